use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Test,
    AlreadyRunning,
    Started,
    Stopped,
    Status,
    Error,
}

/// Value returned to the invoker for every handled event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandlerResult {
    pub result: ResultKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HandlerResult {
    pub fn new(result: ResultKind) -> Self {
        Self {
            result,
            sms_sent: None,
            state: None,
            error: None,
        }
    }

    pub fn test(sms_sent: bool) -> Self {
        Self {
            sms_sent: Some(sms_sent),
            ..Self::new(ResultKind::Test)
        }
    }

    pub fn status(state: impl Into<String>) -> Self {
        Self {
            state: Some(state.into()),
            ..Self::new(ResultKind::Status)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new(ResultKind::Error)
        }
    }
}
