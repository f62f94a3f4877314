use std::fmt;

use serde_json::json;

use crate::logging::{log_error, log_info};

pub trait Notifier {
    /// Publishes one message, returning the provider's message id.
    fn publish(&self, message: &str) -> Result<String, NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyError {
    message: String,
}

impl NotifyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for NotifyError {}

/// Makes a single delivery attempt and reports whether it went through.
pub fn notify(notifier: &impl Notifier, message: &str) -> bool {
    match notifier.publish(message) {
        Ok(message_id) => {
            log_info(
                "notifier",
                "notification_sent",
                json!({ "message_id": message_id, "message": message }),
            );
            true
        }
        Err(error) => {
            log_error(
                "notifier",
                "notification_failed",
                json!({ "error": error.message(), "message": message }),
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct FlakyNotifier {
        fail: bool,
        attempts: Mutex<usize>,
    }

    impl Notifier for FlakyNotifier {
        fn publish(&self, _message: &str) -> Result<String, NotifyError> {
            *self.attempts.lock().expect("poisoned mutex") += 1;
            if self.fail {
                Err(NotifyError::new("endpoint unreachable"))
            } else {
                Ok("msg-1".to_string())
            }
        }
    }

    #[test]
    fn reports_success_after_one_attempt() {
        let notifier = FlakyNotifier {
            fail: false,
            attempts: Mutex::new(0),
        };

        assert!(notify(&notifier, "hello"));
        assert_eq!(*notifier.attempts.lock().expect("poisoned mutex"), 1);
    }

    #[test]
    fn swallows_failure_without_retrying() {
        let notifier = FlakyNotifier {
            fail: true,
            attempts: Mutex::new(0),
        };

        assert!(!notify(&notifier, "hello"));
        assert_eq!(*notifier.attempts.lock().expect("poisoned mutex"), 1);
    }
}
