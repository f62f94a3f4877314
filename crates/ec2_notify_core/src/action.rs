use serde_json::Value;

/// Validated request produced from a raw invocation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Test,
    Start,
    Stop,
    Status,
}

impl Action {
    pub fn from_event(event: &Value) -> Self {
        Self::parse(&resolve_action(event))
    }

    /// Maps a lower-cased action name; anything unrecognised is a status query.
    pub fn parse(action: &str) -> Self {
        match action {
            "test" => Self::Test,
            "start" => Self::Start,
            "stop" => Self::Stop,
            _ => Self::Status,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Status => "status",
        }
    }
}

/// Extracts the lower-cased action string from an invocation event.
///
/// Sources are tried in order: a top-level `action`, then
/// `queryStringParameters.action`, then `action` inside `body` (a JSON string
/// or an already-decoded object). The first non-empty string wins. Anything
/// that cannot be read yields an empty string.
pub fn resolve_action(event: &Value) -> String {
    let Some(object) = event.as_object() else {
        return String::new();
    };

    let action = non_empty_action(object.get("action"))
        .or_else(|| {
            object
                .get("queryStringParameters")
                .and_then(|params| non_empty_action(params.get("action")))
        })
        .or_else(|| object.get("body").and_then(action_from_body))
        .unwrap_or_default();

    action.to_lowercase()
}

fn action_from_body(body: &Value) -> Option<String> {
    match body {
        Value::String(text) if !text.is_empty() => {
            let parsed: Value = serde_json::from_str(text).ok()?;
            non_empty_action(parsed.get("action"))
        }
        Value::Object(_) => non_empty_action(body.get("action")),
        _ => None,
    }
}

fn non_empty_action(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .map(str::to_string)
}
