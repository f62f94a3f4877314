use std::fmt;
use std::time::Duration;

use crate::runtime::poll::{PollPolicy, DEFAULT_POLL_DELAY_SECONDS, DEFAULT_POLL_MAX_ATTEMPTS};

pub const INSTANCE_ID_VAR: &str = "INSTANCE_ID";
pub const SNS_TOPIC_ARN_VAR: &str = "SNS_TOPIC_ARN";
pub const POLL_DELAY_SECONDS_VAR: &str = "POLL_DELAY_SECONDS";
pub const POLL_MAX_ATTEMPTS_VAR: &str = "POLL_MAX_ATTEMPTS";

/// Deployment-time settings injected into the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    pub instance_id: String,
    pub topic_arn: String,
    pub poll: PollPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ConfigError {}

impl HandlerConfig {
    pub fn new(instance_id: impl Into<String>, topic_arn: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            topic_arn: topic_arn.into(),
            poll: PollPolicy::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let instance_id = required(&lookup, INSTANCE_ID_VAR)?;
        let topic_arn = required(&lookup, SNS_TOPIC_ARN_VAR)?;
        let delay_seconds =
            optional_number(&lookup, POLL_DELAY_SECONDS_VAR, DEFAULT_POLL_DELAY_SECONDS)?;
        let max_attempts =
            optional_number(&lookup, POLL_MAX_ATTEMPTS_VAR, DEFAULT_POLL_MAX_ATTEMPTS)?;

        Ok(Self {
            instance_id,
            topic_arn,
            poll: PollPolicy::new(Duration::from_secs(delay_seconds), max_attempts),
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::new(format!("{key} must be configured")))
}

fn optional_number<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key).map(|value| value.trim().to_string()) {
        Some(value) if !value.is_empty() => value
            .parse()
            .map_err(|_| ConfigError::new(format!("{key} must be a non-negative integer"))),
        _ => Ok(default),
    }
}
