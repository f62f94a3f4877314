use std::fmt;

use crate::runtime::poll::{PollPolicy, WaitOutcome};
use crate::runtime::state::InstanceState;

pub trait InstanceControl {
    fn describe_state(&self, instance_id: &str) -> Result<InstanceState, ControlError>;

    fn start(&self, instance_id: &str) -> Result<(), ControlError>;

    fn stop(&self, instance_id: &str) -> Result<(), ControlError>;

    /// Blocks until the instance reports `target` or the poll budget runs out.
    fn wait_until(
        &self,
        instance_id: &str,
        target: &InstanceState,
        policy: &PollPolicy,
    ) -> Result<WaitOutcome, ControlError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlError {
    message: String,
}

impl ControlError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ControlError {}
