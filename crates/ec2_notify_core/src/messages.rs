//! Notification texts sent at each state transition.

use crate::state::InstanceState;

pub fn test_message(instance_id: &str) -> String {
    format!("TEST: EC2 Monitor - Instance {instance_id}")
}

pub fn already_running_message() -> String {
    "🟢 EC2 - ALREADY RUNNING".to_string()
}

pub fn starting_message() -> String {
    "🟡 EC2 - STARTING...".to_string()
}

pub fn started_message() -> String {
    "✅ EC2 - STARTED SUCCESS".to_string()
}

pub fn stopping_message() -> String {
    "🟡 EC2 - STOPPING...".to_string()
}

pub fn stopped_message() -> String {
    "🛑 EC2 - STOPPED SUCCESS".to_string()
}

pub fn status_message(state: &InstanceState) -> String {
    let icon = if state.is_running() { "🟢" } else { "🛑" };
    format!("{icon} EC2 - {}", state.as_str().to_uppercase())
}

pub fn error_message(error: &str) -> String {
    format!("❌ EC2 ERROR: {error}")
}
