use serde_json::{json, Value};

use crate::adapters::compute::{ControlError, InstanceControl};
use crate::adapters::notifier::{notify, Notifier};
use crate::config::HandlerConfig;
use crate::logging::{log_error, log_info};
use crate::runtime::action::Action;
use crate::runtime::contract::{HandlerResult, ResultKind};
use crate::runtime::messages::{
    already_running_message, error_message, started_message, starting_message, status_message,
    stopped_message, stopping_message, test_message,
};
use crate::runtime::poll::WaitOutcome;
use crate::runtime::state::InstanceState;

/// Resolves the event into an action, runs it, and always returns a result.
///
/// Compute-control failures are reported through one error notification and
/// an `error` result; they never escape as an `Err`.
pub fn handle_event(
    event: Value,
    config: &HandlerConfig,
    compute: &impl InstanceControl,
    notifier: &impl Notifier,
) -> HandlerResult {
    let action = Action::from_event(&event);
    log_info(
        "dispatch",
        "action_received",
        json!({
            "action": action.as_str(),
            "instance_id": config.instance_id.clone(),
        }),
    );

    match dispatch(action, config, compute, notifier) {
        Ok(result) => {
            log_info(
                "dispatch",
                "action_completed",
                json!({
                    "action": action.as_str(),
                    "result": result.result,
                    "state": result.state.clone(),
                }),
            );
            result
        }
        Err(error) => {
            let message = error_message(error.message());
            let sms_sent = notify(notifier, &message);
            log_error(
                "dispatch",
                "action_failed",
                json!({
                    "action": action.as_str(),
                    "instance_id": config.instance_id.clone(),
                    "error": error.message(),
                    "sms_sent": sms_sent,
                }),
            );
            HandlerResult::error(message)
        }
    }
}

fn dispatch(
    action: Action,
    config: &HandlerConfig,
    compute: &impl InstanceControl,
    notifier: &impl Notifier,
) -> Result<HandlerResult, ControlError> {
    match action {
        Action::Test => {
            let sms_sent = notify(notifier, &test_message(&config.instance_id));
            Ok(HandlerResult::test(sms_sent))
        }
        Action::Start => start_instance(config, compute, notifier),
        Action::Stop => stop_instance(config, compute, notifier),
        Action::Status => report_status(config, compute, notifier),
    }
}

fn start_instance(
    config: &HandlerConfig,
    compute: &impl InstanceControl,
    notifier: &impl Notifier,
) -> Result<HandlerResult, ControlError> {
    let current = compute.describe_state(&config.instance_id)?;
    if current.is_running() {
        notify(notifier, &already_running_message());
        return Ok(HandlerResult::new(ResultKind::AlreadyRunning));
    }

    notify(notifier, &starting_message());
    compute.start(&config.instance_id)?;
    wait_for(config, compute, &InstanceState::Running)?;
    notify(notifier, &started_message());
    Ok(HandlerResult::new(ResultKind::Started))
}

fn stop_instance(
    config: &HandlerConfig,
    compute: &impl InstanceControl,
    notifier: &impl Notifier,
) -> Result<HandlerResult, ControlError> {
    notify(notifier, &stopping_message());
    compute.stop(&config.instance_id)?;
    wait_for(config, compute, &InstanceState::Stopped)?;
    notify(notifier, &stopped_message());
    Ok(HandlerResult::new(ResultKind::Stopped))
}

fn report_status(
    config: &HandlerConfig,
    compute: &impl InstanceControl,
    notifier: &impl Notifier,
) -> Result<HandlerResult, ControlError> {
    let state = compute.describe_state(&config.instance_id)?;
    notify(notifier, &status_message(&state));
    Ok(HandlerResult::status(state.as_str()))
}

fn wait_for(
    config: &HandlerConfig,
    compute: &impl InstanceControl,
    target: &InstanceState,
) -> Result<(), ControlError> {
    match compute.wait_until(&config.instance_id, target, &config.poll)? {
        WaitOutcome::Reached => Ok(()),
        WaitOutcome::Exhausted { attempts } => Err(ControlError::new(format!(
            "instance {} did not reach '{target}' after {attempts} attempts",
            config.instance_id
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::adapters::notifier::NotifyError;
    use crate::runtime::poll::PollPolicy;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum ComputeCall {
        Describe,
        Start,
        Stop,
        Wait {
            target: InstanceState,
            delay: Duration,
            max_attempts: u32,
        },
    }

    struct FakeCompute {
        state: Result<InstanceState, ControlError>,
        mutate_error: Option<ControlError>,
        wait_outcome: WaitOutcome,
        calls: Mutex<Vec<ComputeCall>>,
    }

    impl FakeCompute {
        fn with_state(state: InstanceState) -> Self {
            Self {
                state: Ok(state),
                mutate_error: None,
                wait_outcome: WaitOutcome::Reached,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<ComputeCall> {
            self.calls.lock().expect("poisoned mutex").clone()
        }

        fn count(&self, wanted: fn(&ComputeCall) -> bool) -> usize {
            self.calls
                .lock()
                .expect("poisoned mutex")
                .iter()
                .filter(|call| wanted(call))
                .count()
        }

        fn mutate(&self, call: ComputeCall) -> Result<(), ControlError> {
            self.calls.lock().expect("poisoned mutex").push(call);
            match &self.mutate_error {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }
    }

    impl InstanceControl for FakeCompute {
        fn describe_state(&self, _instance_id: &str) -> Result<InstanceState, ControlError> {
            self.calls
                .lock()
                .expect("poisoned mutex")
                .push(ComputeCall::Describe);
            self.state.clone()
        }

        fn start(&self, _instance_id: &str) -> Result<(), ControlError> {
            self.mutate(ComputeCall::Start)
        }

        fn stop(&self, _instance_id: &str) -> Result<(), ControlError> {
            self.mutate(ComputeCall::Stop)
        }

        fn wait_until(
            &self,
            _instance_id: &str,
            target: &InstanceState,
            policy: &PollPolicy,
        ) -> Result<WaitOutcome, ControlError> {
            self.calls
                .lock()
                .expect("poisoned mutex")
                .push(ComputeCall::Wait {
                    target: target.clone(),
                    delay: policy.delay,
                    max_attempts: policy.max_attempts,
                });
            Ok(self.wait_outcome)
        }
    }

    struct RecordingNotifier {
        fail: bool,
        messages: Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                fail: false,
                messages: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                messages: Mutex::new(Vec::new()),
            }
        }

        fn messages(&self) -> Vec<String> {
            self.messages.lock().expect("poisoned mutex").clone()
        }
    }

    impl Notifier for RecordingNotifier {
        fn publish(&self, message: &str) -> Result<String, NotifyError> {
            let mut messages = self.messages.lock().expect("poisoned mutex");
            messages.push(message.to_string());
            if self.fail {
                Err(NotifyError::new("sns unavailable"))
            } else {
                Ok(format!("msg-{}", messages.len()))
            }
        }
    }

    fn config() -> HandlerConfig {
        HandlerConfig::new(
            "i-0e068c43430210bff",
            "arn:aws:sns:ap-south-1:123456789012:ec2-state-notify",
        )
    }

    fn is_start(call: &ComputeCall) -> bool {
        matches!(call, ComputeCall::Start)
    }

    fn is_stop(call: &ComputeCall) -> bool {
        matches!(call, ComputeCall::Stop)
    }

    fn is_wait(call: &ComputeCall) -> bool {
        matches!(call, ComputeCall::Wait { .. })
    }

    #[test]
    fn start_from_stopped_issues_one_start_and_one_wait() {
        let compute = FakeCompute::with_state(InstanceState::Stopped);
        let notifier = RecordingNotifier::new();

        let result = handle_event(json!({"action": "START"}), &config(), &compute, &notifier);

        assert_eq!(
            serde_json::to_value(&result).expect("result should serialize"),
            json!({"result": "started"})
        );
        assert_eq!(
            compute.calls(),
            vec![
                ComputeCall::Describe,
                ComputeCall::Start,
                ComputeCall::Wait {
                    target: InstanceState::Running,
                    delay: Duration::from_secs(10),
                    max_attempts: 12,
                },
            ]
        );
        assert_eq!(
            notifier.messages(),
            vec!["🟡 EC2 - STARTING...", "✅ EC2 - STARTED SUCCESS"]
        );
    }

    #[test]
    fn start_when_running_short_circuits() {
        let compute = FakeCompute::with_state(InstanceState::Running);
        let notifier = RecordingNotifier::new();

        let result = handle_event(json!({"action": "start"}), &config(), &compute, &notifier);

        assert_eq!(result.result, ResultKind::AlreadyRunning);
        assert_eq!(compute.calls(), vec![ComputeCall::Describe]);
        assert_eq!(notifier.messages(), vec!["🟢 EC2 - ALREADY RUNNING"]);
    }

    #[test]
    fn stop_issues_one_stop_and_one_wait_regardless_of_prior_state() {
        for prior in [InstanceState::Running, InstanceState::Stopped] {
            let compute = FakeCompute::with_state(prior);
            let notifier = RecordingNotifier::new();

            let result = handle_event(
                json!({"queryStringParameters": {"action": "Stop"}}),
                &config(),
                &compute,
                &notifier,
            );

            assert_eq!(result.result, ResultKind::Stopped);
            assert_eq!(compute.count(is_stop), 1);
            assert_eq!(compute.count(is_wait), 1);
            assert!(!compute.calls().contains(&ComputeCall::Describe));
            assert_eq!(
                notifier.messages(),
                vec!["🟡 EC2 - STOPPING...", "🛑 EC2 - STOPPED SUCCESS"]
            );
        }
    }

    #[test]
    fn empty_event_reports_status_without_mutating() {
        let compute = FakeCompute::with_state(InstanceState::Running);
        let notifier = RecordingNotifier::new();

        let result = handle_event(json!({}), &config(), &compute, &notifier);

        assert_eq!(
            serde_json::to_value(&result).expect("result should serialize"),
            json!({"result": "status", "state": "running"})
        );
        assert_eq!(compute.calls(), vec![ComputeCall::Describe]);
        assert_eq!(notifier.messages(), vec!["🟢 EC2 - RUNNING"]);
    }

    #[test]
    fn malformed_body_falls_back_to_status() {
        let compute = FakeCompute::with_state(InstanceState::Stopped);
        let notifier = RecordingNotifier::new();

        let result = handle_event(json!({"body": "{oops"}), &config(), &compute, &notifier);

        assert_eq!(result, HandlerResult::status("stopped"));
        assert_eq!(notifier.messages(), vec!["🛑 EC2 - STOPPED"]);
    }

    #[test]
    fn test_action_publishes_exactly_once() {
        let compute = FakeCompute::with_state(InstanceState::Stopped);
        let notifier = RecordingNotifier::new();

        let result = handle_event(
            json!({"body": "{\"action\":\"test\"}"}),
            &config(),
            &compute,
            &notifier,
        );

        assert_eq!(
            serde_json::to_value(&result).expect("result should serialize"),
            json!({"result": "test", "sms_sent": true})
        );
        assert!(compute.calls().is_empty());
        assert_eq!(
            notifier.messages(),
            vec!["TEST: EC2 Monitor - Instance i-0e068c43430210bff"]
        );
    }

    #[test]
    fn notifier_failure_does_not_change_result_kind() {
        let cases = [
            (json!({"action": "test"}), InstanceState::Stopped, ResultKind::Test),
            (json!({"action": "start"}), InstanceState::Stopped, ResultKind::Started),
            (
                json!({"action": "start"}),
                InstanceState::Running,
                ResultKind::AlreadyRunning,
            ),
            (json!({"action": "stop"}), InstanceState::Running, ResultKind::Stopped),
            (json!({}), InstanceState::Stopped, ResultKind::Status),
        ];

        for (event, state, expected) in cases {
            let compute = FakeCompute::with_state(state);
            let notifier = RecordingNotifier::failing();

            let result = handle_event(event, &config(), &compute, &notifier);

            assert_eq!(result.result, expected);
            assert!(!notifier.messages().is_empty());
        }

        let compute = FakeCompute::with_state(InstanceState::Stopped);
        let result = handle_event(
            json!({"action": "test"}),
            &config(),
            &compute,
            &RecordingNotifier::failing(),
        );
        assert_eq!(result.sms_sent, Some(false));
    }

    #[test]
    fn describe_failure_becomes_error_result_with_one_notification() {
        let mut compute = FakeCompute::with_state(InstanceState::Stopped);
        compute.state = Err(ControlError::new("InvalidInstanceID.NotFound"));
        let notifier = RecordingNotifier::new();

        let result = handle_event(json!({"action": "start"}), &config(), &compute, &notifier);

        assert_eq!(result.result, ResultKind::Error);
        assert_eq!(
            result.error.as_deref(),
            Some("❌ EC2 ERROR: InvalidInstanceID.NotFound")
        );
        assert_eq!(compute.count(is_start), 0);
        assert_eq!(
            notifier.messages(),
            vec!["❌ EC2 ERROR: InvalidInstanceID.NotFound"]
        );
    }

    #[test]
    fn stop_failure_skips_wait_and_reports_error() {
        let mut compute = FakeCompute::with_state(InstanceState::Running);
        compute.mutate_error = Some(ControlError::new("UnauthorizedOperation"));
        let notifier = RecordingNotifier::new();

        let result = handle_event(json!({"action": "stop"}), &config(), &compute, &notifier);

        assert_eq!(result.result, ResultKind::Error);
        assert_eq!(compute.count(is_wait), 0);
        let messages = notifier.messages();
        assert_eq!(
            messages
                .iter()
                .filter(|message| message.starts_with("❌"))
                .count(),
            1
        );
        assert_eq!(messages[0], "🟡 EC2 - STOPPING...");
    }

    #[test]
    fn exhausted_wait_reports_error_instead_of_success() {
        let mut compute = FakeCompute::with_state(InstanceState::Stopped);
        compute.wait_outcome = WaitOutcome::Exhausted { attempts: 12 };
        let notifier = RecordingNotifier::new();

        let result = handle_event(json!({"action": "start"}), &config(), &compute, &notifier);

        let expected = error_message(
            "instance i-0e068c43430210bff did not reach 'running' after 12 attempts",
        );
        assert_eq!(result.result, ResultKind::Error);
        assert_eq!(result.error.as_deref(), Some(expected.as_str()));
        assert_eq!(
            notifier.messages(),
            vec!["🟡 EC2 - STARTING...".to_string(), expected]
        );
    }

    #[test]
    fn error_result_survives_failed_error_notification() {
        let mut compute = FakeCompute::with_state(InstanceState::Stopped);
        compute.state = Err(ControlError::new("RequestLimitExceeded"));

        let result = handle_event(
            json!({}),
            &config(),
            &compute,
            &RecordingNotifier::failing(),
        );

        assert_eq!(
            result,
            HandlerResult::error("❌ EC2 ERROR: RequestLimitExceeded")
        );
    }
}
