use aws_sdk_sns::types::MessageAttributeValue;
use ec2_notify_lambda::adapters::compute::{ControlError, InstanceControl};
use ec2_notify_lambda::adapters::notifier::{Notifier, NotifyError};
use ec2_notify_lambda::config::HandlerConfig;
use ec2_notify_lambda::handlers::dispatch::handle_event;
use ec2_notify_lambda::runtime::contract::HandlerResult;
use ec2_notify_lambda::runtime::poll::{poll_until_state, PollPolicy, WaitOutcome};
use ec2_notify_lambda::runtime::state::InstanceState;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

const SMS_TYPE_ATTRIBUTE: &str = "AWS.SNS.SMS.SMSType";

struct Ec2InstanceControl {
    ec2_client: aws_sdk_ec2::Client,
}

impl Ec2InstanceControl {
    async fn describe_state_async(&self, instance_id: &str) -> Result<InstanceState, ControlError> {
        let output = self
            .ec2_client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|error| {
                ControlError::new(format!(
                    "failed to describe instance {instance_id}: {}",
                    aws_sdk_ec2::error::DisplayErrorContext(&error)
                ))
            })?;

        output
            .reservations()
            .first()
            .and_then(|reservation| reservation.instances().first())
            .and_then(|instance| instance.state())
            .and_then(|state| state.name())
            .map(|name| InstanceState::from_name(name.as_str()))
            .ok_or_else(|| {
                ControlError::new(format!(
                    "instance {instance_id} missing from describe response"
                ))
            })
    }
}

impl InstanceControl for Ec2InstanceControl {
    fn describe_state(&self, instance_id: &str) -> Result<InstanceState, ControlError> {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(self.describe_state_async(instance_id))
        })
    }

    fn start(&self, instance_id: &str) -> Result<(), ControlError> {
        let client = self.ec2_client.clone();
        let id = instance_id.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .start_instances()
                    .instance_ids(id.clone())
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        ControlError::new(format!(
                            "failed to start instance {id}: {}",
                            aws_sdk_ec2::error::DisplayErrorContext(&error)
                        ))
                    })
            })
        })
    }

    fn stop(&self, instance_id: &str) -> Result<(), ControlError> {
        let client = self.ec2_client.clone();
        let id = instance_id.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .stop_instances()
                    .instance_ids(id.clone())
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| {
                        ControlError::new(format!(
                            "failed to stop instance {id}: {}",
                            aws_sdk_ec2::error::DisplayErrorContext(&error)
                        ))
                    })
            })
        })
    }

    fn wait_until(
        &self,
        instance_id: &str,
        target: &InstanceState,
        policy: &PollPolicy,
    ) -> Result<WaitOutcome, ControlError> {
        tokio::task::block_in_place(|| {
            let handle = tokio::runtime::Handle::current();
            poll_until_state(
                target,
                policy,
                || handle.block_on(self.describe_state_async(instance_id)),
                std::thread::sleep,
            )
            .map_err(|error| ControlError::new(error.to_string()))
        })
    }
}

struct SnsNotifier {
    sns_client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl Notifier for SnsNotifier {
    fn publish(&self, message: &str) -> Result<String, NotifyError> {
        let client = self.sns_client.clone();
        let topic_arn = self.topic_arn.clone();
        let body = message.to_string();

        let sms_type = MessageAttributeValue::builder()
            .data_type("String")
            .string_value("Transactional")
            .build()
            .map_err(|error| NotifyError::new(format!("invalid sms type attribute: {error}")))?;

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .publish()
                    .topic_arn(topic_arn)
                    .message(body)
                    .message_attributes(SMS_TYPE_ATTRIBUTE, sms_type)
                    .send()
                    .await
                    .map(|output| output.message_id().unwrap_or_default().to_string())
                    .map_err(|error| {
                        NotifyError::new(format!(
                            "failed to publish notification: {}",
                            aws_sdk_sns::error::DisplayErrorContext(&error)
                        ))
                    })
            })
        })
    }
}

async fn handle_request(event: LambdaEvent<Value>) -> Result<HandlerResult, Error> {
    let config = HandlerConfig::from_env().map_err(|error| Error::from(error.message()))?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let compute = Ec2InstanceControl {
        ec2_client: aws_sdk_ec2::Client::new(&aws_config),
    };
    let notifier = SnsNotifier {
        sns_client: aws_sdk_sns::Client::new(&aws_config),
        topic_arn: config.topic_arn.clone(),
    };

    Ok(handle_event(event.payload, &config, &compute, &notifier))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::tracing::init_default_subscriber();
    lambda_runtime::run(service_fn(handle_request)).await
}
