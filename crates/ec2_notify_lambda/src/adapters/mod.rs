pub mod compute;
pub mod notifier;
