//! AWS-oriented adapters and handlers for the EC2 state notifier.
//!
//! This crate owns runtime integration details (Lambda handler, compute and
//! notification adapter seams, environment configuration, structured logs)
//! and re-exports the core primitives under a single runtime module boundary.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;

pub mod runtime {
    pub use ec2_notify_core::{action, contract, messages, poll, state};
}
