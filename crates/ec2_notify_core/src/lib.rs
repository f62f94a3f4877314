//! Shared EC2 notifier domain primitives.
//!
//! This crate owns action resolution, the handler result contract, instance
//! state names, the convergence poll loop, and notification texts. It
//! intentionally excludes AWS SDK and Lambda runtime concerns.

pub mod action;
pub mod contract;
pub mod messages;
pub mod poll;
pub mod state;
