use std::fmt;
use std::time::Duration;

use crate::state::InstanceState;

pub const DEFAULT_POLL_DELAY_SECONDS: u64 = 10;
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 12;

/// Fixed-interval convergence poll budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }

    fn effective_attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_POLL_DELAY_SECONDS),
            DEFAULT_POLL_MAX_ATTEMPTS,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Reached,
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollError<E> {
    Describe(E),
    Unreachable {
        target: InstanceState,
        observed: InstanceState,
    },
}

impl<E: fmt::Display> fmt::Display for PollError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Describe(error) => write!(f, "{error}"),
            Self::Unreachable { target, observed } => write!(
                f,
                "instance entered state '{observed}' while waiting for '{target}'"
            ),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for PollError<E> {}

/// Describes the instance until it reports `target` or the attempt budget is spent.
///
/// The first describe happens immediately; `sleep` is called with the policy
/// delay between attempts, never after the last one.
pub fn poll_until_state<E>(
    target: &InstanceState,
    policy: &PollPolicy,
    mut describe: impl FnMut() -> Result<InstanceState, E>,
    mut sleep: impl FnMut(Duration),
) -> Result<WaitOutcome, PollError<E>> {
    let attempts = policy.effective_attempts();

    for attempt in 1..=attempts {
        let observed = describe().map_err(PollError::Describe)?;
        if &observed == target {
            return Ok(WaitOutcome::Reached);
        }
        if observed.blocks_convergence_to(target) {
            return Err(PollError::Unreachable {
                target: target.clone(),
                observed,
            });
        }
        if attempt < attempts {
            sleep(policy.delay);
        }
    }

    Ok(WaitOutcome::Exhausted { attempts })
}
