//! Fluent builder for [`Scheduler`] construction.

use crate::clock::{Clock, MonotonicClock};
use crate::config::{self, FAULT_POLICY, IDLE_PAUSE_MS, SWEEP_PAUSE_MS};
use crate::error::ConfigError;
use crate::runtime::{FaultPolicy, Scheduler};

use std::env;
use std::rc::Rc;
use std::time::Duration;

/// Pause after every Wait Set sweep.
pub const DEFAULT_SWEEP_PAUSE: Duration = Duration::from_millis(1);

/// Pause at the end of every run-loop pass.
pub const DEFAULT_IDLE_PAUSE: Duration = Duration::from_millis(1);

/// Builder for [`Scheduler`] instances.
///
/// # Example
/// ```
/// use cosched::{Builder, FaultPolicy};
/// use std::time::Duration;
///
/// let scheduler = Builder::new()
///     .sweep_pause(Duration::from_millis(1))
///     .fault_policy(FaultPolicy::Collect)
///     .build();
/// assert!(scheduler.is_idle());
/// ```
pub struct Builder {
    clock: Rc<dyn Clock>,
    sweep_pause: Duration,
    idle_pause: Duration,
    fault_policy: FaultPolicy,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// Real clock, 1 ms sweep and idle pauses, faults logged.
    pub fn new() -> Self {
        Self {
            clock: Rc::new(MonotonicClock),
            sweep_pause: DEFAULT_SWEEP_PAUSE,
            idle_pause: DEFAULT_IDLE_PAUSE,
            fault_policy: FaultPolicy::default(),
        }
    }

    /// Starts from the defaults and applies `COSCHED_SWEEP_PAUSE_MS`,
    /// `COSCHED_IDLE_PAUSE_MS` and `COSCHED_FAULT_POLICY` when set.
    ///
    /// # Returns
    /// The builder, or a [`ConfigError`] naming the first malformed variable
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::new();

        if let Some(ms) = config::env_u64(SWEEP_PAUSE_MS)? {
            builder = builder.sweep_pause(Duration::from_millis(ms));
        }
        if let Some(ms) = config::env_u64(IDLE_PAUSE_MS)? {
            builder = builder.idle_pause(Duration::from_millis(ms));
        }
        if let Ok(policy) = env::var(FAULT_POLICY)
            && !policy.trim().is_empty()
        {
            builder = builder.fault_policy(policy.parse()?);
        }

        Ok(builder)
    }

    /// Pause taken after each sweep. Bounds how late a deadline can be
    /// observed and how much CPU a spinning loop can burn.
    pub fn sweep_pause(mut self, pause: Duration) -> Self {
        self.sweep_pause = pause;
        self
    }

    /// Pause taken once per run-loop pass when nothing is ready.
    pub fn idle_pause(mut self, pause: Duration) -> Self {
        self.idle_pause = pause;
        self
    }

    /// Chooses how faulted continuations are surfaced.
    ///
    /// # Arguments
    /// * `policy` - [`FaultPolicy::Log`] unless set
    pub fn fault_policy(mut self, policy: FaultPolicy) -> Self {
        self.fault_policy = policy;
        self
    }

    /// Replaces the time source, e.g. with a
    /// [`ManualClock`](crate::clock::ManualClock).
    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    /// Builds the configured scheduler.
    ///
    /// # Returns
    /// An idle [`Scheduler`] with empty stores
    pub fn build(self) -> Scheduler {
        tracing::debug!(
            sweep_pause = ?self.sweep_pause,
            idle_pause = ?self.idle_pause,
            fault_policy = %self.fault_policy,
            "building scheduler"
        );

        Scheduler::from_parts(
            self.clock,
            self.sweep_pause,
            self.idle_pause,
            self.fault_policy,
        )
    }
}
