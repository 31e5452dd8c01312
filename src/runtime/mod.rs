//! Scheduler subsystem modules.

pub(crate) mod context;
mod core;
mod fault;
pub(crate) mod queue;
pub(crate) mod wait;
pub(crate) mod waker;
mod yield_now;

pub use self::core::{RunReport, Scheduler};
pub use fault::FaultPolicy;
pub use yield_now::{YieldNow, yield_now};
