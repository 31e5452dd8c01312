//! Single-threaded cooperative scheduler for large numbers of timed tasks.
//!
//! Many continuations wait on wall-clock deadlines at once, all on one
//! operating-system thread, instead of parking one thread per task.
//!
//! # Architecture
//!
//! - **Scheduler**: owns the Ready Queue, the Wait Set and the continuation arena
//! - **Ready Queue**: FIFO of continuations that can run now
//! - **Wait Set**: continuations ordered by `(deadline, id)`
//! - **Timeout**: the suspension point that files a continuation into the Wait Set
//! - **Clock**: monotonic time and the pause primitive, swappable for tests
//! - **Builder**: pauses, fault policy and clock, from code or the environment
//!
//! # Example
//!
//! ```
//! use cosched::{Scheduler, timeout_ms};
//!
//! let mut scheduler = Scheduler::new();
//! scheduler.submit(async {
//!     for _ in 0..3 {
//!         timeout_ms(1).await;
//!     }
//! });
//!
//! let report = scheduler.run_until_idle();
//! assert_eq!(report.completed, 1);
//! ```

mod builder;
pub mod clock;
pub mod config;
mod error;
mod runtime;
mod task;
pub mod time;
mod utils;

pub use builder::{Builder, DEFAULT_IDLE_PAUSE, DEFAULT_SWEEP_PAUSE};
pub use error::{ConfigError, Fault};
pub use runtime::{FaultPolicy, RunReport, Scheduler, YieldNow, yield_now};
pub use task::{Resumable, Step, Submit, TaskId, spawn};
pub use time::{timeout, timeout_ms, timeout_until};
