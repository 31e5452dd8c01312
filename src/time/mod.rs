//! Timed suspension.
//!
//! [`timeout`] is the only way a continuation suspends itself on a deadline:
//!
//! ```ignore
//! use cosched::time::timeout;
//! use std::time::Duration;
//!
//! async fn tick_three_times() {
//!     for _ in 0..3 {
//!         timeout(Duration::from_millis(1)).await;
//!     }
//! }
//! ```
//!
//! The continuation resumes at or after its deadline, never before. How far
//! after depends on the scheduler's sweep and idle pauses.

pub mod timeout;

pub use timeout::{Timeout, timeout, timeout_ms, timeout_until};
