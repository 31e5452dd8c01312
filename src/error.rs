//! Error and fault types.

use crate::task::TaskId;

use std::any::Any;

/// Errors produced while reading scheduler configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a non-negative integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("unknown fault policy {0:?} (expected discard, log or collect)")]
    UnknownFaultPolicy(String),
}

/// A panic raised by a continuation while it was being resumed.
///
/// The faulted continuation is dropped; the scheduler keeps running.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("continuation {task} faulted during resume: {message}")]
pub struct Fault {
    pub task: TaskId,
    pub message: String,
}

impl Fault {
    pub(crate) fn from_panic(task: TaskId, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };

        Self { task, message }
    }
}
