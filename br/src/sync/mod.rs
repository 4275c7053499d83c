//! Blocking synchronization primitives
//!
//! [`Condition`] is a predicate-guarded wait/notify over a shared mutex;
//! [`BoundedBlockingQueue`] builds the server's serialized event stream on
//! top of two of them.

mod condition;
mod queue;

pub use condition::{Condition, ConditionBuilder};
pub use queue::BoundedBlockingQueue;

use thiserror::Error;

/// Errors from constructing synchronization primitives
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("Condition has no lock")]
    MissingLock,

    #[error("Condition has no predicate")]
    MissingPredicate,

    #[error("Queue capacity must be at least 1")]
    ZeroCapacity,
}
