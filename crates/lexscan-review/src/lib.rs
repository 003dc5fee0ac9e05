#![deny(unsafe_code)]

//! Review queue, approval state machine and approved-record sinks.

pub mod error;
pub mod sink;
pub mod workflow;

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub use error::{Result, SinkError, WorkflowError};
pub use sink::{JsonLinesSink, MemorySink, RecordSink};
pub use workflow::{ApprovalWorkflow, Clock, ReviewRequest, SubmitRequest, UNTYPED_SCHEMA};

// Mutations are computed on a copy and committed by one assignment, so a
// poisoned lock still guards consistent data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
