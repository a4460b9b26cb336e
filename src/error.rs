//! Error types for transports and the scheduler

use thiserror::Error;

use crate::transport::ConnectionState;

/// Failure reported by an underlying radio stack call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct LinkError(pub String);

impl LinkError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Errors returned by [`HidTransport`](crate::transport::HidTransport)
/// operations and by wireless bring-up.
///
/// None of these are fatal: the scheduler logs them and moves on to the next
/// line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("host not connected")]
    NotConnected,

    #[error("transport not ready (state: {0:?})")]
    NotReady(ConnectionState),

    #[error("link operation failed: {0}")]
    Link(#[from] LinkError),

    #[error("bring-up failed: {0}")]
    BringUp(String),

    #[error("transport busy (state: {0:?})")]
    Busy(ConnectionState),

    #[error("raw key sequences are not supported: {0}")]
    Unsupported(String),
}

/// Errors from the host integration surface of the scheduler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("cannot rebind the transport while a script is running")]
    TransportBusy,
}
