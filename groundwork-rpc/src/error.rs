use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize, Clone, Error)]
pub enum Error {
    /// Peer closed the transport. Dependent operations keep failing until
    /// a new connection is created
    #[error("Peer disconnected")]
    PeerDisconnected,
    /// No live connection for the requested service, and no address to
    /// create one
    #[error("Not connected and no bus address supplied")]
    NotConnected,
    /// Named fault returned by the remote. Call sites match on `name` for
    /// expected, recoverable faults; everything else propagates unchanged
    #[error("{name}: {message}")]
    Fault { name: String, message: String },
    /// Call params don't serialize into the wire format
    #[error("Invalid call params: {0}")]
    ParamsType(String),
    /// Call result doesn't deserialize into the requested type
    #[error("Invalid result type: {0}")]
    ResultType(String),
    /// Value shape with no wire signature. A programming error on the
    /// caller side, signalled rather than silently defaulted
    #[error("No wire signature for value: {0}")]
    Signature(String),
    /// Local input validation failed. Never sent to the remote
    #[error("Validation failed: {0}")]
    Validation(String),
    /// Task stopped without producing a result
    #[error("Task stopped without a result")]
    TaskStopped,
    /// Internal library error. Should never happen
    #[error("Internal groundwork error: {0}. Please report the issue")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
