// Runtime error types.
//
// Two kinds, delivered on different channels:
// - `PathfindingError` is returned synchronously from a `PathfindingContext`
//   call when the call itself cannot be accepted (bad handle, full pool,
//   empty input, context shut down).
// - `RequestError` is the failure side of an accepted request's outcome and
//   only ever arrives through its `Promise`.

use crate::handle::Handle;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PathfindingError {
    #[error("handle {0} is not live")]
    InvalidHandle(Handle),
    #[error("instance pool exhausted ({max} live instances)")]
    InstancePoolExhausted { max: usize },
    #[error("path request needs at least one start tile")]
    EmptyStarts,
    #[error("pathfinding context has been shut down")]
    ShutDown,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    /// The instance was disposed or the context shut down before the
    /// request finished.
    #[error("request cancelled")]
    Cancelled,
    /// The job panicked. Holds the panic message.
    #[error("request failed: {0}")]
    Failed(String),
}

impl From<wayfarer_nav::Cancelled> for RequestError {
    fn from(_: wayfarer_nav::Cancelled) -> Self {
        RequestError::Cancelled
    }
}
