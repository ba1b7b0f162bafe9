// wayfarer_runtime — asynchronous navmesh and path requests per navigator.
//
// A host creates one `PathfindingContext` over its tile world, registers a
// handle per navigator, and from then on asks for navmesh rebuilds and path
// queries without blocking its own loop. Builds and searches run on a small
// pool of worker threads; results come back as `Promise`s, and path
// callbacks are delivered only when the host calls
// `dispatch_completions()` from its own thread.
//
// Module overview:
// - `context.rs`:   PathfindingContext, the public entry point.
// - `handle.rs`:    Generation-checked Handle and the HandleArena.
// - `instance.rs`:  Per-handle navmesh and path tracks.
// - `processor.rs`: Job queues, worker loop, job execution.
// - `promise.rs`:   One-shot multi-waiter Promise.
// - `config.rs`:    RuntimeConfig (serde, JSON-loadable).
// - `error.rs`:     PathfindingError (synchronous) and RequestError (via promise).
//
// Per handle, at most one navmesh build and one path query are in flight.
// Unforced navmesh requests share the in-flight build; a forced request
// (new center) supersedes it, and only the newest build installs its mesh.
// Disposing a handle or shutting down the context cancels its work
// cooperatively; cancelled requests resolve `RequestError::Cancelled` and
// never run the caller's callback.

pub mod config;
pub mod context;
pub mod error;
pub mod handle;
mod instance;
mod processor;
pub mod promise;

pub use config::RuntimeConfig;
pub use context::PathfindingContext;
pub use error::{PathfindingError, RequestError};
pub use handle::{Handle, HandleArena};
pub use processor::PathCallback;
pub use promise::{Outcome, Promise};
