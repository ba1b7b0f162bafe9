// Cooperative cancellation.
//
// Long-running phases (region scan, adjacency construction, BFS, A*) take a
// `&CancelSignal` and poll it at bounded intervals: once per scanned row,
// once per node, once per expanded search node. A cancelled phase returns
// `Err(Cancelled)` and drops whatever it had built so far.
//
// A `CancelToken` is a shared atomic flag. A `CancelSignal` is the union of
// up to two tokens: in the runtime these are the process-wide shutdown token
// and the per-instance token, so either one firing cancels the work.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Returned by a phase that observed cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// A shareable cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// The combination of a global and a local cancellation token.
#[derive(Clone, Debug, Default)]
pub struct CancelSignal {
    global: Option<CancelToken>,
    local: Option<CancelToken>,
}

impl CancelSignal {
    /// A signal that never fires. For synchronous callers and tests.
    pub fn never() -> Self {
        Self::default()
    }

    pub fn from_token(token: CancelToken) -> Self {
        Self {
            global: Some(token),
            local: None,
        }
    }

    pub fn linked(global: CancelToken, local: CancelToken) -> Self {
        Self {
            global: Some(global),
            local: Some(local),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.global.as_ref().is_some_and(CancelToken::is_cancelled)
            || self.local.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// `Err(Cancelled)` if either token has fired.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
