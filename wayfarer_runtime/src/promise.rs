// One-shot, multi-waiter completion cell.
//
// A `Promise` is completed exactly once (later completions are ignored) and
// can be cloned freely; every clone observes the same outcome. Waiters block
// on a `parking_lot::Condvar`. The outcome is cloned out to each reader, so
// payloads are cheap-to-clone types (`Arc<NavMesh>`, `Option<PathResult>`).

use crate::error::RequestError;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type Outcome<T> = Result<T, RequestError>;

struct Inner<T> {
    outcome: Mutex<Option<Outcome<T>>>,
    ready: Condvar,
}

pub struct Promise<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise")
            .field("complete", &self.inner.outcome.lock().is_some())
            .finish()
    }
}

impl<T: Clone> Default for Promise<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Promise<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                outcome: Mutex::new(None),
                ready: Condvar::new(),
            }),
        }
    }

    /// Store the outcome and wake all waiters. Returns false if the promise
    /// was already complete, in which case `outcome` is dropped.
    pub fn complete(&self, outcome: Outcome<T>) -> bool {
        let mut slot = self.inner.outcome.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(outcome);
        drop(slot);
        self.inner.ready.notify_all();
        true
    }

    pub fn is_complete(&self) -> bool {
        self.inner.outcome.lock().is_some()
    }

    /// The outcome if already available.
    pub fn try_get(&self) -> Option<Outcome<T>> {
        self.inner.outcome.lock().clone()
    }

    /// Block until the outcome is available.
    pub fn wait(&self) -> Outcome<T> {
        let mut slot = self.inner.outcome.lock();
        loop {
            if let Some(outcome) = slot.as_ref() {
                return outcome.clone();
            }
            self.inner.ready.wait(&mut slot);
        }
    }

    /// Block for at most `timeout`. `None` if still pending.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<Outcome<T>> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.inner.outcome.lock();
        while slot.is_none() {
            if self.inner.ready.wait_until(&mut slot, deadline).timed_out() {
                break;
            }
        }
        slot.clone()
    }

    /// Whether both promises share one completion cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn first_completion_wins() {
        let promise = Promise::new();
        assert!(promise.complete(Ok(1)));
        assert!(!promise.complete(Ok(2)));
        assert_eq!(promise.try_get(), Some(Ok(1)));
    }

    #[test]
    fn all_clones_see_the_outcome() {
        let promise: Promise<u32> = Promise::new();
        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let p = promise.clone();
                thread::spawn(move || p.wait())
            })
            .collect();
        promise.complete(Err(RequestError::Cancelled));
        for waiter in waiters {
            assert_eq!(waiter.join().unwrap(), Err(RequestError::Cancelled));
        }
    }

    #[test]
    fn wait_timeout_returns_none_while_pending() {
        let promise: Promise<u32> = Promise::new();
        assert_eq!(promise.wait_timeout(Duration::from_millis(5)), None);
        assert!(!promise.is_complete());
        promise.complete(Ok(7));
        assert_eq!(promise.wait_timeout(Duration::from_millis(5)), Some(Ok(7)));
    }

    #[test]
    fn ptr_eq_distinguishes_cells() {
        let a: Promise<u8> = Promise::new();
        let b = a.clone();
        let c = Promise::new();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}
