// Worker pool and job execution.
//
// `Shared` is the state every worker and the owning context hold through an
// `Arc`: the world, the edge-type registry, the two job queues and the
// completion queue. Workers are plain named threads running `worker_loop`.
//
// Queue discipline: a worker always drains the navmesh queue before the
// path queue, and blocks on both for at most `idle_wait` before rechecking
// the shutdown token. A path job whose navmesh is still being built waits
// in short slices and runs queued navmesh builds itself in between, so a
// pool where every worker holds a waiting path job still makes progress.
//
// Every job runs under `catch_unwind`. A panic fails that job's promise and
// the worker moves on to the next job.

use crate::config::RuntimeConfig;
use crate::error::RequestError;
use crate::instance::{BuildTicket, Instance, NavMeshPromise, NavMeshState, PathPromise};
use crate::promise::Outcome;
use crossbeam_channel::{Receiver, Sender, select};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use wayfarer_nav::{
    AdjacencyMode, CancelSignal, CancelToken, EdgeTypeRegistry, Heuristic, NavMesh, NavMeshParams, PathResult,
    TilePoint, TileWorld, plan_path,
};

/// A caller callback queued for `dispatch_completions`.
pub(crate) type Completion = Box<dyn FnOnce() + Send>;

/// Receives the path (or `None`) once a query succeeds.
pub type PathCallback = Box<dyn FnOnce(Option<PathResult>) + Send>;

pub(crate) struct NavJob {
    instance: Arc<Instance>,
    seq: u64,
    params: NavMeshParams,
    promise: NavMeshPromise,
}

pub(crate) struct PathJob {
    instance: Arc<Instance>,
    starts: Vec<TilePoint>,
    promise: PathPromise,
    on_complete: PathCallback,
}

pub(crate) struct Shared {
    world: Arc<dyn TileWorld>,
    registry: Arc<EdgeTypeRegistry>,
    config: RuntimeConfig,
    shutdown: CancelToken,
    nav_tx: Sender<NavJob>,
    nav_rx: Receiver<NavJob>,
    path_tx: Sender<PathJob>,
    path_rx: Receiver<PathJob>,
    completions: Sender<Completion>,
}

impl Shared {
    pub fn new(
        world: Arc<dyn TileWorld>,
        registry: Arc<EdgeTypeRegistry>,
        config: RuntimeConfig,
        completions: Sender<Completion>,
    ) -> Self {
        let (nav_tx, nav_rx) = crossbeam_channel::unbounded();
        let (path_tx, path_rx) = crossbeam_channel::unbounded();
        Self {
            world,
            registry,
            config,
            shutdown: CancelToken::new(),
            nav_tx,
            nav_rx,
            path_tx,
            path_rx,
            completions,
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn shutdown_token(&self) -> &CancelToken {
        &self.shutdown
    }

    /// Schedule a navmesh build for `instance`, or join the one in flight
    /// when `force` is false.
    pub fn request_navmesh(&self, instance: &Arc<Instance>, new_center: Option<TilePoint>, force: bool) -> NavMeshPromise {
        match instance.begin_build(force, new_center) {
            BuildTicket::Joined(promise) => promise,
            BuildTicket::Scheduled { seq, params, promise } => {
                tracing::trace!(handle = %instance.handle, seq, force, "navmesh build scheduled");
                let job = NavJob {
                    instance: Arc::clone(instance),
                    seq,
                    params,
                    promise: promise.clone(),
                };
                if let Err(err) = self.nav_tx.send(job) {
                    let job = err.into_inner();
                    let outcome = job.instance.finish_build(job.seq, Err(RequestError::Cancelled), &CancelSignal::never());
                    job.promise.complete(outcome);
                }
                promise
            }
        }
    }

    /// Queue a path query. `None` if one is already in flight.
    pub fn request_path(
        &self,
        instance: &Arc<Instance>,
        starts: Vec<TilePoint>,
        on_complete: PathCallback,
    ) -> Option<PathPromise> {
        let Some(promise) = instance.begin_path() else {
            tracing::trace!(handle = %instance.handle, "path query already in flight; request dropped");
            return None;
        };
        tracing::trace!(handle = %instance.handle, starts = starts.len(), "path query scheduled");
        let job = PathJob {
            instance: Arc::clone(instance),
            starts,
            promise: promise.clone(),
            on_complete,
        };
        if let Err(err) = self.path_tx.send(job) {
            let job = err.into_inner();
            let outcome = job.instance.finish_path(&job.promise, Err(RequestError::Cancelled), &CancelSignal::never());
            job.promise.complete(outcome);
        }
        Some(promise)
    }

    pub fn worker_loop(&self, index: usize) {
        tracing::debug!(worker = index, "worker started");
        let idle = self.config.idle_wait();
        while !self.shutdown.is_cancelled() {
            if let Ok(job) = self.nav_rx.try_recv() {
                self.run_nav(job);
                continue;
            }
            if let Ok(job) = self.path_rx.try_recv() {
                self.run_path(job);
                continue;
            }
            select! {
                recv(self.nav_rx) -> job => {
                    if let Ok(job) = job {
                        self.run_nav(job);
                    }
                }
                recv(self.path_rx) -> job => {
                    if let Ok(job) = job {
                        self.run_path(job);
                    }
                }
                default(idle) => {}
            }
        }
        tracing::debug!(worker = index, "worker stopped");
    }

    /// Resolve every queued job as cancelled. Only called once the workers
    /// have been joined.
    pub fn drain_queues(&self) -> usize {
        let mut drained = 0;
        while let Ok(job) = self.nav_rx.try_recv() {
            let outcome = job.instance.finish_build(job.seq, Err(RequestError::Cancelled), &CancelSignal::never());
            job.promise.complete(outcome);
            drained += 1;
        }
        while let Ok(job) = self.path_rx.try_recv() {
            let outcome = job.instance.finish_path(&job.promise, Err(RequestError::Cancelled), &CancelSignal::never());
            job.promise.complete(outcome);
            drained += 1;
        }
        drained
    }

    fn run_nav(&self, job: NavJob) {
        let NavJob {
            instance,
            seq,
            params,
            promise,
        } = job;
        let signal = instance.signal(&self.shutdown);
        let built = self.build_navmesh(&instance, params, &signal);
        let outcome = instance.finish_build(seq, built, &signal);
        match &outcome {
            Ok(_) => tracing::trace!(handle = %instance.handle, seq, "navmesh build finished"),
            Err(err) => tracing::debug!(handle = %instance.handle, seq, %err, "navmesh build did not complete"),
        }
        promise.complete(outcome);
    }

    fn build_navmesh(
        &self,
        instance: &Instance,
        params: NavMeshParams,
        signal: &CancelSignal,
    ) -> Outcome<Arc<NavMesh>> {
        signal.check()?;
        let mode = if self.config.parallel_adjacency {
            AdjacencyMode::Parallel
        } else {
            AdjacencyMode::Sequential
        };
        let built = panic::catch_unwind(AssertUnwindSafe(|| {
            NavMesh::build_with(&*self.world, &self.registry, params, &instance.navigator, signal, mode)
        }));
        match built {
            Ok(result) => {
                let mesh = result?;
                signal.check()?;
                Ok(Arc::new(mesh))
            }
            Err(payload) => Err(job_panicked("navmesh build", instance, payload)),
        }
    }

    fn run_path(&self, job: PathJob) {
        let PathJob {
            instance,
            starts,
            promise,
            on_complete,
        } = job;
        let signal = instance.signal(&self.shutdown);
        let planned = self.plan(&instance, &starts, &signal);
        let outcome = instance.finish_path(&promise, planned, &signal);
        match &outcome {
            Ok(result) => {
                tracing::trace!(
                    handle = %instance.handle,
                    found = result.is_some(),
                    "path query finished"
                );
                let result = result.clone();
                let callback: Completion = Box::new(move || on_complete(result));
                if self.completions.send(callback).is_err() {
                    tracing::trace!(handle = %instance.handle, "completion queue closed; callback dropped");
                }
            }
            Err(err) => tracing::debug!(handle = %instance.handle, %err, "path query did not complete"),
        }
        promise.complete(outcome);
    }

    fn plan(&self, instance: &Arc<Instance>, starts: &[TilePoint], signal: &CancelSignal) -> Outcome<Option<PathResult>> {
        signal.check()?;
        let mesh = self.await_navmesh(instance, signal)?;
        let heuristic = Heuristic::for_mode(self.config.heuristic, &self.registry, &instance.navigator);
        let select_end = &*instance.navigator.select_end;
        let planned = panic::catch_unwind(AssertUnwindSafe(|| {
            plan_path(&mesh, starts, select_end, heuristic, signal)
        }));
        match planned {
            Ok(result) => {
                let path = result?;
                signal.check()?;
                Ok(path)
            }
            Err(payload) => Err(job_panicked("path query", instance, payload)),
        }
    }

    fn await_navmesh(&self, instance: &Arc<Instance>, signal: &CancelSignal) -> Outcome<Arc<NavMesh>> {
        let promise = match instance.navmesh_state() {
            NavMeshState::Ready(mesh) => return Ok(mesh),
            NavMeshState::Pending(promise) => promise,
            NavMeshState::Missing => self.request_navmesh(instance, None, false),
        };
        let idle = self.config.idle_wait();
        loop {
            signal.check()?;
            if let Some(outcome) = promise.wait_timeout(idle) {
                return outcome;
            }
            if let Ok(job) = self.nav_rx.try_recv() {
                self.run_nav(job);
            }
        }
    }
}

fn job_panicked(what: &str, instance: &Instance, payload: Box<dyn Any + Send>) -> RequestError {
    let message = panic_message(payload.as_ref());
    tracing::error!(handle = %instance.handle, %message, "{what} panicked");
    RequestError::Failed(message)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_messages_are_extracted() {
        let payload = panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static message");
        let payload = panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 42");
        let payload = panic::catch_unwind(|| std::panic::panic_any(7u8)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "unknown panic payload");
    }
}
