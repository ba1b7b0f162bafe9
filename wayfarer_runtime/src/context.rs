// The owning entry point of the runtime.
//
// A `PathfindingContext` owns the worker pool, the handle table and the
// completion queue. Every public call validates its handle against the
// table under a read lock and hands work to the pool; nothing here blocks
// on a job except `shutdown`, which joins the workers.
//
// Shutdown order matters:
// 1. fire the shared cancel token so running jobs stop at their next check;
// 2. mark the table closed under the write lock, so no new job can be
//    queued once this returns;
// 3. join the workers;
// 4. resolve every still-queued job as cancelled;
// 5. drop every instance.
// Callbacks already on the completion queue are left for the caller's next
// `dispatch_completions`.

use crate::config::RuntimeConfig;
use crate::error::PathfindingError;
use crate::handle::{Handle, HandleArena};
use crate::instance::Instance;
use crate::processor::{Completion, PathCallback, Shared};
use crate::promise::Promise;
use crossbeam_channel::Receiver;
use parking_lot::{Mutex, RwLock};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use wayfarer_nav::{EdgeTypeRegistry, NavMesh, NavMeshParams, NavigatorParams, PathResult, TilePoint, TileWorld};

struct InstanceTable {
    arena: HandleArena<Arc<Instance>>,
    closed: bool,
}

pub struct PathfindingContext {
    shared: Arc<Shared>,
    table: RwLock<InstanceTable>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    completions: Receiver<Completion>,
}

impl PathfindingContext {
    /// Start a context over `world` with its own worker pool.
    pub fn new(
        world: Arc<dyn TileWorld>,
        registry: Arc<EdgeTypeRegistry>,
        config: RuntimeConfig,
    ) -> io::Result<Self> {
        let worker_count = config.resolved_worker_count();
        let max_instances = config.max_instances;
        let (completions_tx, completions) = crossbeam_channel::unbounded();
        let shared = Arc::new(Shared::new(world, registry, config, completions_tx));

        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("wayfarer-worker-{index}"))
                .spawn(move || worker_shared.worker_loop(index));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(err) => {
                    shared.shutdown_token().cancel();
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(err);
                }
            }
        }
        tracing::info!(workers = worker_count, max_instances, "pathfinding context started");

        Ok(Self {
            shared,
            table: RwLock::new(InstanceTable {
                arena: HandleArena::with_capacity(max_instances),
                closed: false,
            }),
            workers: Mutex::new(workers),
            completions,
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        self.shared.config()
    }

    /// Register a navigator and schedule its first navmesh build.
    pub fn create_instance(
        &self,
        params: NavMeshParams,
        navigator: NavigatorParams,
    ) -> Result<Handle, PathfindingError> {
        let mut table = self.table.write();
        if table.closed {
            return Err(PathfindingError::ShutDown);
        }
        let max = table.arena.capacity();
        let mut created = None;
        let handle = table
            .arena
            .insert_with(|handle| {
                let instance = Arc::new(Instance::new(handle, params, navigator));
                created = Some(Arc::clone(&instance));
                instance
            })
            .ok_or(PathfindingError::InstancePoolExhausted { max })?;
        if let Some(instance) = created {
            self.shared.request_navmesh(&instance, None, false);
        }
        tracing::trace!(%handle, "instance created");
        Ok(handle)
    }

    /// Ask for a navmesh. With `new_center` the region moves there and a
    /// fresh build always starts; without it, an in-flight build is shared.
    pub fn recalculate_navmesh(
        &self,
        handle: Handle,
        new_center: Option<TilePoint>,
    ) -> Result<Promise<Arc<NavMesh>>, PathfindingError> {
        self.with_instance(handle, |instance| {
            self.shared
                .request_navmesh(instance, new_center, new_center.is_some())
        })
    }

    /// Queue a path query from the first usable tile in `starts`.
    ///
    /// `Ok(None)` when a query for this handle is already in flight; the
    /// request is dropped. `on_complete` runs from `dispatch_completions`
    /// once the query succeeds, with `None` when no path exists. It is not
    /// run if the query is cancelled or fails.
    pub fn recalculate_path(
        &self,
        handle: Handle,
        starts: Vec<TilePoint>,
        on_complete: impl FnOnce(Option<PathResult>) + Send + 'static,
    ) -> Result<Option<Promise<Option<PathResult>>>, PathfindingError> {
        self.with_instance(handle, |instance| {
            if starts.is_empty() {
                return Err(PathfindingError::EmptyStarts);
            }
            let callback: PathCallback = Box::new(on_complete);
            Ok(self.shared.request_path(instance, starts, callback))
        })?
    }

    pub fn is_pathfinding(&self, handle: Handle) -> Result<bool, PathfindingError> {
        self.with_instance(handle, |instance| instance.is_pathfinding())
    }

    /// Whether `tile` is a node of the installed navmesh. False until the
    /// first build has been installed.
    pub fn is_valid_node(&self, handle: Handle, tile: TilePoint) -> Result<bool, PathfindingError> {
        self.with_instance(handle, |instance| instance.is_valid_node(tile))
    }

    /// The installed navmesh, for inspection and debug drawing.
    pub fn navmesh(&self, handle: Handle) -> Result<Option<Arc<NavMesh>>, PathfindingError> {
        self.with_instance(handle, |instance| instance.installed())
    }

    /// Retire `handle` and cancel its pending work. Unknown, stale and
    /// already-disposed handles are ignored.
    pub fn dispose_instance(&self, handle: Handle) {
        let removed = self.table.write().arena.remove(handle);
        if let Some(instance) = removed {
            instance.cancel.cancel();
            tracing::trace!(%handle, "instance disposed");
        }
    }

    pub fn live_instances(&self) -> usize {
        self.table.read().arena.len()
    }

    /// Run queued path callbacks on the calling thread. Returns how many
    /// ran.
    pub fn dispatch_completions(&self) -> usize {
        let mut ran = 0;
        while let Ok(callback) = self.completions.try_recv() {
            callback();
            ran += 1;
        }
        ran
    }

    pub fn is_shut_down(&self) -> bool {
        self.table.read().closed
    }

    /// Cancel all work, stop the workers and resolve every pending promise.
    /// Safe to call more than once.
    pub fn shutdown(&self) {
        self.shared.shutdown_token().cancel();
        {
            let mut table = self.table.write();
            if table.closed {
                return;
            }
            table.closed = true;
        }

        let workers: Vec<JoinHandle<()>> = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if worker.join().is_err() {
                tracing::warn!("worker thread panicked outside a job");
            }
        }
        let drained = self.shared.drain_queues();

        let instances = self.table.write().arena.drain();
        for instance in &instances {
            instance.cancel.cancel();
        }
        tracing::info!(drained, disposed = instances.len(), "pathfinding context shut down");
    }

    fn with_instance<R>(
        &self,
        handle: Handle,
        f: impl FnOnce(&Arc<Instance>) -> R,
    ) -> Result<R, PathfindingError> {
        let table = self.table.read();
        if table.closed {
            return Err(PathfindingError::ShutDown);
        }
        let instance = table
            .arena
            .get(handle)
            .ok_or(PathfindingError::InvalidHandle(handle))?;
        Ok(f(instance))
    }
}

impl Drop for PathfindingContext {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PathfindingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.table.read();
        f.debug_struct("PathfindingContext")
            .field("live_instances", &table.arena.len())
            .field("closed", &table.closed)
            .field("workers", &self.workers.lock().len())
            .finish()
    }
}
