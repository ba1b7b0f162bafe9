// Per-handle state: one navigator, its navmesh track and its path track.
//
// The navmesh track numbers every scheduled build. Only the build whose
// number is still `in_flight` when it finishes may install its mesh, so a
// forced rebuild supersedes whatever was running before it. A superseded
// build still completes its own promise.
//
// The path track is a single slot: present while a path query is queued or
// running, cleared by the worker that finishes it.

use crate::error::RequestError;
use crate::handle::Handle;
use crate::promise::{Outcome, Promise};
use parking_lot::Mutex;
use std::sync::Arc;
use wayfarer_nav::{CancelSignal, CancelToken, NavMesh, NavMeshParams, NavigatorParams, PathResult, TilePoint};

pub(crate) type NavMeshPromise = Promise<Arc<NavMesh>>;
pub(crate) type PathPromise = Promise<Option<PathResult>>;

#[derive(Default)]
struct NavMeshTrack {
    installed: Option<Arc<NavMesh>>,
    in_flight: Option<(u64, NavMeshPromise)>,
    next_seq: u64,
}

/// Result of asking an instance for a navmesh build.
pub(crate) enum BuildTicket {
    /// A build is already scheduled or running; share its outcome.
    Joined(NavMeshPromise),
    /// A new build was scheduled and must be submitted.
    Scheduled {
        seq: u64,
        params: NavMeshParams,
        promise: NavMeshPromise,
    },
}

/// What a path job should wait on before planning.
pub(crate) enum NavMeshState {
    Ready(Arc<NavMesh>),
    Pending(NavMeshPromise),
    Missing,
}

pub(crate) struct Instance {
    pub handle: Handle,
    pub navigator: NavigatorParams,
    pub cancel: CancelToken,
    params: Mutex<NavMeshParams>,
    navmesh: Mutex<NavMeshTrack>,
    path: Mutex<Option<PathPromise>>,
}

impl Instance {
    pub fn new(handle: Handle, params: NavMeshParams, navigator: NavigatorParams) -> Self {
        Self {
            handle,
            navigator,
            cancel: CancelToken::new(),
            params: Mutex::new(params),
            navmesh: Mutex::new(NavMeshTrack::default()),
            path: Mutex::new(None),
        }
    }

    /// Cancellation for jobs on this instance: the context-wide token plus
    /// the instance's own.
    pub fn signal(&self, shutdown: &CancelToken) -> CancelSignal {
        CancelSignal::linked(shutdown.clone(), self.cancel.clone())
    }

    pub fn begin_build(&self, force: bool, new_center: Option<TilePoint>) -> BuildTicket {
        let mut track = self.navmesh.lock();
        if !force {
            if let Some((_, promise)) = &track.in_flight {
                return BuildTicket::Joined(promise.clone());
            }
        }
        let params = {
            let mut params = self.params.lock();
            if let Some(center) = new_center {
                *params = params.recentered(center);
            }
            params.clone()
        };
        let seq = track.next_seq;
        track.next_seq += 1;
        let promise = Promise::new();
        track.in_flight = Some((seq, promise.clone()));
        BuildTicket::Scheduled { seq, params, promise }
    }

    /// Record the end of build `seq` and decide what its promise resolves
    /// to. Decided under the track lock, so a cancel that lands before this
    /// call always wins over a finished build.
    pub fn finish_build(
        &self,
        seq: u64,
        outcome: Outcome<Arc<NavMesh>>,
        signal: &CancelSignal,
    ) -> Outcome<Arc<NavMesh>> {
        let mut track = self.navmesh.lock();
        let outcome = if signal.is_cancelled() { Err(RequestError::Cancelled) } else { outcome };
        let newest = track.in_flight.as_ref().is_some_and(|(s, _)| *s == seq);
        if newest {
            track.in_flight = None;
            if let Ok(mesh) = &outcome {
                track.installed = Some(Arc::clone(mesh));
                tracing::trace!(handle = %self.handle, seq, "navmesh installed");
            }
        }
        outcome
    }

    pub fn navmesh_state(&self) -> NavMeshState {
        let track = self.navmesh.lock();
        match (&track.in_flight, &track.installed) {
            (Some((_, promise)), _) => NavMeshState::Pending(promise.clone()),
            (None, Some(mesh)) => NavMeshState::Ready(Arc::clone(mesh)),
            (None, None) => NavMeshState::Missing,
        }
    }

    pub fn installed(&self) -> Option<Arc<NavMesh>> {
        self.navmesh.lock().installed.clone()
    }

    pub fn is_valid_node(&self, tile: TilePoint) -> bool {
        self.navmesh
            .lock()
            .installed
            .as_ref()
            .is_some_and(|mesh| mesh.is_valid_node(tile))
    }

    /// Claim the path slot. `None` if a query is already in flight.
    pub fn begin_path(&self) -> Option<PathPromise> {
        let mut slot = self.path.lock();
        if slot.is_some() {
            return None;
        }
        let promise = Promise::new();
        *slot = Some(promise.clone());
        Some(promise)
    }

    /// Release the path slot if it still holds `promise`, and decide the
    /// query's final outcome under the slot lock.
    pub fn finish_path(
        &self,
        promise: &PathPromise,
        outcome: Outcome<Option<PathResult>>,
        signal: &CancelSignal,
    ) -> Outcome<Option<PathResult>> {
        let mut slot = self.path.lock();
        if slot.as_ref().is_some_and(|p| p.ptr_eq(promise)) {
            *slot = None;
        }
        if signal.is_cancelled() { Err(RequestError::Cancelled) } else { outcome }
    }

    pub fn is_pathfinding(&self) -> bool {
        self.path.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_nav::{EdgeTypeRegistry, NavigatorConfig, TileGrid};

    fn instance() -> Instance {
        Instance::new(
            Handle::INVALID,
            NavMeshParams::new(TilePoint::new(1, 1), 2),
            NavigatorParams::from_config(&NavigatorConfig::default(), |_| None),
        )
    }

    fn mesh(instance: &Instance, params: NavMeshParams) -> Arc<NavMesh> {
        let grid = TileGrid::from_ascii("....\n....\n####\n");
        Arc::new(
            NavMesh::build(
                &grid,
                &EdgeTypeRegistry::with_builtins(),
                params,
                &instance.navigator,
                &CancelSignal::never(),
            )
            .unwrap(),
        )
    }

    fn scheduled(ticket: BuildTicket) -> (u64, NavMeshParams, NavMeshPromise) {
        match ticket {
            BuildTicket::Scheduled { seq, params, promise } => (seq, params, promise),
            BuildTicket::Joined(_) => panic!("expected a new build"),
        }
    }

    #[test]
    fn unforced_requests_join_the_in_flight_build() {
        let inst = instance();
        let (_, _, first) = scheduled(inst.begin_build(false, None));
        match inst.begin_build(false, None) {
            BuildTicket::Joined(promise) => assert!(promise.ptr_eq(&first)),
            BuildTicket::Scheduled { .. } => panic!("duplicate build scheduled"),
        }
    }

    #[test]
    fn only_the_newest_build_installs() {
        let inst = instance();
        let never = CancelSignal::never();
        let (old_seq, old_params, _) = scheduled(inst.begin_build(false, None));
        let (new_seq, new_params, _) = scheduled(inst.begin_build(true, Some(TilePoint::new(2, 1))));
        assert_eq!(new_params.center, TilePoint::new(2, 1));

        // The superseded build still resolves Ok for its own waiters.
        let old = inst.finish_build(old_seq, Ok(mesh(&inst, old_params)), &never);
        assert!(old.is_ok());
        assert!(matches!(inst.navmesh_state(), NavMeshState::Pending(_)));

        let new = inst.finish_build(new_seq, Ok(mesh(&inst, new_params)), &never);
        assert!(new.is_ok());
        match inst.navmesh_state() {
            NavMeshState::Ready(installed) => assert_eq!(installed.center(), TilePoint::new(2, 1)),
            _ => panic!("mesh not installed"),
        }
    }

    #[test]
    fn cancelled_or_failed_builds_install_nothing() {
        let inst = instance();
        let (seq, _, _) = scheduled(inst.begin_build(false, None));
        let failed = inst.finish_build(seq, Err(RequestError::Failed("boom".into())), &CancelSignal::never());
        assert!(matches!(failed, Err(RequestError::Failed(_))));
        assert!(matches!(inst.navmesh_state(), NavMeshState::Missing));
    }

    #[test]
    fn cancel_before_finish_turns_a_built_mesh_into_cancelled() {
        let inst = instance();
        let (seq, params, _) = scheduled(inst.begin_build(false, None));
        let built = mesh(&inst, params);
        let signal = inst.signal(&CancelToken::new());
        inst.cancel.cancel();
        let outcome = inst.finish_build(seq, Ok(built), &signal);
        assert!(matches!(outcome, Err(RequestError::Cancelled)));
        assert!(inst.installed().is_none());
        assert!(matches!(inst.navmesh_state(), NavMeshState::Missing));
    }

    #[test]
    fn shutdown_before_finish_turns_a_built_mesh_into_cancelled() {
        let inst = instance();
        let shutdown = CancelToken::new();
        let (seq, params, _) = scheduled(inst.begin_build(false, None));
        let built = mesh(&inst, params);
        let signal = inst.signal(&shutdown);
        shutdown.cancel();
        assert!(matches!(inst.finish_build(seq, Ok(built), &signal), Err(RequestError::Cancelled)));
        assert!(inst.installed().is_none());
    }

    #[test]
    fn path_slot_admits_one_query() {
        let inst = instance();
        let never = CancelSignal::never();
        let promise = inst.begin_path().unwrap();
        assert!(inst.is_pathfinding());
        assert!(inst.begin_path().is_none());
        let _ = inst.finish_path(&Promise::new(), Ok(None), &never);
        assert!(inst.is_pathfinding());
        let _ = inst.finish_path(&promise, Ok(None), &never);
        assert!(!inst.is_pathfinding());
        assert!(inst.begin_path().is_some());
    }

    #[test]
    fn cancel_before_finish_turns_a_found_path_into_cancelled() {
        let inst = instance();
        let promise = inst.begin_path().unwrap();
        let signal = inst.signal(&CancelToken::new());
        inst.cancel.cancel();
        let outcome = inst.finish_path(&promise, Ok(None), &signal);
        assert!(matches!(outcome, Err(RequestError::Cancelled)));
        assert!(!inst.is_pathfinding());
    }
}
