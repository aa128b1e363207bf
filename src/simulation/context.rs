// src/simulation/context.rs

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Barrier, Mutex, PoisonError};

use crate::config::SimConfig;
use crate::errors::SimError;
use crate::models::Vec3;
use crate::shared::{BodyTable, SyncCell};
use crate::tree::{LockTable, NodePool, RootCube};

/// The five barriers every worker passes once per step, in order.
pub struct StepBarriers {
    /// All bodies inserted; the tree shape is final.
    pub tree_built: Barrier,
    /// All node aggregates and costs published.
    pub cost_done: Barrier,
    /// All accelerations and potentials written.
    pub forces_done: Barrier,
    /// All positions advanced and folded into the global bounds.
    pub positions_done: Barrier,
    /// Root cube refit and next root allocated by worker 0.
    pub bounds_reset: Barrier,
}

impl StepBarriers {
    pub fn new(nproc: usize) -> Self {
        StepBarriers {
            tree_built: Barrier::new(nproc),
            cost_done: Barrier::new(nproc),
            forces_done: Barrier::new(nproc),
            positions_done: Barrier::new(nproc),
            bounds_reset: Barrier::new(nproc),
        }
    }
}

/// Running min/max of body positions, merged under a mutex by each worker
/// at the end of its advance phase.
#[derive(Debug, Clone, Copy)]
pub struct BoundsAccum {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundsAccum {
    pub fn sentinel() -> Self {
        BoundsAccum {
            min: Vec3::splat(1e99),
            max: Vec3::splat(-1e99),
        }
    }

    pub fn merge(&mut self, min: Vec3, max: Vec3) {
        self.min = self.min.min(min);
        self.max = self.max.max(max);
    }
}

/// Cooperative abort channel for fatal errors inside the worker pool.
///
/// A worker that fails raises the flag and keeps attending barriers doing
/// no work; every worker checks the flag right after each barrier, so the
/// whole pool drains through the same barrier and no one deadlocks.
pub struct AbortFlag {
    raised: AtomicBool,
    error: Mutex<Option<SimError>>,
}

impl AbortFlag {
    pub fn new() -> Self {
        AbortFlag {
            raised: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    /// Records the first error and raises the flag.
    pub fn raise(&self, e: SimError) {
        let mut slot = self.error.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(e);
        }
        self.raised.store(true, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }

    /// Clears the flag and returns the recorded error, if any.
    pub fn take(&self) -> Option<SimError> {
        let e = self
            .error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.raised.store(false, Ordering::Release);
        e
    }
}

impl Default for AbortFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// All state shared by the worker pool for the lifetime of a simulation.
pub struct SimContext {
    pub config: SimConfig,
    pub bodies: BodyTable,
    pub pool: NodePool,
    pub locks: LockTable,
    pub barriers: StepBarriers,
    pub abort: AbortFlag,
    pub bounds: Mutex<BoundsAccum>,
    /// Interaction totals accumulated across the whole run.
    pub n2b_total: AtomicU64,
    pub nbc_total: AtomicU64,
    pub self_interactions: AtomicU64,
    root: AtomicU32,
    cube: SyncCell<RootCube>,
}

impl SimContext {
    pub fn new(config: SimConfig, bodies: BodyTable, pool: NodePool) -> Self {
        SimContext {
            bodies,
            pool,
            locks: LockTable::new(),
            barriers: StepBarriers::new(config.nproc),
            abort: AbortFlag::new(),
            bounds: Mutex::new(BoundsAccum::sentinel()),
            n2b_total: AtomicU64::new(0),
            nbc_total: AtomicU64::new(0),
            self_interactions: AtomicU64::new(0),
            root: AtomicU32::new(0),
            cube: SyncCell::new(RootCube { rmin: Vec3::ZERO, rsize: 1.0 }),
            config,
        }
    }

    /// The root cube of the current step. Written only by worker 0 in its
    /// exclusive window between the positions and bounds-reset barriers.
    pub fn cube(&self) -> RootCube {
        unsafe { *self.cube.as_ref() }
    }

    pub fn set_cube(&self, cube: RootCube) {
        unsafe {
            *self.cube.as_mut() = cube;
        }
    }

    /// Pool index of the current step's root cell.
    pub fn root_cell(&self) -> u32 {
        self.root.load(Ordering::Relaxed)
    }

    pub fn set_root_cell(&self, root: u32) {
        self.root.store(root, Ordering::Relaxed);
    }
}
