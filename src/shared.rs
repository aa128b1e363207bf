// src/shared.rs
//
// Shared-memory primitives for the worker pool. Bodies are stored in
// structure-of-arrays form and every phase of a step touches a disjoint
// part of the table:
//
//   build      - positions read by all workers, nothing written
//   summarize  - positions and costs read by all workers
//   partition  - costs read by all workers
//   forces     - kinematic state written by the owning worker only
//   advance    - positions, state and costs written by the owning worker only
//
// Phases are separated by barriers, so the unsynchronized reads and the
// owner-only writes below never overlap.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::models::{Body, Vec3};

/// An `UnsafeCell` that may be shared between workers.
///
/// Synchronization is external: either a lock, an atomic publish of the
/// containing node, or the phase barriers of the step loop.
#[derive(Debug)]
pub struct SyncCell<T>(UnsafeCell<T>);

unsafe impl<T: Send> Sync for SyncCell<T> {}

impl<T> SyncCell<T> {
    pub const fn new(value: T) -> Self {
        SyncCell(UnsafeCell::new(value))
    }

    pub fn get(&self) -> *mut T {
        self.0.get()
    }

    /// # Safety
    ///
    /// No worker may hold a mutable reference to the same cell.
    pub unsafe fn as_ref(&self) -> &T {
        &*self.0.get()
    }

    /// # Safety
    ///
    /// The caller must have exclusive access to the cell, either by owning
    /// the containing node or by holding the lock that guards it.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn as_mut(&self) -> &mut T {
        &mut *self.0.get()
    }
}

/// The read-shared half of a body: position and mass.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyPos {
    pub pos: Vec3,
    pub mass: f64,
}

/// The owner-only half of a body: velocity, acceleration and potential.
#[derive(Debug, Clone, Copy, Default)]
pub struct BodyState {
    pub vel: Vec3,
    pub acc: Vec3,
    pub phi: f64,
}

/// Structure-of-arrays storage for every body in the simulation.
///
/// The per-body work cost lives in its own atomic column because it is
/// read by all workers during partitioning but rewritten by the owner.
#[derive(Debug)]
pub struct BodyTable {
    pos: Box<[SyncCell<BodyPos>]>,
    state: Box<[SyncCell<BodyState>]>,
    cost: Box<[AtomicU32]>,
}

impl BodyTable {
    pub fn from_bodies(bodies: &[Body]) -> Self {
        let pos = bodies
            .iter()
            .map(|b| SyncCell::new(BodyPos { pos: b.pos, mass: b.mass }))
            .collect();
        let state = bodies
            .iter()
            .map(|b| SyncCell::new(BodyState { vel: b.vel, acc: b.acc, phi: b.phi }))
            .collect();
        let cost = bodies.iter().map(|b| AtomicU32::new(b.cost.max(1))).collect();
        Self { pos, state, cost }
    }

    pub fn len(&self) -> usize {
        self.pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pos.len() == 0
    }

    /// Position and mass of body `i`. Safe in every phase except while the
    /// owner is advancing positions, which no other phase overlaps.
    pub fn pos(&self, i: u32) -> BodyPos {
        unsafe { *self.pos[i as usize].as_ref() }
    }

    /// Owner-only write of body `i`'s position record.
    pub fn set_pos(&self, i: u32, value: BodyPos) {
        unsafe {
            *self.pos[i as usize].as_mut() = value;
        }
    }

    /// Kinematic state of body `i`. Owner-only outside of setup.
    pub fn state(&self, i: u32) -> BodyState {
        unsafe { *self.state[i as usize].as_ref() }
    }

    /// Owner-only write of body `i`'s kinematic state.
    pub fn set_state(&self, i: u32, value: BodyState) {
        unsafe {
            *self.state[i as usize].as_mut() = value;
        }
    }

    pub fn cost(&self, i: u32) -> u32 {
        self.cost[i as usize].load(Ordering::Relaxed)
    }

    pub fn set_cost(&self, i: u32, value: u32) {
        self.cost[i as usize].store(value, Ordering::Relaxed);
    }

    /// Copies the table back out into plain body records.
    pub fn snapshot(&self) -> Vec<Body> {
        (0..self.len() as u32)
            .map(|i| {
                let p = self.pos(i);
                let s = self.state(i);
                Body {
                    mass: p.mass,
                    pos: p.pos,
                    vel: s.vel,
                    acc: s.acc,
                    phi: s.phi,
                    cost: self.cost(i),
                }
            })
            .collect()
    }
}
