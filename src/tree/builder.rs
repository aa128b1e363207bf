// src/tree/builder.rs
//
// Concurrent octree construction. Every worker inserts its own bodies by
// descending the shared tree through the atomic child slots; the only
// serialization is a sharded lock table keyed by the parent cell, taken
// when a slot has to change. The protocol is check, lock, re-check: a slot
// observed empty or as a leaf may have been filled or split by another
// worker before the lock was acquired, in which case the descent resumes
// from the fresh observation.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::errors::SimError;
use crate::shared::BodyTable;
use crate::tree::{subindex, NodeHandle, NodePool, RootCube, WorkerArena};

/// Number of lock shards guarding child-slot updates.
pub const NUM_LOCKS: usize = 2048;

/// A fixed table of mutexes shared by all cells; a cell's shard is its
/// pool index modulo the table size.
pub struct LockTable {
    locks: Box<[Mutex<()>]>,
}

impl LockTable {
    pub fn new() -> Self {
        LockTable {
            locks: (0..NUM_LOCKS).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Locks the shard guarding `cell`'s child slots and leaf children.
    pub fn guard(&self, cell: u32) -> MutexGuard<'_, ()> {
        self.locks[cell as usize % NUM_LOCKS]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LockTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the insertion path needs, fixed for one step.
pub struct BuildCtx<'a> {
    pub pool: &'a NodePool,
    pub locks: &'a LockTable,
    pub bodies: &'a BodyTable,
    pub cube: RootCube,
    pub root: u32,
    pub bodies_per_leaf: usize,
}

/// Inserts one body into the tree.
///
/// Descends by testing one coordinate bit per level. An empty slot gets a
/// new leaf; a full leaf above level 0 is split into a cell and the descent
/// continues into it. At level 0 coincident bodies accumulate in an
/// over-full leaf instead of recursing.
///
/// # Errors
///
/// Returns an error if the body lies outside the root cube or the worker's
/// pool slice runs out of cells or leaves.
pub fn load_body(bc: &BuildCtx, arena: &mut WorkerArena, body: u32) -> Result<(), SimError> {
    let pos = bc.bodies.pos(body).pos;
    let iv = bc.cube.int_coords(pos).ok_or(SimError::BodyOutOfBounds {
        worker: arena.id(),
        body: body as usize,
    })?;

    let mut cell = bc.root;
    loop {
        let c = bc.pool.cell(cell);
        let si = subindex(&iv, c.level());
        match c.child(si) {
            None => {
                let guard = bc.locks.guard(cell);
                // Another worker may have filled the slot first.
                if c.child(si).is_none() {
                    let li = arena.alloc_leaf(bc.pool, c.level() >> 1)?;
                    let leaf = bc.pool.leaf(li);
                    leaf.push_body(body);
                    c.set_child(si, NodeHandle::Leaf(li), true);
                    drop(guard);
                    return Ok(());
                }
            }
            Some(NodeHandle::Cell(next)) => {
                cell = next;
            }
            Some(NodeHandle::Leaf(_)) => {
                let guard = bc.locks.guard(cell);
                // The leaf may have been split or replaced before we locked.
                if let Some(NodeHandle::Leaf(li)) = c.child(si) {
                    let leaf = bc.pool.leaf(li);
                    let level = leaf.level();
                    if leaf.body_count() < bc.bodies_per_leaf || level == 0 {
                        leaf.push_body(body);
                        drop(guard);
                        return Ok(());
                    }
                    let nc = subdivide_leaf(bc, arena, li, level)?;
                    c.set_child(si, NodeHandle::Cell(nc), true);
                    drop(guard);
                    cell = nc;
                }
            }
        }
    }
}

/// Splits a full leaf into a cell, redistributing its members one level
/// down. The emptied leaf is reused as the child under the first member's
/// slot. Caller holds the parent's lock shard; the new cell is unpublished
/// until the caller swaps it into the parent slot.
fn subdivide_leaf(
    bc: &BuildCtx,
    arena: &mut WorkerArena,
    li: u32,
    level: u32,
) -> Result<u32, SimError> {
    let nc = arena.alloc_cell(bc.pool, level)?;
    let cell = bc.pool.cell(nc);
    let leaf = bc.pool.leaf(li);

    let members = leaf.take_bodies();
    leaf.set_level(level >> 1);

    let worker = arena.id();
    let coords = |b: u32| {
        bc.cube
            .int_coords(bc.bodies.pos(b).pos)
            .ok_or(SimError::BodyOutOfBounds { worker, body: b as usize })
    };

    // Reuse the emptied leaf for the first member's octant.
    let si0 = subindex(&coords(members[0])?, level);
    cell.set_child(si0, NodeHandle::Leaf(li), false);

    for &b in &members {
        let si = subindex(&coords(b)?, level);
        match cell.child(si) {
            None => {
                let nl = arena.alloc_leaf(bc.pool, level >> 1)?;
                bc.pool.leaf(nl).push_body(b);
                cell.set_child(si, NodeHandle::Leaf(nl), false);
            }
            Some(NodeHandle::Leaf(l)) => {
                bc.pool.leaf(l).push_body(b);
            }
            Some(NodeHandle::Cell(_)) => unreachable!("fresh cell has no cell children"),
        }
    }

    Ok(nc)
}
