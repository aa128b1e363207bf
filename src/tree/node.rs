// src/tree/node.rs
//
// The octree is stored in two pre-allocated pools, one of cells and one of
// leaves. Child links are atomic 32-bit handles so descent never locks:
// a worker initializes a node inside its private pool slice, then publishes
// it with a release store into the parent's child slot.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::errors::SimError;
use crate::models::Vec3;
use crate::shared::SyncCell;

/// Children per cell.
pub const NSUB: usize = 8;

/// Depth of the integer coordinate system; positions map into `[0, IMAX)`
/// per axis and descent tests one coordinate bit per tree level.
pub const IMAX: u32 = 1 << 30;

/// Empty child slot.
pub const NIL: u32 = u32::MAX;

const LEAF_BIT: u32 = 1 << 31;

/// A reference to a node in the pool, packed into 32 bits for the atomic
/// child slots. The high bit distinguishes leaves from cells; `NIL` is
/// reserved for empty slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeHandle {
    Cell(u32),
    Leaf(u32),
}

impl NodeHandle {
    pub fn encode(self) -> u32 {
        match self {
            NodeHandle::Cell(i) => i,
            NodeHandle::Leaf(i) => i | LEAF_BIT,
        }
    }

    pub fn decode(raw: u32) -> Option<NodeHandle> {
        if raw == NIL {
            None
        } else if raw & LEAF_BIT != 0 {
            Some(NodeHandle::Leaf(raw & !LEAF_BIT))
        } else {
            Some(NodeHandle::Cell(raw))
        }
    }
}

/// Aggregates computed bottom-up after the tree is built.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeSummary {
    pub mass: f64,
    pub com: Vec3,
    pub cost: u64,
}

#[derive(Debug, Default)]
struct CellData {
    level: u32,
    summary: NodeSummary,
}

/// An internal octree node with eight atomic child slots.
pub struct Cell {
    child: [AtomicU32; NSUB],
    done: AtomicBool,
    data: SyncCell<CellData>,
}

impl Cell {
    fn empty() -> Self {
        Cell {
            child: std::array::from_fn(|_| AtomicU32::new(NIL)),
            done: AtomicBool::new(false),
            data: SyncCell::new(CellData::default()),
        }
    }

    /// Reinitializes a freshly allocated cell. The caller owns the slot
    /// exclusively until the cell is published into a child slot.
    pub fn reset(&self, level: u32) {
        for c in &self.child {
            c.store(NIL, Ordering::Relaxed);
        }
        self.done.store(false, Ordering::Relaxed);
        unsafe {
            let d = self.data.as_mut();
            d.level = level;
            d.summary = NodeSummary::default();
        }
    }

    /// Loads the child handle in slot `si`.
    pub fn child(&self, si: usize) -> Option<NodeHandle> {
        NodeHandle::decode(self.child[si].load(Ordering::Acquire))
    }

    /// Stores a child handle; `publish` releases the node's initialization
    /// to other workers, a plain store is enough before the cell itself is
    /// published.
    pub fn set_child(&self, si: usize, handle: NodeHandle, publish: bool) {
        let order = if publish { Ordering::Release } else { Ordering::Relaxed };
        self.child[si].store(handle.encode(), order);
    }

    /// Subdivision level of this cell in the integer coordinate system.
    /// Immutable after the cell is published.
    pub fn level(&self) -> u32 {
        unsafe { self.data.as_ref().level }
    }

    pub fn summary(&self) -> NodeSummary {
        unsafe { self.data.as_ref().summary }
    }

    /// Owner-only write of the aggregates, sequenced before [`Cell::mark_done`].
    pub fn set_summary(&self, summary: NodeSummary) {
        unsafe {
            self.data.as_mut().summary = summary;
        }
    }

    pub fn mark_done(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// Spins until the owner of this cell has published its aggregates.
    pub fn wait_done(&self) {
        while !self.done.load(Ordering::Acquire) {
            std::hint::spin_loop();
        }
    }
}

#[derive(Debug, Default)]
struct LeafData {
    level: u32,
    bodies: Vec<u32>,
    summary: NodeSummary,
}

/// A terminal octree node holding up to the configured number of bodies.
/// Membership is guarded by the lock shard of the parent cell; a leaf can
/// exceed its capacity only at level 0, where coincident bodies have no
/// deeper level to split into.
pub struct Leaf {
    done: AtomicBool,
    data: SyncCell<LeafData>,
}

impl Leaf {
    fn empty() -> Self {
        Leaf {
            done: AtomicBool::new(false),
            data: SyncCell::new(LeafData::default()),
        }
    }

    /// Reinitializes a freshly allocated leaf. The caller owns the slot
    /// exclusively until the leaf is published into a child slot.
    pub fn reset(&self, level: u32, capacity: usize) {
        self.done.store(false, Ordering::Relaxed);
        unsafe {
            let d = self.data.as_mut();
            d.level = level;
            d.bodies.clear();
            d.bodies.reserve(capacity);
            d.summary = NodeSummary::default();
        }
    }

    pub fn level(&self) -> u32 {
        unsafe { self.data.as_ref().level }
    }

    /// Demotes the reused leaf one level during subdivision. Caller must
    /// hold the parent's lock shard.
    pub fn set_level(&self, level: u32) {
        unsafe {
            self.data.as_mut().level = level;
        }
    }

    pub fn body_count(&self) -> usize {
        unsafe { self.data.as_ref().bodies.len() }
    }

    /// Member body indices. Stable outside the build phase; during the
    /// build the parent's lock shard must be held.
    pub fn bodies(&self) -> &[u32] {
        unsafe { &self.data.as_ref().bodies }
    }

    /// Appends a body. Caller must hold the parent's lock shard or own the
    /// unpublished leaf.
    pub fn push_body(&self, body: u32) {
        unsafe {
            self.data.as_mut().bodies.push(body);
        }
    }

    /// Removes and returns all members during subdivision. Caller must hold
    /// the parent's lock shard.
    pub fn take_bodies(&self) -> Vec<u32> {
        unsafe { std::mem::take(&mut self.data.as_mut().bodies) }
    }

    pub fn summary(&self) -> NodeSummary {
        unsafe { self.data.as_ref().summary }
    }

    pub fn set_summary(&self, summary: NodeSummary) {
        unsafe {
            self.data.as_mut().summary = summary;
        }
    }

    pub fn mark_done(&self) {
        self.done.store(true, Ordering::Release);
    }

    pub fn wait_done(&self) {
        while !self.done.load(Ordering::Acquire) {
            std::hint::spin_loop();
        }
    }
}

/// The shared cell and leaf pools, sized once per simulation.
pub struct NodePool {
    cells: Box<[Cell]>,
    leaves: Box<[Leaf]>,
}

impl NodePool {
    pub fn new(maxcell: usize, maxleaf: usize) -> Self {
        NodePool {
            cells: (0..maxcell).map(|_| Cell::empty()).collect(),
            leaves: (0..maxleaf).map(|_| Leaf::empty()).collect(),
        }
    }

    pub fn cell(&self, i: u32) -> &Cell {
        &self.cells[i as usize]
    }

    pub fn leaf(&self, i: u32) -> &Leaf {
        &self.leaves[i as usize]
    }

    pub fn cell_capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn leaf_capacity(&self) -> usize {
        self.leaves.len()
    }

    /// Summary of any node through its handle.
    pub fn summary(&self, handle: NodeHandle) -> NodeSummary {
        match handle {
            NodeHandle::Cell(c) => self.cell(c).summary(),
            NodeHandle::Leaf(l) => self.leaf(l).summary(),
        }
    }
}

/// A worker's private slice of the node pool. Allocation is a bump index;
/// `lo..next` doubles as the worker's creation-ordered node list for the
/// bottom-up summarize pass.
pub struct WorkerArena {
    id: usize,
    leaf_capacity: usize,
    cell_lo: u32,
    cell_next: u32,
    cell_hi: u32,
    leaf_lo: u32,
    leaf_next: u32,
    leaf_hi: u32,
}

impl WorkerArena {
    pub fn new(id: usize, nproc: usize, pool: &NodePool, leaf_capacity: usize) -> Self {
        let cell_share = pool.cell_capacity() / nproc;
        let leaf_share = pool.leaf_capacity() / nproc;
        let cell_lo = (id * cell_share) as u32;
        let leaf_lo = (id * leaf_share) as u32;
        let cell_hi = if id == nproc - 1 { pool.cell_capacity() } else { (id + 1) * cell_share };
        let leaf_hi = if id == nproc - 1 { pool.leaf_capacity() } else { (id + 1) * leaf_share };
        let (cell_hi, leaf_hi) = (cell_hi as u32, leaf_hi as u32);
        WorkerArena {
            id,
            leaf_capacity,
            cell_lo,
            cell_next: cell_lo,
            cell_hi,
            leaf_lo,
            leaf_next: leaf_lo,
            leaf_hi,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Allocates and reinitializes a cell at the given level.
    pub fn alloc_cell(&mut self, pool: &NodePool, level: u32) -> Result<u32, SimError> {
        if self.cell_next == self.cell_hi {
            return Err(SimError::CellPoolExhausted {
                worker: self.id,
                capacity: (self.cell_hi - self.cell_lo) as usize,
            });
        }
        let i = self.cell_next;
        self.cell_next += 1;
        pool.cell(i).reset(level);
        Ok(i)
    }

    /// Allocates and reinitializes a leaf at the given level.
    pub fn alloc_leaf(&mut self, pool: &NodePool, level: u32) -> Result<u32, SimError> {
        if self.leaf_next == self.leaf_hi {
            return Err(SimError::LeafPoolExhausted {
                worker: self.id,
                capacity: (self.leaf_hi - self.leaf_lo) as usize,
            });
        }
        let i = self.leaf_next;
        self.leaf_next += 1;
        pool.leaf(i).reset(level, self.leaf_capacity);
        Ok(i)
    }

    /// Frees every node this worker created, keeping the slice.
    pub fn reset(&mut self) {
        self.cell_next = self.cell_lo;
        self.leaf_next = self.leaf_lo;
    }

    /// Cells created this step, in creation order.
    pub fn cells_used(&self) -> Range<u32> {
        self.cell_lo..self.cell_next
    }

    /// Leaves created this step, in creation order.
    pub fn leaves_used(&self) -> Range<u32> {
        self.leaf_lo..self.leaf_next
    }
}

/// The cube the root cell spans, refit around the bodies every step.
#[derive(Debug, Clone, Copy)]
pub struct RootCube {
    pub rmin: Vec3,
    pub rsize: f64,
}

impl RootCube {
    /// Fits the cube around an axis-aligned bounding box, with a small
    /// margin so no body lands exactly on a face.
    pub fn fit(min: Vec3, max: Vec3) -> RootCube {
        let mut side = (max - min).max_component();
        if !(side > 0.0) {
            side = 1.0;
        }
        RootCube {
            rmin: min - Vec3::splat(side / 100000.0),
            rsize: 1.00002 * side,
        }
    }

    /// Maps a position into integer coordinates, `None` if it lies outside
    /// the cube.
    pub fn int_coords(&self, p: Vec3) -> Option<[u32; 3]> {
        let scale = IMAX as f64 / self.rsize;
        let mut iv = [0u32; 3];
        for (k, comp) in [p.x - self.rmin.x, p.y - self.rmin.y, p.z - self.rmin.z]
            .into_iter()
            .enumerate()
        {
            let xs = (comp * scale).floor();
            if xs < 0.0 || xs >= IMAX as f64 {
                return None;
            }
            iv[k] = xs as u32;
        }
        Some(iv)
    }
}

/// Child slot of the integer coordinates at a subdivision level: one bit
/// per axis, x highest.
pub fn subindex(iv: &[u32; 3], level: u32) -> usize {
    let mut si = 0;
    if iv[0] & level != 0 {
        si |= 4;
    }
    if iv[1] & level != 0 {
        si |= 2;
    }
    if iv[2] & level != 0 {
        si |= 1;
    }
    si
}
