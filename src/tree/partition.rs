// src/tree/partition.rs
//
// Cost-based body assignment. Worker i owns the half-open slice
// [C*i/P, C*(i+1)/P) of the total tree cost C; a deterministic traversal
// of the tree accumulates a running cost and hands a body to the worker
// whose slice contains the body's prefix cost. Subtrees wholly outside the
// slice are skipped by their aggregate cost without being visited.

use crate::errors::SimError;
use crate::shared::BodyTable;
use crate::tree::{NodeHandle, NodePool, NSUB};

/// Octant visiting order per traversal orientation. Each row is a
/// permutation of the eight octants; successive octants in a row are
/// spatially adjacent, which keeps a worker's bodies clustered.
pub const CHILD_SEQUENCE: [[usize; NSUB]; NSUB] = [
    [0, 1, 3, 2, 6, 7, 5, 4],
    [1, 0, 2, 3, 7, 6, 4, 5],
    [2, 3, 1, 0, 4, 5, 7, 6],
    [3, 2, 0, 1, 5, 4, 6, 7],
    [4, 5, 7, 6, 2, 3, 1, 0],
    [5, 4, 6, 7, 3, 2, 0, 1],
    [6, 7, 5, 4, 0, 1, 3, 2],
    [7, 6, 4, 5, 1, 0, 2, 3],
];

/// Orientation handed to the child visited at each position of
/// [`CHILD_SEQUENCE`], rotating the curve to keep adjacency across levels.
pub const DIRECTION_SEQUENCE: [[usize; NSUB]; NSUB] = [
    [1, 3, 2, 6, 7, 5, 4, 0],
    [0, 2, 3, 7, 6, 4, 5, 1],
    [3, 1, 0, 4, 5, 7, 6, 2],
    [2, 0, 1, 5, 4, 6, 7, 3],
    [5, 7, 6, 2, 3, 1, 0, 4],
    [4, 6, 7, 3, 2, 0, 1, 5],
    [7, 5, 4, 0, 1, 3, 2, 6],
    [6, 4, 5, 1, 0, 2, 3, 7],
];

/// The cost slice `[min, max)` of worker `id` out of `nproc`, in exact
/// integer arithmetic.
pub fn cost_interval(total: u64, id: usize, nproc: usize) -> (u64, u64) {
    let lo = (total as u128 * id as u128 / nproc as u128) as u64;
    let hi = (total as u128 * (id + 1) as u128 / nproc as u128) as u64;
    (lo, hi)
}

struct PartitionWalk<'a> {
    pool: &'a NodePool,
    bodies: &'a BodyTable,
    min_work: u64,
    max_work: u64,
    last: bool,
    limit: usize,
    worker: usize,
}

/// Collects the bodies whose prefix cost falls inside the worker's slice.
///
/// Every worker traverses the same tree in the same order, so the
/// concatenation of all workers' lists is the full body set, each body
/// exactly once. The last worker's slice is closed above so rounding can
/// never orphan the final body.
///
/// # Errors
///
/// Returns an error if the worker's share exceeds `limit` bodies.
#[allow(clippy::too_many_arguments)]
pub fn find_my_bodies(
    pool: &NodePool,
    bodies: &BodyTable,
    root: NodeHandle,
    min_work: u64,
    max_work: u64,
    last: bool,
    limit: usize,
    worker: usize,
) -> Result<Vec<u32>, SimError> {
    let walk = PartitionWalk { pool, bodies, min_work, max_work, last, limit, worker };
    let mut out = Vec::new();
    let mut work = 0u64;
    visit(&walk, root, &mut work, 0, &mut out)?;
    Ok(out)
}

fn visit(
    walk: &PartitionWalk,
    handle: NodeHandle,
    work: &mut u64,
    direction: usize,
    out: &mut Vec<u32>,
) -> Result<(), SimError> {
    let cost = walk.pool.summary(handle).cost;
    if *work + cost <= walk.min_work {
        // Entirely below the slice; account for it and move on.
        *work += cost;
        return Ok(());
    }
    if !walk.last && *work >= walk.max_work {
        return Ok(());
    }

    match handle {
        NodeHandle::Leaf(l) => {
            for &b in walk.pool.leaf(l).bodies() {
                if *work >= walk.min_work && (walk.last || *work < walk.max_work) {
                    if out.len() == walk.limit {
                        return Err(SimError::BodyListOverflow {
                            worker: walk.worker,
                            capacity: walk.limit,
                        });
                    }
                    out.push(b);
                }
                *work += walk.bodies.cost(b) as u64;
            }
        }
        NodeHandle::Cell(c) => {
            let cell = walk.pool.cell(c);
            for i in 0..NSUB {
                let si = CHILD_SEQUENCE[direction][i];
                if let Some(child) = cell.child(si) {
                    visit(walk, child, work, DIRECTION_SEQUENCE[direction][i], out)?;
                }
            }
        }
    }
    Ok(())
}
