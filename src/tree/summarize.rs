// src/tree/summarize.rs

use crate::models::Vec3;
use crate::shared::BodyTable;
use crate::tree::{NodeHandle, NodePool, NodeSummary, WorkerArena, NSUB};

/// Bottom-up pass computing mass, center of mass and work cost for every
/// node this worker created.
///
/// Leaves first, then cells in reverse creation order. A cell's cell
/// children are always created after the cell itself, so the reverse order
/// visits them first; leaf children are finished by the leaf pass. Children
/// owned by other workers are awaited through their done flags, which is
/// free of deadlock because waits only ever point deeper into the tree.
///
/// Runs between the tree-built and cost-done barriers.
pub fn summarize_worker(pool: &NodePool, bodies: &BodyTable, arena: &WorkerArena) {
    for li in arena.leaves_used() {
        let leaf = pool.leaf(li);
        let mut sum = NodeSummary::default();
        let mut weighted = Vec3::ZERO;
        for &b in leaf.bodies() {
            let p = bodies.pos(b);
            sum.mass += p.mass;
            weighted += p.pos * p.mass;
            sum.cost += bodies.cost(b) as u64;
        }
        debug_assert!(sum.mass > 0.0, "leaves are never empty");
        sum.com = weighted / sum.mass;
        leaf.set_summary(sum);
        leaf.mark_done();
    }

    for ci in arena.cells_used().rev() {
        let cell = pool.cell(ci);
        let mut sum = NodeSummary::default();
        let mut weighted = Vec3::ZERO;
        for si in 0..NSUB {
            let Some(child) = cell.child(si) else { continue };
            match child {
                NodeHandle::Cell(c) => pool.cell(c).wait_done(),
                NodeHandle::Leaf(l) => pool.leaf(l).wait_done(),
            }
            let cs = pool.summary(child);
            sum.mass += cs.mass;
            weighted += cs.com * cs.mass;
            sum.cost += cs.cost;
        }
        sum.com = weighted / sum.mass;
        cell.set_summary(sum);
        cell.mark_done();
    }
}
