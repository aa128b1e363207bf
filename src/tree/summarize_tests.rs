// src/tree/summarize_tests.rs

use super::*;
use crate::assert_float_eq;
use crate::models::{plummer_model, Body, Vec3};
use crate::shared::BodyTable;

fn build_and_summarize(
    bodies: &[Body],
    bodies_per_leaf: usize,
) -> (NodePool, WorkerArena, BodyTable, u32) {
    let table = BodyTable::from_bodies(bodies);
    let pool = NodePool::new(4096, 4096);
    let locks = LockTable::new();
    let mut min = Vec3::splat(1e99);
    let mut max = Vec3::splat(-1e99);
    for b in bodies {
        min = min.min(b.pos);
        max = max.max(b.pos);
    }
    let cube = RootCube::fit(min, max);
    let mut arena = WorkerArena::new(0, 1, &pool, bodies_per_leaf);
    let root = arena.alloc_cell(&pool, IMAX >> 1).unwrap();
    let bc = BuildCtx {
        pool: &pool,
        locks: &locks,
        bodies: &table,
        cube,
        root,
        bodies_per_leaf,
    };
    for i in 0..bodies.len() as u32 {
        load_body(&bc, &mut arena, i).unwrap();
    }
    summarize_worker(&pool, &table, &arena);
    (pool, arena, table, root)
}

#[test]
fn test_root_summary_conserves_mass() {
    let bodies = plummer_model(300, 11);
    let (pool, _arena, _table, root) = build_and_summarize(&bodies, 10);

    let total: f64 = bodies.iter().map(|b| b.mass).sum();
    assert_float_eq(pool.cell(root).summary().mass, total, 1e-12, None);
}

#[test]
fn test_root_summary_matches_center_of_mass() {
    let bodies = plummer_model(300, 11);
    let (pool, _arena, _table, root) = build_and_summarize(&bodies, 10);

    let mut weighted = Vec3::ZERO;
    let mut mass = 0.0;
    for b in &bodies {
        weighted += b.pos * b.mass;
        mass += b.mass;
    }
    let com = weighted / mass;
    let summary = pool.cell(root).summary();
    assert_float_eq(summary.com.x, com.x, 1e-12, None);
    assert_float_eq(summary.com.y, com.y, 1e-12, None);
    assert_float_eq(summary.com.z, com.z, 1e-12, None);
}

#[test]
fn test_root_cost_counts_unit_body_costs() {
    let bodies = plummer_model(150, 5);
    let (pool, _arena, _table, root) = build_and_summarize(&bodies, 10);

    // Fresh bodies carry cost 1, so the root cost is the body count.
    assert_eq!(pool.cell(root).summary().cost, bodies.len() as u64);
}

#[test]
fn test_leaf_cost_sums_member_costs() {
    let bodies = plummer_model(60, 9);
    let (pool, arena, table, _root) = build_and_summarize(&bodies, 10);

    for li in arena.leaves_used() {
        let leaf = pool.leaf(li);
        let expected: u64 = leaf.bodies().iter().map(|&b| table.cost(b) as u64).sum();
        assert_eq!(leaf.summary().cost, expected);
    }
}

#[test]
fn test_every_arena_node_is_marked_done() {
    let bodies = plummer_model(100, 21);
    let (pool, arena, _table, _root) = build_and_summarize(&bodies, 10);

    for li in arena.leaves_used() {
        pool.leaf(li).wait_done();
    }
    for ci in arena.cells_used() {
        pool.cell(ci).wait_done();
    }
}
