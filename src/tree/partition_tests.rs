// src/tree/partition_tests.rs

use super::*;
use crate::models::{plummer_model, Vec3};
use crate::shared::BodyTable;

fn build_tree(nbody: usize, seed: u64) -> (NodePool, WorkerArena, BodyTable, u32) {
    let bodies = plummer_model(nbody, seed);
    let table = BodyTable::from_bodies(&bodies);
    let pool = NodePool::new(4096, 4096);
    let locks = LockTable::new();
    let mut min = Vec3::splat(1e99);
    let mut max = Vec3::splat(-1e99);
    for b in &bodies {
        min = min.min(b.pos);
        max = max.max(b.pos);
    }
    let cube = RootCube::fit(min, max);
    let mut arena = WorkerArena::new(0, 1, &pool, 10);
    let root = arena.alloc_cell(&pool, IMAX >> 1).unwrap();
    let bc = BuildCtx {
        pool: &pool,
        locks: &locks,
        bodies: &table,
        cube,
        root,
        bodies_per_leaf: 10,
    };
    for i in 0..bodies.len() as u32 {
        load_body(&bc, &mut arena, i).unwrap();
    }
    summarize_worker(&pool, &table, &arena);
    (pool, arena, table, root)
}

fn assert_permutation(row: &[usize; NSUB]) {
    let mut seen = [false; NSUB];
    for &si in row {
        assert!(si < NSUB);
        assert!(!seen[si], "duplicate subindex {} in {:?}", si, row);
        seen[si] = true;
    }
}

#[test]
fn test_child_sequence_rows_are_permutations() {
    for row in &CHILD_SEQUENCE {
        assert_permutation(row);
    }
}

#[test]
fn test_direction_sequence_rows_are_permutations() {
    for row in &DIRECTION_SEQUENCE {
        assert_permutation(row);
    }
}

#[test]
fn test_cost_interval_covers_total_without_gaps() {
    for &total in &[0u64, 1, 7, 64, 1_000_003] {
        for nproc in 1..=5usize {
            let mut prev = 0;
            for id in 0..nproc {
                let (lo, hi) = cost_interval(total, id, nproc);
                assert_eq!(lo, prev);
                assert!(hi >= lo);
                prev = hi;
            }
            assert_eq!(prev, total);
        }
    }
}

#[test]
fn test_partition_assigns_every_body_exactly_once() {
    let nbody = 64;
    let (pool, _arena, table, root) = build_tree(nbody, 17);
    let total = pool.cell(root).summary().cost;

    for nproc in [1usize, 2, 3, 5] {
        let mut counts = vec![0u32; nbody];
        for id in 0..nproc {
            let (lo, hi) = cost_interval(total, id, nproc);
            let mine = find_my_bodies(
                &pool,
                &table,
                NodeHandle::Cell(root),
                lo,
                hi,
                id == nproc - 1,
                nbody,
                id,
            )
            .unwrap();
            for &b in &mine {
                counts[b as usize] += 1;
            }
        }
        assert!(
            counts.iter().all(|&c| c == 1),
            "unbalanced assignment for {} workers: {:?}",
            nproc,
            counts
        );
    }
}

#[test]
fn test_partition_respects_body_list_limit() {
    let (pool, _arena, table, root) = build_tree(64, 17);
    let total = pool.cell(root).summary().cost;

    let err = find_my_bodies(&pool, &table, NodeHandle::Cell(root), 0, total, true, 8, 0)
        .unwrap_err();
    assert_eq!(
        err,
        crate::errors::SimError::BodyListOverflow { worker: 0, capacity: 8 }
    );
}

#[test]
fn test_single_worker_gets_the_whole_tree() {
    let nbody = 48;
    let (pool, _arena, table, root) = build_tree(nbody, 5);
    let total = pool.cell(root).summary().cost;
    let (lo, hi) = cost_interval(total, 0, 1);

    let mut mine = find_my_bodies(&pool, &table, NodeHandle::Cell(root), lo, hi, true, nbody, 0)
        .unwrap();
    mine.sort_unstable();
    let expected: Vec<u32> = (0..nbody as u32).collect();
    assert_eq!(mine, expected);
}
