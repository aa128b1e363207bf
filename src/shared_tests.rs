// src/shared_tests.rs

use crate::models::{Body, Vec3};
use crate::shared::BodyTable;

#[test]
fn test_table_round_trip() {
    let bodies = vec![
        Body::new(1.0, Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.1, 0.2, 0.3)),
        Body::new(2.0, Vec3::new(-1.0, 0.0, 1.0), Vec3::ZERO),
    ];
    let table = BodyTable::from_bodies(&bodies);
    assert_eq!(table.len(), 2);

    let out = table.snapshot();
    assert_eq!(out[0].mass, 1.0);
    assert_eq!(out[0].pos, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(out[1].vel, Vec3::ZERO);
    assert_eq!(out[1].cost, 1);
}

#[test]
fn test_owner_writes_are_visible() {
    let bodies = vec![Body::new(1.0, Vec3::ZERO, Vec3::ZERO)];
    let table = BodyTable::from_bodies(&bodies);

    let mut s = table.state(0);
    s.acc = Vec3::new(0.0, -9.8, 0.0);
    table.set_state(0, s);
    table.set_cost(0, 42);

    assert_eq!(table.state(0).acc.y, -9.8);
    assert_eq!(table.cost(0), 42);
}
