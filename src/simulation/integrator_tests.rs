// src/simulation/integrator_tests.rs

use super::*;
use crate::models::{Body, Vec3};
use crate::shared::BodyTable;

#[test]
fn test_advance_constant_acceleration() {
    let bodies = vec![Body::new(1.0, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0))];
    let table = BodyTable::from_bodies(&bodies);
    let mut s = table.state(0);
    s.acc = Vec3::new(0.0, 2.0, 0.0);
    table.set_state(0, s);

    let dtime = 0.5;
    let pos = advance_body(&table, 0, dtime, 0.5 * dtime);

    // vel1 = (1, 0.5, 0); pos = vel1 * dt; vel = vel1 + dvel
    crate::assert_float_eq(pos.x, 0.5, 1e-12, None);
    crate::assert_float_eq(pos.y, 0.25, 1e-12, None);
    let s = table.state(0);
    crate::assert_float_eq(s.vel.x, 1.0, 1e-12, None);
    crate::assert_float_eq(s.vel.y, 1.0, 1e-12, None);
}

#[test]
fn test_kick_correction_uses_acceleration_delta() {
    let bodies = vec![Body::new(1.0, Vec3::ZERO, Vec3::ZERO)];
    let table = BodyTable::from_bodies(&bodies);
    let mut s = table.state(0);
    s.acc = Vec3::new(3.0, 0.0, 0.0);
    table.set_state(0, s);

    kick_correction(&table, 0, Vec3::new(1.0, 0.0, 0.0), 0.5);
    crate::assert_float_eq(table.state(0).vel.x, 1.0, 1e-12, None);
}
