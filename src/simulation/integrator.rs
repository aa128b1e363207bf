// src/simulation/integrator.rs
//
// Leapfrog integration. The force phase leaves the new acceleration in the
// body's state; advance kicks the velocity a half step, drifts the
// position a full step and kicks the second half. From the third step
// onward the force phase also applies a second-order correction using the
// change in acceleration across the step.

use crate::models::Vec3;
use crate::shared::BodyTable;

/// Second-order velocity correction, `vel += (acc - acc_old) * dthf`.
/// Applied by the owning worker right after the force walk, from global
/// step 2 onward; the first two steps bootstrap uncorrected.
pub fn kick_correction(bodies: &BodyTable, body: u32, acc_old: Vec3, dthf: f64) {
    let mut s = bodies.state(body);
    s.vel += (s.acc - acc_old) * dthf;
    bodies.set_state(body, s);
}

/// Advances one body a full timestep and returns its new position for the
/// caller's bounds fold.
pub fn advance_body(bodies: &BodyTable, body: u32, dtime: f64, dthf: f64) -> Vec3 {
    let mut p = bodies.pos(body);
    let mut s = bodies.state(body);

    let dvel = s.acc * dthf;
    let vel1 = s.vel + dvel;
    p.pos += vel1 * dtime;
    s.vel = vel1 + dvel;

    bodies.set_pos(body, p);
    bodies.set_state(body, s);
    p.pos
}
