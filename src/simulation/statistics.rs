// src/simulation/statistics.rs

use rayon::prelude::*;

use crate::models::{Body, Vec3};

/// Calculates the total kinetic energy of a set of bodies.
///
/// # Arguments
///
/// * `bodies` - A slice of bodies.
///
/// # Returns
///
/// The sum of `0.5 * m * v^2` over all bodies.
pub fn kinetic_energy(bodies: &[Body]) -> f64 {
    bodies
        .par_iter()
        .map(|b| 0.5 * b.mass * b.vel.length_squared())
        .sum()
}

/// Calculates the total potential energy from the per-body potentials
/// accumulated during the last force evaluation.
///
/// Each pair contributes to both bodies' potentials, so the sum is halved.
pub fn potential_energy(bodies: &[Body]) -> f64 {
    0.5 * bodies.par_iter().map(|b| b.mass * b.phi).sum::<f64>()
}

pub fn total_energy(bodies: &[Body]) -> f64 {
    kinetic_energy(bodies) + potential_energy(bodies)
}

/// Calculates the exact softened potential energy by direct summation.
///
/// This is an O(N^2) reference used to check the tree-walk potentials.
pub fn direct_potential_energy(bodies: &[Body], epssq: f64) -> f64 {
    bodies
        .par_iter()
        .enumerate()
        .map(|(i, a)| {
            let mut phi = 0.0;
            for b in &bodies[i + 1..] {
                let drsq = (b.pos - a.pos).length_squared() + epssq;
                phi -= a.mass * b.mass / drsq.sqrt();
            }
            phi
        })
        .sum()
}

/// Calculates the center of mass of a set of bodies.
///
/// # Returns
///
/// `Vec3::ZERO` when the slice is empty.
pub fn center_of_mass(bodies: &[Body]) -> Vec3 {
    let (weighted, mass) = bodies
        .par_iter()
        .map(|b| (b.pos * b.mass, b.mass))
        .reduce(|| (Vec3::ZERO, 0.0), |a, b| (a.0 + b.0, a.1 + b.1));
    if mass > 0.0 {
        weighted / mass
    } else {
        Vec3::ZERO
    }
}
