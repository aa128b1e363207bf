use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::{Body, Vec3};

/// Mass fraction of the Plummer sphere kept by the radial cutoff.
const MFRAC: f64 = 0.999;

/// Generates a seeded Plummer-model distribution of `nbody` equal-mass
/// particles, arranged as two half-clusters offset by 4 length units and
/// recentered on their common center of mass.
///
/// Radii are drawn by inverting the cumulative mass profile and rejecting
/// the far tail (r > 9); speeds are drawn from the isotropic velocity
/// distribution by von Neumann rejection.
///
/// # Arguments
///
/// * `nbody` - Number of particles to generate.
/// * `seed` - Seed for the random number generator.
///
/// # Examples
///
/// ```
/// use rs_nbody::models::plummer_model;
///
/// let bodies = plummer_model(64, 123);
/// assert_eq!(bodies.len(), 64);
///
/// let total_mass: f64 = bodies.iter().map(|b| b.mass).sum();
/// assert!((total_mass - 1.0).abs() < 1e-12);
/// ```
pub fn plummer_model(nbody: usize, seed: u64) -> Vec<Body> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut bodies = Vec::with_capacity(nbody);

    let rsc = 9.0 * std::f64::consts::PI / 16.0;
    let vsc = (1.0 / rsc).sqrt();
    let mass = 1.0 / nbody as f64;

    let half = nbody / 2 + nbody % 2;
    for _ in 0..half {
        let mut r = radius_from_mass_profile(&mut rng);
        while r > 9.0 {
            r = radius_from_mass_profile(&mut rng);
        }
        let pos = pick_shell(&mut rng, rsc * r);

        // von Neumann sampling of the speed distribution q^2 (1 - q^2)^3.5
        let mut x: f64 = rng.random_range(0.0..1.0);
        let mut y = rng.random_range(0.0..0.1);
        while y > x * x * (1.0 - x * x).powf(3.5) {
            x = rng.random_range(0.0..1.0);
            y = rng.random_range(0.0..0.1);
        }
        let v = std::f64::consts::SQRT_2 * x / (1.0 + r * r).powf(0.25);
        let vel = pick_shell(&mut rng, vsc * v);

        bodies.push(Body::new(mass, pos, vel));
    }

    // Mirror the first half into a second cluster offset along each axis.
    let offset = Vec3::splat(4.0);
    for i in 0..nbody - half {
        let twin = bodies[i];
        bodies.push(Body::new(mass, twin.pos + offset, twin.vel));
    }

    // Recenter on the center of mass in both position and velocity.
    let mut cmr = Vec3::ZERO;
    let mut cmv = Vec3::ZERO;
    for b in &bodies {
        cmr += b.pos;
        cmv += b.vel;
    }
    cmr = cmr / nbody as f64;
    cmv = cmv / nbody as f64;
    for b in &mut bodies {
        b.pos -= cmr;
        b.vel -= cmv;
    }

    bodies
}

/// Radius at a uniformly random enclosed-mass fraction below `MFRAC`.
fn radius_from_mass_profile(rng: &mut StdRng) -> f64 {
    let m = rng.random_range(0.0..MFRAC);
    1.0 / (m.powf(-2.0 / 3.0) - 1.0).sqrt()
}

/// Picks a uniformly random point on a sphere of radius `rad`.
fn pick_shell(rng: &mut StdRng, rad: f64) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
            rng.random_range(-1.0..1.0),
        );
        let rsq = v.length_squared();
        if rsq <= 1.0 && rsq > 0.0 {
            return v * (rad / rsq.sqrt());
        }
    }
}
