// src/simulation/engine_tests.rs

use super::*;
use crate::config::SimConfig;
use crate::errors::SimError;
use crate::models::{plummer_model, Body, Vec3};

fn two_body_binary() -> Vec<Body> {
    // Equal masses on a circular orbit of separation 2: the mutual pull
    // 1/4 balances v^2/r with v = 0.5.
    vec![
        Body::new(1.0, Vec3::new(-1.0, 0.0, 0.0), Vec3::new(0.0, -0.5, 0.0)),
        Body::new(1.0, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 0.5, 0.0)),
    ]
}

#[test]
fn test_empty_universe_is_rejected() {
    let err = Simulation::new(Vec::new(), SimConfig::default()).err().unwrap();
    assert_eq!(err, SimError::EmptyUniverse);
}

#[test]
fn test_invalid_body_is_rejected() {
    let bodies = vec![
        Body::new(1.0, Vec3::ZERO, Vec3::ZERO),
        Body::new(1.0, Vec3::new(f64::NAN, 0.0, 0.0), Vec3::ZERO),
    ];
    let err = Simulation::new(bodies, SimConfig::default()).err().unwrap();
    assert_eq!(err, SimError::InvalidBody { index: 1 });
}

#[test]
fn test_zero_steps_is_a_no_op() {
    let mut sim = Simulation::new(two_body_binary(), SimConfig::default()).unwrap();
    let before = sim.bodies();
    let stats = sim.run_steps(0).unwrap();
    assert_eq!(stats.steps, 0);
    assert_eq!(sim.bodies(), before);
}

#[test]
fn test_circular_orbit_conserves_energy() {
    let config = SimConfig {
        dtime: 0.01,
        eps: 0.0,
        tol: 0.0,
        ..SimConfig::default()
    };
    let bodies = two_body_binary();
    let e0 = kinetic_energy(&bodies) + direct_potential_energy(&bodies, 0.0);

    let mut sim = Simulation::new(bodies, config).unwrap();
    sim.run_steps(200).unwrap();

    let after = sim.bodies();
    let e1 = kinetic_energy(&after) + direct_potential_energy(&after, 0.0);
    assert!(
        ((e1 - e0) / e0).abs() < 0.01,
        "energy drifted from {} to {}",
        e0,
        e1
    );

    // The orbit stays near its initial radius.
    let sep = (after[1].pos - after[0].pos).length();
    assert!((sep - 2.0).abs() < 0.1, "separation drifted to {}", sep);
}

#[test]
fn test_softened_pair_first_step() {
    let bodies = vec![
        Body::new(1.0, Vec3::new(-1.0, 0.0, 0.0), Vec3::ZERO),
        Body::new(1.0, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO),
    ];
    let config = SimConfig {
        dtime: 0.01,
        eps: 0.05,
        tol: 1.0,
        ..SimConfig::default()
    };
    let mut sim = Simulation::new(bodies, config).unwrap();
    sim.run_steps(1).unwrap();

    // a = m * d / (d^2 + eps^2)^(3/2), mirrored on the two bodies.
    let drsq = 4.0 + config.epssq();
    let a = 2.0 / (drsq * drsq.sqrt());
    let after = sim.bodies();
    crate::assert_float_eq(after[0].acc.x, a, 1e-12, None);
    crate::assert_float_eq(after[1].acc.x, -a, 1e-12, None);

    // Starting from rest, one step moves each body half a kick-drift in.
    let step = 0.5 * config.dtime * config.dtime * a;
    crate::assert_float_eq(after[0].pos.x, -(1.0 - step), 1e-12, None);
    crate::assert_float_eq(after[1].pos.x, 1.0 - step, 1e-12, None);
    crate::assert_float_eq(after[0].vel.x, a * config.dtime, 1e-12, None);
    crate::assert_float_eq(after[1].vel.x, -a * config.dtime, 1e-12, None);
    assert_eq!(after[0].acc.y, 0.0);
    assert_eq!(after[0].acc.z, 0.0);
}

#[test]
fn test_parallel_run_matches_serial() {
    let bodies = plummer_model(256, 31);
    let config = SimConfig {
        tol: 0.0,
        ..SimConfig::default()
    };

    let mut serial = Simulation::new(bodies.clone(), config).unwrap();
    serial.run_steps(4).unwrap();

    let mut parallel =
        Simulation::new(bodies, SimConfig { nproc: 3, ..config }).unwrap();
    parallel.run_steps(4).unwrap();

    for (a, b) in serial.bodies().iter().zip(parallel.bodies().iter()) {
        assert!((a.pos - b.pos).length() < 1e-6);
        assert!((a.vel - b.vel).length() < 1e-6);
    }
}

#[test]
fn test_exhausted_pool_aborts_every_worker() {
    let bodies = plummer_model(2000, 8);
    let config = SimConfig {
        fcells: 0.01,
        fleaves: 0.01,
        bodies_per_leaf: 1,
        nproc: 2,
        ..SimConfig::default()
    };

    let mut sim = Simulation::new(bodies, config).unwrap();
    let err = sim.run_steps(1).unwrap_err();
    assert!(matches!(
        err,
        SimError::CellPoolExhausted { .. } | SimError::LeafPoolExhausted { .. }
    ));
}

#[test]
fn test_run_accumulates_interaction_stats() {
    let bodies = plummer_model(128, 55);
    let config = SimConfig {
        nproc: 2,
        ..SimConfig::default()
    };

    let mut sim = Simulation::new(bodies, config).unwrap();
    let stats = sim.run().unwrap();

    assert_eq!(stats.steps, 4);
    assert!(stats.body_body_interactions > 0);
    assert!(stats.body_cell_interactions > 0);
    assert_eq!(stats.self_interactions, 0);
}

#[test]
fn test_plummer_bodies_stay_finite() {
    let bodies = plummer_model(64, 2);
    let mut sim = Simulation::new(bodies, SimConfig::default()).unwrap();
    sim.run().unwrap();
    assert!(sim.bodies().iter().all(|b| b.is_valid()));
}
