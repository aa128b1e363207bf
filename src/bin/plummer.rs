// src/bin/plummer.rs

use rs_nbody::config::SimConfig;
use rs_nbody::errors::SimError;
use rs_nbody::models::plummer_model;
use rs_nbody::simulation::{
    center_of_mass, kinetic_energy, potential_energy, Simulation,
};

fn main() -> Result<(), SimError> {
    env_logger::init();

    let nbody = 2048;
    let config = SimConfig {
        nproc: 4,
        ..SimConfig::default()
    };
    let bodies = plummer_model(nbody, 123);

    println!("Plummer model, {} bodies, {} workers", nbody, config.nproc);
    println!("Initial kinetic energy:  {:.6}", kinetic_energy(&bodies));
    println!("Initial center of mass:  {:?}", center_of_mass(&bodies));

    let mut sim = Simulation::new(bodies, config)?;
    let stats = sim.run()?;

    let after = sim.bodies();
    println!("\nAfter {} steps:", stats.steps);
    println!("Kinetic energy:          {:.6}", kinetic_energy(&after));
    println!("Potential energy:        {:.6}", potential_energy(&after));
    println!(
        "Total energy:            {:.6}",
        kinetic_energy(&after) + potential_energy(&after)
    );
    println!("Center of mass:          {:?}", center_of_mass(&after));
    println!("Body-body interactions:  {}", stats.body_body_interactions);
    println!("Body-cell interactions:  {}", stats.body_cell_interactions);
    println!("Missed self-skips:       {}", stats.self_interactions);

    Ok(())
}
