mod context;
mod engine;
mod integrator;
mod statistics;

pub use context::*;
pub use engine::*;
pub use integrator::*;
pub use statistics::*;

#[cfg(test)]
mod engine_tests;
#[cfg(test)]
mod integrator_tests;
