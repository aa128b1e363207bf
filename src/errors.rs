use std::fmt;
use std::error::Error;

/// Represents errors that can occur while configuring or running a simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// Indicates a non-positive or non-finite integration timestep.
    InvalidTimestep,
    /// Indicates a negative or non-finite softening length.
    InvalidSoftening,
    /// Indicates a negative or non-finite cell-opening tolerance.
    InvalidTolerance,
    /// Indicates non-positive cell or leaf pool scaling factors.
    InvalidPoolScaling,
    /// Indicates a worker count of zero.
    InvalidWorkerCount,
    /// Indicates a leaf capacity of zero.
    InvalidLeafCapacity,
    /// Indicates a simulation constructed with no bodies.
    EmptyUniverse,
    /// Indicates a body with a non-positive mass or non-finite state.
    InvalidBody { index: usize },
    /// A worker ran out of cells in its slice of the node pool.
    CellPoolExhausted { worker: usize, capacity: usize },
    /// A worker ran out of leaves in its slice of the node pool.
    LeafPoolExhausted { worker: usize, capacity: usize },
    /// A worker was assigned more bodies than its body list can hold.
    BodyListOverflow { worker: usize, capacity: usize },
    /// A body fell outside the root cube during tree construction.
    BodyOutOfBounds { worker: usize, body: usize },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::InvalidTimestep => write!(f, "Invalid integration timestep"),
            SimError::InvalidSoftening => write!(f, "Invalid softening length"),
            SimError::InvalidTolerance => write!(f, "Invalid cell-opening tolerance"),
            SimError::InvalidPoolScaling => write!(f, "Invalid cell/leaf pool scaling"),
            SimError::InvalidWorkerCount => write!(f, "Worker count must be at least 1"),
            SimError::InvalidLeafCapacity => write!(f, "Leaf capacity must be at least 1"),
            SimError::EmptyUniverse => write!(f, "Simulation requires at least one body"),
            SimError::InvalidBody { index } => {
                write!(f, "Body {} has a non-positive mass or non-finite state", index)
            }
            SimError::CellPoolExhausted { worker, capacity } => {
                write!(f, "Worker {} needs more than {} cells; increase fcells", worker, capacity)
            }
            SimError::LeafPoolExhausted { worker, capacity } => {
                write!(f, "Worker {} needs more than {} leaves; increase fleaves", worker, capacity)
            }
            SimError::BodyListOverflow { worker, capacity } => {
                write!(f, "Worker {} needs more than {} bodies; increase fleaves", worker, capacity)
            }
            SimError::BodyOutOfBounds { worker, body } => {
                write!(f, "Worker {}: body {} is outside the root cube", worker, body)
            }
        }
    }
}

impl Error for SimError {}
