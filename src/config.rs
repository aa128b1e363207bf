// src/config.rs

use crate::errors::SimError;

/// Scalar parameters of a simulation run.
///
/// The pool scaling factors size the shared node pool up front: the leaf pool
/// holds `fleaves * nbody` leaves and the cell pool `fcells` cells per leaf.
/// Each worker owns a fixed contiguous slice of both pools.
///
/// # Examples
///
/// ```
/// use rs_nbody::config::SimConfig;
///
/// let config = SimConfig { nproc: 4, tol: 0.5, ..SimConfig::default() };
/// assert!(config.validated().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimConfig {
    /// Integration timestep.
    pub dtime: f64,
    /// Potential softening length.
    pub eps: f64,
    /// Cell-opening tolerance; 0.0 forces exact summation.
    pub tol: f64,
    /// Cells allocated per leaf in the node pool.
    pub fcells: f64,
    /// Leaves allocated per body in the node pool.
    pub fleaves: f64,
    /// Simulation end time used by [`Simulation::run`](crate::simulation::Simulation::run).
    pub tstop: f64,
    /// Number of worker threads.
    pub nproc: usize,
    /// Maximum number of bodies stored in a leaf before it splits.
    pub bodies_per_leaf: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dtime: 0.025,
            eps: 0.05,
            tol: 1.0,
            fcells: 2.0,
            fleaves: 0.5,
            tstop: 0.075,
            nproc: 1,
            bodies_per_leaf: 10,
        }
    }
}

// Node pool indices are packed into 31 bits of a handle word.
const MAX_POOL_NODES: usize = 1 << 31;

impl SimConfig {
    /// Checks every field and returns the configuration unchanged if it is usable.
    pub fn validated(self) -> Result<Self, SimError> {
        if !(self.dtime > 0.0 && self.dtime.is_finite()) {
            return Err(SimError::InvalidTimestep);
        }
        if !(self.eps >= 0.0 && self.eps.is_finite()) {
            return Err(SimError::InvalidSoftening);
        }
        if !(self.tol >= 0.0 && self.tol.is_finite()) {
            return Err(SimError::InvalidTolerance);
        }
        if !(self.fcells > 0.0 && self.fcells.is_finite())
            || !(self.fleaves > 0.0 && self.fleaves.is_finite())
        {
            return Err(SimError::InvalidPoolScaling);
        }
        if self.nproc == 0 {
            return Err(SimError::InvalidWorkerCount);
        }
        if self.bodies_per_leaf == 0 {
            return Err(SimError::InvalidLeafCapacity);
        }
        Ok(self)
    }

    /// Half the timestep, used by the leapfrog kick.
    pub fn dthf(&self) -> f64 {
        0.5 * self.dtime
    }

    /// Squared softening length.
    pub fn epssq(&self) -> f64 {
        self.eps * self.eps
    }

    /// Squared cell-opening tolerance.
    pub fn tolsq(&self) -> f64 {
        self.tol * self.tol
    }

    /// Total number of leaves in the shared pool for `nbody` bodies.
    pub fn maxleaf(&self, nbody: usize) -> usize {
        let scaled = (self.fleaves * nbody as f64) as usize;
        scaled.max(self.nproc * 16).min(MAX_POOL_NODES)
    }

    /// Total number of cells in the shared pool for `nbody` bodies.
    pub fn maxcell(&self, nbody: usize) -> usize {
        let scaled = (self.fcells * self.maxleaf(nbody) as f64) as usize;
        scaled.max(self.nproc * 16).min(MAX_POOL_NODES)
    }

    /// Upper bound on the number of bodies any one worker may be assigned.
    pub fn maxmybody(&self, nbody: usize) -> usize {
        (nbody + self.maxleaf(nbody) * self.bodies_per_leaf) / self.nproc
    }

    /// Number of steps advanced by a full run, `tnow < tstop + 0.1 * dtime`.
    pub fn nsteps(&self) -> u32 {
        (self.tstop / self.dtime + 0.1).ceil().max(0.0) as u32
    }
}
