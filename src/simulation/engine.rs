// src/simulation/engine.rs
//
// The step loop. A fixed pool of worker threads is spawned once per run;
// each worker loops over all steps, passing the five shared barriers in
// order:
//
//   insert bodies        -> tree_built
//   summarize own nodes  -> cost_done
//   partition + forces   -> forces_done
//   advance + bounds     -> positions_done
//   refit cube (worker 0)-> bounds_reset
//
// New body costs are published during the advance phase, not the force
// phase, so every worker partitions against the same frozen cost table.

use std::sync::atomic::Ordering;
use std::thread;

use log::{debug, info};
use rayon::prelude::*;

use crate::config::SimConfig;
use crate::errors::SimError;
use crate::gravity::{hack_gravity, ForceCtx};
use crate::models::{Body, Vec3};
use crate::shared::BodyTable;
use crate::simulation::{advance_body, kick_correction, BoundsAccum, SimContext};
use crate::tree::{
    cost_interval, find_my_bodies, load_body, BuildCtx, NodeHandle, NodePool, RootCube,
    WorkerArena, IMAX,
};

/// Interaction totals accumulated since the simulation was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub steps: u32,
    pub body_body_interactions: u64,
    pub body_cell_interactions: u64,
    /// Force walks that failed to skip their own body.
    pub self_interactions: u64,
}

/// A parallel Barnes-Hut N-body simulation.
///
/// # Examples
///
/// ```
/// use rs_nbody::config::SimConfig;
/// use rs_nbody::models::plummer_model;
/// use rs_nbody::simulation::Simulation;
///
/// let bodies = plummer_model(256, 123);
/// let config = SimConfig { nproc: 2, ..SimConfig::default() };
/// let mut sim = Simulation::new(bodies, config).unwrap();
///
/// let stats = sim.run().unwrap();
/// assert_eq!(stats.steps, 4);
/// ```
pub struct Simulation {
    ctx: SimContext,
    maxmybody: usize,
    steps_done: u32,
}

impl Simulation {
    /// Validates the configuration and bodies and sizes the node pool.
    pub fn new(bodies: Vec<Body>, config: SimConfig) -> Result<Self, SimError> {
        let config = config.validated()?;
        if bodies.is_empty() {
            return Err(SimError::EmptyUniverse);
        }
        for (index, b) in bodies.iter().enumerate() {
            if !b.is_valid() {
                return Err(SimError::InvalidBody { index });
            }
        }

        let nbody = bodies.len();
        let pool = NodePool::new(config.maxcell(nbody), config.maxleaf(nbody));
        let maxmybody = config.maxmybody(nbody);
        info!(
            "simulation of {} bodies: {} workers, {} cells, {} leaves",
            nbody,
            config.nproc,
            pool.cell_capacity(),
            pool.leaf_capacity()
        );

        Ok(Simulation {
            ctx: SimContext::new(config, BodyTable::from_bodies(&bodies), pool),
            maxmybody,
            steps_done: 0,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.ctx.config
    }

    /// Copies the current body states out of the shared table.
    pub fn bodies(&self) -> Vec<Body> {
        self.ctx.bodies.snapshot()
    }

    pub fn stats(&self) -> RunStats {
        RunStats {
            steps: self.steps_done,
            body_body_interactions: self.ctx.n2b_total.load(Ordering::Relaxed),
            body_cell_interactions: self.ctx.nbc_total.load(Ordering::Relaxed),
            self_interactions: self.ctx.self_interactions.load(Ordering::Relaxed),
        }
    }

    /// Advances the system until `tstop`.
    pub fn run(&mut self) -> Result<RunStats, SimError> {
        let nsteps = self.ctx.config.nsteps();
        self.run_steps(nsteps)
    }

    /// Advances the system a fixed number of steps.
    pub fn run_steps(&mut self, nsteps: u32) -> Result<RunStats, SimError> {
        if nsteps == 0 {
            return Ok(self.stats());
        }

        let nproc = self.ctx.config.nproc;
        let (min, max) = initial_bounds(&self.ctx.bodies);
        self.ctx.set_cube(RootCube::fit(min, max));
        *self.ctx.bounds.lock().unwrap_or_else(std::sync::PoisonError::into_inner) =
            BoundsAccum::sentinel();

        let mut arenas: Vec<WorkerArena> = (0..nproc)
            .map(|id| WorkerArena::new(id, nproc, &self.ctx.pool, self.ctx.config.bodies_per_leaf))
            .collect();
        let root = arenas[0].alloc_cell(&self.ctx.pool, IMAX >> 1)?;
        self.ctx.set_root_cell(root);

        let ctx = &self.ctx;
        let maxmybody = self.maxmybody;
        let base_step = self.steps_done;
        thread::scope(|scope| {
            for (id, arena) in arenas.into_iter().enumerate() {
                scope.spawn(move || worker_loop(ctx, arena, id, base_step, nsteps, maxmybody));
            }
        });

        if let Some(e) = self.ctx.abort.take() {
            log::error!("simulation aborted: {}", e);
            return Err(e);
        }
        self.steps_done += nsteps;
        let missed = self.ctx.self_interactions.load(Ordering::Relaxed);
        if missed > 0 {
            log::warn!("{} force walks failed to skip their own body", missed);
        }
        debug!("advanced to step {}", self.steps_done);
        Ok(self.stats())
    }
}

/// Bounding box of all body positions, computed before the pool starts.
fn initial_bounds(bodies: &BodyTable) -> (Vec3, Vec3) {
    (0..bodies.len() as u32)
        .into_par_iter()
        .map(|i| {
            let p = bodies.pos(i).pos;
            (p, p)
        })
        .reduce(
            || (Vec3::splat(1e99), Vec3::splat(-1e99)),
            |a, b| (a.0.min(b.0), a.1.max(b.1)),
        )
}

/// Contiguous body ranges for the first step, before any cost data exists.
fn initial_assignment(nbody: usize, id: usize, nproc: usize) -> Vec<u32> {
    let share = nbody / nproc;
    let extra = nbody % nproc;
    let (count, offset) = if id < extra {
        (share + 1, (share + 1) * id)
    } else {
        (share, (share + 1) * extra + (id - extra) * share)
    };
    (offset as u32..(offset + count) as u32).collect()
}

fn worker_loop(
    ctx: &SimContext,
    mut arena: WorkerArena,
    id: usize,
    base_step: u32,
    nsteps: u32,
    maxmybody: usize,
) {
    let nproc = ctx.config.nproc;
    let dtime = ctx.config.dtime;
    let dthf = ctx.config.dthf();
    let epssq = ctx.config.epssq();
    let tolsq = ctx.config.tolsq();

    let mut my_bodies = initial_assignment(ctx.bodies.len(), id, nproc);
    let mut new_costs: Vec<u32> = Vec::new();

    for step in 0..nsteps {
        let global_step = base_step + step;
        let cube = ctx.cube();
        let root = ctx.root_cell();

        // Insert this worker's bodies into the shared tree.
        let bc = BuildCtx {
            pool: &ctx.pool,
            locks: &ctx.locks,
            bodies: &ctx.bodies,
            cube,
            root,
            bodies_per_leaf: ctx.config.bodies_per_leaf,
        };
        for &b in &my_bodies {
            if let Err(e) = load_body(&bc, &mut arena, b) {
                ctx.abort.raise(e);
                break;
            }
        }
        ctx.barriers.tree_built.wait();
        if ctx.abort.is_raised() {
            return;
        }

        crate::tree::summarize_worker(&ctx.pool, &ctx.bodies, &arena);
        ctx.barriers.cost_done.wait();
        if ctx.abort.is_raised() {
            return;
        }

        // Partition against the frozen cost table, then evaluate forces.
        let root_handle = NodeHandle::Cell(root);
        let total_cost = ctx.pool.cell(root).summary().cost;
        let (min_work, max_work) = cost_interval(total_cost, id, nproc);
        match find_my_bodies(
            &ctx.pool,
            &ctx.bodies,
            root_handle,
            min_work,
            max_work,
            id == nproc - 1,
            maxmybody,
            id,
        ) {
            Ok(list) => {
                my_bodies = list;
                let fc = ForceCtx {
                    pool: &ctx.pool,
                    bodies: &ctx.bodies,
                    root: root_handle,
                    rsize: cube.rsize,
                    epssq,
                    tolsq,
                };
                new_costs.clear();
                let (mut n2b, mut nbc, mut selfint) = (0u64, 0u64, 0u64);
                for &b in &my_bodies {
                    let acc_old = ctx.bodies.state(b).acc;
                    let field = hack_gravity(&fc, b);
                    let mut s = ctx.bodies.state(b);
                    s.acc = field.acc;
                    s.phi = field.phi;
                    ctx.bodies.set_state(b, s);
                    new_costs.push(field.cost());
                    n2b += field.n2b_terms;
                    nbc += field.nbc_terms;
                    if !field.skipped_self {
                        selfint += 1;
                    }
                    if global_step >= 2 {
                        kick_correction(&ctx.bodies, b, acc_old, dthf);
                    }
                }
                ctx.n2b_total.fetch_add(n2b, Ordering::Relaxed);
                ctx.nbc_total.fetch_add(nbc, Ordering::Relaxed);
                ctx.self_interactions.fetch_add(selfint, Ordering::Relaxed);
            }
            Err(e) => ctx.abort.raise(e),
        }
        ctx.barriers.forces_done.wait();
        if ctx.abort.is_raised() {
            return;
        }

        // Advance positions, publish next-step costs, fold the bounds.
        let mut lmin = Vec3::splat(1e99);
        let mut lmax = Vec3::splat(-1e99);
        for (k, &b) in my_bodies.iter().enumerate() {
            let p = advance_body(&ctx.bodies, b, dtime, dthf);
            ctx.bodies.set_cost(b, new_costs[k].max(1));
            lmin = lmin.min(p);
            lmax = lmax.max(p);
        }
        {
            let mut bounds = ctx
                .bounds
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            bounds.merge(lmin, lmax);
        }
        ctx.barriers.positions_done.wait();
        if ctx.abort.is_raised() {
            return;
        }

        // Prepare the next step: refit the cube and allocate a fresh root.
        arena.reset();
        if id == 0 {
            let (bmin, bmax) = {
                let mut bounds = ctx
                    .bounds
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                let r = (bounds.min, bounds.max);
                *bounds = BoundsAccum::sentinel();
                r
            };
            ctx.set_cube(RootCube::fit(bmin, bmax));
            match arena.alloc_cell(&ctx.pool, IMAX >> 1) {
                Ok(r) => ctx.set_root_cell(r),
                Err(e) => ctx.abort.raise(e),
            }
        }
        ctx.barriers.bounds_reset.wait();
        if ctx.abort.is_raised() {
            return;
        }
    }
}
