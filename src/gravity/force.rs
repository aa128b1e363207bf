// src/gravity/force.rs

use crate::models::Vec3;
use crate::shared::BodyTable;
use crate::tree::{NodeHandle, NodePool, NSUB};

/// Acceleration and potential accumulated for one body, plus the
/// interaction counts that become the body's work cost for the next step.
#[derive(Debug, Clone, Copy, Default)]
pub struct GravityField {
    pub acc: Vec3,
    pub phi: f64,
    /// Body-body interaction terms.
    pub n2b_terms: u64,
    /// Body-cell (multipole) interaction terms.
    pub nbc_terms: u64,
    /// Whether the walk found and skipped the body itself. A miss means
    /// the body interacted with its own mass through a multipole.
    pub skipped_self: bool,
}

impl GravityField {
    /// The body's work cost for the next partition.
    pub fn cost(&self) -> u32 {
        (self.n2b_terms + self.nbc_terms).min(u32::MAX as u64) as u32
    }
}

/// Read-only view of the tree for one step's force phase.
pub struct ForceCtx<'a> {
    pub pool: &'a NodePool,
    pub bodies: &'a BodyTable,
    pub root: NodeHandle,
    pub rsize: f64,
    pub epssq: f64,
    pub tolsq: f64,
}

/// Walks the tree and accumulates the softened monopole field at `body`.
///
/// A node is opened when `tolsq * drsq < dsq`, where `drsq` is the squared
/// distance to the node's center of mass and `dsq` the squared cell size,
/// starting at `rsize^2` and quartered per level. With `tol = 0` every
/// node opens and the walk degenerates to exact pairwise summation.
pub fn hack_gravity(fc: &ForceCtx, body: u32) -> GravityField {
    let pos0 = fc.bodies.pos(body).pos;
    let mut field = GravityField::default();
    walk(fc, &mut field, pos0, body, fc.root, fc.rsize * fc.rsize);
    field
}

fn walk(fc: &ForceCtx, field: &mut GravityField, pos0: Vec3, body: u32, handle: NodeHandle, dsq: f64) {
    let summary = fc.pool.summary(handle);
    let dr = summary.com - pos0;
    let open = fc.tolsq * dr.length_squared() < dsq;

    match handle {
        NodeHandle::Cell(c) if open => {
            let cell = fc.pool.cell(c);
            for si in 0..NSUB {
                if let Some(child) = cell.child(si) {
                    walk(fc, field, pos0, body, child, dsq * 0.25);
                }
            }
        }
        NodeHandle::Leaf(l) if open => {
            for &b in fc.pool.leaf(l).bodies() {
                if b == body {
                    field.skipped_self = true;
                    continue;
                }
                let bp = fc.bodies.pos(b);
                interact(field, fc.epssq, bp.mass, bp.pos - pos0);
                field.n2b_terms += 1;
            }
        }
        _ => {
            interact(field, fc.epssq, summary.mass, dr);
            field.nbc_terms += 1;
        }
    }
}

/// Adds one softened monopole term to the accumulated field.
fn interact(field: &mut GravityField, epssq: f64, mass: f64, dr: Vec3) {
    let drsq = dr.length_squared() + epssq;
    let drabs = drsq.sqrt();
    let phii = mass / drabs;
    field.phi -= phii;
    let mor3 = phii / drsq;
    field.acc += dr * mor3;
}
