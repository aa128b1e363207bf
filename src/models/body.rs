use crate::models::Vec3;

/// A single particle of the simulation.
///
/// `phi` and `acc` hold the result of the most recent force evaluation;
/// `cost` is the interaction count of that evaluation, used to balance the
/// work partition on the next step. Fresh bodies carry a cost of 1.
///
/// # Examples
///
/// ```
/// use rs_nbody::models::{Body, Vec3};
///
/// let body = Body::new(1.0, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
/// assert_eq!(body.mass, 1.0);
/// assert_eq!(body.cost, 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub mass: f64,
    pub pos: Vec3,
    pub vel: Vec3,
    pub acc: Vec3,
    pub phi: f64,
    pub cost: u32,
}

impl Body {
    pub fn new(mass: f64, pos: Vec3, vel: Vec3) -> Self {
        Body {
            mass,
            pos,
            vel,
            acc: Vec3::ZERO,
            phi: 0.0,
            cost: 1,
        }
    }

    /// True when the body can participate in a simulation.
    pub fn is_valid(&self) -> bool {
        self.mass > 0.0
            && self.mass.is_finite()
            && self.pos.is_finite()
            && self.vel.is_finite()
            && self.acc.is_finite()
            && self.phi.is_finite()
    }
}
