//! Rigid body state and motion.

use super::{
    aa_box::AaBox,
    shape::Shape,
};
use anyhow::*;
use vek::*;


/// Identifier of an entity. Assigned externally, unique, never reused within a run.
pub type EntityId = u32;

/// Mass given to `Entity::with_defaults`.
pub const DEFAULT_MASS: f64 = 10.0;

/// Circle radius given to `Entity::with_defaults`.
pub const DEFAULT_RADIUS: f64 = 10.0;


/// A rigid body.
///
/// Position doubles as center of mass. Shape and mass are private so that the derived quantities
/// (inverse mass, inertia, inverse inertia, bounding box offset) can only change together, through
/// `set_shape`, `set_mass`, or `recompute`.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: EntityId,
    shape: Shape,

    // linear state
    pub position: Vec2<f64>,
    pub velocity: Vec2<f64>,
    force: Vec2<f64>,

    // angular state
    pub angle: f64,
    pub angular_velocity: f64,
    torque: f64,

    mass: f64,
    inverse_mass: f64,

    // derived from shape and mass
    inertia: f64,
    inverse_inertia: f64,
    bounding_box_offset: f64,
}

impl Entity {
    /// Construct at rest at the origin, with derived quantities computed.
    ///
    /// Errors if the mass is not positive and finite or the shape is degenerate.
    pub fn new(id: EntityId, shape: Shape, mass: f64) -> Result<Self> {
        let mut entity = Entity {
            id,
            shape,
            position: Vec2::zero(),
            velocity: Vec2::zero(),
            force: Vec2::zero(),
            angle: 0.0,
            angular_velocity: 0.0,
            torque: 0.0,
            mass,
            inverse_mass: 0.0,
            inertia: 0.0,
            inverse_inertia: 0.0,
            bounding_box_offset: 0.0,
        };
        entity.recompute()?;
        Ok(entity)
    }

    /// Circle of radius `DEFAULT_RADIUS` and mass `DEFAULT_MASS`, at rest at the origin.
    pub fn with_defaults(id: EntityId) -> Self {
        let inertia = DEFAULT_MASS * DEFAULT_RADIUS * DEFAULT_RADIUS / 4.0;
        Entity {
            id,
            shape: Shape::Circle { radius: DEFAULT_RADIUS },
            position: Vec2::zero(),
            velocity: Vec2::zero(),
            force: Vec2::zero(),
            angle: 0.0,
            angular_velocity: 0.0,
            torque: 0.0,
            mass: DEFAULT_MASS,
            inverse_mass: 1.0 / DEFAULT_MASS,
            inertia,
            inverse_inertia: 1.0 / inertia,
            bounding_box_offset: DEFAULT_RADIUS,
        }
    }

    /// Builder-style position setter.
    pub fn at<V: Into<Vec2<f64>>>(mut self, position: V) -> Self {
        self.position = position.into();
        self
    }

    /// Builder-style velocity setter.
    pub fn moving<V: Into<Vec2<f64>>>(mut self, velocity: V) -> Self {
        self.velocity = velocity.into();
        self
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn inverse_mass(&self) -> f64 {
        self.inverse_mass
    }

    pub fn inertia(&self) -> f64 {
        self.inertia
    }

    pub fn inverse_inertia(&self) -> f64 {
        self.inverse_inertia
    }

    pub fn force(&self) -> Vec2<f64> {
        self.force
    }

    pub fn torque(&self) -> f64 {
        self.torque
    }

    /// Half extent of the bounding box around `position`, as of the last recompute.
    pub fn bounding_box_offset(&self) -> f64 {
        self.bounding_box_offset
    }

    /// Local-space center of the shape.
    pub fn center_of_mass(&self) -> Vec2<f64> {
        self.shape.center()
    }

    /// Recompute inverse mass, inertia, inverse inertia, and bounding box offset from the current
    /// shape and mass.
    ///
    /// On error nothing is modified.
    pub fn recompute(&mut self) -> Result<()> {
        ensure!(
            self.mass.is_finite() && self.mass > 0.0,
            "entity {} has invalid mass {}", self.id, self.mass,
        );
        self.shape.validate()
            .with_context(|| format!("entity {} has invalid shape", self.id))?;
        let inertia = self.shape.inertia(self.mass);
        ensure!(
            inertia.is_finite() && inertia > 0.0,
            "entity {} has invalid inertia {}", self.id, inertia,
        );

        self.inverse_mass = 1.0 / self.mass;
        self.inertia = inertia;
        self.inverse_inertia = 1.0 / inertia;
        self.bounding_box_offset = self.shape.bounding_box_offset();
        Ok(())
    }

    /// Replace the shape. Rejected, leaving the entity unchanged, if the result would be invalid.
    pub fn set_shape(&mut self, shape: Shape) -> Result<()> {
        let old = std::mem::replace(&mut self.shape, shape);
        self.recompute().map_err(|e| {
            self.shape = old;
            e
        })
    }

    /// Replace the mass. Rejected, leaving the entity unchanged, if not positive and finite.
    pub fn set_mass(&mut self, mass: f64) -> Result<()> {
        let old = std::mem::replace(&mut self.mass, mass);
        self.recompute().map_err(|e| {
            self.mass = old;
            e
        })
    }

    /// Bounding box at the current position.
    pub fn bounding_box(&self) -> AaBox {
        AaBox::around(self.position, Extent2::from(self.bounding_box_offset))
    }

    /// Exact world-space extent of a rectangle, or of the square around a circle.
    pub fn world_rect(&self) -> AaBox {
        AaBox::around(self.position, self.shape.half_extents())
    }

    pub fn set_force(&mut self, force: Vec2<f64>) {
        self.force = force;
    }

    pub fn add_force(&mut self, force: Vec2<f64>) {
        self.force += force;
    }

    pub fn set_torque(&mut self, torque: f64) {
        self.torque = torque;
    }

    pub fn add_torque(&mut self, torque: f64) {
        self.torque += torque;
    }

    /// Add both a force and a torque. A missing force counts as zero.
    pub fn apply_forces(&mut self, force: Option<Vec2<f64>>, torque: f64) {
        self.add_force(force.unwrap_or_else(Vec2::zero));
        self.add_torque(torque);
    }

    /// Advance by `dt` seconds with semi-implicit Euler, then zero the force and torque
    /// accumulators.
    ///
    /// Velocity is updated before position, and the position update uses the new velocity.
    pub fn integrate(&mut self, dt: f64) {
        self.velocity += self.force * self.inverse_mass * dt;
        self.position += self.velocity * dt;

        self.angular_velocity += self.torque * self.inverse_inertia * dt;
        self.angle += self.angular_velocity * dt;

        self.force = Vec2::zero();
        self.torque = 0.0;
    }
}


#[cfg(test)]
fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

#[test]
fn defaults_are_consistent() {
    let mut a = Entity::with_defaults(1);
    let b = a.clone();
    a.recompute().unwrap();
    assert_eq!(a, b);
    assert_eq!(a.mass(), DEFAULT_MASS);
    assert_eq!(a.bounding_box_offset(), DEFAULT_RADIUS);
    assert!(approx(a.inertia(), 250.0));
}

#[test]
fn reciprocals_recomputed_together() {
    let mut e = Entity::new(3, Shape::rectangle([-1.0, -2.0], [1.0, 2.0]).unwrap(), 2.0).unwrap();
    assert!(approx(e.inverse_mass(), 0.5));
    assert!(approx(e.inertia(), 2.0 * (16.0 + 4.0) / 12.0));
    assert!(approx(e.inertia() * e.inverse_inertia(), 1.0));
    assert_eq!(e.bounding_box_offset(), 2.0);

    e.set_mass(4.0).unwrap();
    assert!(approx(e.inverse_mass(), 0.25));
    assert!(approx(e.inertia() * e.inverse_inertia(), 1.0));

    e.set_shape(Shape::circle(3.0).unwrap()).unwrap();
    assert!(approx(e.inertia(), 4.0 * 9.0 / 4.0));
    assert_eq!(e.bounding_box_offset(), 3.0);
}

#[test]
fn invalid_mass_rejected_without_change() {
    assert!(Entity::new(1, Shape::circle(1.0).unwrap(), 0.0).is_err());
    assert!(Entity::new(1, Shape::circle(1.0).unwrap(), -5.0).is_err());

    let mut e = Entity::with_defaults(1);
    let before = e.clone();
    assert!(e.set_mass(0.0).is_err());
    assert!(e.set_mass(f64::NAN).is_err());
    assert!(e.set_shape(Shape::Circle { radius: -1.0 }).is_err());
    assert_eq!(e, before);
    assert!(e.inverse_mass().is_finite());
}

#[test]
fn bounding_box_follows_position() {
    let mut e = Entity::with_defaults(1).at([5.0, -3.0]).moving([2.0, 1.0]);
    for _ in 0..10 {
        e.add_force(Vec2::new(1.0, -4.0));
        e.add_torque(0.5);
        e.integrate(0.1);
        let bb = e.bounding_box();
        let off = e.bounding_box_offset();
        let (lo, hi) = (e.position - Vec2::from(off), e.position + Vec2::from(off));
        assert!(approx(bb.pos.x, lo.x) && approx(bb.pos.y, lo.y));
        assert!(approx(bb.max().x, hi.x) && approx(bb.max().y, hi.y));
    }
}

#[test]
fn zero_force_keeps_velocity() {
    let mut e = Entity::with_defaults(1).moving([3.0, -1.0]);
    e.integrate(0.5);
    assert_eq!(e.velocity, Vec2::new(3.0, -1.0));
    assert_eq!(e.position, Vec2::new(1.5, -0.5));
}

#[test]
fn semi_implicit_euler() {
    let mut e = Entity::with_defaults(1).at([1.0, 2.0]).moving([1.0, 0.0]);
    let dt = 0.25;
    e.apply_forces(Some(Vec2::new(20.0, -40.0)), 50.0);
    e.integrate(dt);

    // v_new = v_old + F/m dt, p_new = p_old + v_new dt
    let v = Vec2::new(1.0 + 2.0 * dt, -4.0 * dt);
    assert!(approx(e.velocity.x, v.x) && approx(e.velocity.y, v.y));
    assert!(approx(e.position.x, 1.0 + v.x * dt));
    assert!(approx(e.position.y, 2.0 + v.y * dt));

    let w = 50.0 / 250.0 * dt;
    assert!(approx(e.angular_velocity, w));
    assert!(approx(e.angle, w * dt));
}

#[test]
fn accumulators_cleared_after_integrate() {
    let mut e = Entity::with_defaults(1);
    e.apply_forces(None, 2.0);
    e.add_force(Vec2::new(10.0, 0.0));
    e.integrate(1.0);
    assert_eq!(e.force(), Vec2::zero());
    assert_eq!(e.torque(), 0.0);

    let v = e.velocity;
    e.integrate(1.0);
    assert_eq!(e.velocity, v);
}
