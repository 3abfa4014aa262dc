//! Simulated masses.
//!
//! A [`Body`] is a point mass with a collision radius. The integrator pushes
//! forces into its accumulator, advances it, and clears the accumulator again;
//! the body itself only guarantees its invariants (non-negative mass, positive
//! radius, bounded trail).

use std::collections::VecDeque;
use std::fmt;

use glam::{DVec3, Vec4};
use tracing::{debug, warn};

use crate::central_mass::CentralMass;
use crate::constants::{DEFAULT_TRAIL_CAPACITY, SOLAR_MASS};

/// Smallest radius a body may have (m).
pub const MIN_RADIUS: f64 = 1.0;

/// What a body represents. Display only; physics treats every kind alike.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Star,
    #[default]
    Planet,
    Asteroid,
    GasCloud,
    Debris,
    /// Massless tracer.
    TestMass,
}

impl BodyKind {
    /// Parse a configuration name such as `"gas_cloud"` or `"GasCloud"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "star" => Some(Self::Star),
            "planet" => Some(Self::Planet),
            "asteroid" => Some(Self::Asteroid),
            "gascloud" => Some(Self::GasCloud),
            "debris" => Some(Self::Debris),
            "testmass" | "testparticle" => Some(Self::TestMass),
            _ => None,
        }
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BodyKind::Star => "Star",
            BodyKind::Planet => "Planet",
            BodyKind::Asteroid => "Asteroid",
            BodyKind::GasCloud => "Gas Cloud",
            BodyKind::Debris => "Debris",
            BodyKind::TestMass => "Test Mass",
        };
        f.write_str(s)
    }
}

/// A massive sphere moving under gravity.
#[derive(Clone, Debug)]
pub struct Body {
    position: DVec3,
    velocity: DVec3,
    /// Acceleration at the start of the last integrated step.
    acceleration: DVec3,
    mass: f64,
    radius: f64,
    color: Vec4,
    name: String,
    kind: BodyKind,
    active: bool,
    force: DVec3,
    trail: VecDeque<DVec3>,
    trail_capacity: usize,
}

impl Body {
    /// Create a body at rest.
    ///
    /// Negative masses become 0 and radii below [`MIN_RADIUS`] are raised to
    /// it, both with a warning.
    pub fn new(name: impl Into<String>, position: DVec3, mass: f64, radius: f64) -> Self {
        let name = name.into();

        let mass = if mass >= 0.0 && mass.is_finite() {
            mass
        } else {
            warn!(body = %name, mass, "invalid body mass, using 0");
            0.0
        };
        let radius = if radius >= MIN_RADIUS && radius.is_finite() {
            radius
        } else {
            warn!(body = %name, radius, "invalid body radius, using {}", MIN_RADIUS);
            MIN_RADIUS
        };

        let mut trail = VecDeque::with_capacity(DEFAULT_TRAIL_CAPACITY);
        trail.push_back(position);

        debug!(
            "Body '{}' created at ({:e}, {:e}, {:e})",
            name, position.x, position.y, position.z
        );

        Self {
            position,
            velocity: DVec3::ZERO,
            acceleration: DVec3::ZERO,
            mass,
            radius,
            color: Vec4::ONE,
            name,
            kind: BodyKind::default(),
            active: true,
            force: DVec3::ZERO,
            trail,
            trail_capacity: DEFAULT_TRAIL_CAPACITY,
        }
    }

    pub fn with_velocity(mut self, velocity: DVec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_color(mut self, color: Vec4) -> Self {
        self.color = color;
        self
    }

    pub fn with_kind(mut self, kind: BodyKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set how many trail points are kept. At least one is always kept.
    pub fn with_trail_capacity(mut self, capacity: usize) -> Self {
        self.trail_capacity = capacity.max(1);
        while self.trail.len() > self.trail_capacity {
            self.trail.pop_front();
        }
        self
    }

    #[inline]
    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    #[inline]
    pub fn velocity(&self) -> DVec3 {
        self.velocity
    }

    /// The only way to move a massless body.
    pub fn set_velocity(&mut self, velocity: DVec3) {
        self.velocity = velocity;
    }

    #[inline]
    pub fn acceleration(&self) -> DVec3 {
        self.acceleration
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    pub fn color(&self) -> Vec4 {
        self.color
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn kind(&self) -> BodyKind {
        self.kind
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Add to the force accumulator.
    pub fn apply_force(&mut self, force: DVec3) {
        self.force += force;
    }

    /// Accumulated force since the last reset.
    #[inline]
    pub fn force(&self) -> DVec3 {
        self.force
    }

    pub fn reset_forces(&mut self) {
        self.force = DVec3::ZERO;
    }

    /// `force / mass`, or zero for a massless body.
    #[inline]
    pub fn acceleration_under(&self, force: DVec3) -> DVec3 {
        if self.mass > 0.0 {
            force / self.mass
        } else {
            DVec3::ZERO
        }
    }

    /// Commit the end state of an integration step.
    pub(crate) fn advance(&mut self, position: DVec3, velocity: DVec3, acceleration: DVec3) {
        self.position = position;
        self.velocity = velocity;
        self.acceleration = acceleration;
        self.record_trail();
    }

    fn record_trail(&mut self) {
        self.trail.push_back(self.position);
        while self.trail.len() > self.trail_capacity {
            self.trail.pop_front();
        }
    }

    /// Past positions, oldest first.
    pub fn trail(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.trail.iter().copied()
    }

    #[inline]
    pub fn trail_len(&self) -> usize {
        self.trail.len()
    }

    #[inline]
    pub fn trail_capacity(&self) -> usize {
        self.trail_capacity
    }

    pub fn distance_to(&self, other: &Body) -> f64 {
        (other.position - self.position).length()
    }

    /// Whether two active spheres touch or overlap.
    pub fn is_colliding_with(&self, other: &Body) -> bool {
        if !self.active || !other.active {
            return false;
        }
        self.distance_to(other) <= self.radius + other.radius
    }

    /// `½mv²`, zero for massless bodies.
    pub fn kinetic_energy(&self) -> f64 {
        if self.mass <= 0.0 {
            return 0.0;
        }
        0.5 * self.mass * self.velocity.length_squared()
    }

    /// Replace the velocity with a circular orbit around `center`.
    ///
    /// The orbit plane contains world Y unless the body sits on the Y axis,
    /// in which case world X is used.
    pub fn set_circular_orbit(&mut self, center: &CentralMass) {
        let offset = self.position - center.position();
        let r = offset.length();
        if r <= 0.0 {
            self.velocity = DVec3::ZERO;
            return;
        }

        let radial = offset / r;
        let reference = if radial.dot(DVec3::Y).abs() > 0.99 {
            DVec3::X
        } else {
            DVec3::Y
        };
        let speed = center.circular_orbit_speed(r);
        self.velocity = radial.cross(reference).normalize() * speed;

        debug!("Body '{}' set to circular orbit at {:e} m/s", self.name, speed);
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.position / 1e9;
        let v = self.velocity / 1e3;
        writeln!(f, "Object: {}", self.name)?;
        writeln!(f, "Type: {}", self.kind)?;
        writeln!(f, "Position: ({:.2}, {:.2}, {:.2}) Gm", p.x, p.y, p.z)?;
        writeln!(f, "Velocity: ({:.2}, {:.2}, {:.2}) km/s", v.x, v.y, v.z)?;
        writeln!(f, "Mass: {:.2} solar masses", self.mass / SOLAR_MASS)?;
        writeln!(f, "Radius: {:.2} Gm", self.radius / 1e9)?;
        writeln!(f, "Kinetic Energy: {:.2} x 10^30 J", self.kinetic_energy() / 1e30)?;
        write!(f, "Active: {}", if self.active { "Yes" } else { "No" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_mass_and_radius_are_clamped() {
        let b = Body::new("bad", DVec3::ZERO, -5.0, -1.0);
        assert_eq!(b.mass(), 0.0);
        assert_eq!(b.radius(), MIN_RADIUS);
    }

    #[test]
    fn test_massless_body_ignores_force() {
        let b = Body::new("tracer", DVec3::ZERO, 0.0, 1.0).with_kind(BodyKind::TestMass);
        assert_eq!(b.acceleration_under(DVec3::new(1e30, -1e30, 5.0)), DVec3::ZERO);
    }

    #[test]
    fn test_force_accumulates_and_resets() {
        let mut b = Body::new("b", DVec3::ZERO, 2.0, 1.0);
        b.apply_force(DVec3::X);
        b.apply_force(DVec3::X * 3.0);
        assert_eq!(b.force(), DVec3::new(4.0, 0.0, 0.0));
        assert_eq!(b.acceleration_under(b.force()), DVec3::new(2.0, 0.0, 0.0));
        b.reset_forces();
        assert_eq!(b.force(), DVec3::ZERO);
    }

    #[test]
    fn test_trail_is_bounded_and_evicts_oldest() {
        let mut b = Body::new("b", DVec3::ZERO, 1.0, 1.0).with_trail_capacity(5);
        for i in 1..=20 {
            let p = DVec3::new(i as f64, 0.0, 0.0);
            b.advance(p, DVec3::ZERO, DVec3::ZERO);
            assert!(b.trail_len() <= 5);
        }
        let xs: Vec<f64> = b.trail().map(|p| p.x).collect();
        assert_eq!(xs, vec![16.0, 17.0, 18.0, 19.0, 20.0]);
    }

    #[test]
    fn test_collision_requires_both_active() {
        let a = Body::new("a", DVec3::ZERO, 1.0, 10.0);
        let mut b = Body::new("b", DVec3::new(15.0, 0.0, 0.0), 1.0, 10.0);
        assert!(a.is_colliding_with(&b));
        b.set_active(false);
        assert!(!a.is_colliding_with(&b));
    }

    #[test]
    fn test_collision_boundary_is_inclusive() {
        let a = Body::new("a", DVec3::ZERO, 1.0, 10.0);
        let b = Body::new("b", DVec3::new(20.0, 0.0, 0.0), 1.0, 10.0);
        assert!(a.is_colliding_with(&b));
    }

    #[test]
    fn test_kinetic_energy() {
        let b = Body::new("b", DVec3::ZERO, 4.0, 1.0).with_velocity(DVec3::new(3.0, 4.0, 0.0));
        assert_eq!(b.kinetic_energy(), 50.0);
    }

    #[test]
    fn test_circular_orbit_is_tangential() {
        let bh = CentralMass::default();
        let mut b = Body::new("b", DVec3::new(4e11, 0.0, 0.0), 1.0, 1.0);
        b.set_circular_orbit(&bh);
        let v = b.velocity();
        assert!(v.dot(b.position()).abs() / (v.length() * 4e11) < 1e-12);
        assert!((v.length() - bh.circular_orbit_speed(4e11)).abs() < 1e-3);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(BodyKind::from_name("gas_cloud"), Some(BodyKind::GasCloud));
        assert_eq!(BodyKind::from_name("Star"), Some(BodyKind::Star));
        assert_eq!(BodyKind::from_name("comet"), None);
        assert_eq!(BodyKind::GasCloud.to_string(), "Gas Cloud");
    }

    #[test]
    fn test_display_mentions_name_and_kind() {
        let b = Body::new("Test Star", DVec3::ZERO, SOLAR_MASS, 4e10).with_kind(BodyKind::Star);
        let info = b.to_string();
        assert!(info.contains("Object: Test Star"));
        assert!(info.contains("Type: Star"));
        assert!(info.contains("Mass: 1.00 solar masses"));
    }
}
