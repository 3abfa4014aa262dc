//! Gravitational forces and time integration.
//!
//! One step is:
//!
//! 1. [`accumulate_forces`] pushes pairwise and central-mass gravity into each
//!    body's force accumulator,
//! 2. [`IntegrationScheme::advance`] moves every active body by `dt`,
//! 3. the accumulators are cleared.
//!
//! Leapfrog and RK4 need accelerations at trial positions as well; those use
//! the same force law and the same guards as step 1, so a body inside the
//! singularity guard or a coincident pair never produces a non-finite value.

use std::fmt;
use std::str::FromStr;

use glam::DVec3;
use tracing::warn;

use crate::body::Body;
use crate::central_mass::CentralMass;

/// Numerical scheme used to advance bodies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IntegrationScheme {
    /// First-order explicit: `v += a dt; x += v dt`.
    Euler,
    /// Kick-drift-kick, second order, two force evaluations.
    Leapfrog,
    /// Classical fourth-order Runge-Kutta over the whole system.
    #[default]
    Rk4,
}

impl IntegrationScheme {
    pub const ALL: [IntegrationScheme; 3] = [Self::Euler, Self::Leapfrog, Self::Rk4];

    /// Configuration name: `"euler"`, `"leapfrog"` or `"rk4"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Euler => "euler",
            Self::Leapfrog => "leapfrog",
            Self::Rk4 => "rk4",
        }
    }

    /// Parse a configuration name, falling back to RK4 with a warning.
    pub fn parse_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!("unknown integration method '{}', using rk4", name);
            Self::Rk4
        })
    }

    /// Advance every active body by `dt` and clear all force accumulators.
    ///
    /// Expects forces for the current positions to be accumulated already.
    pub fn advance(&self, bodies: &mut [Body], central: &CentralMass, g: f64, dt: f64) {
        match self {
            Self::Euler => euler(bodies, dt),
            Self::Leapfrog => leapfrog(bodies, central, g, dt),
            Self::Rk4 => rk4(bodies, central, g, dt),
        }
        for body in bodies.iter_mut() {
            body.reset_forces();
        }
    }
}

impl fmt::Display for IntegrationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Euler => "Euler",
            Self::Leapfrog => "Leapfrog",
            Self::Rk4 => "Runge-Kutta 4",
        };
        f.write_str(s)
    }
}

/// Error returned when parsing an unknown scheme name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownScheme(pub String);

impl fmt::Display for UnknownScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown integration method '{}'", self.0)
    }
}

impl std::error::Error for UnknownScheme {}

impl FromStr for IntegrationScheme {
    type Err = UnknownScheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "euler" => Ok(Self::Euler),
            "leapfrog" => Ok(Self::Leapfrog),
            "rk4" => Ok(Self::Rk4),
            _ => Err(UnknownScheme(s.to_string())),
        }
    }
}

/// Newtonian force `G m₁ m₂ / r²` on a body at `from` exerted by one at `to`.
///
/// `None` when the two positions coincide.
#[inline]
fn newtonian_force(from: DVec3, to: DVec3, m1: f64, m2: f64, g: f64) -> Option<DVec3> {
    let offset = to - from;
    let r2 = offset.length_squared();
    if r2 <= 0.0 {
        return None;
    }
    let r = r2.sqrt();
    Some(offset / r * (g * m1 * m2 / r2))
}

/// Force `b` exerts on `a`. The force on `b` is the negation.
pub fn pairwise_force(a: &Body, b: &Body, g: f64) -> Option<DVec3> {
    newtonian_force(a.position(), b.position(), a.mass(), b.mass(), g)
}

/// Force of the central mass on a body of `mass` at `position`.
///
/// Zero strictly inside the singularity guard, matching
/// [`CentralMass::gravitational_acceleration`].
#[inline]
fn central_force_at(position: DVec3, mass: f64, central: &CentralMass, g: f64) -> DVec3 {
    let r = central.distance_to(position);
    if r < central.singularity_guard_radius() {
        return DVec3::ZERO;
    }
    newtonian_force(position, central.position(), mass, central.mass(), g).unwrap_or(DVec3::ZERO)
}

/// Force of the central mass on `body`.
pub fn central_force(body: &Body, central: &CentralMass, g: f64) -> DVec3 {
    central_force_at(body.position(), body.mass(), central, g)
}

/// Push pairwise and central-mass gravity into the accumulators of all
/// active bodies.
pub fn accumulate_forces(bodies: &mut [Body], central: &CentralMass, g: f64) {
    for i in 0..bodies.len() {
        let (head, tail) = bodies.split_at_mut(i + 1);
        let a = &mut head[i];
        if !a.is_active() {
            continue;
        }
        for b in tail.iter_mut().filter(|b| b.is_active()) {
            if let Some(force) = pairwise_force(a, b, g) {
                a.apply_force(force);
                b.apply_force(-force);
            }
        }
    }

    for body in bodies.iter_mut().filter(|b| b.is_active()) {
        let force = central_force(body, central, g);
        body.apply_force(force);
    }
}

/// Accelerations of all bodies if they were at `positions`.
///
/// Inactive bodies neither feel nor exert gravity.
fn accelerations_at(
    bodies: &[Body],
    positions: &[DVec3],
    central: &CentralMass,
    g: f64,
) -> Vec<DVec3> {
    bodies
        .iter()
        .enumerate()
        .map(|(i, body)| {
            if !body.is_active() {
                return DVec3::ZERO;
            }
            let mut force = central_force_at(positions[i], body.mass(), central, g);
            for (j, other) in bodies.iter().enumerate() {
                if j == i || !other.is_active() {
                    continue;
                }
                if let Some(f) =
                    newtonian_force(positions[i], positions[j], body.mass(), other.mass(), g)
                {
                    force += f;
                }
            }
            body.acceleration_under(force)
        })
        .collect()
}

/// Write a step result back, refusing non-finite states.
fn commit(body: &mut Body, position: DVec3, velocity: DVec3, acceleration: DVec3) {
    if position.is_finite() && velocity.is_finite() {
        body.advance(position, velocity, acceleration);
    } else {
        warn!(body = %body.name(), "discarding non-finite integration result");
    }
}

/// Move bodies along their current velocity. Used when gravity is off.
pub fn coast(bodies: &mut [Body], dt: f64) {
    for body in bodies.iter_mut().filter(|b| b.is_active()) {
        let position = body.position() + body.velocity() * dt;
        let velocity = body.velocity();
        commit(body, position, velocity, DVec3::ZERO);
    }
    for body in bodies.iter_mut() {
        body.reset_forces();
    }
}

fn euler(bodies: &mut [Body], dt: f64) {
    for body in bodies.iter_mut().filter(|b| b.is_active()) {
        let a = body.acceleration_under(body.force());
        let v = body.velocity() + a * dt;
        let x = body.position() + v * dt;
        commit(body, x, v, a);
    }
}

fn leapfrog(bodies: &mut [Body], central: &CentralMass, g: f64, dt: f64) {
    let half_dt = 0.5 * dt;

    // Kick and drift with a(xₙ) from the accumulators
    let a0: Vec<DVec3> = bodies.iter().map(|b| b.acceleration_under(b.force())).collect();
    let v_half: Vec<DVec3> = bodies
        .iter()
        .zip(&a0)
        .map(|(b, a)| b.velocity() + *a * half_dt)
        .collect();
    let x1: Vec<DVec3> = bodies
        .iter()
        .zip(&v_half)
        .map(|(b, v)| if b.is_active() { b.position() + *v * dt } else { b.position() })
        .collect();

    // Second kick with a(xₙ₊₁)
    let a1 = accelerations_at(bodies, &x1, central, g);

    for (i, body) in bodies.iter_mut().enumerate() {
        if !body.is_active() {
            continue;
        }
        let v1 = v_half[i] + a1[i] * half_dt;
        commit(body, x1[i], v1, a0[i]);
    }
}

fn rk4(bodies: &mut [Body], central: &CentralMass, g: f64, dt: f64) {
    let half_dt = 0.5 * dt;
    let active: Vec<bool> = bodies.iter().map(|b| b.is_active()).collect();
    let x0: Vec<DVec3> = bodies.iter().map(|b| b.position()).collect();
    let v0: Vec<DVec3> = bodies.iter().map(|b| b.velocity()).collect();

    // Trial positions x0 + dx·h for active bodies only
    let offset = |dx: &[DVec3], h: f64| -> Vec<DVec3> {
        x0.iter()
            .zip(dx)
            .zip(&active)
            .map(|((x, d), &on)| if on { *x + *d * h } else { *x })
            .collect()
    };
    let shifted = |dv: &[DVec3], h: f64| -> Vec<DVec3> {
        v0.iter().zip(dv).map(|(v, d)| *v + *d * h).collect()
    };

    let k1v: Vec<DVec3> = bodies.iter().map(|b| b.acceleration_under(b.force())).collect();
    let k1x = v0.clone();

    let k2x = shifted(&k1v, half_dt);
    let k2v = accelerations_at(bodies, &offset(&k1x, half_dt), central, g);

    let k3x = shifted(&k2v, half_dt);
    let k3v = accelerations_at(bodies, &offset(&k2x, half_dt), central, g);

    let k4x = shifted(&k3v, dt);
    let k4v = accelerations_at(bodies, &offset(&k3x, dt), central, g);

    let sixth = dt / 6.0;
    for (i, body) in bodies.iter_mut().enumerate() {
        if !active[i] {
            continue;
        }
        let x = x0[i] + (k1x[i] + 2.0 * k2x[i] + 2.0 * k3x[i] + k4x[i]) * sixth;
        let v = v0[i] + (k1v[i] + 2.0 * k2v[i] + 2.0 * k3v[i] + k4v[i]) * sixth;
        commit(body, x, v, k1v[i]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::G;

    fn far_central() -> CentralMass {
        // Tiny hole far away, so only pairwise forces matter
        CentralMass::new(DVec3::new(1e30, 0.0, 0.0), 1.0, "far")
    }

    fn orbiting_body(scheme_label: &str) -> (Vec<Body>, CentralMass) {
        let central = CentralMass::default();
        let mut body = Body::new(scheme_label, DVec3::new(1e11, 0.0, 0.0), 1.0, 1.0);
        body.set_circular_orbit(&central);
        (vec![body], central)
    }

    #[test]
    fn test_scheme_names_roundtrip() {
        for scheme in IntegrationScheme::ALL {
            assert_eq!(scheme.name().parse::<IntegrationScheme>(), Ok(scheme));
        }
        assert_eq!("RK4".parse::<IntegrationScheme>(), Ok(IntegrationScheme::Rk4));
        assert!("verlet".parse::<IntegrationScheme>().is_err());
        assert_eq!(IntegrationScheme::parse_or_default("verlet"), IntegrationScheme::Rk4);
        assert_eq!(IntegrationScheme::default(), IntegrationScheme::Rk4);
        assert_eq!(IntegrationScheme::Rk4.to_string(), "Runge-Kutta 4");
    }

    #[test]
    fn test_pairwise_force_magnitude() {
        let a = Body::new("a", DVec3::ZERO, 2.0, 1.0);
        let b = Body::new("b", DVec3::new(10.0, 0.0, 0.0), 3.0, 1.0);
        let f = pairwise_force(&a, &b, G).unwrap();
        let expected = G * 6.0 / 100.0;
        assert!((f.x - expected).abs() < 1e-24);
        assert_eq!(f.y, 0.0);
    }

    #[test]
    fn test_pairwise_force_skips_coincident() {
        let a = Body::new("a", DVec3::ONE, 2.0, 1.0);
        let b = Body::new("b", DVec3::ONE, 3.0, 1.0);
        assert!(pairwise_force(&a, &b, G).is_none());
    }

    #[test]
    fn test_accumulate_obeys_third_law() {
        let mut bodies = vec![
            Body::new("a", DVec3::new(-1e3, 5.0, 0.0), 5e20, 1.0),
            Body::new("b", DVec3::new(2e3, -7.0, 3e2), 7e22, 1.0),
        ];
        accumulate_forces(&mut bodies, &far_central(), G);
        let sum = bodies[0].force() + bodies[1].force();
        assert!(sum.length() <= 1e-12 * bodies[0].force().length());
    }

    #[test]
    fn test_third_law_random_systems() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let mut bodies: Vec<Body> = (0..6)
                .map(|i| {
                    let p = DVec3::new(
                        rng.gen_range(-1e12..1e12),
                        rng.gen_range(-1e12..1e12),
                        rng.gen_range(-1e12..1e12),
                    );
                    Body::new(format!("b{i}"), p, rng.gen_range(1e20..1e30), 1.0)
                })
                .collect();
            accumulate_forces(&mut bodies, &far_central(), G);
            let total: DVec3 = bodies.iter().map(|b| b.force()).sum();
            let largest = bodies.iter().map(|b| b.force().length()).fold(0.0, f64::max);
            assert!(total.length() <= 1e-9 * largest);
        }
    }

    #[test]
    fn test_central_force_suppressed_inside_guard() {
        let central = CentralMass::default();
        let inside = Body::new("in", DVec3::new(central.singularity_guard_radius() * 0.9, 0.0, 0.0), 1e20, 1.0);
        let at_center = Body::new("center", DVec3::ZERO, 1e20, 1.0);
        assert_eq!(central_force(&inside, &central, G), DVec3::ZERO);
        assert_eq!(central_force(&at_center, &central, G), DVec3::ZERO);
    }

    #[test]
    fn test_central_force_matches_model_acceleration() {
        let central = CentralMass::default();
        let body = Body::new("b", DVec3::new(0.0, 3e11, 4e11), 10.0, 1.0);
        let f = central_force(&body, &central, G);
        let a = central.gravitational_acceleration(body.position());
        assert!((f / 10.0 - a).length() <= 1e-12 * a.length());
    }

    #[test]
    fn test_central_force_active_at_guard_boundary() {
        let central = CentralMass::default();
        let guard = central.singularity_guard_radius();
        let body = Body::new("edge", DVec3::new(guard, 0.0, 0.0), 10.0, 1.0);
        let a = central.gravitational_acceleration(body.position());
        assert!(a.x < 0.0);
        let f = central_force(&body, &central, G);
        assert!((f / 10.0 - a).length() <= 1e-12 * a.length());
    }

    #[test]
    fn test_inactive_bodies_receive_no_force() {
        let mut bodies = vec![
            Body::new("a", DVec3::new(1e11, 0.0, 0.0), 1e24, 1.0),
            Body::new("b", DVec3::new(2e11, 0.0, 0.0), 1e24, 1.0),
        ];
        bodies[1].set_active(false);
        accumulate_forces(&mut bodies, &CentralMass::default(), G);
        assert_eq!(bodies[1].force(), DVec3::ZERO);
        // a only feels the hole
        let expected = central_force(&bodies[0], &CentralMass::default(), G);
        assert_eq!(bodies[0].force(), expected);
    }

    #[test]
    fn test_forces_reset_after_advance() {
        for scheme in IntegrationScheme::ALL {
            let (mut bodies, central) = orbiting_body("b");
            accumulate_forces(&mut bodies, &central, G);
            assert_ne!(bodies[0].force(), DVec3::ZERO);
            scheme.advance(&mut bodies, &central, G, 1.0);
            assert_eq!(bodies[0].force(), DVec3::ZERO, "{scheme}");
        }
    }

    #[test]
    fn test_massless_body_never_accelerates() {
        for scheme in IntegrationScheme::ALL {
            let central = CentralMass::default();
            let v = DVec3::new(0.0, 1e3, 0.0);
            let mut bodies = vec![
                Body::new("tracer", DVec3::new(1e11, 0.0, 0.0), 0.0, 1.0).with_velocity(v),
                Body::new("heavy", DVec3::new(1.1e11, 0.0, 0.0), 1e30, 1.0),
            ];
            for _ in 0..10 {
                accumulate_forces(&mut bodies, &central, G);
                bodies[0].apply_force(DVec3::splat(1e35));
                scheme.advance(&mut bodies, &central, G, 10.0);
                assert_eq!(bodies[0].velocity(), v, "{scheme}");
            }
        }
    }

    #[test]
    fn test_schemes_produce_distinct_orbits() {
        let dt = 100.0;
        let final_positions: Vec<DVec3> = IntegrationScheme::ALL
            .iter()
            .map(|scheme| {
                let (mut bodies, central) = orbiting_body(scheme.name());
                for _ in 0..20 {
                    accumulate_forces(&mut bodies, &central, G);
                    scheme.advance(&mut bodies, &central, G, dt);
                }
                bodies[0].position()
            })
            .collect();

        let scale = 1e11;
        for i in 0..3 {
            for j in (i + 1)..3 {
                let gap = (final_positions[i] - final_positions[j]).length();
                assert!(gap > 1e-6 * scale, "schemes {i} and {j} agree: gap {gap}");
            }
        }
    }

    #[test]
    fn test_higher_order_schemes_hold_orbit_radius() {
        let dt = 100.0;
        let drift = |scheme: IntegrationScheme| {
            let (mut bodies, central) = orbiting_body("b");
            let mut worst: f64 = 0.0;
            for _ in 0..50 {
                accumulate_forces(&mut bodies, &central, G);
                scheme.advance(&mut bodies, &central, G, dt);
                worst = worst.max((bodies[0].position().length() - 1e11).abs());
            }
            worst
        };
        assert!(drift(IntegrationScheme::Rk4) < drift(IntegrationScheme::Euler));
        assert!(drift(IntegrationScheme::Leapfrog) < drift(IntegrationScheme::Euler));
    }

    #[test]
    fn test_coast_moves_in_straight_line() {
        let v = DVec3::new(1.0, 2.0, 3.0);
        let mut bodies = vec![Body::new("b", DVec3::ZERO, 1.0, 1.0).with_velocity(v)];
        bodies[0].apply_force(DVec3::X * 100.0);
        coast(&mut bodies, 2.0);
        assert_eq!(bodies[0].position(), v * 2.0);
        assert_eq!(bodies[0].velocity(), v);
        assert_eq!(bodies[0].force(), DVec3::ZERO);
    }

    #[test]
    fn test_inactive_bodies_do_not_move() {
        for scheme in IntegrationScheme::ALL {
            let central = CentralMass::default();
            let start = DVec3::new(2e11, 0.0, 0.0);
            let mut bodies = vec![Body::new("b", start, 1.0, 1.0).with_velocity(DVec3::Y * 1e4)];
            bodies[0].set_active(false);
            accumulate_forces(&mut bodies, &central, G);
            scheme.advance(&mut bodies, &central, G, 10.0);
            assert_eq!(bodies[0].position(), start);
        }
    }
}
