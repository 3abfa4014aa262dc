//! The simulation clock: owns the bodies and the central mass and advances
//! them one step at a time.
//!
//! A step always runs in the same order:
//!
//! 1. forces and integration (or straight-line coasting with gravity off),
//! 2. collision resolution,
//! 3. the horizon sweep.
//!
//! Nothing else mutates the body collection, so once [`Simulation::step`]
//! returns, [`Simulation::bodies`] is stable until the next step.
//!
//! # Example
//!
//! ```ignore
//! let mut sim = Simulation::new(CentralMass::default())
//!     .with_gravity(true)
//!     .with_scheme(IntegrationScheme::Leapfrog);
//! sim.add_body(Body::new("Star", DVec3::new(4e11, 0.0, 0.0), 1.989e30, 4e10))?;
//! sim.step(1.0 / 60.0);
//! ```

use glam::{DVec3, Vec4};
use tracing::{debug, info, warn};

use crate::body::{Body, BodyKind};
use crate::central_mass::CentralMass;
use crate::config::Config;
use crate::constants::{DEFAULT_TRAIL_CAPACITY, G, MAX_BODIES, SOLAR_MASS};
use crate::error::CapacityError;
use crate::integrator::{accumulate_forces, coast, IntegrationScheme};
use crate::interactions::{resolve_collisions, sweep, SweepReport};

/// Steps between progress log lines (one minute at 60 FPS).
const PROGRESS_INTERVAL: u64 = 3600;

/// Bodies and central mass, advanced by [`step`](Self::step).
#[derive(Clone, Debug)]
pub struct Simulation {
    bodies: Vec<Body>,
    central: CentralMass,
    scheme: IntegrationScheme,
    gravity_enabled: bool,
    gravity_constant: f64,
    trail_capacity: usize,
    time: f64,
    steps: u64,
}

impl Simulation {
    /// Empty simulation around `central`, gravity off, RK4.
    pub fn new(central: CentralMass) -> Self {
        Self {
            bodies: Vec::with_capacity(MAX_BODIES),
            central,
            scheme: IntegrationScheme::default(),
            gravity_enabled: false,
            gravity_constant: G,
            trail_capacity: DEFAULT_TRAIL_CAPACITY,
            time: 0.0,
            steps: 0,
        }
    }

    /// Build from configuration. With no configured objects the default
    /// star and planet are added.
    pub fn from_config(config: &Config) -> Self {
        let bh = &config.black_hole;
        let central = CentralMass::new(DVec3::from_array(bh.position), bh.mass, bh.name.clone());
        let physics = &config.physics;
        let mut sim = Self::new(central)
            .with_gravity(physics.enable_gravity)
            .with_scheme(physics.scheme())
            .with_gravity_constant(physics.gravity_constant)
            .with_trail_capacity(physics.trail_length);

        let bodies = if config.objects.is_empty() {
            default_bodies(sim.trail_capacity)
        } else {
            config
                .objects
                .iter()
                .map(|o| o.to_body(sim.trail_capacity))
                .collect()
        };
        for body in bodies {
            // Overflow is already logged by add_body
            let _ = sim.add_body(body);
        }

        info!(
            "Physics initialized: {} bodies, {}, gravity {}",
            sim.bodies.len(),
            sim.scheme,
            if sim.gravity_enabled { "enabled" } else { "disabled" }
        );
        sim
    }

    /// Enable or disable gravity. Disabled bodies coast in straight lines.
    pub fn with_gravity(mut self, enabled: bool) -> Self {
        self.gravity_enabled = enabled;
        self
    }

    /// Integration scheme used while gravity is on.
    pub fn with_scheme(mut self, scheme: IntegrationScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Override `G` for body-body and body-hole forces. Non-positive or
    /// non-finite values are ignored.
    pub fn with_gravity_constant(mut self, g: f64) -> Self {
        if g > 0.0 && g.is_finite() {
            self.gravity_constant = g;
        } else {
            warn!(g, "ignoring invalid gravitational constant");
        }
        self
    }

    /// Trail capacity for bodies created from configuration.
    pub fn with_trail_capacity(mut self, capacity: usize) -> Self {
        self.trail_capacity = capacity.max(1);
        self
    }

    /// Append a body, returning its index.
    ///
    /// Fails without touching the collection once [`MAX_BODIES`] are present.
    pub fn add_body(&mut self, body: Body) -> Result<usize, CapacityError> {
        if self.bodies.len() >= MAX_BODIES {
            warn!(
                "Cannot add body '{}': maximum of {} bodies reached",
                body.name(),
                MAX_BODIES
            );
            return Err(CapacityError {
                capacity: MAX_BODIES,
                rejected: body.name().to_string(),
            });
        }
        info!("Added body: {}", body.name());
        self.bodies.push(body);
        Ok(self.bodies.len() - 1)
    }

    /// Remove the body at `index`, keeping the order of the rest.
    pub fn remove_body(&mut self, index: usize) -> Option<Body> {
        if index >= self.bodies.len() {
            return None;
        }
        let body = self.bodies.remove(index);
        info!("Removed body: {}", body.name());
        Some(body)
    }

    /// Remove every body. The central mass and clock are untouched.
    pub fn clear_bodies(&mut self) {
        self.bodies.clear();
        info!("All bodies cleared");
    }

    /// Stop every body and rewind the clock. Positions are kept.
    pub fn reset(&mut self) {
        self.time = 0.0;
        self.steps = 0;
        for body in &mut self.bodies {
            body.set_velocity(DVec3::ZERO);
            body.reset_forces();
        }
        info!("Physics simulation reset");
    }

    /// Advance by `dt` seconds and return what the horizon sweep removed.
    ///
    /// Non-positive or non-finite `dt` is a no-op.
    pub fn step(&mut self, dt: f64) -> SweepReport {
        if !(dt > 0.0 && dt.is_finite()) {
            return SweepReport::default();
        }

        if self.gravity_enabled {
            accumulate_forces(&mut self.bodies, &self.central, self.gravity_constant);
            self.scheme
                .advance(&mut self.bodies, &self.central, self.gravity_constant, dt);
        } else {
            coast(&mut self.bodies, dt);
        }

        resolve_collisions(&mut self.bodies);
        let report = sweep(&mut self.bodies, &self.central);

        self.time += dt;
        self.steps += 1;
        if self.steps % PROGRESS_INTERVAL == 0 {
            debug!(
                "Physics: {} steps, {:.1}s simulated, {} bodies",
                self.steps,
                self.time,
                self.bodies.len()
            );
        }
        report
    }

    /// Flip gravity on or off, returning the new state.
    pub fn toggle_gravity(&mut self) -> bool {
        self.gravity_enabled = !self.gravity_enabled;
        info!(
            "Gravity {}",
            if self.gravity_enabled { "enabled" } else { "disabled" }
        );
        self.gravity_enabled
    }

    /// Turn gravity on or off.
    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }

    #[inline]
    pub fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// Switch integration scheme; takes effect on the next step.
    pub fn set_scheme(&mut self, scheme: IntegrationScheme) {
        if scheme != self.scheme {
            info!("Integration method: {}", scheme);
        }
        self.scheme = scheme;
    }

    #[inline]
    pub fn scheme(&self) -> IntegrationScheme {
        self.scheme
    }

    /// Bodies in insertion order.
    #[inline]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, index: usize) -> Option<&Body> {
        self.bodies.get(index)
    }

    pub fn body_mut(&mut self, index: usize) -> Option<&mut Body> {
        self.bodies.get_mut(index)
    }

    #[inline]
    pub fn central(&self) -> &CentralMass {
        &self.central
    }

    /// Mutable access for mass or position changes; the horizon radius
    /// follows through [`CentralMass::set_mass`].
    pub fn central_mut(&mut self) -> &mut CentralMass {
        &mut self.central
    }

    #[inline]
    pub fn gravity_constant(&self) -> f64 {
        self.gravity_constant
    }

    /// Simulated seconds since start or last reset.
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.bodies
            .iter()
            .filter(|b| b.is_active())
            .map(Body::kinetic_energy)
            .sum()
    }

    /// Body-hole and body-body Newtonian potential energy.
    pub fn potential_energy(&self) -> f64 {
        let g = self.gravity_constant;
        let active: Vec<&Body> = self.bodies.iter().filter(|b| b.is_active()).collect();
        let mut total = 0.0;
        for (i, a) in active.iter().enumerate() {
            let r = self.central.distance_to(a.position());
            if r > 0.0 {
                total -= g * self.central.mass() * a.mass() / r;
            }
            for b in &active[i + 1..] {
                let r = a.distance_to(b);
                if r > 0.0 {
                    total -= g * a.mass() * b.mass() / r;
                }
            }
        }
        total
    }

    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy() + self.potential_energy()
    }
}

/// The star and planet used when no objects are configured.
pub fn default_bodies(trail_capacity: usize) -> Vec<Body> {
    vec![
        Body::new("Test Star 1", DVec3::new(4e11, 0.0, 0.0), SOLAR_MASS, 4e10)
            .with_color(Vec4::new(1.0, 1.0, 0.0, 1.0))
            .with_kind(BodyKind::Star)
            .with_trail_capacity(trail_capacity),
        Body::new("Test Planet 1", DVec3::new(0.0, 0.0, 4e11), 5.972e24, 4e10)
            .with_color(Vec4::new(1.0, 0.0, 0.0, 1.0))
            .with_kind(BodyKind::Planet)
            .with_trail_capacity(trail_capacity),
    ]
}
