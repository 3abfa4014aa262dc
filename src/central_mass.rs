//! Schwarzschild model of the central black hole.
//!
//! [`CentralMass`] is the only stateful piece: it caches the horizon radius
//! and recomputes it whenever the mass changes. Everything else is a pure
//! function of mass and distance.
//!
//! ```ignore
//! let bh = CentralMass::new(DVec3::ZERO, SGR_A_STAR_MASS, "Sagittarius A*");
//! assert!(bh.is_inside_horizon(DVec3::ZERO));
//! assert_eq!(bh.metric_coefficient(bh.horizon_radius()), 0.0);
//! ```

use std::f64::consts::PI;

use glam::DVec3;
use tracing::{debug, info, warn};

use crate::constants::{
    C, G, HBAR, ISCO_FACTOR, K_B, PHOTON_SPHERE_FACTOR, SGR_A_STAR_MASS, SINGULARITY_GUARD,
};

/// Vertical shift of the curvature grid, in meters.
const CURVATURE_OFFSET: f64 = 3.0e10;

/// Schwarzschild radius `2GM/c²` for a mass in kilograms.
#[inline]
pub fn horizon_radius_for(mass: f64) -> f64 {
    2.0 * G * mass / (C * C)
}

/// A non-rotating, uncharged black hole.
#[derive(Clone, Debug)]
pub struct CentralMass {
    position: DVec3,
    mass: f64,
    /// Always `horizon_radius_for(mass)`; only written by `set_mass`.
    horizon_radius: f64,
    name: String,
}

impl CentralMass {
    /// Create a black hole. Non-positive or non-finite masses are replaced by
    /// the Sagittarius A* mass.
    pub fn new(position: DVec3, mass: f64, name: impl Into<String>) -> Self {
        let name = name.into();
        let mass = if mass > 0.0 && mass.is_finite() {
            mass
        } else {
            warn!(name = %name, mass, "invalid central mass, using Sagittarius A* mass");
            SGR_A_STAR_MASS
        };

        let bh = Self {
            position,
            mass,
            horizon_radius: horizon_radius_for(mass),
            name,
        };
        info!(
            "Black hole '{}' created with mass {:e} kg, Rs = {:e} m",
            bh.name, bh.mass, bh.horizon_radius
        );
        bh
    }

    #[inline]
    pub fn position(&self) -> DVec3 {
        self.position
    }

    pub fn set_position(&mut self, position: DVec3) {
        self.position = position;
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Change the mass and recompute the horizon radius in the same call.
    ///
    /// Non-positive or non-finite values are ignored.
    pub fn set_mass(&mut self, mass: f64) {
        if !(mass > 0.0 && mass.is_finite()) {
            warn!(name = %self.name, mass, "ignoring invalid central mass");
            return;
        }
        self.mass = mass;
        self.horizon_radius = horizon_radius_for(mass);
        debug!(
            "Black hole '{}' mass updated: {:e} kg, Rs = {:e} m",
            self.name, self.mass, self.horizon_radius
        );
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Event horizon (Schwarzschild) radius in meters.
    #[inline]
    pub fn horizon_radius(&self) -> f64 {
        self.horizon_radius
    }

    /// Radius at which light can orbit, `1.5 r_s`.
    #[inline]
    pub fn photon_sphere_radius(&self) -> f64 {
        PHOTON_SPHERE_FACTOR * self.horizon_radius
    }

    /// Innermost stable circular orbit, `3 r_s`.
    #[inline]
    pub fn isco_radius(&self) -> f64 {
        ISCO_FACTOR * self.horizon_radius
    }

    /// Distance inside which central gravity is not applied.
    #[inline]
    pub fn singularity_guard_radius(&self) -> f64 {
        SINGULARITY_GUARD * self.horizon_radius
    }

    #[inline]
    pub fn distance_to(&self, point: DVec3) -> f64 {
        (point - self.position).length()
    }

    pub fn is_inside_horizon(&self, point: DVec3) -> bool {
        self.distance_to(point) <= self.horizon_radius
    }

    pub fn is_inside_photon_sphere(&self, point: DVec3) -> bool {
        self.distance_to(point) <= self.photon_sphere_radius()
    }

    /// Newtonian acceleration toward the center.
    ///
    /// Returns zero inside the singularity guard; the pull is switched off
    /// there, not clamped.
    pub fn gravitational_acceleration(&self, point: DVec3) -> DVec3 {
        let offset = self.position - point;
        let r = offset.length();
        if r < self.singularity_guard_radius() || r <= 0.0 {
            return DVec3::ZERO;
        }
        offset / r * (G * self.mass / (r * r))
    }

    /// Newtonian potential `-GM/r`, with `r` floored at the guard radius.
    pub fn gravitational_potential(&self, point: DVec3) -> f64 {
        let r = self.distance_to(point).max(self.singularity_guard_radius());
        if r <= 0.0 {
            return 0.0;
        }
        -G * self.mass / r
    }

    /// `g_tt = 1 - r_s/r` outside the horizon, exactly 0 at or inside it.
    pub fn metric_coefficient(&self, radius: f64) -> f64 {
        if radius <= self.horizon_radius {
            return 0.0;
        }
        1.0 - self.horizon_radius / radius
    }

    /// Ratio of proper time to coordinate time at `radius`.
    ///
    /// Zero at and inside the horizon.
    pub fn time_dilation_factor(&self, radius: f64) -> f64 {
        let g_tt = self.metric_coefficient(radius);
        if g_tt <= 0.0 {
            return 0.0;
        }
        g_tt.sqrt()
    }

    /// Height of the curvature grid at `point`, in meters.
    ///
    /// `2·sqrt(r_s·(r − r_s)) − 3e10` outside the horizon: the Flamm
    /// paraboloid, shifted down so the funnel dips below the disk plane.
    /// Inside the horizon the funnel is capped at `2·r_s − 3e10`. This is a
    /// picture of the curvature, not a metric quantity.
    pub fn spacetime_curvature(&self, point: DVec3) -> f64 {
        let r = self.distance_to(point);
        let rs = self.horizon_radius;
        let height = if r <= rs {
            2.0 * rs
        } else {
            2.0 * (rs * (r - rs)).sqrt()
        };
        height - CURVATURE_OFFSET
    }

    /// Hawking temperature `ħc³ / (8πGMk_B)` in kelvin.
    pub fn hawking_temperature(&self) -> f64 {
        (HBAR * C * C * C) / (8.0 * PI * G * self.mass * K_B)
    }

    /// Bekenstein-Hawking entropy `k_B c³ A / (4ħG)` in J/K.
    pub fn bekenstein_hawking_entropy(&self) -> f64 {
        let area = 4.0 * PI * self.horizon_radius * self.horizon_radius;
        (K_B * C * C * C * area) / (4.0 * HBAR * G)
    }

    /// Speed needed to escape from `radius`, zero for non-positive radii.
    pub fn escape_velocity(&self, radius: f64) -> f64 {
        if radius <= 0.0 {
            return 0.0;
        }
        (2.0 * G * self.mass / radius).sqrt()
    }

    /// Speed of a circular Newtonian orbit at `radius`.
    pub fn circular_orbit_speed(&self, radius: f64) -> f64 {
        if radius <= 0.0 {
            return 0.0;
        }
        (G * self.mass / radius).sqrt()
    }
}

impl Default for CentralMass {
    fn default() -> Self {
        Self::new(DVec3::ZERO, SGR_A_STAR_MASS, "Sagittarius A*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SOLAR_MASS;

    #[test]
    fn test_horizon_radius_of_sun() {
        // ~2.95 km for one solar mass
        let rs = horizon_radius_for(SOLAR_MASS);
        assert!((rs - 2954.0).abs() < 5.0, "rs = {}", rs);
    }

    #[test]
    fn test_horizon_radius_strictly_increasing() {
        let mut previous = horizon_radius_for(1.0);
        for exp in 1..40 {
            let rs = horizon_radius_for(10f64.powi(exp));
            assert!(rs > previous);
            previous = rs;
        }
    }

    #[test]
    fn test_spacetime_curvature() {
        let bh = CentralMass::default();
        let rs = bh.horizon_radius();

        // Capped funnel at and inside the horizon
        let cap = 2.0 * rs - 3.0e10;
        assert_eq!(bh.spacetime_curvature(DVec3::ZERO), cap);
        assert_eq!(bh.spacetime_curvature(DVec3::new(rs, 0.0, 0.0)), cap);

        // Flamm paraboloid outside, rising with distance
        let r = 5.0 * rs;
        let expected = 2.0 * (rs * (r - rs)).sqrt() - 3.0e10;
        let h = bh.spacetime_curvature(DVec3::new(0.0, 0.0, r));
        assert!((h - expected).abs() <= 1e-6 * expected.abs());
        assert!(bh.spacetime_curvature(DVec3::new(0.0, 0.0, 2.0 * r)) > h);
    }

    #[test]
    fn test_set_mass_recomputes_horizon() {
        let mut bh = CentralMass::default();
        let before = bh.horizon_radius();
        bh.set_mass(SGR_A_STAR_MASS * 2.0);
        assert!((bh.horizon_radius() - 2.0 * before).abs() / before < 1e-12);
        assert_eq!(bh.horizon_radius(), horizon_radius_for(bh.mass()));
    }

    #[test]
    fn test_set_mass_rejects_invalid() {
        let mut bh = CentralMass::default();
        bh.set_mass(-1.0);
        bh.set_mass(f64::NAN);
        assert_eq!(bh.mass(), SGR_A_STAR_MASS);
    }

    #[test]
    fn test_derived_radii() {
        let bh = CentralMass::default();
        let rs = bh.horizon_radius();
        assert_eq!(bh.photon_sphere_radius(), 1.5 * rs);
        assert_eq!(bh.isco_radius(), 3.0 * rs);
    }

    #[test]
    fn test_metric_coefficient_at_horizon_is_zero() {
        let bh = CentralMass::default();
        assert_eq!(bh.metric_coefficient(bh.horizon_radius()), 0.0);
        assert_eq!(bh.metric_coefficient(0.0), 0.0);
        assert!((bh.metric_coefficient(2.0 * bh.horizon_radius()) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_time_dilation_limits() {
        let bh = CentralMass::default();
        let rs = bh.horizon_radius();
        assert_eq!(bh.time_dilation_factor(rs), 0.0);
        assert_eq!(bh.time_dilation_factor(0.5 * rs), 0.0);
        assert!((1.0 - bh.time_dilation_factor(1e9 * rs)) < 1e-8);
        assert!(bh.time_dilation_factor(1e3 * rs) < bh.time_dilation_factor(1e6 * rs));
    }

    #[test]
    fn test_acceleration_points_toward_center() {
        let bh = CentralMass::default();
        let p = DVec3::new(4e11, 0.0, 0.0);
        let a = bh.gravitational_acceleration(p);
        assert!(a.x < 0.0);
        assert_eq!(a.y, 0.0);
        let expected = G * bh.mass() / (4e11 * 4e11);
        assert!((a.length() - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_acceleration_zero_inside_guard() {
        let bh = CentralMass::default();
        let inside = DVec3::new(bh.singularity_guard_radius() * 0.5, 0.0, 0.0);
        assert_eq!(bh.gravitational_acceleration(inside), DVec3::ZERO);
        assert_eq!(bh.gravitational_acceleration(DVec3::ZERO), DVec3::ZERO);
    }

    #[test]
    fn test_potential_is_floored() {
        let bh = CentralMass::default();
        let at_center = bh.gravitational_potential(DVec3::ZERO);
        let at_guard =
            bh.gravitational_potential(DVec3::new(bh.singularity_guard_radius(), 0.0, 0.0));
        assert!(at_center.is_finite());
        assert_eq!(at_center, at_guard);
    }

    #[test]
    fn test_horizon_containment() {
        let bh = CentralMass::default();
        let rs = bh.horizon_radius();
        assert!(bh.is_inside_horizon(DVec3::new(rs, 0.0, 0.0)));
        assert!(!bh.is_inside_horizon(DVec3::new(rs * 1.01, 0.0, 0.0)));
        assert!(bh.is_inside_photon_sphere(DVec3::new(rs * 1.4, 0.0, 0.0)));
    }

    #[test]
    fn test_thermodynamics_are_finite_and_positive() {
        let bh = CentralMass::default();
        let t = bh.hawking_temperature();
        let s = bh.bekenstein_hawking_entropy();
        assert!(t > 0.0 && t.is_finite());
        assert!(s > 0.0 && s.is_finite());

        // Heavier holes are colder
        let mut heavy = bh.clone();
        heavy.set_mass(bh.mass() * 10.0);
        assert!(heavy.hawking_temperature() < t);
    }

    #[test]
    fn test_invalid_construction_falls_back() {
        let bh = CentralMass::new(DVec3::ZERO, 0.0, "empty");
        assert_eq!(bh.mass(), SGR_A_STAR_MASS);
        assert!(bh.horizon_radius() > 0.0);
    }
}
