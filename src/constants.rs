//! Physical constants and hard limits shared across the simulation.
//!
//! All values are SI.

/// Gravitational constant (m³ kg⁻¹ s⁻²).
pub const G: f64 = 6.674_30e-11;
/// Speed of light in vacuum (m/s).
pub const C: f64 = 299_792_458.0;
/// Reduced Planck constant (J s).
pub const HBAR: f64 = 1.054_571_817e-34;
/// Boltzmann constant (J/K).
pub const K_B: f64 = 1.380_649e-23;

/// One solar mass (kg).
pub const SOLAR_MASS: f64 = 1.988_92e30;
/// Mass of Sagittarius A*, the default central mass (kg).
pub const SGR_A_STAR_MASS: f64 = 8.54e36;

/// Fraction of the horizon radius inside which central-mass gravity is
/// switched off rather than evaluated.
pub const SINGULARITY_GUARD: f64 = 0.1;

/// Photon sphere radius in units of the horizon radius.
pub const PHOTON_SPHERE_FACTOR: f64 = 1.5;
/// Innermost stable circular orbit in units of the horizon radius.
pub const ISCO_FACTOR: f64 = 3.0;

/// Number of body slots in the GPU objects block.
pub const MAX_BODIES: usize = 16;

/// Default number of trail points kept per body.
pub const DEFAULT_TRAIL_CAPACITY: usize = 100;
