//! # Horizon
//!
//! N-body simulation around a Schwarzschild black hole, rendered by a GPU
//! ray tracer that bends light through the hole's curved spacetime.
//!
//! The crate splits into a CPU side and a GPU side that meet at one seam:
//!
//! - [`Simulation`] owns the [`CentralMass`] and up to [`MAX_BODIES`]
//!   [`Body`] values and advances them with an [`IntegrationScheme`],
//!   resolving collisions and removing bodies that cross the horizon.
//! - [`SceneSnapshotMarshaler`] reads the bodies and a [`CameraState`] each
//!   frame, picks a resolution tier, and packs the uniform blocks the
//!   ray-tracing kernel reads.
//! - [`gpu::RayTracer`] uploads the snapshot and dispatches the kernel,
//!   then draws the [`SpacetimeGrid`] overlay on top.
//!
//! ## Quick Start
//!
//! ```ignore
//! use horizon::prelude::*;
//!
//! let mut sim = Simulation::new(CentralMass::default()).with_gravity(true);
//! sim.add_body(
//!     Body::new("Star", DVec3::new(4e11, 0.0, 0.0), SOLAR_MASS, 4e10)
//!         .with_kind(BodyKind::Star),
//! )?;
//! sim.step(1.0 / 60.0);
//!
//! let camera = FixedCamera::looking_at(Vec3::new(0.0, 0.0, 6.3e10), Vec3::ZERO);
//! let marshaler = SceneSnapshotMarshaler::from_config(&Config::default());
//! let snapshot = marshaler.marshal(&camera, sim.bodies());
//! ```
//!
//! ## Units
//!
//! Everything on the CPU side is SI: meters, kilograms, seconds, in `f64`.
//! Uniform blocks narrow to `f32` at packing time.
//!
//! ## Running the viewer
//!
//! The `horizon` binary opens a window driven by [`app::App`]. Scenes come
//! from a JSON [`Config`]; see [`config`] for the format.

pub mod app;
pub mod body;
pub mod camera;
pub mod central_mass;
pub mod config;
pub mod constants;
pub mod error;
pub mod gpu;
pub mod grid;
pub mod integrator;
pub mod interactions;
pub mod logging;
pub mod shaders;
pub mod simulation;
pub mod snapshot;
pub mod time;
pub mod uniforms;

pub use body::{Body, BodyKind};
pub use camera::{CameraState, FixedCamera, OrbitCamera};
pub use central_mass::CentralMass;
pub use config::Config;
pub use constants::MAX_BODIES;
pub use error::{AppError, CapacityError, ConfigError, GpuError};
pub use glam::{DVec3, Vec3, Vec4};
pub use grid::SpacetimeGrid;
pub use integrator::IntegrationScheme;
pub use interactions::SweepReport;
pub use simulation::Simulation;
pub use snapshot::{Resolution, SceneSnapshot, SceneSnapshotMarshaler, Tier};
pub use uniforms::{CameraBlock, DiskBlock, GridBlock, ObjectsBlock};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use horizon::prelude::*;
/// ```
pub mod prelude {
    pub use crate::body::{Body, BodyKind};
    pub use crate::camera::{CameraState, FixedCamera, OrbitCamera};
    pub use crate::central_mass::CentralMass;
    pub use crate::config::Config;
    pub use crate::constants::{MAX_BODIES, SOLAR_MASS};
    pub use crate::integrator::IntegrationScheme;
    pub use crate::simulation::Simulation;
    pub use crate::snapshot::{SceneSnapshot, SceneSnapshotMarshaler};
    pub use crate::{DVec3, Vec3, Vec4};
}
