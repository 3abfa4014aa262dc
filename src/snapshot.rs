//! Per-frame packing of simulation and camera state for the ray tracer.
//!
//! [`SceneSnapshotMarshaler::marshal`] is a pure read of the body collection
//! and the camera. It picks a resolution tier and fills the uniform
//! blocks; uploading and dispatching is left to [`crate::gpu::RayTracer`].
//!
//! ```ignore
//! let marshaler = SceneSnapshotMarshaler::from_config(&config);
//! let snapshot = marshaler.marshal(&camera, simulation.bodies());
//! assert!(snapshot.objects.len() <= MAX_BODIES);
//! ```

use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::camera::{orthonormal_basis, CameraState};
use crate::config::{Config, RenderingConfig};
use crate::constants::MAX_BODIES;
use crate::uniforms::{CameraBlock, DiskBlock, GridBlock, ObjectsBlock};

/// Kernel workgroup edge length.
pub const WORKGROUP_SIZE: u32 = 16;

/// Translucent blue of the grid overlay.
const GRID_COLOR: [f32; 4] = [0.3, 0.5, 1.0, 0.35];

/// Output image size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Workgroups needed to cover every pixel, rounding up.
    pub fn workgroups(&self) -> (u32, u32) {
        (
            self.width.div_ceil(WORKGROUP_SIZE),
            self.height.div_ceil(WORKGROUP_SIZE),
        )
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Which configured resolution a frame renders at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Full quality while the camera is still.
    Static,
    /// Reduced quality while the camera moves.
    Moving,
}

/// Accretion disk tuple, constant for a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiskParams {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub temperature: f32,
    pub thickness: f32,
}

impl From<DiskParams> for DiskBlock {
    fn from(d: DiskParams) -> Self {
        DiskBlock {
            inner_radius: d.inner_radius,
            outer_radius: d.outer_radius,
            temperature: d.temperature,
            thickness: d.thickness,
        }
    }
}

/// Everything one dispatch needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneSnapshot {
    pub tier: Tier,
    pub resolution: Resolution,
    pub camera: CameraBlock,
    pub disk: DiskBlock,
    pub objects: ObjectsBlock,
    pub grid: GridBlock,
}

/// Builds a [`SceneSnapshot`] each frame.
#[derive(Clone, Debug)]
pub struct SceneSnapshotMarshaler {
    adaptive_quality: bool,
    static_resolution: Resolution,
    moving_resolution: Resolution,
    disk: DiskParams,
}

impl SceneSnapshotMarshaler {
    pub fn new(rendering: &RenderingConfig, disk: DiskParams) -> Self {
        Self {
            adaptive_quality: rendering.adaptive_quality,
            static_resolution: rendering.static_resolution,
            moving_resolution: rendering.moving_resolution,
            disk,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.rendering, config.accretion_disk.params())
    }

    pub fn set_adaptive_quality(&mut self, enabled: bool) {
        self.adaptive_quality = enabled;
    }

    pub fn adaptive_quality(&self) -> bool {
        self.adaptive_quality
    }

    /// Moving tier only when adaptive quality is on and the camera moves.
    pub fn select_tier(&self, camera_moving: bool) -> (Tier, Resolution) {
        if self.adaptive_quality && camera_moving {
            (Tier::Moving, self.moving_resolution)
        } else {
            (Tier::Static, self.static_resolution)
        }
    }

    pub fn marshal(&self, camera: &impl CameraState, bodies: &[Body]) -> SceneSnapshot {
        let (tier, resolution) = self.select_tier(camera.is_moving());
        SceneSnapshot {
            tier,
            resolution,
            camera: pack_camera(camera),
            disk: self.disk.into(),
            objects: pack_objects(bodies),
            grid: pack_grid(camera),
        }
    }
}

/// Fill the camera block, rebuilding the basis from the view direction.
pub fn pack_camera(camera: &impl CameraState) -> CameraBlock {
    let forward = camera.forward().normalize_or(glam::Vec3::NEG_Z);
    let (right, up) = orthonormal_basis(forward);
    CameraBlock {
        pos: camera.position().to_array(),
        right: right.to_array(),
        up: up.to_array(),
        forward: forward.to_array(),
        tan_half_fov: (camera.fov_y() * 0.5).tan(),
        aspect: camera.aspect(),
        moving: camera.is_moving() as i32,
        ..CameraBlock::default()
    }
}

/// Projection for the grid overlay.
pub fn pack_grid(camera: &impl CameraState) -> GridBlock {
    GridBlock {
        view_proj: camera.view_projection().to_cols_array_2d(),
        color: GRID_COLOR,
    }
}

/// Copy at most [`MAX_BODIES`] bodies into the objects block, in order.
pub fn pack_objects(bodies: &[Body]) -> ObjectsBlock {
    let mut block = ObjectsBlock::default();
    let count = bodies.len().min(MAX_BODIES);
    for (i, body) in bodies.iter().take(count).enumerate() {
        let p = body.position().as_vec3();
        block.pos_radius[i] = [p.x, p.y, p.z, body.radius() as f32];
        block.color[i] = body.color().to_array();
        block.mass[i] = body.mass() as f32;
    }
    block.num_objects = count as i32;
    block
}
