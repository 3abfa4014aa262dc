//! Uniform blocks shared with the ray-tracing kernel.
//!
//! These structs are uploaded with `bytemuck::bytes_of` and must match the
//! WGSL declarations in [`crate::shaders`] byte for byte.
//! Every `vec3` occupies 16 bytes, so each one is followed by an explicit
//! padding scalar.
//!
//! | Block | Binding | Size |
//! |-------|---------|------|
//! | [`CameraBlock`] | 1 | 80 |
//! | [`DiskBlock`] | 2 | 16 |
//! | [`ObjectsBlock`] | 3 | 592 |
//!
//! [`GridBlock`] feeds the grid overlay pass at its own binding 0.

use bytemuck::{Pod, Zeroable};

use crate::constants::MAX_BODIES;

/// Camera position, orthonormal basis and projection scalars.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct CameraBlock {
    pub pos: [f32; 3],
    pub _pad0: f32,
    pub right: [f32; 3],
    pub _pad1: f32,
    pub up: [f32; 3],
    pub _pad2: f32,
    pub forward: [f32; 3],
    pub _pad3: f32,
    /// `tan(fov_y / 2)`.
    pub tan_half_fov: f32,
    pub aspect: f32,
    /// 1 while the camera moves, else 0.
    pub moving: i32,
    pub _pad4: i32,
}

/// Accretion disk parameters, all in SI units.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct DiskBlock {
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub temperature: f32,
    pub thickness: f32,
}

/// Up to [`MAX_BODIES`] spheres.
///
/// Slots at or past `num_objects` are zeroed and must be ignored by the
/// kernel. The kernel sees `mass` as `array<vec4<f32>, 4>`; slot `i` is
/// component `i % 4` of element `i / 4`.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectsBlock {
    pub num_objects: i32,
    pub _pad: [f32; 3],
    /// `xyz` position, `w` radius.
    pub pos_radius: [[f32; 4]; MAX_BODIES],
    pub color: [[f32; 4]; MAX_BODIES],
    pub mass: [f32; MAX_BODIES],
}

impl Default for ObjectsBlock {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl ObjectsBlock {
    /// Occupied slots.
    pub fn len(&self) -> usize {
        self.num_objects.max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.num_objects <= 0
    }
}

/// View-projection and line color for the grid overlay.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GridBlock {
    /// Column-major, as `Mat4::to_cols_array_2d` gives it.
    pub view_proj: [[f32; 4]; 4],
    pub color: [f32; 4],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_block_sizes() {
        assert_eq!(size_of::<CameraBlock>(), 80);
        assert_eq!(size_of::<DiskBlock>(), 16);
        assert_eq!(size_of::<ObjectsBlock>(), 592);
        assert_eq!(size_of::<GridBlock>(), 80);
    }

    #[test]
    fn test_camera_block_offsets() {
        assert_eq!(offset_of!(CameraBlock, pos), 0);
        assert_eq!(offset_of!(CameraBlock, right), 16);
        assert_eq!(offset_of!(CameraBlock, up), 32);
        assert_eq!(offset_of!(CameraBlock, forward), 48);
        assert_eq!(offset_of!(CameraBlock, tan_half_fov), 64);
        assert_eq!(offset_of!(CameraBlock, aspect), 68);
        assert_eq!(offset_of!(CameraBlock, moving), 72);
    }

    #[test]
    fn test_objects_block_offsets() {
        assert_eq!(offset_of!(ObjectsBlock, num_objects), 0);
        assert_eq!(offset_of!(ObjectsBlock, pos_radius), 16);
        assert_eq!(offset_of!(ObjectsBlock, color), 16 + 16 * 16);
        assert_eq!(offset_of!(ObjectsBlock, mass), 16 + 2 * 16 * 16);
    }

    #[test]
    fn test_default_objects_block_is_empty() {
        let block = ObjectsBlock::default();
        assert!(block.is_empty());
        assert!(bytemuck::bytes_of(&block).iter().all(|&b| b == 0));
    }
}
