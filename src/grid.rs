//! Spacetime curvature grid drawn over the ray-traced image.
//!
//! A square lattice in the hole's XZ plane whose height at each vertex is
//! [`CentralMass::spacetime_curvature`], so the lines sag into a funnel
//! around the horizon. The mesh depends only on the central mass and the
//! grid settings, so it is built once and reused every frame.

use glam::DVec3;

use crate::central_mass::CentralMass;
use crate::config::RenderingConfig;

/// Line-list mesh of the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct SpacetimeGrid {
    vertices: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl SpacetimeGrid {
    /// Build a `size`×`size` cell grid with cells `spacing` meters wide,
    /// centred on the central mass.
    pub fn new(central: &CentralMass, size: u32, spacing: f64) -> Self {
        let size = size.max(1);
        let side = size + 1;
        let half = (size / 2) as i64;
        let origin = central.position();

        let mut vertices = Vec::with_capacity((side * side) as usize);
        for z in 0..side {
            for x in 0..side {
                let wx = origin.x + (x as i64 - half) as f64 * spacing;
                let wz = origin.z + (z as i64 - half) as f64 * spacing;
                let wy = origin.y + central.spacetime_curvature(DVec3::new(wx, origin.y, wz));
                vertices.push(DVec3::new(wx, wy, wz).as_vec3().to_array());
            }
        }

        let mut indices = Vec::with_capacity((4 * size * side) as usize);
        for z in 0..side {
            for x in 0..side {
                let i = z * side + x;
                if x < size {
                    indices.extend_from_slice(&[i, i + 1]);
                }
                if z < size {
                    indices.extend_from_slice(&[i, i + side]);
                }
            }
        }

        Self { vertices, indices }
    }

    pub fn from_config(central: &CentralMass, rendering: &RenderingConfig) -> Self {
        Self::new(central, rendering.grid_size, rendering.grid_spacing)
    }

    /// Vertex positions in meters.
    pub fn vertices(&self) -> &[[f32; 3]] {
        &self.vertices
    }

    /// Pairs of vertex indices, one pair per line segment.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn line_count(&self) -> usize {
        self.indices.len() / 2
    }
}
