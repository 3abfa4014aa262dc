//! Cameras that feed the ray tracer.
//!
//! The ray tracer only needs what [`CameraState`] exposes. [`OrbitCamera`] is
//! the interactive one: it orbits the origin in spherical coordinates and
//! eases toward its targets, reporting itself as moving until it settles.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec3};
use tracing::{debug, info};

use crate::config::CameraConfig;

/// Radius change (m) below which the camera counts as settled.
const RADIUS_EPSILON: f32 = 1.0e6;
/// Angle change (rad) below which the camera counts as settled.
const ANGLE_EPSILON: f32 = 1.0e-3;
/// Keeps the orbit off the poles, where the basis degenerates.
const ELEVATION_MARGIN: f32 = 0.01;
/// Clip planes (m) for rasterized overlays.
const NEAR_PLANE: f32 = 1.0e8;
const FAR_PLANE: f32 = 1.0e13;

/// Right and up vectors for a view direction.
///
/// `right = normalize(forward × Y)`, `up = right × forward`. When `forward`
/// is parallel to Y, world Z is used as the reference instead so the result
/// stays orthonormal.
pub fn orthonormal_basis(forward: Vec3) -> (Vec3, Vec3) {
    let forward = forward.normalize_or(Vec3::NEG_Z);
    let right = forward
        .cross(Vec3::Y)
        .try_normalize()
        .unwrap_or_else(|| forward.cross(Vec3::Z).normalize());
    let up = right.cross(forward);
    (right, up)
}

/// What the ray tracer reads from a camera each frame.
pub trait CameraState {
    fn position(&self) -> Vec3;

    /// Unit view direction.
    fn forward(&self) -> Vec3;

    fn right(&self) -> Vec3 {
        orthonormal_basis(self.forward()).0
    }

    fn up(&self) -> Vec3 {
        orthonormal_basis(self.forward()).1
    }

    fn is_moving(&self) -> bool;

    /// Vertical field of view in radians.
    fn fov_y(&self) -> f32;

    /// Width over height.
    fn aspect(&self) -> f32;

    /// Perspective view-projection for overlays drawn on top of the traced
    /// image. Uses the same basis the kernel casts rays through, so a point
    /// `d` ahead and `d·tan(fov/2)` up lands on the top edge.
    fn view_projection(&self) -> Mat4 {
        let forward = self.forward().normalize_or(Vec3::NEG_Z);
        let (_, up) = orthonormal_basis(forward);
        let view = Mat4::look_to_rh(self.position(), forward, up);
        let proj = Mat4::perspective_rh(self.fov_y(), self.aspect(), NEAR_PLANE, FAR_PLANE);
        proj * view
    }
}

/// A camera that never moves on its own.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedCamera {
    pub position: Vec3,
    pub forward: Vec3,
    pub moving: bool,
    pub fov_y: f32,
    pub aspect: f32,
}

impl FixedCamera {
    /// Look from `position` toward `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            forward: (target - position).normalize_or(Vec3::NEG_Z),
            moving: false,
            fov_y: 60f32.to_radians(),
            aspect: 4.0 / 3.0,
        }
    }
}

impl CameraState for FixedCamera {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn is_moving(&self) -> bool {
        self.moving
    }

    fn fov_y(&self) -> f32 {
        self.fov_y
    }

    fn aspect(&self) -> f32 {
        self.aspect
    }
}

/// Damped orbit around the origin.
///
/// `elevation` is the polar angle from +Y, so `π/2` is the disk plane.
#[derive(Clone, Debug)]
pub struct OrbitCamera {
    target: Vec3,
    radius: f32,
    azimuth: f32,
    elevation: f32,
    target_radius: f32,
    target_azimuth: f32,
    target_elevation: f32,
    initial_radius: f32,
    min_radius: f32,
    max_radius: f32,
    orbit_speed: f32,
    damping: f32,
    fov_y: f32,
    aspect: f32,
    dragging: bool,
    moving: bool,
    last_cursor: Option<(f64, f64)>,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let min_radius = config.min_radius.max(1.0);
        let max_radius = config.max_radius.max(min_radius);
        let radius = config.initial_radius.clamp(min_radius, max_radius);
        info!("Camera initialized at radius {:e} m", radius);
        Self {
            target: Vec3::ZERO,
            radius,
            azimuth: 0.0,
            elevation: PI / 2.0,
            target_radius: radius,
            target_azimuth: 0.0,
            target_elevation: PI / 2.0,
            initial_radius: radius,
            min_radius,
            max_radius,
            orbit_speed: config.orbit_speed,
            damping: config.damping_factor.clamp(0.0, 1.0),
            fov_y: config.fov.to_radians(),
            aspect,
            dragging: false,
            moving: false,
            last_cursor: None,
        }
    }

    /// Ease toward the targets and refresh the moving flag.
    pub fn update(&mut self, dt: f32) {
        if dt.is_finite() && dt > 0.0 && dt < 1.0 {
            let t = 1.0 - self.damping.powf(dt * 60.0);
            self.radius += (self.target_radius - self.radius) * t;
            self.azimuth += (self.target_azimuth - self.azimuth) * t;
            self.elevation += (self.target_elevation - self.elevation) * t;
        }

        let was_moving = self.moving;
        self.moving = (self.radius - self.target_radius).abs() > RADIUS_EPSILON
            || (self.azimuth - self.target_azimuth).abs() > ANGLE_EPSILON
            || (self.elevation - self.target_elevation).abs() > ANGLE_EPSILON
            || self.dragging;
        if was_moving != self.moving {
            debug!(
                "{}",
                if self.moving { "Camera started moving" } else { "Camera stopped moving" }
            );
        }
    }

    /// Nudge the target angles by `d_azimuth` and `d_elevation` radians.
    pub fn orbit(&mut self, d_azimuth: f32, d_elevation: f32) {
        self.target_azimuth += d_azimuth;
        self.target_elevation += d_elevation;
        self.clamp_targets();
    }

    /// One keyboard orbit step.
    pub fn key_step(&self) -> f32 {
        self.orbit_speed * 2.0
    }

    /// Multiply the target radius by `factor`.
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.target_radius *= factor;
            self.clamp_targets();
        }
    }

    /// Scroll wheel zoom; positive `lines` moves closer.
    pub fn scroll(&mut self, lines: f32) {
        self.zoom(1.0 - lines * 0.1);
        debug!("Camera zoom: {:e}", self.target_radius);
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    /// Cursor moved to `(x, y)` in physical pixels.
    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        if let Some((last_x, last_y)) = self.last_cursor {
            if self.dragging {
                let dx = (x - last_x) as f32;
                let dy = (y - last_y) as f32;
                self.orbit(dx * self.orbit_speed, -dy * self.orbit_speed);
            }
        }
        self.last_cursor = Some((x, y));
    }

    /// Return to the starting viewpoint.
    pub fn reset(&mut self) {
        self.target_radius = self.initial_radius;
        self.target_azimuth = 0.0;
        self.target_elevation = PI / 2.0;
        info!("Camera reset to default position");
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    fn clamp_targets(&mut self) {
        self.target_radius = self.target_radius.clamp(self.min_radius, self.max_radius);
        self.target_elevation = self
            .target_elevation
            .clamp(ELEVATION_MARGIN, PI - ELEVATION_MARGIN);

        // Shift the current angle along with the wrapped target
        let wrapped = self.target_azimuth.rem_euclid(TAU);
        self.azimuth += wrapped - self.target_azimuth;
        self.target_azimuth = wrapped;
    }
}

impl CameraState for OrbitCamera {
    fn position(&self) -> Vec3 {
        let (sin_el, cos_el) = self.elevation.sin_cos();
        let (sin_az, cos_az) = self.azimuth.sin_cos();
        self.target + self.radius * Vec3::new(sin_el * cos_az, cos_el, sin_el * sin_az)
    }

    fn forward(&self) -> Vec3 {
        (self.target - self.position()).normalize_or(Vec3::NEG_Z)
    }

    fn is_moving(&self) -> bool {
        self.moving
    }

    fn fov_y(&self) -> f32 {
        self.fov_y
    }

    fn aspect(&self) -> f32 {
        self.aspect
    }
}
