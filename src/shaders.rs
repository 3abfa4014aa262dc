//! WGSL sources for the ray-tracing kernel and the render passes that
//! draw on the swapchain.
//!
//! The kernel declares the uniform blocks from [`crate::uniforms`]; the tests
//! below parse it with naga and compare every offset and size with the Rust
//! structs.
//!
//! Rays are marched in units of the horizon radius so that `r⁵` stays well
//! inside `f32` range. Light bending uses the Schwarzschild photon equation
//! in Cartesian form, `a = -1.5 r_s h² x / r⁵` with `h = |x × v|`.

/// Placeholder replaced by the horizon radius in meters.
const HORIZON_PLACEHOLDER: &str = "HORIZON_RADIUS_M";

const RAYTRACE_TEMPLATE: &str = r#"
struct Camera {
    pos: vec3<f32>,
    _pad0: f32,
    right: vec3<f32>,
    _pad1: f32,
    up: vec3<f32>,
    _pad2: f32,
    forward: vec3<f32>,
    _pad3: f32,
    tan_half_fov: f32,
    aspect: f32,
    moving: i32,
    _pad4: i32,
};

struct Disk {
    inner_radius: f32,
    outer_radius: f32,
    temperature: f32,
    thickness: f32,
};

struct Objects {
    num_objects: i32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
    pos_radius: array<vec4<f32>, 16>,
    color: array<vec4<f32>, 16>,
    // Slot i is mass[i / 4][i % 4]
    mass: array<vec4<f32>, 4>,
};

@group(0) @binding(0)
var output: texture_storage_2d<rgba8unorm, write>;
@group(0) @binding(1)
var<uniform> cam: Camera;
@group(0) @binding(2)
var<uniform> disk: Disk;
@group(0) @binding(3)
var<uniform> objs: Objects;

const RS: f32 = HORIZON_RADIUS_M;
const MAX_OBJECTS: i32 = 16;
const STATIC_STEPS: i32 = 1200;
const MOVING_STEPS: i32 = 500;

fn object_mass(i: i32) -> f32 {
    return objs.mass[i / 4][i % 4];
}

// Photon acceleration with r_s = 1
fn bend(x: vec3<f32>, h2: f32) -> vec3<f32> {
    let r2 = dot(x, x);
    let r5 = r2 * r2 * sqrt(r2);
    return -1.5 * h2 * x / r5;
}

fn hash3(p: vec3<f32>) -> f32 {
    return fract(sin(dot(p, vec3<f32>(12.9898, 78.233, 45.164))) * 43758.5453);
}

fn background(dir: vec3<f32>) -> vec3<f32> {
    let d = normalize(dir);
    let base = vec3<f32>(0.01, 0.01, 0.03) * (1.0 + 0.5 * d.y);
    let cell = floor(d * 300.0);
    if (hash3(cell) > 0.997) {
        return vec3<f32>(0.9, 0.9, 1.0);
    }
    return base;
}

fn disk_color(r: f32) -> vec3<f32> {
    let inner = disk.inner_radius / RS;
    let outer = disk.outer_radius / RS;
    let t = clamp((r - inner) / max(outer - inner, 1e-3), 0.0, 1.0);
    let heat = clamp(disk.temperature / 10000.0, 0.2, 3.0);
    let hot = vec3<f32>(1.0, 0.95, 0.8);
    let cool = vec3<f32>(0.9, 0.3, 0.05);
    return mix(hot, cool, t) * heat * (1.4 - t);
}

fn shade_object(i: i32, x: vec3<f32>, center: vec3<f32>) -> vec3<f32> {
    let normal = normalize(x - center);
    // Lit by the disk around the origin
    let light = normalize(-x);
    let diffuse = max(dot(normal, light), 0.0) * 0.8 + 0.2;
    let glow = clamp(log(max(object_mass(i), 1.0)) / 70.0, 0.0, 1.0);
    return objs.color[i].rgb * (diffuse + 0.5 * glow);
}

@compute @workgroup_size(16, 16, 1)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {
    let dims = textureDimensions(output);
    if (gid.x >= dims.x || gid.y >= dims.y) {
        return;
    }

    let uv = (vec2<f32>(gid.xy) + vec2<f32>(0.5, 0.5)) / vec2<f32>(dims) * 2.0 - vec2<f32>(1.0, 1.0);
    let dir = normalize(
        cam.forward
        + uv.x * cam.tan_half_fov * cam.aspect * cam.right
        - uv.y * cam.tan_half_fov * cam.up
    );

    var x = cam.pos / RS;
    var v = dir;
    let h = cross(x, v);
    let h2 = dot(h, h);
    let escape = max(80.0, 2.0 * length(x));
    let half_thickness = 0.5 * disk.thickness / RS;
    let inner = disk.inner_radius / RS;
    let outer = disk.outer_radius / RS;
    let count = clamp(objs.num_objects, 0, MAX_OBJECTS);
    let max_steps = select(STATIC_STEPS, MOVING_STEPS, cam.moving != 0);

    var color = vec3<f32>(0.0, 0.0, 0.0);
    var done = false;
    for (var n = 0; n < max_steps; n = n + 1) {
        let r = length(x);
        if (r <= 1.0) {
            // Inside the horizon
            color = vec3<f32>(0.0, 0.0, 0.0);
            done = true;
            break;
        }
        if (r > escape) {
            color = background(v);
            done = true;
            break;
        }

        let ds = clamp(0.02 * r, 0.002, 2.0);
        let prev = x;
        v = v + bend(x, h2) * ds;
        x = x + v * ds;

        var p = x;
        var in_plane = abs(x.y) < half_thickness;
        if (prev.y * x.y < 0.0) {
            p = mix(prev, x, prev.y / (prev.y - x.y));
            in_plane = true;
        }
        let rd = length(p.xz);
        if (in_plane && rd >= inner && rd <= outer) {
            color = disk_color(rd);
            done = true;
            break;
        }

        for (var i = 0; i < count; i = i + 1) {
            let sphere = objs.pos_radius[i];
            let center = sphere.xyz / RS;
            if (distance(x, center) <= sphere.w / RS) {
                color = shade_object(i, x, center);
                done = true;
                break;
            }
        }
        if (done) {
            break;
        }
    }

    if (!done) {
        color = background(v);
    }
    textureStore(output, vec2<i32>(gid.xy), vec4<f32>(clamp(color, vec3<f32>(0.0), vec3<f32>(1.0)), 1.0));
}
"#;

/// Fullscreen triangle that samples the ray-traced image.
pub const BLIT_WGSL: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0)
var frame: texture_2d<f32>;
@group(0) @binding(1)
var frame_sampler: sampler;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var positions = array<vec2<f32>, 3>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(3.0, -1.0),
        vec2<f32>(-1.0, 3.0),
    );
    var uvs = array<vec2<f32>, 3>(
        vec2<f32>(0.0, 1.0),
        vec2<f32>(2.0, 1.0),
        vec2<f32>(0.0, -1.0),
    );

    var out: VertexOutput;
    out.clip_position = vec4<f32>(positions[vertex_index], 0.0, 1.0);
    out.uv = uvs[vertex_index];
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(frame, frame_sampler, in.uv);
}
"#;

/// Spacetime grid lines, projected with the camera's view-projection and
/// drawn with a single translucent colour.
pub const GRID_WGSL: &str = r#"
struct Grid {
    view_proj: mat4x4<f32>,
    color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> grid: Grid;

@vertex
fn vs_main(@location(0) position: vec3<f32>) -> @builtin(position) vec4<f32> {
    return grid.view_proj * vec4<f32>(position, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return grid.color;
}
"#;

/// Kernel source for a hole with the given horizon radius in meters.
pub fn raytrace_kernel(horizon_radius: f64) -> String {
    let rs = horizon_radius as f32;
    RAYTRACE_TEMPLATE.replace(HORIZON_PLACEHOLDER, &format!("{:e}", rs))
}
