//! GPU side of the viewer: uploads a [`SceneSnapshot`], dispatches the
//! ray-tracing kernel and shows the result.
//!
//! Each frame runs two submissions. The compute pass writes the output image
//! at the snapshot's tier resolution, the queue is drained, and a fullscreen
//! pass then stretches the image onto the swapchain, with the spacetime grid
//! drawn over it when enabled. Validation errors raised by any pass are
//! caught in an error scope and logged after the fact.

mod blit;
mod grid;

use std::sync::Arc;

use tracing::{debug, error, info};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::error::GpuError;
use crate::grid::SpacetimeGrid;
use crate::shaders::raytrace_kernel;
use crate::snapshot::{Resolution, SceneSnapshot};
use crate::uniforms::{CameraBlock, DiskBlock, ObjectsBlock};
use blit::BlitPass;
use grid::GridPass;

const OUTPUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Output image plus the bind groups that reference it.
struct RenderTarget {
    resolution: Resolution,
    _texture: wgpu::Texture,
    kernel_bind_group: wgpu::BindGroup,
    blit_bind_group: wgpu::BindGroup,
}

pub struct RayTracer {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    kernel_pipeline: wgpu::ComputePipeline,
    kernel_layout: wgpu::BindGroupLayout,
    camera_buffer: wgpu::Buffer,
    disk_buffer: wgpu::Buffer,
    objects_buffer: wgpu::Buffer,
    blit: BlitPass,
    grid: GridPass,
    show_grid: bool,
    target: Option<RenderTarget>,
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_buffer(device: &wgpu::Device, label: &str, size: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

impl RayTracer {
    /// Set up the surface, device and both pipelines.
    ///
    /// `horizon_radius` is baked into the kernel, so a tracer only ever
    /// renders the hole it was built for. The grid mesh is uploaded once;
    /// `show_grid` sets whether it is drawn initially.
    pub async fn new(
        window: Arc<Window>,
        horizon_radius: f64,
        grid: &SpacetimeGrid,
        show_grid: bool,
    ) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;
        info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        // The kernel writes display-ready values, so avoid a second sRGB encode.
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| !f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoAdapter)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let camera_buffer =
            uniform_buffer(&device, "Camera Buffer", std::mem::size_of::<CameraBlock>());
        let disk_buffer = uniform_buffer(&device, "Disk Buffer", std::mem::size_of::<DiskBlock>());
        let objects_buffer =
            uniform_buffer(&device, "Objects Buffer", std::mem::size_of::<ObjectsBlock>());

        let kernel_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Ray Trace Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: OUTPUT_FORMAT,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                uniform_entry(1),
                uniform_entry(2),
                uniform_entry(3),
            ],
        });

        let kernel_src = raytrace_kernel(horizon_radius);
        let kernel_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Ray Trace Shader"),
            source: wgpu::ShaderSource::Wgsl(kernel_src.into()),
        });

        let kernel_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Ray Trace Pipeline Layout"),
                bind_group_layouts: &[&kernel_layout],
                push_constant_ranges: &[],
            });

        let kernel_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Ray Trace Pipeline"),
            layout: Some(&kernel_pipeline_layout),
            module: &kernel_module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let blit = BlitPass::new(&device, surface_format);
        debug!("Grid mesh: {} lines", grid.line_count());
        let grid = GridPass::new(&device, surface_format, grid);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            kernel_pipeline,
            kernel_layout,
            camera_buffer,
            disk_buffer,
            objects_buffer,
            blit,
            grid,
            show_grid,
            target: None,
        })
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Flip the grid overlay, returning whether it is now shown.
    pub fn toggle_grid(&mut self) -> bool {
        self.show_grid = !self.show_grid;
        self.show_grid
    }

    pub fn show_grid(&self) -> bool {
        self.show_grid
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    /// Resolution of the current output image, if one exists yet.
    pub fn resolution(&self) -> Option<Resolution> {
        self.target.as_ref().map(|t| t.resolution)
    }

    fn create_target(&self, resolution: Resolution) -> RenderTarget {
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Ray Trace Output"),
            size: wgpu::Extent3d {
                width: resolution.width.max(1),
                height: resolution.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: OUTPUT_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let kernel_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Ray Trace Bind Group"),
            layout: &self.kernel_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: self.camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.disk_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: self.objects_buffer.as_entire_binding(),
                },
            ],
        });
        let blit_bind_group = self.blit.bind(&self.device, &view);

        RenderTarget {
            resolution,
            _texture: texture,
            kernel_bind_group,
            blit_bind_group,
        }
    }

    /// Trace and present one frame.
    ///
    /// The output image is recreated only when the snapshot's resolution
    /// differs from the previous frame's.
    pub fn render(&mut self, snapshot: &SceneSnapshot) -> Result<(), wgpu::SurfaceError> {
        if self.resolution() != Some(snapshot.resolution) {
            debug!(
                "Output image now {}x{} ({:?})",
                snapshot.resolution.width, snapshot.resolution.height, snapshot.tier
            );
            self.target = Some(self.create_target(snapshot.resolution));
        }
        let Some(target) = self.target.as_ref() else {
            return Ok(());
        };

        let output = self.surface.get_current_texture()?;
        let surface_view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&snapshot.camera));
        self.queue
            .write_buffer(&self.disk_buffer, 0, bytemuck::bytes_of(&snapshot.disk));
        self.queue
            .write_buffer(&self.objects_buffer, 0, bytemuck::bytes_of(&snapshot.objects));
        if self.show_grid {
            self.grid.update(&self.queue, &snapshot.grid);
        }

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Ray Trace Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Ray Trace Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.kernel_pipeline);
            pass.set_bind_group(0, &target.kernel_bind_group, &[]);
            let (x, y) = snapshot.resolution.workgroups();
            pass.dispatch_workgroups(x, y, 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        // The image must be complete before it is sampled.
        let _ = self.device.poll(wgpu::Maintain::Wait);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Blit Encoder"),
            });
        self.blit
            .draw(&mut encoder, &surface_view, &target.blit_bind_group);
        if self.show_grid {
            self.grid.draw(&mut encoder, &surface_view);
        }
        self.queue.submit(std::iter::once(encoder.finish()));

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            error!("GPU validation error while tracing: {}", err);
        }

        output.present();
        Ok(())
    }
}
