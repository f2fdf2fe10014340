//! SDF-based WebGPU render pipeline
//!
//! Renders the entire court in a fragment shader using signed distance
//! fields. Faces, the banner and the overlays are DOM elements stacked on
//! top of the canvas; this pass draws everything else.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::projector::Letterbox;
use crate::game::RenderView;
use crate::sim::{MAX_PARTICLES, Paddle, RacketPose};

/// Maximum number of trail points
const MAX_TRAIL: usize = crate::consts::TRAIL_CAPACITY;

/// Racket kick glow lasts this long after a hit (ms)
const HIT_GLOW_MS: f64 = 160.0;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct Globals {
    resolution: [f32; 2], // offset 0
    offset: [f32; 2],     // offset 8 - letterbox origin in pixels
    world: [f32; 2],      // offset 16
    scale: f32,           // offset 24 - pixels per world unit
    time: f32,            // offset 28
    particle_count: u32,  // offset 32
    trail_count: u32,     // offset 36
    court_padding: f32,   // offset 40
    super_active: u32,    // offset 44
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct PaddleData {
    pos: [f32; 2],
    radius: f32,
    face_radius: f32,
    racket_center: [f32; 2],
    racket_size: [f32; 2],
    racket_angle: f32,
    tilt: f32,
    hit_glow: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct SceneUniform {
    player: PaddleData,
    computer: PaddleData,
    ball_pos: [f32; 2],
    ball_radius: f32,
    ball_speed: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct ParticleData {
    pos: [f32; 2],
    radius: f32,
    fade: f32,
    color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct TrailData {
    pos: [f32; 2],
    radius: f32,
    fade: f32,
}

fn pack_paddle(paddle: &Paddle, pose: RacketPose, now_ms: f64) -> PaddleData {
    let since_hit = now_ms - paddle.last_hit_at_ms;
    let hit_glow = if (0.0..HIT_GLOW_MS).contains(&since_hit) {
        (1.0 - since_hit / HIT_GLOW_MS) as f32
    } else {
        0.0
    };
    PaddleData {
        pos: paddle.pos.into(),
        radius: paddle.radius,
        face_radius: paddle.face_radius,
        racket_center: pose.center.into(),
        racket_size: [paddle.racket.width, paddle.racket.height],
        racket_angle: pose.angle,
        tilt: paddle.tilt,
        hit_glow,
        _pad: 0.0,
    }
}

fn pack_globals(view: &RenderView, letterbox: &Letterbox, time: f32) -> Globals {
    Globals {
        resolution: letterbox.viewport.into(),
        offset: letterbox.offset.into(),
        world: [view.world.width, view.world.height],
        scale: letterbox.scale,
        time,
        particle_count: view.particles.len().min(MAX_PARTICLES) as u32,
        trail_count: view.trail.len().min(MAX_TRAIL) as u32,
        court_padding: view.world.padding,
        super_active: view.super_active as u32,
    }
}

fn pack_scene(view: &RenderView, now_ms: f64) -> SceneUniform {
    SceneUniform {
        player: pack_paddle(view.player, view.player_racket, now_ms),
        computer: pack_paddle(view.computer, view.computer_racket, now_ms),
        ball_pos: view.ball.pos.into(),
        ball_radius: view.ball.radius,
        ball_speed: view.ball.speed(),
    }
}

fn pack_particles(view: &RenderView) -> Vec<ParticleData> {
    view.particles
        .iter()
        .take(MAX_PARTICLES)
        .map(|p| ParticleData {
            pos: p.pos.into(),
            radius: p.radius,
            fade: p.fade(),
            color: p.tint.rgba(),
        })
        .collect()
}

/// Oldest first, shrinking toward the tail
fn pack_trail(view: &RenderView) -> Vec<TrailData> {
    let radius = view.ball.radius;
    view.trail
        .iter()
        .rev()
        .take(MAX_TRAIL)
        .rev()
        .map(|t| {
            let fade = t.fade();
            TrailData {
                pos: t.pos.into(),
                radius: radius * (0.4 + 0.6 * fade),
                fade,
            }
        })
        .collect()
}

// ============================================================================
// SDF RENDER STATE
// ============================================================================

pub struct SdfRenderState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub pipeline: wgpu::RenderPipeline,

    globals_buffer: wgpu::Buffer,
    scene_buffer: wgpu::Buffer,
    particles_buffer: wgpu::Buffer,
    trail_buffer: wgpu::Buffer,

    bind_group: wgpu::BindGroup,

    pub size: (u32, u32),
    start_time: f64,
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl SdfRenderState {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("sdf-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::debug!("Surface formats: {:?}", surface_caps.formats);

        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        log::info!("Using surface format: {:?}", surface_format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sdf_shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("sdf_shader.wgsl").into()),
        });

        let globals_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("globals"),
            contents: bytemuck::bytes_of(&Globals::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("scene"),
            contents: bytemuck::bytes_of(&SceneUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let particles_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particles"),
            size: (std::mem::size_of::<ParticleData>() * MAX_PARTICLES) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let trail_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trail"),
            size: (std::mem::size_of::<TrailData>() * MAX_TRAIL) as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sdf_bind_group_layout"),
            entries: &[
                uniform_entry(0),
                uniform_entry(1),
                storage_entry(2),
                storage_entry(3),
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sdf_bind_group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: scene_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: particles_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: trail_buffer.as_entire_binding(),
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sdf_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sdf_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[], // No vertex buffers - fullscreen triangle
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            size: (config.width, config.height),
            surface,
            device,
            queue,
            config,
            pipeline,
            globals_buffer,
            scene_buffer,
            particles_buffer,
            trail_buffer,
            bind_group,
            start_time: 0.0,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) {
        if new_width > 0 && new_height > 0 {
            self.size = (new_width, new_height);
            self.config.width = new_width;
            self.config.height = new_height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    pub fn set_start_time(&mut self, time: f64) {
        self.start_time = time;
    }

    /// Letterbox for the current surface size
    pub fn letterbox(&self, view: &RenderView) -> Letterbox {
        Letterbox::new(self.size.0 as f32, self.size.1 as f32, view.world)
    }

    /// Upload the view and draw one frame; `time` is the rAF timestamp in ms
    pub fn render(&mut self, view: &RenderView, time: f64) -> Result<(), wgpu::SurfaceError> {
        let elapsed = ((time - self.start_time) / 1000.0) as f32;
        let letterbox = self.letterbox(view);

        let globals = pack_globals(view, &letterbox, elapsed);
        self.queue
            .write_buffer(&self.globals_buffer, 0, bytemuck::bytes_of(&globals));

        let scene = pack_scene(view, time);
        self.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::bytes_of(&scene));

        let particles = pack_particles(view);
        if !particles.is_empty() {
            self.queue
                .write_buffer(&self.particles_buffer, 0, bytemuck::cast_slice(&particles));
        }
        let trail = pack_trail(view);
        if !trail.is_empty() {
            self.queue
                .write_buffer(&self.trail_buffer, 0, bytemuck::cast_slice(&trail));
        }

        let output = self.surface.get_current_texture()?;
        let target = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("sdf_encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sdf_render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.bind_group, &[]);
            render_pass.draw(0..3, 0..1); // Fullscreen triangle
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}
