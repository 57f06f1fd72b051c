use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::logging::LogTree;
use crate::paint::Color;
use crate::shader::front;

use super::surface::ScreenSurface;
use super::{
    AttachmentInfo, Attachments, Bindings, BufferKind, DeviceError, FramebufferStatus, GpuInit,
    GraphicsDevice, GraphicsHandle, HandleTable, ObjectCounts, ObjectKind, PixelRect, ShaderKind,
    VertexArrayDesc, attachment_status,
};

/// Texel format of offscreen color textures.
const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const DEPTH_STENCIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// A texture or renderbuffer. `view` is `None` when the size is outside device limits.
struct GpuImage {
    width: u32,
    height: u32,
    view: Option<(wgpu::Texture, wgpu::TextureView)>,
}

impl GpuImage {
    fn info(&self) -> AttachmentInfo {
        AttachmentInfo {
            width: self.width,
            height: self.height,
            supported: self.view.is_some(),
        }
    }
}

struct GpuBuffer {
    kind: BufferKind,
    buffer: wgpu::Buffer,
}

struct GpuShader {
    kind: ShaderKind,
    ir: naga::Module,
    module: wgpu::ShaderModule,
}

struct GpuProgram {
    vertex: wgpu::ShaderModule,
    fragment: wgpu::ShaderModule,
    /// Pipelines built on first draw, per vertex layout and target format.
    pipelines: HashMap<(GraphicsHandle, wgpu::TextureFormat), wgpu::RenderPipeline>,
}

/// Acquired on-screen frame. Holding it blocks acquisition of the next one.
struct ScreenFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

/// Color (and optional depth/stencil) views a command renders into.
struct RenderTarget {
    color: wgpu::TextureView,
    depth_stencil: Option<wgpu::TextureView>,
    format: wgpu::TextureFormat,
}

/// [`GraphicsDevice`] backed by wgpu and bound to a window surface.
///
/// Owns the wgpu device, queue and surface configuration, and maps handles to
/// wgpu resources:
/// - framebuffers are attachment records; a render pass is opened per command
/// - programs are a pair of validated shader modules; render pipelines are
///   created lazily per vertex array and target format
/// - the on-screen frame is acquired on first use and released by `present`
///
/// Commands are recorded into one encoder and submitted by `flush`, `finish`,
/// `present` and `fill_rect` (which uploads through the queue).
pub struct WgpuDevice {
    window: Arc<Window>,
    screen: ScreenSurface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    max_dimension: u32,

    sampler: wgpu::Sampler,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,

    textures: HandleTable<GpuImage>,
    renderbuffers: HandleTable<GpuImage>,
    framebuffers: HandleTable<Attachments>,
    buffers: HandleTable<GpuBuffer>,
    vertex_arrays: HandleTable<VertexArrayDesc>,
    shaders: HandleTable<GpuShader>,
    programs: HandleTable<GpuProgram>,
    bind_groups: HashMap<GraphicsHandle, wgpu::BindGroup>,

    bound: Bindings,
    encoder: Option<wgpu::CommandEncoder>,
    frame: Option<ScreenFrame>,
    /// Set when the surface refused a frame; cleared by `present`.
    frame_skipped: bool,
    skipped_frames: u64,
}

impl WgpuDevice {
    /// Creates a device bound to `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: Arc<Window>, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: init.backends,
            ..Default::default()
        });

        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("veneer device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let screen = ScreenSurface::new(surface, &adapter, &device, size, &init)?;

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("veneer composite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("veneer composite bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("veneer composite pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let max_dimension = device.limits().max_texture_dimension_2d;
        log::info!(
            "wgpu device ready: {:?}, surface {:?} {}x{}, max texture {max_dimension}",
            adapter.get_info().backend,
            screen.format(),
            size.width,
            size.height,
        );

        Ok(Self {
            window,
            screen,
            device,
            queue,
            max_dimension,
            sampler,
            bind_group_layout,
            pipeline_layout,
            textures: HandleTable::new(),
            renderbuffers: HandleTable::new(),
            framebuffers: HandleTable::new(),
            buffers: HandleTable::new(),
            vertex_arrays: HandleTable::new(),
            shaders: HandleTable::new(),
            programs: HandleTable::new(),
            bind_groups: HashMap::new(),
            bound: Bindings::default(),
            encoder: None,
            frame: None,
            frame_skipped: false,
            skipped_frames: 0,
        })
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.screen.format()
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.screen.size()
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    /// Frames whose on-screen work was dropped because the surface had no
    /// frame to give (minimized window, timeout).
    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    fn allocate(
        &self,
        label: &'static str,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
        width: u32,
        height: u32,
    ) -> GpuImage {
        let fits = (1..=self.max_dimension).contains(&width)
            && (1..=self.max_dimension).contains(&height);
        let view = fits.then(|| {
            let texture = self.device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            (texture, view)
        });
        GpuImage {
            width,
            height,
            view,
        }
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        let device = &self.device;
        self.encoder.get_or_insert_with(|| {
            device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("veneer command encoder"),
            })
        })
    }

    fn submit_pending(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.queue.submit(std::iter::once(encoder.finish()));
        }
    }

    /// Acquires the on-screen frame on first use.
    ///
    /// `Ok(None)` means the surface could not provide a frame this time and
    /// on-screen commands are dropped until the next `present`.
    fn screen_view(&mut self) -> Result<Option<wgpu::TextureView>, DeviceError> {
        if let Some(frame) = &self.frame {
            return Ok(Some(frame.view.clone()));
        }
        if self.frame_skipped {
            return Ok(None);
        }

        let Some(texture) = self.screen.acquire(&self.device)? else {
            let size = self.screen.size();
            log::debug!(
                target: LogTree::TARGET,
                "no surface frame at {}x{}; dropping on-screen work",
                size.width,
                size.height
            );
            self.frame_skipped = true;
            return Ok(None);
        };
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        self.frame = Some(ScreenFrame {
            texture,
            view: view.clone(),
        });
        Ok(Some(view))
    }

    fn bound_target(&mut self, operation: &str) -> Result<Option<RenderTarget>, DeviceError> {
        let framebuffer = self.bound.framebuffer;
        if !framebuffer.is_allocated() {
            let format = self.screen.format();
            return Ok(self.screen_view()?.map(|color| RenderTarget {
                color,
                depth_stencil: None,
                format,
            }));
        }

        let status = self.framebuffer_status(framebuffer);
        if !status.is_complete() {
            return Err(DeviceError::InvalidState(format!(
                "{operation} on framebuffer {framebuffer}: {status}"
            )));
        }
        let attachments = self.framebuffers.get(framebuffer).copied().unwrap_or_default();
        let view_of = |image: Option<&GpuImage>| {
            image
                .and_then(|img| img.view.as_ref())
                .map(|(_, view)| view.clone())
        };
        let color = view_of(self.textures.get(attachments.color)).ok_or(
            DeviceError::InvalidHandle {
                kind: ObjectKind::Texture,
                handle: attachments.color,
            },
        )?;
        Ok(Some(RenderTarget {
            color,
            depth_stencil: view_of(self.renderbuffers.get(attachments.depth_stencil)),
            format: OFFSCREEN_FORMAT,
        }))
    }

    fn pipeline(
        &mut self,
        program: GraphicsHandle,
        vertex_array: GraphicsHandle,
        desc: &VertexArrayDesc,
        format: wgpu::TextureFormat,
    ) -> Result<wgpu::RenderPipeline, DeviceError> {
        let device = &self.device;
        let layout = &self.pipeline_layout;
        let entry = self.programs.get_mut(program).ok_or(DeviceError::InvalidHandle {
            kind: ObjectKind::Program,
            handle: program,
        })?;
        if let Some(pipeline) = entry.pipelines.get(&(vertex_array, format)) {
            return Ok(pipeline.clone());
        }

        let attributes = desc
            .attributes
            .iter()
            .map(|a| {
                Ok(wgpu::VertexAttribute {
                    format: float_format(a.components)?,
                    offset: u64::from(a.offset),
                    shader_location: a.location,
                })
            })
            .collect::<Result<Vec<_>, DeviceError>>()?;

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("veneer composite pipeline"),
            layout: Some(layout),

            vertex: wgpu::VertexState {
                module: &entry.vertex,
                entry_point: Some(front::VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: u64::from(desc.stride),
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },

            fragment: Some(wgpu::FragmentState {
                module: &entry.fragment,
                entry_point: Some(front::FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(premul_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        entry
            .pipelines
            .insert((vertex_array, format), pipeline.clone());
        Ok(pipeline)
    }

    fn bind_group(&mut self, texture: GraphicsHandle, view: &wgpu::TextureView) -> wgpu::BindGroup {
        let device = &self.device;
        let layout = &self.bind_group_layout;
        let sampler = &self.sampler;
        self.bind_groups
            .entry(texture)
            .or_insert_with(|| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("veneer composite bind group"),
                    layout,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: wgpu::BindingResource::TextureView(view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::Sampler(sampler),
                        },
                    ],
                })
            })
            .clone()
    }
}

fn premul_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

fn float_format(components: u32) -> Result<wgpu::VertexFormat, DeviceError> {
    match components {
        1 => Ok(wgpu::VertexFormat::Float32),
        2 => Ok(wgpu::VertexFormat::Float32x2),
        3 => Ok(wgpu::VertexFormat::Float32x3),
        4 => Ok(wgpu::VertexFormat::Float32x4),
        n => Err(DeviceError::InvalidState(format!(
            "vertex attribute with {n} components"
        ))),
    }
}

impl GraphicsDevice for WgpuDevice {
    fn create_texture(&mut self, width: u32, height: u32) -> GraphicsHandle {
        let image = self.allocate(
            "veneer offscreen color",
            OFFSCREEN_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST,
            width,
            height,
        );
        self.textures.insert(image)
    }

    fn create_renderbuffer(&mut self, width: u32, height: u32) -> GraphicsHandle {
        let image = self.allocate(
            "veneer offscreen depth/stencil",
            DEPTH_STENCIL_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
            width,
            height,
        );
        self.renderbuffers.insert(image)
    }

    fn create_framebuffer(&mut self) -> GraphicsHandle {
        self.framebuffers.insert(Attachments::default())
    }

    fn attach_color(&mut self, framebuffer: GraphicsHandle, texture: GraphicsHandle) {
        match self.framebuffers.get_mut(framebuffer) {
            Some(a) => a.color = texture,
            None => log::warn!("attach to unknown framebuffer {framebuffer} ignored"),
        }
    }

    fn attach_depth_stencil(&mut self, framebuffer: GraphicsHandle, renderbuffer: GraphicsHandle) {
        match self.framebuffers.get_mut(framebuffer) {
            Some(a) => a.depth_stencil = renderbuffer,
            None => log::warn!("attach to unknown framebuffer {framebuffer} ignored"),
        }
    }

    fn framebuffer_status(&self, framebuffer: GraphicsHandle) -> FramebufferStatus {
        let Some(a) = self.framebuffers.get(framebuffer) else {
            return FramebufferStatus::InvalidFramebuffer;
        };
        attachment_status(
            self.textures.get(a.color).map(GpuImage::info),
            self.renderbuffers.get(a.depth_stencil).map(GpuImage::info),
        )
    }

    fn delete_texture(&mut self, texture: GraphicsHandle) {
        self.bind_groups.remove(&texture);
        self.textures.release(ObjectKind::Texture, texture);
    }

    fn delete_renderbuffer(&mut self, renderbuffer: GraphicsHandle) {
        self.renderbuffers
            .release(ObjectKind::Renderbuffer, renderbuffer);
    }

    fn delete_framebuffer(&mut self, framebuffer: GraphicsHandle) {
        if self.bound.framebuffer == framebuffer {
            self.bound.framebuffer = GraphicsHandle::NONE;
        }
        self.framebuffers.release(ObjectKind::Framebuffer, framebuffer);
    }

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> GraphicsHandle {
        use wgpu::util::DeviceExt;

        let (label, usage) = match kind {
            BufferKind::Vertex => ("veneer vertex buffer", wgpu::BufferUsages::VERTEX),
            BufferKind::Index => ("veneer index buffer", wgpu::BufferUsages::INDEX),
        };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        self.buffers.insert(GpuBuffer { kind, buffer })
    }

    fn create_vertex_array(&mut self, desc: VertexArrayDesc) -> GraphicsHandle {
        self.vertex_arrays.insert(desc)
    }

    fn delete_buffer(&mut self, buffer: GraphicsHandle) {
        self.buffers.release(ObjectKind::Buffer, buffer);
    }

    fn delete_vertex_array(&mut self, vertex_array: GraphicsHandle) {
        if self.bound.vertex_array == vertex_array {
            self.bound.vertex_array = GraphicsHandle::NONE;
        }
        self.vertex_arrays
            .release(ObjectKind::VertexArray, vertex_array);
    }

    fn compile_shader(&mut self, kind: ShaderKind, source: &str) -> Result<GraphicsHandle, String> {
        let ir = front::compile_wgsl(kind, source)?;
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("veneer composite shader"),
                source: wgpu::ShaderSource::Wgsl(source.to_owned().into()),
            });
        Ok(self.shaders.insert(GpuShader { kind, ir, module }))
    }

    fn link_program(
        &mut self,
        vertex: GraphicsHandle,
        fragment: GraphicsHandle,
    ) -> Result<GraphicsHandle, String> {
        let vs = self
            .shaders
            .get(vertex)
            .filter(|s| s.kind == ShaderKind::Vertex)
            .ok_or_else(|| format!("{vertex} is not a vertex shader"))?;
        let fs = self
            .shaders
            .get(fragment)
            .filter(|s| s.kind == ShaderKind::Fragment)
            .ok_or_else(|| format!("{fragment} is not a fragment shader"))?;
        front::link(&vs.ir, &fs.ir)?;

        let program = GpuProgram {
            vertex: vs.module.clone(),
            fragment: fs.module.clone(),
            pipelines: HashMap::new(),
        };
        Ok(self.programs.insert(program))
    }

    fn delete_shader(&mut self, shader: GraphicsHandle) {
        self.shaders.release(ObjectKind::Shader, shader);
    }

    fn delete_program(&mut self, program: GraphicsHandle) {
        if self.bound.program == program {
            self.bound.program = GraphicsHandle::NONE;
        }
        self.programs.release(ObjectKind::Program, program);
    }

    fn bind_framebuffer(&mut self, framebuffer: GraphicsHandle) {
        self.bound.framebuffer = framebuffer;
    }

    fn use_program(&mut self, program: GraphicsHandle) {
        self.bound.program = program;
    }

    fn bind_vertex_array(&mut self, vertex_array: GraphicsHandle) {
        self.bound.vertex_array = vertex_array;
    }

    fn bind_texture(&mut self, texture: GraphicsHandle) {
        self.bound.texture = texture;
    }

    fn clear(&mut self, color: Color) -> Result<(), DeviceError> {
        let Some(target) = self.bound_target("clear")? else {
            return Ok(());
        };

        let encoder = self.encoder();
        let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("veneer clear pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: target.depth_stencil.as_ref().map(|view| {
                wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Store,
                    }),
                }
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
        Ok(())
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Color) -> Result<(), DeviceError> {
        let framebuffer = self.bound.framebuffer;
        if !framebuffer.is_allocated() {
            return Err(DeviceError::InvalidState(
                "fill_rect needs an offscreen framebuffer bound".into(),
            ));
        }
        let attachments = self.framebuffers.get(framebuffer).copied().ok_or(
            DeviceError::InvalidHandle {
                kind: ObjectKind::Framebuffer,
                handle: framebuffer,
            },
        )?;
        let image = self
            .textures
            .get(attachments.color)
            .ok_or(DeviceError::InvalidHandle {
                kind: ObjectKind::Texture,
                handle: attachments.color,
            })?;
        let Some((texture, _)) = image.view.as_ref() else {
            return Err(DeviceError::InvalidState(format!(
                "fill_rect on framebuffer {framebuffer}: {}",
                FramebufferStatus::UnsupportedDimensions
            )));
        };
        let Some(r) = rect.clipped_to(image.width, image.height) else {
            return Ok(());
        };
        let texture = texture.clone();

        // Queue writes run before the next submission; earlier passes must go first.
        self.submit_pending();

        let data = color.to_rgba8().repeat(r.width as usize * r.height as usize);
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d {
                    x: r.x,
                    y: r.y,
                    z: 0,
                },
                aspect: wgpu::TextureAspect::All,
            },
            &data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(r.width * 4),
                rows_per_image: Some(r.height),
            },
            wgpu::Extent3d {
                width: r.width,
                height: r.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn draw_elements(&mut self, index_count: u32) -> Result<(), DeviceError> {
        let Bindings {
            framebuffer,
            program,
            vertex_array,
            texture,
        } = self.bound;

        if !self.programs.contains(program) {
            return Err(DeviceError::InvalidHandle {
                kind: ObjectKind::Program,
                handle: program,
            });
        }
        let desc = self
            .vertex_arrays
            .get(vertex_array)
            .cloned()
            .ok_or(DeviceError::InvalidHandle {
                kind: ObjectKind::VertexArray,
                handle: vertex_array,
            })?;
        let vertex_buffer = self
            .buffers
            .get(desc.vertex_buffer)
            .map(|b| b.buffer.clone())
            .ok_or(DeviceError::InvalidHandle {
                kind: ObjectKind::Buffer,
                handle: desc.vertex_buffer,
            })?;
        let index_buffer = self
            .buffers
            .get(desc.index_buffer)
            .filter(|b| b.kind == BufferKind::Index)
            .map(|b| b.buffer.clone())
            .ok_or(DeviceError::InvalidHandle {
                kind: ObjectKind::Buffer,
                handle: desc.index_buffer,
            })?;
        let available = index_buffer.size() / std::mem::size_of::<u32>() as u64;
        if u64::from(index_count) > available {
            return Err(DeviceError::InvalidState(format!(
                "draw of {index_count} indices exceeds index buffer of {available}"
            )));
        }
        let sampled = self
            .textures
            .get(texture)
            .and_then(|img| img.view.as_ref())
            .map(|(_, view)| view.clone())
            .ok_or(DeviceError::InvalidHandle {
                kind: ObjectKind::Texture,
                handle: texture,
            })?;
        let sampling_own_target = self
            .framebuffers
            .get(framebuffer)
            .is_some_and(|a| a.color == texture);
        if sampling_own_target {
            return Err(DeviceError::InvalidState(format!(
                "texture {texture} is sampled while bound as render target"
            )));
        }

        let Some(target) = self.bound_target("draw")? else {
            return Ok(());
        };
        let pipeline = self.pipeline(program, vertex_array, &desc, target.format)?;
        let bind_group = self.bind_group(texture, &sampled);

        let encoder = self.encoder();
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("veneer composite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &target.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..index_count, 0, 0..1);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DeviceError> {
        self.submit_pending();
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DeviceError> {
        self.submit_pending();
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map(|_| ())
            .map_err(|e| DeviceError::Backend(e.to_string()))
    }

    fn resize_screen(&mut self, width: u32, height: u32) {
        // A frame acquired at the old size cannot be presented after reconfiguring.
        self.frame = None;
        self.screen.resize(&self.device, PhysicalSize::new(width, height));
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        self.submit_pending();
        let skipped = std::mem::take(&mut self.frame_skipped);

        let Some(frame) = self.frame.take() else {
            self.skipped_frames += 1;
            log::debug!(
                target: LogTree::TARGET,
                "frame skipped ({} so far): {}",
                self.skipped_frames,
                if skipped { "surface not drawable" } else { "nothing drawn to screen" }
            );
            return Ok(());
        };
        drop(frame.view);
        self.window.pre_present_notify();
        frame.texture.present();
        Ok(())
    }

    fn object_counts(&self) -> ObjectCounts {
        ObjectCounts {
            framebuffers: self.framebuffers.len(),
            textures: self.textures.len(),
            renderbuffers: self.renderbuffers.len(),
            buffers: self.buffers.len(),
            vertex_arrays: self.vertex_arrays.len(),
            shaders: self.shaders.len(),
            programs: self.programs.len(),
        }
    }
}
