use crate::logging::LogTree;
use crate::paint::Color;
use crate::shader::front;

use super::{
    AttachmentInfo, Attachments, Bindings, BufferKind, DeviceError, FramebufferStatus,
    GraphicsDevice, GraphicsHandle, HandleTable, ObjectCounts, ObjectKind, PixelRect, ShaderKind,
    VertexArrayDesc, attachment_status,
};

/// Configuration for [`HeadlessDevice`].
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Largest texture or renderbuffer edge the device accepts for rendering.
    ///
    /// Larger attachments can be created but make a framebuffer incomplete.
    pub max_texture_dimension: u32,

    /// Initial on-screen framebuffer size.
    pub screen_size: (u32, u32),
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            max_texture_dimension: 8192,
            screen_size: (640, 480),
        }
    }
}

/// Command recorded by [`HeadlessDevice`], in submission order.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BindFramebuffer(GraphicsHandle),
    UseProgram(GraphicsHandle),
    BindVertexArray(GraphicsHandle),
    BindTexture(GraphicsHandle),
    Clear {
        framebuffer: GraphicsHandle,
        color: Color,
    },
    FillRect {
        framebuffer: GraphicsHandle,
        rect: PixelRect,
        color: Color,
    },
    DrawElements {
        framebuffer: GraphicsHandle,
        program: GraphicsHandle,
        vertex_array: GraphicsHandle,
        texture: GraphicsHandle,
        index_count: u32,
    },
    Flush,
    Finish,
    ResizeScreen {
        width: u32,
        height: u32,
    },
    Present,
}

fn fits(width: u32, height: u32, max_dimension: u32) -> bool {
    (1..=max_dimension).contains(&width) && (1..=max_dimension).contains(&height)
}

#[derive(Debug)]
struct Image {
    width: u32,
    height: u32,
    supported: bool,
    /// Premultiplied RGBA8, row-major. Empty for unsupported sizes.
    pixels: Vec<u8>,
}

impl Image {
    fn new(width: u32, height: u32, max_dimension: u32) -> Self {
        let supported = fits(width, height, max_dimension);
        let pixels = if supported {
            vec![0; width as usize * height as usize * 4]
        } else {
            Vec::new()
        };
        Self {
            width,
            height,
            supported,
            pixels,
        }
    }

    fn info(&self) -> AttachmentInfo {
        AttachmentInfo {
            width: self.width,
            height: self.height,
            supported: self.supported,
        }
    }

    fn fill(&mut self, rect: PixelRect, texel: [u8; 4]) {
        if !self.supported {
            return;
        }
        let Some(r) = rect.clipped_to(self.width, self.height) else {
            return;
        };
        let row_len = self.width as usize * 4;
        for y in r.y..r.y + r.height {
            let start = y as usize * row_len + r.x as usize * 4;
            let end = start + r.width as usize * 4;
            for px in self.pixels[start..end].chunks_exact_mut(4) {
                px.copy_from_slice(&texel);
            }
        }
    }

    fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if !self.supported || x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.pixels[i..i + 4]);
        Some(out)
    }
}

#[derive(Debug)]
struct Buffer {
    kind: BufferKind,
    bytes: Vec<u8>,
}

#[derive(Debug)]
struct Shader {
    kind: ShaderKind,
    module: naga::Module,
}

/// Software graphics device.
///
/// Tracks every object it hands out, keeps buffer contents and texture pixels
/// in memory, validates framebuffer completeness and binding state with the
/// same rules as the GPU backend, and records an ordered command log. Shaders
/// go through the real WGSL front end.
///
/// Nothing is rasterized except `clear` and `fill_rect` on offscreen targets.
#[derive(Debug)]
pub struct HeadlessDevice {
    config: HeadlessConfig,

    textures: HandleTable<Image>,
    renderbuffers: HandleTable<Image>,
    framebuffers: HandleTable<Attachments>,
    buffers: HandleTable<Buffer>,
    vertex_arrays: HandleTable<VertexArrayDesc>,
    shaders: HandleTable<Shader>,
    programs: HandleTable<()>,

    bound: Bindings,
    commands: Vec<Command>,
    screen_size: (u32, u32),
    presented_frames: u64,
    skipped_frames: u64,
}

impl HeadlessDevice {
    pub fn new(config: HeadlessConfig) -> Self {
        let screen_size = config.screen_size;
        Self {
            config,
            textures: HandleTable::new(),
            renderbuffers: HandleTable::new(),
            framebuffers: HandleTable::new(),
            buffers: HandleTable::new(),
            vertex_arrays: HandleTable::new(),
            shaders: HandleTable::new(),
            programs: HandleTable::new(),
            bound: Bindings::default(),
            commands: Vec::new(),
            screen_size,
            presented_frames: 0,
            skipped_frames: 0,
        }
    }

    /// Commands recorded since creation or the last [`take_commands`](Self::take_commands).
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    /// Contents of a live buffer.
    pub fn buffer_contents(&self, buffer: GraphicsHandle) -> Option<&[u8]> {
        self.buffers.get(buffer).map(|b| b.bytes.as_slice())
    }

    /// Premultiplied RGBA8 texel of a live texture.
    pub fn pixel(&self, texture: GraphicsHandle, x: u32, y: u32) -> Option<[u8; 4]> {
        self.textures.get(texture).and_then(|img| img.pixel(x, y))
    }

    pub fn texture_size(&self, texture: GraphicsHandle) -> Option<(u32, u32)> {
        self.textures.get(texture).map(|img| (img.width, img.height))
    }

    /// Attachments currently recorded on a framebuffer.
    pub fn framebuffer_attachments(
        &self,
        framebuffer: GraphicsHandle,
    ) -> Option<(GraphicsHandle, GraphicsHandle)> {
        self.framebuffers
            .get(framebuffer)
            .map(|a| (a.color, a.depth_stencil))
    }

    pub fn bound_framebuffer(&self) -> GraphicsHandle {
        self.bound.framebuffer
    }

    pub fn bound_program(&self) -> GraphicsHandle {
        self.bound.program
    }

    pub fn bound_vertex_array(&self) -> GraphicsHandle {
        self.bound.vertex_array
    }

    pub fn screen_size(&self) -> (u32, u32) {
        self.screen_size
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented_frames
    }

    /// Presents dropped because the screen had no drawable area.
    pub fn skipped_frames(&self) -> u64 {
        self.skipped_frames
    }

    fn bound_color_image(&mut self, operation: &str) -> Result<&mut Image, DeviceError> {
        let framebuffer = self.bound.framebuffer;
        if !framebuffer.is_allocated() {
            return Err(DeviceError::InvalidState(format!(
                "{operation} needs an offscreen framebuffer bound"
            )));
        }
        let attachments = *self.framebuffers.get(framebuffer).ok_or(DeviceError::InvalidHandle {
            kind: ObjectKind::Framebuffer,
            handle: framebuffer,
        })?;
        self.textures
            .get_mut(attachments.color)
            .ok_or(DeviceError::InvalidHandle {
                kind: ObjectKind::Texture,
                handle: attachments.color,
            })
    }

    fn check_draw_state(&self, index_count: u32) -> Result<(), DeviceError> {
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
        let desc = self.vertex_arrays.get(vertex_array).ok_or(DeviceError::InvalidHandle {
            kind: ObjectKind::VertexArray,
            handle: vertex_array,
        })?;
        if !self.textures.contains(texture) {
            return Err(DeviceError::InvalidHandle {
                kind: ObjectKind::Texture,
                handle: texture,
            });
        }
        if !self.buffers.contains(desc.vertex_buffer) {
            return Err(DeviceError::InvalidHandle {
                kind: ObjectKind::Buffer,
                handle: desc.vertex_buffer,
            });
        }
        let indices = self
            .buffers
            .get(desc.index_buffer)
            .filter(|b| b.kind == BufferKind::Index)
            .ok_or(DeviceError::InvalidHandle {
                kind: ObjectKind::Buffer,
                handle: desc.index_buffer,
            })?;
        let available = indices.bytes.len() / std::mem::size_of::<u32>();
        if index_count as usize > available {
            return Err(DeviceError::InvalidState(format!(
                "draw of {index_count} indices exceeds index buffer of {available}"
            )));
        }

        if framebuffer.is_allocated() {
            let status = self.framebuffer_status(framebuffer);
            if !status.is_complete() {
                return Err(DeviceError::InvalidState(format!(
                    "draw into framebuffer {framebuffer}: {status}"
                )));
            }
            let sampling_own_target = self
                .framebuffers
                .get(framebuffer)
                .is_some_and(|a| a.color == texture);
            if sampling_own_target {
                return Err(DeviceError::InvalidState(format!(
                    "texture {texture} is sampled while bound as render target"
                )));
            }
        }
        Ok(())
    }
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new(HeadlessConfig::default())
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn create_texture(&mut self, width: u32, height: u32) -> GraphicsHandle {
        self.textures
            .insert(Image::new(width, height, self.config.max_texture_dimension))
    }

    fn create_renderbuffer(&mut self, width: u32, height: u32) -> GraphicsHandle {
        let supported = fits(width, height, self.config.max_texture_dimension);
        self.renderbuffers.insert(Image {
            width,
            height,
            supported,
            pixels: Vec::new(),
        })
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
            self.textures.get(a.color).map(Image::info),
            self.renderbuffers.get(a.depth_stencil).map(Image::info),
        )
    }

    fn delete_texture(&mut self, texture: GraphicsHandle) {
        self.textures.release(ObjectKind::Texture, texture);
    }

    fn delete_renderbuffer(&mut self, renderbuffer: GraphicsHandle) {
        self.renderbuffers.release(ObjectKind::Renderbuffer, renderbuffer);
    }

    fn delete_framebuffer(&mut self, framebuffer: GraphicsHandle) {
        if self.bound.framebuffer == framebuffer {
            self.bound.framebuffer = GraphicsHandle::NONE;
        }
        self.framebuffers.release(ObjectKind::Framebuffer, framebuffer);
    }

    fn create_buffer(&mut self, kind: BufferKind, contents: &[u8]) -> GraphicsHandle {
        self.buffers.insert(Buffer {
            kind,
            bytes: contents.to_vec(),
        })
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
        self.vertex_arrays.release(ObjectKind::VertexArray, vertex_array);
    }

    fn compile_shader(&mut self, kind: ShaderKind, source: &str) -> Result<GraphicsHandle, String> {
        let module = front::compile_wgsl(kind, source)?;
        Ok(self.shaders.insert(Shader { kind, module }))
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
        front::link(&vs.module, &fs.module)?;
        Ok(self.programs.insert(()))
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
        self.commands.push(Command::BindFramebuffer(framebuffer));
    }

    fn use_program(&mut self, program: GraphicsHandle) {
        self.bound.program = program;
        self.commands.push(Command::UseProgram(program));
    }

    fn bind_vertex_array(&mut self, vertex_array: GraphicsHandle) {
        self.bound.vertex_array = vertex_array;
        self.commands.push(Command::BindVertexArray(vertex_array));
    }

    fn bind_texture(&mut self, texture: GraphicsHandle) {
        self.bound.texture = texture;
        self.commands.push(Command::BindTexture(texture));
    }

    fn clear(&mut self, color: Color) -> Result<(), DeviceError> {
        let framebuffer = self.bound.framebuffer;
        if framebuffer.is_allocated() {
            let status = self.framebuffer_status(framebuffer);
            if !status.is_complete() {
                return Err(DeviceError::InvalidState(format!(
                    "clear of framebuffer {framebuffer}: {status}"
                )));
            }
            let image = self.bound_color_image("clear")?;
            let full = PixelRect::new(0, 0, image.width, image.height);
            image.fill(full, color.to_rgba8());
        }
        self.commands.push(Command::Clear { framebuffer, color });
        Ok(())
    }

    fn fill_rect(&mut self, rect: PixelRect, color: Color) -> Result<(), DeviceError> {
        self.bound_color_image("fill_rect")?.fill(rect, color.to_rgba8());
        self.commands.push(Command::FillRect {
            framebuffer: self.bound.framebuffer,
            rect,
            color,
        });
        Ok(())
    }

    fn draw_elements(&mut self, index_count: u32) -> Result<(), DeviceError> {
        self.check_draw_state(index_count)?;
        let Bindings {
            framebuffer,
            program,
            vertex_array,
            texture,
        } = self.bound;
        self.commands.push(Command::DrawElements {
            framebuffer,
            program,
            vertex_array,
            texture,
            index_count,
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DeviceError> {
        self.commands.push(Command::Flush);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), DeviceError> {
        self.commands.push(Command::Finish);
        Ok(())
    }

    fn resize_screen(&mut self, width: u32, height: u32) {
        self.screen_size = (width, height);
        self.commands.push(Command::ResizeScreen { width, height });
    }

    fn present(&mut self) -> Result<(), DeviceError> {
        self.commands.push(Command::Present);
        let (width, height) = self.screen_size;
        if width == 0 || height == 0 {
            self.skipped_frames += 1;
            log::debug!(
                target: LogTree::TARGET,
                "frame skipped ({} so far): screen is {width}x{height}",
                self.skipped_frames
            );
            return Ok(());
        }
        self.presented_frames += 1;
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

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_framebuffer(dev: &mut HeadlessDevice, w: u32, h: u32) -> (GraphicsHandle, GraphicsHandle) {
        let fb = dev.create_framebuffer();
        let tex = dev.create_texture(w, h);
        let rb = dev.create_renderbuffer(w, h);
        dev.attach_color(fb, tex);
        dev.attach_depth_stencil(fb, rb);
        (fb, tex)
    }

    #[test]
    fn present_on_a_hidden_screen_is_skipped() {
        let mut dev = HeadlessDevice::default();
        dev.present().unwrap();
        dev.resize_screen(0, 480);
        dev.present().unwrap();
        dev.resize_screen(320, 240);
        dev.present().unwrap();

        assert_eq!(dev.presented_frames(), 2);
        assert_eq!(dev.skipped_frames(), 1);
    }

    #[test]
    fn framebuffer_becomes_complete_once_attached() {
        let mut dev = HeadlessDevice::default();
        let fb = dev.create_framebuffer();
        assert_eq!(dev.framebuffer_status(fb), FramebufferStatus::MissingColorAttachment);

        let tex = dev.create_texture(16, 8);
        dev.attach_color(fb, tex);
        assert_eq!(
            dev.framebuffer_status(fb),
            FramebufferStatus::MissingDepthStencilAttachment
        );

        let rb = dev.create_renderbuffer(16, 8);
        dev.attach_depth_stencil(fb, rb);
        assert!(dev.framebuffer_status(fb).is_complete());

        dev.delete_texture(tex);
        assert_eq!(dev.framebuffer_status(fb), FramebufferStatus::MissingColorAttachment);
    }

    #[test]
    fn oversized_attachments_are_unsupported() {
        let mut dev = HeadlessDevice::new(HeadlessConfig {
            max_texture_dimension: 64,
            ..Default::default()
        });
        let (fb, _) = complete_framebuffer(&mut dev, 65, 10);
        assert_eq!(dev.framebuffer_status(fb), FramebufferStatus::UnsupportedDimensions);
    }

    #[test]
    fn clear_and_fill_write_texels() {
        let mut dev = HeadlessDevice::default();
        let (fb, tex) = complete_framebuffer(&mut dev, 4, 4);
        dev.bind_framebuffer(fb);
        dev.clear(Color::WHITE).unwrap();
        dev.fill_rect(PixelRect::new(1, 1, 2, 10), Color::BLACK).unwrap();

        assert_eq!(dev.pixel(tex, 0, 0), Some([255, 255, 255, 255]));
        assert_eq!(dev.pixel(tex, 1, 1), Some([0, 0, 0, 255]));
        assert_eq!(dev.pixel(tex, 2, 3), Some([0, 0, 0, 255]));
        assert_eq!(dev.pixel(tex, 3, 3), Some([255, 255, 255, 255]));
    }

    #[test]
    fn fill_on_screen_is_rejected() {
        let mut dev = HeadlessDevice::default();
        dev.bind_framebuffer(GraphicsHandle::NONE);
        let err = dev.fill_rect(PixelRect::new(0, 0, 1, 1), Color::BLACK).unwrap_err();
        assert!(matches!(err, DeviceError::InvalidState(_)));
    }

    #[test]
    fn draw_without_program_fails() {
        let mut dev = HeadlessDevice::default();
        let err = dev.draw_elements(6).unwrap_err();
        assert!(matches!(
            err,
            DeviceError::InvalidHandle {
                kind: ObjectKind::Program,
                ..
            }
        ));
    }

    #[test]
    fn counts_follow_creation_and_deletion() {
        let mut dev = HeadlessDevice::default();
        let buf = dev.create_buffer(BufferKind::Vertex, &[1, 2, 3, 4]);
        assert_eq!(dev.buffer_contents(buf), Some(&[1u8, 2, 3, 4][..]));
        assert_eq!(dev.object_counts().buffers, 1);

        dev.delete_buffer(buf);
        dev.delete_buffer(buf);
        dev.delete_buffer(GraphicsHandle::NONE);
        assert_eq!(dev.object_counts(), ObjectCounts::default());
    }

    #[test]
    fn failed_compile_creates_no_object() {
        let mut dev = HeadlessDevice::default();
        assert!(dev.compile_shader(ShaderKind::Fragment, "not wgsl").is_err());
        assert_eq!(dev.object_counts().shaders, 0);
    }
}
