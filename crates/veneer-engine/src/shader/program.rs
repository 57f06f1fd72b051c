use crate::device::{GraphicsDevice, GraphicsHandle, ShaderKind};
use crate::error::{RenderError, ShaderCompileError, ShaderStage};

use super::{ResourceLoader, load_or_placeholder};

/// The compositing program: one linked vertex + fragment pair.
///
/// No draw may reference the program until [`is_compiled`](Self::is_compiled)
/// is true; [`ready_handle`](Self::ready_handle) enforces that.
#[derive(Debug, Default)]
pub struct ShaderProgram {
    handle: GraphicsHandle,
    compiled: bool,
}

impl ShaderProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles both stages and links them.
    ///
    /// A previously compiled program is destroyed first. Per-stage shader
    /// objects never outlive this call, on success or failure.
    pub fn compile(
        &mut self,
        device: &mut dyn GraphicsDevice,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<GraphicsHandle, ShaderCompileError> {
        self.destroy(device);

        let vertex = device
            .compile_shader(ShaderKind::Vertex, vertex_source)
            .map_err(|log| ShaderCompileError::new(ShaderStage::Vertex, log))?;

        let fragment = match device.compile_shader(ShaderKind::Fragment, fragment_source) {
            Ok(fragment) => fragment,
            Err(log) => {
                device.delete_shader(vertex);
                return Err(ShaderCompileError::new(ShaderStage::Fragment, log));
            }
        };

        let linked = device.link_program(vertex, fragment);
        device.delete_shader(vertex);
        device.delete_shader(fragment);

        let program = linked.map_err(|log| ShaderCompileError::new(ShaderStage::Link, log))?;
        self.handle = program;
        self.compiled = true;
        log::debug!("compositing program {program} linked");
        Ok(program)
    }

    /// Loads both stages through `loader` and compiles them.
    ///
    /// A stage that fails to load is replaced by a placeholder that does not
    /// compile, so the error names that stage.
    pub fn compile_from(
        &mut self,
        device: &mut dyn GraphicsDevice,
        loader: &dyn ResourceLoader,
        vertex_path: &str,
        fragment_path: &str,
    ) -> Result<GraphicsHandle, ShaderCompileError> {
        let vertex_source = load_or_placeholder(loader, vertex_path);
        let fragment_source = load_or_placeholder(loader, fragment_path);
        self.compile(device, &vertex_source, &fragment_source)
    }

    /// Handle for use in a draw. Fails until the program is compiled.
    pub fn ready_handle(&self) -> Result<GraphicsHandle, RenderError> {
        if self.compiled {
            Ok(self.handle)
        } else {
            Err(RenderError::ProgramNotCompiled)
        }
    }

    #[inline]
    pub fn is_compiled(&self) -> bool {
        self.compiled
    }

    #[inline]
    pub fn handle(&self) -> GraphicsHandle {
        self.handle
    }

    /// Releases the program. Safe to call any number of times.
    pub fn destroy(&mut self, device: &mut dyn GraphicsDevice) {
        self.compiled = false;
        let handle = GraphicsHandle::take(&mut self.handle);
        if handle.is_allocated() {
            device.delete_program(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;
    use crate::shader::{
        COMPOSITE_FRAGMENT_PATH, COMPOSITE_FRAGMENT_SOURCE, COMPOSITE_VERTEX_PATH,
        COMPOSITE_VERTEX_SOURCE, EmbeddedResources,
    };

    #[test]
    fn compile_links_and_releases_stage_objects() {
        let mut dev = HeadlessDevice::default();
        let mut program = ShaderProgram::new();
        let handle = program
            .compile(&mut dev, COMPOSITE_VERTEX_SOURCE, COMPOSITE_FRAGMENT_SOURCE)
            .unwrap();

        assert!(program.is_compiled());
        assert_eq!(program.ready_handle().unwrap(), handle);
        let counts = dev.object_counts();
        assert_eq!(counts.programs, 1);
        assert_eq!(counts.shaders, 0);
    }

    #[test]
    fn invalid_fragment_reports_fragment_stage() {
        let mut dev = HeadlessDevice::default();
        let mut program = ShaderProgram::new();
        let err = program
            .compile(&mut dev, COMPOSITE_VERTEX_SOURCE, "fn fs_main( {")
            .unwrap_err();

        assert_eq!(err.stage, ShaderStage::Fragment);
        assert!(!err.log.trim().is_empty());
        assert!(!program.is_compiled());
        assert!(matches!(program.ready_handle(), Err(RenderError::ProgramNotCompiled)));
        assert_eq!(dev.object_counts().total(), 0);
    }

    #[test]
    fn mismatched_interface_fails_at_link() {
        let mut dev = HeadlessDevice::default();
        let mut program = ShaderProgram::new();
        let vs = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";
        let err = program.compile(&mut dev, vs, COMPOSITE_FRAGMENT_SOURCE).unwrap_err();

        assert_eq!(err.stage, ShaderStage::Link);
        assert_eq!(dev.object_counts().total(), 0);
    }

    #[test]
    fn missing_resource_fails_that_stage() {
        let mut dev = HeadlessDevice::default();
        let mut program = ShaderProgram::new();
        let loader = EmbeddedResources::new().with(COMPOSITE_VERTEX_PATH, COMPOSITE_VERTEX_SOURCE);
        let err = program
            .compile_from(&mut dev, &loader, COMPOSITE_VERTEX_PATH, COMPOSITE_FRAGMENT_PATH)
            .unwrap_err();
        assert_eq!(err.stage, ShaderStage::Fragment);
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut dev = HeadlessDevice::default();
        let mut program = ShaderProgram::new();
        program
            .compile(&mut dev, COMPOSITE_VERTEX_SOURCE, COMPOSITE_FRAGMENT_SOURCE)
            .unwrap();

        program.destroy(&mut dev);
        program.destroy(&mut dev);
        assert_eq!(program.handle(), GraphicsHandle::NONE);
        assert!(!program.is_compiled());
        assert_eq!(dev.object_counts().programs, 0);
    }
}
