use std::rc::Rc;
use std::time::Instant;

use crate::device::{GraphicsDevice, GraphicsHandle};
use crate::error::RenderError;
use crate::logging::{LogSink, LogTree, TraceGroup};
use crate::paint::Color;
use crate::schedule::{FrameScheduler, Invalidator};
use crate::shader::{
    COMPOSITE_FRAGMENT_PATH, COMPOSITE_VERTEX_PATH, EmbeddedResources, ResourceLoader,
    ShaderProgram,
};
use crate::target::{CompositingMesh, OffscreenTarget, QUAD_INDEX_COUNT, TargetState};
use crate::time::FrameClock;

use super::{AppControl, Canvas, CanvasSurface, EngineHooks, FrameState, HostEvent, UiEngine};

/// Compositor configuration.
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    /// Color the offscreen target is cleared to before each paint.
    pub clear_color: Color,
    pub vertex_path: String,
    pub fragment_path: String,
    /// Log an info line every this many renders. Zero disables it.
    pub progress_interval: u64,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            clear_color: Color::WHITE,
            vertex_path: COMPOSITE_VERTEX_PATH.to_string(),
            fragment_path: COMPOSITE_FRAGMENT_PATH.to_string(),
            progress_interval: 100,
        }
    }
}

/// Owns the GPU objects of the offscreen pipeline and drives a UI engine.
///
/// Lifecycle:
/// - `new` wires the engine to the scheduler; no GPU work happens
/// - `initialize` compiles the program, uploads the mesh, creates the target
///   and its canvas surface
/// - `tick` / `handle_event` render frames
/// - `shutdown` releases everything; it is idempotent and unconditional
///
/// Every frame follows the same order: bind target, clear, paint, flush,
/// bind screen, draw the quad with the target's color texture, unbind,
/// present.
pub struct Compositor<D, E> {
    device: D,
    engine: E,
    config: CompositorConfig,

    program: ShaderProgram,
    mesh: CompositingMesh,
    target: OffscreenTarget,
    canvas: Option<CanvasSurface>,
    canvas_generation: u64,

    frame: FrameState,
    scheduler: FrameScheduler,
    clock: FrameClock,

    sink: Rc<dyn LogSink>,
    resources: Box<dyn ResourceLoader>,
    shut_down: bool,
}

impl<D, E> Compositor<D, E>
where
    D: GraphicsDevice,
    E: UiEngine,
{
    /// Creates a compositor for a `width` x `height` pixel drawable.
    ///
    /// `make_engine` receives the repaint and task hooks the engine keeps.
    pub fn new(
        device: D,
        config: CompositorConfig,
        width: u32,
        height: u32,
        scale: f32,
        make_engine: impl FnOnce(EngineHooks) -> E,
    ) -> Self {
        let scheduler = FrameScheduler::new();
        let engine = make_engine(EngineHooks {
            invalidator: scheduler.invalidator(),
            spawner: scheduler.spawner(),
        });

        Self {
            device,
            engine,
            config,
            program: ShaderProgram::new(),
            mesh: CompositingMesh::new(),
            target: OffscreenTarget::new(),
            canvas: None,
            canvas_generation: 0,
            frame: FrameState::new(width, height, scale),
            scheduler,
            clock: FrameClock::new(),
            sink: Rc::new(LogTree::new()),
            resources: Box::new(EmbeddedResources::builtin()),
            shut_down: false,
        }
    }

    pub fn with_log_sink(mut self, sink: Rc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_resources(mut self, resources: Box<dyn ResourceLoader>) -> Self {
        self.resources = resources;
        self
    }

    /// Builds every GPU object and schedules the first frame.
    ///
    /// On failure everything already allocated is released before the error
    /// is returned.
    pub fn initialize(&mut self) -> Result<(), RenderError> {
        if self.shut_down {
            return Err(RenderError::ShutDown);
        }

        let group = TraceGroup::enter(&self.sink, "initialize");
        if let Err(err) = self.build(&group) {
            group.log(&format!("failed: {err}"));
            log::error!("compositor initialization failed: {err}");
            self.release();
            return Err(err);
        }

        self.scheduler.invalidator().invalidate();
        log::info!(
            "compositor ready at {}x{} (scale {})",
            self.frame.width,
            self.frame.height,
            self.frame.scale
        );
        Ok(())
    }

    fn build(&mut self, group: &TraceGroup) -> Result<(), RenderError> {
        self.program.compile_from(
            &mut self.device,
            self.resources.as_ref(),
            &self.config.vertex_path,
            &self.config.fragment_path,
        )?;
        group.log(&format!("program {}", self.program.handle()));

        self.mesh.create(&mut self.device);
        group.log(&format!("mesh {}", self.mesh.vertex_array()));

        let FrameState { width, height, scale, .. } = self.frame;
        self.target.create(&mut self.device, width, height)?;
        group.log(&format!("target {} {width}x{height}", self.target.framebuffer()));

        self.open_canvas();
        self.engine.set_size(width, height);
        self.engine.set_scale(scale);
        Ok(())
    }

    /// Renders one frame, regardless of whether a repaint was requested.
    pub fn render(&mut self) -> Result<(), RenderError> {
        if self.shut_down {
            return Err(RenderError::ShutDown);
        }
        let program = self.program.ready_handle()?;
        let vertex_array = self.mesh.ready_vertex_array()?;
        let texture = self.target.ready_color_attachment()?;
        let surface = self
            .canvas
            .ok_or(RenderError::TargetNotReady { operation: "paint" })?;

        let time = self.clock.tick();
        let group = TraceGroup::enter(&self.sink, "render");

        self.target.bind(&mut self.device)?;
        self.device.clear(self.config.clear_color)?;
        {
            let mut canvas = Canvas::new(&mut self.device, surface, self.frame.scale);
            self.engine.paint(&mut canvas, time.timestamp_nanos)?;
        }
        self.device.flush()?;

        self.device.bind_framebuffer(GraphicsHandle::NONE);
        self.device.use_program(program);
        self.device.bind_vertex_array(vertex_array);
        self.device.bind_texture(texture);
        self.device.draw_elements(QUAD_INDEX_COUNT)?;
        self.device.bind_vertex_array(GraphicsHandle::NONE);
        self.device.use_program(GraphicsHandle::NONE);

        self.device.present()?;

        let frames = self.frame.record_frame();
        group.log(&format!("frame {frames} at {}ns", time.timestamp_nanos));
        let interval = self.config.progress_interval;
        if interval > 0 && frames % interval == 0 {
            log::info!("rendered {frames} frames");
        }
        Ok(())
    }

    /// Runs ready UI tasks, then renders once if a repaint is pending.
    ///
    /// Returns whether a frame was rendered.
    pub fn tick(&mut self, now: Instant) -> Result<bool, RenderError> {
        if self.shut_down {
            return Ok(false);
        }
        if !self.scheduler.begin_frame(now) {
            return Ok(false);
        }
        self.render()?;
        Ok(true)
    }

    /// When the loop should next call [`tick`](Self::tick): `now` if a
    /// repaint is pending, else the next task deadline.
    pub fn next_wakeup(&self, now: Instant) -> Option<Instant> {
        if self.shut_down {
            return None;
        }
        if self.scheduler.is_pending() {
            return Some(now);
        }
        self.scheduler.next_task_deadline(now)
    }

    /// Applies one host event.
    ///
    /// After [`shutdown`](Self::shutdown) every event is dropped and the
    /// answer is [`AppControl::Exit`]; the host may still deliver events
    /// queued before it stopped.
    pub fn handle_event(&mut self, event: HostEvent) -> Result<AppControl, RenderError> {
        log::trace!("host event {:?}", event.kind());
        if self.shut_down {
            return Ok(AppControl::Exit);
        }
        match event {
            HostEvent::Resized { width, height } => {
                self.resize(width, height)?;
                Ok(AppControl::Continue)
            }
            HostEvent::ContentScaleChanged { scale_x, scale_y } => {
                if (scale_x - scale_y).abs() > f32::EPSILON {
                    log::debug!("non-uniform content scale {scale_x}x{scale_y}; using {scale_x}");
                }
                self.rescale(scale_x);
                Ok(AppControl::Continue)
            }
            HostEvent::CloseRequested => Ok(AppControl::Exit),
            HostEvent::Input(input) => {
                self.engine.handle_input(&input);
                Ok(AppControl::Continue)
            }
        }
    }

    /// Resizes the target to follow the window and renders right away.
    ///
    /// Zero dimensions are clamped to 1 for the target; the screen is told
    /// the real size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if self.shut_down {
            return Err(RenderError::ShutDown);
        }
        if self.target.state() != TargetState::Ready {
            return Err(RenderError::TargetNotReady { operation: "resize" });
        }
        let group = TraceGroup::enter(&self.sink, "resize");
        let (target_w, target_h) = self.frame.resize(width, height);
        group.log(&format!("{width}x{height} -> target {target_w}x{target_h}"));
        self.engine.set_size(target_w, target_h);

        self.canvas = None;
        self.device.flush()?;
        self.device.finish()?;

        self.device.resize_screen(width, height);
        self.target.resize(&mut self.device, target_w, target_h)?;
        self.open_canvas();
        drop(group);

        self.scheduler.take_pending();
        self.render()
    }

    /// Applies a new content scale and requests a repaint.
    pub fn rescale(&mut self, scale: f32) {
        let scale = self.frame.set_scale(scale);
        let _group = TraceGroup::enter(&self.sink, "rescale");
        self.sink.log(&format!("scale {scale}"));
        self.engine.set_scale(scale);
        self.scheduler.invalidator().invalidate();
    }

    /// Drops pending work and releases every GPU object.
    ///
    /// Runs in full even after a failed render. Later calls do nothing.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        let _group = TraceGroup::enter(&self.sink, "shutdown");
        self.scheduler.discard();
        if let Err(err) = self.device.finish() {
            log::warn!("device did not go idle before teardown: {err}");
        }
        self.release();
        self.shut_down = true;
        log::info!("compositor shut down after {} frames", self.frame.frame_counter);
    }

    fn release(&mut self) {
        self.canvas = None;
        self.target.destroy(&mut self.device);
        self.mesh.destroy(&mut self.device);
        self.program.destroy(&mut self.device);
    }

    fn open_canvas(&mut self) {
        self.canvas_generation += 1;
        let (width, height) = self.target.size();
        self.canvas = Some(CanvasSurface {
            framebuffer: self.target.framebuffer(),
            width,
            height,
            generation: self.canvas_generation,
        });
    }

    pub fn invalidator(&self) -> Invalidator {
        self.scheduler.invalidator()
    }

    pub fn is_repaint_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn frame_state(&self) -> &FrameState {
        &self.frame
    }

    pub fn canvas_surface(&self) -> Option<CanvasSurface> {
        self.canvas
    }

    pub fn target(&self) -> &OffscreenTarget {
        &self.target
    }

    pub fn mesh(&self) -> &CompositingMesh {
        &self.mesh
    }

    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::time::Duration;

    use super::*;
    use crate::device::{Command, DeviceError, HeadlessDevice, PixelRect};
    use crate::error::ShaderStage;
    use crate::input::InputEvent;
    use crate::logging::NoopSink;

    const INK: Color = Color::from_premul(0.0, 0.0, 1.0, 1.0);

    #[derive(Default)]
    struct ScriptedEngine {
        size: (u32, u32),
        scale: f32,
        paints: u32,
        inputs: u32,
        invalidate_while_painting: Rc<Cell<u32>>,
        invalidator: Option<Invalidator>,
    }

    impl UiEngine for ScriptedEngine {
        fn set_size(&mut self, width: u32, height: u32) {
            self.size = (width, height);
        }

        fn set_scale(&mut self, scale: f32) {
            self.scale = scale;
        }

        fn paint(&mut self, canvas: &mut Canvas<'_>, _ts: u64) -> Result<(), DeviceError> {
            self.paints += 1;
            canvas.fill_rect(PixelRect::new(0, 0, 2, 2), INK)?;
            let left = self.invalidate_while_painting.get();
            if left > 0 {
                self.invalidate_while_painting.set(left - 1);
                if let Some(inv) = &self.invalidator {
                    inv.invalidate();
                }
            }
            Ok(())
        }

        fn handle_input(&mut self, _event: &InputEvent) {
            self.inputs += 1;
            if let Some(inv) = &self.invalidator {
                inv.invalidate();
            }
        }
    }

    fn compositor(width: u32, height: u32) -> Compositor<HeadlessDevice, ScriptedEngine> {
        Compositor::new(
            HeadlessDevice::default(),
            CompositorConfig::default(),
            width,
            height,
            1.0,
            |hooks| ScriptedEngine {
                invalidator: Some(hooks.invalidator),
                ..Default::default()
            },
        )
    }

    fn ready(width: u32, height: u32) -> Compositor<HeadlessDevice, ScriptedEngine> {
        let mut c = compositor(width, height);
        c.initialize().unwrap();
        c
    }

    /// Sink that keeps every call, one entry per line.
    #[derive(Default)]
    struct Recorder {
        lines: RefCell<Vec<String>>,
    }

    impl Recorder {
        fn groups(&self) -> Vec<String> {
            self.lines
                .borrow()
                .iter()
                .filter_map(|l| l.strip_prefix("enter ").map(str::to_owned))
                .collect()
        }
    }

    impl LogSink for Recorder {
        fn enter(&self, name: &str) {
            self.lines.borrow_mut().push(format!("enter {name}"));
        }

        fn log(&self, line: &str) {
            self.lines.borrow_mut().push(format!("log {line}"));
        }

        fn exit(&self) {
            self.lines.borrow_mut().push("exit".to_owned());
        }
    }

    fn exercise(c: &mut Compositor<HeadlessDevice, ScriptedEngine>) {
        c.initialize().unwrap();
        c.tick(Instant::now()).unwrap();
        c.handle_event(HostEvent::Resized { width: 32, height: 24 }).unwrap();
        c.rescale(2.0);
        c.tick(Instant::now()).unwrap();
        c.shutdown();
    }

    #[test]
    fn end_to_end_create_render_resize_destroy() {
        let mut c = ready(640, 480);
        assert!(c.tick(Instant::now()).unwrap());
        assert_eq!(c.target().size(), (640, 480));

        c.handle_event(HostEvent::Resized { width: 800, height: 600 }).unwrap();
        assert_eq!(c.target().state(), TargetState::Ready);
        assert_eq!(c.target().size(), (800, 600));
        assert_eq!(c.engine().size, (800, 600));
        assert_eq!(c.frame_state().frame_counter, 2);
        assert_eq!(c.device().presented_frames(), 2);

        c.shutdown();
        assert_eq!(c.target().state(), TargetState::Uninitialized);
        assert_eq!(c.device().object_counts().total(), 0);
    }

    #[test]
    fn frame_follows_the_compositing_protocol() {
        let mut c = ready(16, 16);
        c.device_mut().take_commands();
        c.render().unwrap();

        let fb = c.target().framebuffer();
        let tex = c.target().color_texture();
        let program = c.program().handle();
        let vao = c.mesh().vertex_array();
        let none = GraphicsHandle::NONE;
        assert_eq!(
            c.device().commands(),
            &[
                Command::BindFramebuffer(fb),
                Command::Clear { framebuffer: fb, color: Color::WHITE },
                Command::FillRect {
                    framebuffer: fb,
                    rect: PixelRect::new(0, 0, 2, 2),
                    color: INK,
                },
                Command::Flush,
                Command::BindFramebuffer(none),
                Command::UseProgram(program),
                Command::BindVertexArray(vao),
                Command::BindTexture(tex),
                Command::DrawElements {
                    framebuffer: none,
                    program,
                    vertex_array: vao,
                    texture: tex,
                    index_count: 6,
                },
                Command::BindVertexArray(none),
                Command::UseProgram(none),
                Command::Present,
            ]
        );
        assert_eq!(c.device().pixel(tex, 1, 1), Some(INK.to_rgba8()));
        assert_eq!(c.device().pixel(tex, 5, 5), Some([255, 255, 255, 255]));
    }

    #[test]
    fn invalidations_coalesce_into_one_render() {
        let mut c = ready(32, 32);
        let inv = c.invalidator();
        for _ in 0..10 {
            inv.invalidate();
        }
        let now = Instant::now();
        assert!(c.tick(now).unwrap());
        assert!(!c.tick(now).unwrap());
        assert_eq!(c.engine().paints, 1);
    }

    #[test]
    fn invalidation_during_paint_renders_once_more() {
        let mut c = ready(32, 32);
        c.engine_mut().invalidate_while_painting.set(1);
        let now = Instant::now();
        assert!(c.tick(now).unwrap());
        assert!(c.is_repaint_pending());
        assert!(c.tick(now).unwrap());
        assert!(!c.tick(now).unwrap());
        assert_eq!(c.engine().paints, 2);
    }

    #[test]
    fn repeated_resizes_do_not_leak() {
        let mut c = ready(100, 100);
        let baseline = c.device().object_counts();
        for i in 1..=20 {
            c.resize(100 + i * 7, 100 + i * 3).unwrap();
            assert_eq!(c.device().object_counts(), baseline);
        }
        assert_eq!(c.target().size(), (240, 160));
        assert_eq!(c.canvas_surface().map(|s| s.generation), Some(21));
    }

    #[test]
    fn mesh_is_untouched_by_resizes() {
        use crate::target::{QUAD_INDICES, QUAD_VERTICES};

        let mut c = ready(100, 100);
        let vertex_array = c.mesh().vertex_array();
        for (w, h) in [(300, 200), (1, 1), (640, 480)] {
            c.resize(w, h).unwrap();
        }

        let mesh = c.mesh();
        assert_eq!(mesh.vertex_array(), vertex_array);
        assert_eq!(
            c.device().buffer_contents(mesh.vertex_buffer()),
            Some(bytemuck::cast_slice::<_, u8>(&QUAD_VERTICES))
        );
        assert_eq!(
            c.device().buffer_contents(mesh.index_buffer()),
            Some(bytemuck::cast_slice::<_, u8>(&QUAD_INDICES))
        );
    }

    #[test]
    fn resize_releases_canvas_and_fences_before_touching_target() {
        let mut c = ready(64, 64);
        c.device_mut().take_commands();
        c.resize(65, 64).unwrap();

        let commands = c.device().commands();
        assert_eq!(commands[0], Command::Flush);
        assert_eq!(commands[1], Command::Finish);
        assert_eq!(commands[2], Command::ResizeScreen { width: 65, height: 64 });
        assert_eq!(commands.last(), Some(&Command::Present));
        assert_eq!(c.device().screen_size(), (65, 64));
    }

    #[test]
    fn zero_size_is_clamped_for_the_target() {
        let mut c = ready(64, 64);
        let presented = c.device().presented_frames();
        c.handle_event(HostEvent::Resized { width: 0, height: 0 }).unwrap();
        assert_eq!(c.target().size(), (1, 1));
        assert_eq!(c.device().screen_size(), (0, 0));
        assert_eq!(c.device().presented_frames(), presented);
        assert_eq!(c.device().skipped_frames(), 1);

        // offscreen content still renders while hidden
        assert_eq!(c.frame_state().frame_counter, 1);
    }

    #[test]
    fn rescale_propagates_and_requests_repaint() {
        let mut c = ready(64, 64);
        c.tick(Instant::now()).unwrap();
        c.handle_event(HostEvent::ContentScaleChanged { scale_x: 2.0, scale_y: 2.0 })
            .unwrap();
        assert_eq!(c.engine().scale, 2.0);
        assert_eq!(c.frame_state().scale, 2.0);
        assert_eq!(c.target().size(), (64, 64));
        assert!(c.is_repaint_pending());
    }

    #[test]
    fn input_is_forwarded_and_close_exits() {
        let mut c = ready(8, 8);
        c.tick(Instant::now()).unwrap();
        let control = c.handle_event(HostEvent::Input(InputEvent::Focused(true))).unwrap();
        assert_eq!(control, AppControl::Continue);
        assert_eq!(c.engine().inputs, 1);
        assert!(c.is_repaint_pending());
        assert_eq!(c.handle_event(HostEvent::CloseRequested).unwrap(), AppControl::Exit);
    }

    #[test]
    fn invalid_fragment_source_fails_initialization_cleanly() {
        let loader = EmbeddedResources::builtin().with(COMPOSITE_FRAGMENT_PATH, "fn broken(");
        let mut c = compositor(64, 64).with_resources(Box::new(loader));
        let err = c.initialize().unwrap_err();

        match err {
            RenderError::ShaderCompile(e) => {
                assert_eq!(e.stage, ShaderStage::Fragment);
                assert!(!e.log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!c.program().is_compiled());
        assert_eq!(c.device().object_counts().total(), 0);
        assert!(matches!(c.render(), Err(RenderError::ProgramNotCompiled)));
    }

    #[test]
    fn render_before_initialize_is_rejected() {
        let mut c = compositor(8, 8);
        assert!(c.render().unwrap_err().is_precondition());
        assert!(matches!(
            c.resize(10, 10),
            Err(RenderError::TargetNotReady { operation: "resize" })
        ));
    }

    #[test]
    fn shutdown_is_idempotent_and_final() {
        let mut c = ready(8, 8);
        c.invalidator().invalidate();
        c.shutdown();
        c.shutdown();

        assert!(c.is_shut_down());
        assert_eq!(c.device().object_counts().total(), 0);
        assert!(!c.tick(Instant::now()).unwrap());
        assert!(matches!(c.render(), Err(RenderError::ShutDown)));
        assert_eq!(c.next_wakeup(Instant::now()), None);
    }

    #[test]
    fn events_after_shutdown_are_dropped() {
        let mut c = ready(8, 8);
        let scale = c.engine().scale;
        c.shutdown();
        c.device_mut().take_commands();

        let late = [
            HostEvent::Resized { width: 80, height: 60 },
            HostEvent::ContentScaleChanged { scale_x: 2.0, scale_y: 2.0 },
            HostEvent::CloseRequested,
        ];
        for event in late {
            assert!(matches!(c.handle_event(event), Ok(AppControl::Exit)));
        }

        assert!(c.device().commands().is_empty());
        assert_eq!(c.device().object_counts().total(), 0);
        assert_eq!(c.device().screen_size(), (640, 480));
        assert!(!c.is_repaint_pending());
        assert_eq!(c.engine().scale, scale);
    }

    #[test]
    fn trace_groups_nest_and_balance() {
        let sink = Rc::new(Recorder::default());
        let mut c = compositor(16, 16).with_log_sink(sink.clone());
        exercise(&mut c);

        let mut depth = 0usize;
        for line in sink.lines.borrow().iter() {
            if line.starts_with("enter ") {
                depth += 1;
            } else if line == "exit" {
                depth = depth.checked_sub(1).expect("exit without enter");
            } else {
                assert!(depth > 0, "{line:?} logged outside any group");
            }
        }
        assert_eq!(depth, 0);

        let groups = sink.groups();
        for name in ["initialize", "render", "resize", "rescale", "shutdown"] {
            assert!(groups.iter().any(|g| g == name), "no {name} group in {groups:?}");
        }
        assert_eq!(groups.iter().filter(|g| *g == "render").count(), 3);
    }

    #[test]
    fn failed_initialize_still_closes_its_group() {
        let sink = Rc::new(Recorder::default());
        let loader = EmbeddedResources::builtin().with(COMPOSITE_VERTEX_PATH, "fn broken(");
        let mut c = compositor(8, 8)
            .with_resources(Box::new(loader))
            .with_log_sink(sink.clone());
        assert!(c.initialize().is_err());

        let lines = sink.lines.borrow();
        let enters = lines.iter().filter(|l| l.starts_with("enter ")).count();
        let exits = lines.iter().filter(|l| *l == "exit").count();
        assert!(enters > 0);
        assert_eq!(enters, exits);
    }

    #[test]
    fn noop_sink_does_not_change_device_output() {
        let mut traced = compositor(16, 16);
        exercise(&mut traced);

        let mut silent = compositor(16, 16).with_log_sink(Rc::new(NoopSink));
        exercise(&mut silent);

        assert!(!traced.device().commands().is_empty());
        assert_eq!(traced.device().commands(), silent.device().commands());
        assert_eq!(traced.device().presented_frames(), silent.device().presented_frames());
    }

    #[test]
    fn next_wakeup_follows_pending_work() {
        let mut c = ready(8, 8);
        let now = Instant::now();
        assert_eq!(c.next_wakeup(now), Some(now));
        c.tick(now).unwrap();
        assert_eq!(c.next_wakeup(now), None);

        let due = now + Duration::from_millis(16);
        let hooks_inv = c.invalidator();
        c.scheduler.spawner().spawn_at(due, move || hooks_inv.invalidate());
        assert_eq!(c.next_wakeup(now), Some(due));
        assert!(!c.tick(now).unwrap());
        assert!(c.tick(due).unwrap());
    }
}
