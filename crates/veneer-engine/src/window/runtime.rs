use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::compositor::{AppControl, Compositor, CompositorConfig, EngineHooks, HostEvent, UiEngine};
use crate::device::{GpuInit, WgpuDevice};
use crate::error::RenderError;

use super::InputTranslator;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    /// When false the window stays hidden until the first frame is presented.
    pub visible_before_first_frame: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "veneer".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            visible_before_first_frame: true,
        }
    }
}

/// Entry point for the windowed runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window, composites the engine built by `make_engine` into it
    /// and runs until the window closes or a render error occurs.
    ///
    /// Redraws are driven by invalidation: the loop sleeps until the engine
    /// requests a repaint or a UI task comes due.
    pub fn run<E, F>(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        compositor_config: CompositorConfig,
        make_engine: F,
    ) -> Result<()>
    where
        E: UiEngine + 'static,
        F: FnOnce(EngineHooks) -> E,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState {
            config,
            gpu_init,
            compositor_config,
            make_engine: Some(make_engine),
            window: None,
            compositor: None,
            translator: InputTranslator::new(),
            failure: None,
        };

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct AppState<E, F>
where
    E: UiEngine + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    compositor_config: CompositorConfig,
    make_engine: Option<F>,

    window: Option<Arc<Window>>,
    compositor: Option<Compositor<WgpuDevice, E>>,
    translator: InputTranslator,
    failure: Option<anyhow::Error>,
}

impl<E, F> AppState<E, F>
where
    E: UiEngine + 'static,
    F: FnOnce(EngineHooks) -> E,
{
    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let make_engine = self
            .make_engine
            .take()
            .context("ui engine was already consumed")?;

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_visible(self.config.visible_before_first_frame);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let device = pollster::block_on(WgpuDevice::new(Arc::clone(&window), self.gpu_init.clone()))
            .context("GPU initialization failed for window")?;

        let size = window.inner_size();
        let mut compositor = Compositor::new(
            device,
            self.compositor_config.clone(),
            size.width,
            size.height,
            window.scale_factor() as f32,
            make_engine,
        );
        compositor.initialize()?;

        // Hidden windows may never receive RedrawRequested.
        if !self.config.visible_before_first_frame {
            compositor.tick(Instant::now())?;
            window.set_visible(true);
        }
        window.request_redraw();
        self.window = Some(window);
        self.compositor = Some(compositor);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.stop(event_loop);
        self.failure.get_or_insert(err);
    }

    fn stop(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(compositor) = self.compositor.as_mut() {
            compositor.shutdown();
        }
        event_loop.exit();
    }

    fn dispatch(&mut self, event: &WindowEvent) -> Result<AppControl, RenderError> {
        let (Some(window), Some(compositor)) = (self.window.as_ref(), self.compositor.as_mut())
        else {
            return Ok(AppControl::Continue);
        };
        if compositor.is_shut_down() {
            return Ok(AppControl::Continue);
        }

        match event {
            WindowEvent::CloseRequested => compositor.handle_event(HostEvent::CloseRequested),

            WindowEvent::Resized(size) => compositor.handle_event(HostEvent::Resized {
                width: size.width,
                height: size.height,
            }),

            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let scale = *scale_factor as f32;
                compositor.handle_event(HostEvent::ContentScaleChanged {
                    scale_x: scale,
                    scale_y: scale,
                })
            }

            WindowEvent::RedrawRequested => {
                compositor.tick(Instant::now())?;
                Ok(AppControl::Continue)
            }

            other => match self.translator.translate(other, window.scale_factor()) {
                Some(input) => compositor.handle_event(HostEvent::Input(input)),
                None => Ok(AppControl::Continue),
            },
        }
    }
}

impl<E, F> ApplicationHandler for AppState<E, F>
where
    E: UiEngine + 'static,
    F: FnOnce(EngineHooks) -> E,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.compositor.is_some() || self.failure.is_some() {
            return;
        }
        if let Err(err) = self.start(event_loop) {
            self.fail(event_loop, err.context("failed to start the compositor"));
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(compositor)) = (self.window.as_ref(), self.compositor.as_ref())
        else {
            return;
        };

        let now = Instant::now();
        match compositor.next_wakeup(now) {
            Some(due) if due <= now => {
                window.request_redraw();
                event_loop.set_control_flow(ControlFlow::Wait);
            }
            Some(due) => event_loop.set_control_flow(ControlFlow::WaitUntil(due)),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.window.as_ref().map(|w| w.id()) != Some(window_id) {
            return;
        }

        match self.dispatch(&event) {
            Ok(AppControl::Continue) => {}
            Ok(AppControl::Exit) => self.stop(event_loop),
            Err(err) => self.fail(event_loop, anyhow::Error::new(err).context("render loop failed")),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(compositor) = self.compositor.as_mut() {
            compositor.shutdown();
        }
    }
}
