use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use veneer_engine::compositor::{Canvas, Compositor, CompositorConfig, EngineHooks, UiEngine};
use veneer_engine::device::{DeviceError, GpuInit, GraphicsDevice, HeadlessDevice};
use veneer_engine::input::{ButtonState, InputEvent};
use veneer_engine::logging::{LoggingConfig, init_logging};
use veneer_engine::paint::Color;
use veneer_engine::schedule::{Invalidator, TaskSpawner};
use veneer_engine::window::{Runtime, RuntimeConfig};

const FRAME_PERIOD: Duration = Duration::from_millis(16);

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("--headless") => {
            let frames = match args.next() {
                Some(n) => n.parse().context("frame count must be a number")?,
                None => 120,
            };
            run_headless(frames)
        }
        Some(other) => anyhow::bail!("unknown argument `{other}` (expected --headless [frames])"),
        None => Runtime::run(
            RuntimeConfig {
                title: "Veneer Studio".to_string(),
                ..Default::default()
            },
            GpuInit::default(),
            CompositorConfig::default(),
            Pulse::new,
        ),
    }
}

/// Renders `frames` frames without a window, resizing along the way.
fn run_headless(frames: u64) -> Result<()> {
    let mut compositor = Compositor::new(
        HeadlessDevice::default(),
        CompositorConfig::default(),
        640,
        480,
        1.0,
        Pulse::new,
    );
    compositor.initialize()?;

    let invalidator = compositor.invalidator();
    let start = Instant::now();
    for frame in 0..frames {
        if frame > 0 && frame % 30 == 0 {
            let step = (frame / 30) as u32;
            compositor.resize(640 + step * 40, 480 + step * 30)?;
        }
        invalidator.invalidate();
        compositor.tick(start + FRAME_PERIOD * frame as u32)?;
    }

    let counts = compositor.device().object_counts();
    log::info!(
        "rendered {} frames; {} live GPU objects",
        compositor.frame_state().frame_counter,
        counts.total()
    );

    compositor.shutdown();
    let leaked = compositor.device().object_counts().total();
    anyhow::ensure!(leaked == 0, "{leaked} GPU objects outlived shutdown");
    Ok(())
}

/// Demo engine: sliding bars, plus a marker that follows the pointer.
struct Pulse {
    size: (u32, u32),
    scale: f32,
    pointer: Option<(f32, f32)>,
    pressed: bool,
    invalidator: Invalidator,
}

impl Pulse {
    fn new(hooks: EngineHooks) -> Self {
        animate(hooks.spawner.clone(), hooks.invalidator.clone());
        Self {
            size: (0, 0),
            scale: 1.0,
            pointer: None,
            pressed: false,
            invalidator: hooks.invalidator,
        }
    }
}

fn animate(spawner: TaskSpawner, invalidator: Invalidator) {
    let next = spawner.clone();
    spawner.spawn_after(FRAME_PERIOD, move || {
        invalidator.invalidate();
        animate(next, invalidator);
    });
}

impl UiEngine for Pulse {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = (width, height);
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn paint(&mut self, canvas: &mut Canvas<'_>, timestamp_nanos: u64) -> Result<(), DeviceError> {
        let (w, h) = canvas.logical_size();
        let t = (timestamp_nanos as f64 / 1e9) as f32;

        canvas.clear(Color::from_srgb_u8(18, 20, 28, 255))?;
        for i in 0..6 {
            let phase = t * 0.6 + i as f32 * 0.35;
            let x = (phase.sin() * 0.5 + 0.5) * (w - 120.0).max(0.0);
            let y = 40.0 + i as f32 * (h - 80.0).max(0.0) / 6.0;
            let color = Color::from_srgb_u8(80 + i * 25, 140, 220 - i * 20, 255);
            canvas.fill_logical_rect(x, y, 120.0, 24.0, color)?;
        }

        if let Some((x, y)) = self.pointer {
            let color = if self.pressed {
                Color::from_srgb_u8(240, 90, 80, 255)
            } else {
                Color::from_srgb_u8(240, 240, 240, 255).with_opacity(0.8)
            };
            canvas.fill_logical_rect(x - 6.0, y - 6.0, 12.0, 12.0, color)?;
        }
        Ok(())
    }

    fn handle_input(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerMoved { x, y } => self.pointer = Some((*x, *y)),
            InputEvent::PointerButton { state, .. } => self.pressed = *state == ButtonState::Pressed,
            InputEvent::PointerLeft => self.pointer = None,
            _ => return,
        }
        self.invalidator.invalidate();
    }
}
