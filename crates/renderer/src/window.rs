use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasRawWindowHandle;
use tracing::{debug, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowBuilder};

use crate::gpu::GlowBackend;
use crate::runtime::DisplaySurface;
use crate::types::WindowSettings;

/// A winit window with a current OpenGL 3.3 core context.
///
/// Events are pumped from [`DisplaySurface::poll_events`] so the render loop
/// keeps control of the thread. Escape and the window close button both
/// request a close.
pub struct GlWindowSurface {
    // drop order: surface and context before the window they draw into
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,
    event_loop: EventLoop<()>,
    size: PhysicalSize<u32>,
    close_requested: bool,
}

impl GlWindowSurface {
    /// Opens the window, makes a core-profile context current on this thread
    /// and loads GL entry points for it.
    pub fn create(settings: &WindowSettings) -> Result<(Self, GlowBackend)> {
        let (width, height) = settings.size;
        if width == 0 || height == 0 {
            return Err(anyhow!("window size {width}x{height} must be non-zero"));
        }

        let event_loop = EventLoop::new().context("failed to initialise the event loop")?;
        let window_builder = WindowBuilder::new()
            .with_title(settings.title.clone())
            .with_inner_size(PhysicalSize::new(width, height));

        let (window, gl_config) = DisplayBuilder::new()
            .with_window_builder(Some(window_builder))
            .build(&event_loop, ConfigTemplateBuilder::new(), pick_config)
            .map_err(|err| anyhow!("failed to create the window: {err}"))?;
        let window = window.ok_or_else(|| anyhow!("display builder returned no window"))?;
        debug!(
            samples = gl_config.num_samples(),
            srgb = gl_config.srgb_capable(),
            "selected GL config"
        );

        let gl_display = gl_config.display();
        let context_attributes = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(window.raw_window_handle()));
        // SAFETY: the raw window handle belongs to `window`, which outlives the context.
        let not_current = unsafe { gl_display.create_context(&gl_config, &context_attributes) }
            .context("failed to create an OpenGL 3.3 core context")?;

        let surface_attributes = window.build_surface_attributes(Default::default());
        // SAFETY: as above, the surface is dropped before `window`.
        let surface = unsafe { gl_display.create_window_surface(&gl_config, &surface_attributes) }
            .context("failed to create the window surface")?;
        let context = not_current
            .make_current(&surface)
            .context("failed to make the GL context current")?;

        let interval = if settings.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(err) = surface.set_swap_interval(&context, interval) {
            warn!(vsync = settings.vsync, "could not set swap interval: {err}");
        }

        // SAFETY: the context is current on this thread, owned by the returned
        // surface, and stays current while the surface lives.
        let backend = unsafe { GlowBackend::load(|symbol| gl_display.get_proc_address(symbol)) }
            .context("failed to load OpenGL entry points")?;
        info!(
            version = %backend.version(),
            width,
            height,
            vsync = settings.vsync,
            "OpenGL context ready"
        );

        let size = window.inner_size();
        Ok((
            Self {
                surface,
                context,
                window,
                event_loop,
                size,
                close_requested: false,
            },
            backend,
        ))
    }

    fn handle_window_event(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                self.close_requested = true;
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                debug!("escape pressed");
                self.close_requested = true;
            }
            WindowEvent::Resized(size) => {
                if size.width > 0 && size.height > 0 {
                    self.window.resize_surface(&self.surface, &self.context);
                }
                self.size = size;
            }
            _ => {}
        }
    }
}

impl DisplaySurface for GlWindowSurface {
    fn poll_events(&mut self) {
        let window_id = self.window.id();
        let mut events = Vec::new();
        let status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, _target| {
                if let Event::WindowEvent { window_id: id, event } = event {
                    if id == window_id {
                        events.push(event);
                    }
                }
            });

        for event in events {
            self.handle_window_event(event);
        }
        if let PumpStatus::Exit(code) = status {
            debug!(code, "event loop exited");
            self.close_requested = true;
        }
    }

    fn should_close(&self) -> bool {
        self.close_requested
    }

    fn swap_buffers(&mut self) -> Result<()> {
        self.surface
            .swap_buffers(&self.context)
            .context("failed to swap buffers")
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        (self.size.width, self.size.height)
    }
}

/// Prefers the config with the most samples.
///
/// glutin reports `BadConfig` from `find_configs` when no config matches the
/// template, so the picker is only ever handed a non-empty set.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|best, candidate| {
            if candidate.num_samples() > best.num_samples() {
                candidate
            } else {
                best
            }
        })
        .expect("glutin offers at least one config to the picker")
}
