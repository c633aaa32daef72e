use std::num::NonZeroU32;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use glow::HasContext;
use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContext, PossiblyCurrentContext,
    Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SwapInterval, WindowSurface};
use glutin_winit::{DisplayBuilder, GlWindow};
use raw_window_handle::HasWindowHandle;
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

use super::{GlInit, SurfaceErrorAction};

/// Owns the window together with its GL surface and current context.
///
/// This type is the low-level rendering context:
/// - picks a framebuffer config and creates the window for it
/// - creates a core-profile context and makes it current on this thread
/// - loads GL entry points into a shared `glow::Context`
/// - resizes and swaps the window surface
pub struct GlContext {
    /// Loaded entry points, shared with renderers.
    gl: Rc<glow::Context>,

    // Field order is drop order: surface, then context, then window.
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    window: Window,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,
}

impl GlContext {
    /// Creates the window described by `attrs` and a GL context bound to it.
    pub fn new(event_loop: &ActiveEventLoop, attrs: WindowAttributes, init: GlInit) -> Result<Self> {
        let template = ConfigTemplateBuilder::new()
            .with_depth_size(init.depth_bits)
            .with_alpha_size(8);

        let prefer_multisampling = init.prefer_multisampling;
        let (window, config) = DisplayBuilder::new()
            .with_window_attributes(Some(attrs))
            .build(event_loop, template, |configs| pick_config(configs, prefer_multisampling))
            .map_err(|e| anyhow!("failed to create GL display: {e}"))?;

        let window = window.context("display builder did not create a window")?;
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        log::info!(
            "GL config: {} samples, depth {}, srgb {}",
            config.num_samples(),
            config.depth_size(),
            config.srgb_capable()
        );

        let raw_window_handle = window
            .window_handle()
            .context("window has no native handle")?
            .as_raw();

        let display = config.display();
        let (major, minor) = init.version;
        let context_attrs = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(major, minor))))
            .build(Some(raw_window_handle));

        let not_current = unsafe { display.create_context(&config, &context_attrs) }
            .with_context(|| format!("failed to create OpenGL {major}.{minor} core context"))?;

        let surface_attrs = window
            .build_surface_attributes(Default::default())
            .context("failed to describe window surface")?;
        let surface = unsafe { display.create_window_surface(&config, &surface_attrs) }
            .context("failed to create window surface")?;

        let context = not_current
            .make_current(&surface)
            .context("failed to make GL context current")?;

        let interval = if init.vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        if let Err(e) = surface.set_swap_interval(&context, interval) {
            log::warn!("failed to set swap interval {interval:?}: {e}");
        }

        let gl = unsafe {
            glow::Context::from_loader_function_cstr(|symbol| display.get_proc_address(symbol))
        };
        log::info!("OpenGL context ready: {:?}", gl.version());

        Ok(Self {
            gl: Rc::new(gl),
            surface,
            context,
            window,
            size,
        })
    }

    /// Shared GL entry points. Valid while `self` is alive.
    pub fn gl(&self) -> &Rc<glow::Context> {
        &self.gl
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Resizes the window surface.
    ///
    /// A 0x0 size (minimized window) only updates the recorded size; the
    /// surface keeps its previous extent until a real size arrives.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.size = new_size;
        let (Some(w), Some(h)) = (NonZeroU32::new(new_size.width), NonZeroU32::new(new_size.height))
        else {
            return;
        };
        self.surface.resize(&self.context, w, h);
    }

    /// Presents the back buffer.
    pub fn swap_buffers(&self) -> std::result::Result<(), glutin::error::Error> {
        self.window.pre_present_notify();
        self.surface.swap_buffers(&self.context)
    }

    /// Converts a swap failure into a higher-level action.
    pub fn handle_swap_error(&self, err: &glutin::error::Error) -> SurfaceErrorAction {
        let action = SurfaceErrorAction::from_swap_error(err.error_kind());
        match action {
            SurfaceErrorAction::Fatal => log::error!("buffer swap failed: {err}"),
            SurfaceErrorAction::SkipFrame => log::warn!("buffer swap failed, skipping frame: {err}"),
        }
        action
    }
}

/// Picks the config with the most samples when multisampling is preferred,
/// otherwise the first one offered.
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>, prefer_multisampling: bool) -> Config {
    // glutin's `find_configs` fails with `BadConfig` when nothing matches the
    // template, so the picker is only reached with a non-empty iterator.
    best_config(configs, prefer_multisampling, |c| c.num_samples())
        .expect("glutin invokes the config picker with at least one config")
}

/// Selection rule behind `pick_config`. Ties keep the earlier candidate.
fn best_config<T>(
    mut candidates: impl Iterator<Item = T>,
    prefer_multisampling: bool,
    samples: impl Fn(&T) -> u8,
) -> Option<T> {
    if !prefer_multisampling {
        return candidates.next();
    }
    candidates.reduce(|best, c| if samples(&c) > samples(&best) { c } else { best })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_candidate_wins_without_multisampling() {
        assert_eq!(best_config([0u8, 4, 8].into_iter(), false, |s| *s), Some(0));
    }

    #[test]
    fn most_samples_wins_with_multisampling() {
        let candidates = [(0u8, 'a'), (8, 'b'), (4, 'c'), (8, 'd')];
        let picked = best_config(candidates.into_iter(), true, |c| c.0);
        assert_eq!(picked, Some((8, 'b')));
    }

    #[test]
    fn no_candidates_yields_none() {
        assert_eq!(best_config(std::iter::empty::<u8>(), true, |s| *s), None);
        assert_eq!(best_config(std::iter::empty::<u8>(), false, |s| *s), None);
    }
}
