use anyhow::Result;
use winit::event::WindowEvent;
use winit::window::WindowId;

use super::ctx::{FrameCtx, GlCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// Callbacks run on the event-loop thread with the GL context current, in
/// this order: `on_load` once, then `on_resize` / `on_frame` as events
/// arrive, then `on_unload` once before the context is destroyed.
pub trait App {
    /// Called once after the GL context has been created.
    ///
    /// An error aborts the runtime and is returned from `Runtime::run`.
    fn on_load(&mut self, ctx: &GlCtx<'_>) -> Result<()>;

    /// Called for window events.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called after the drawable size changed.
    fn on_resize(&mut self, ctx: &GlCtx<'_>) {
        let _ = ctx;
    }

    /// Called once per rendered frame. The runtime swaps buffers afterwards.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl;

    /// Called once before the GL context is destroyed.
    fn on_unload(&mut self, ctx: &GlCtx<'_>) {
        let _ = ctx;
    }
}
