use std::rc::Rc;

use winit::window::{Window, WindowId};

use crate::coords::Viewport;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Returns the logical window size as `(width, height)` in logical pixels.
    pub fn logical_size(&self) -> (f32, f32) {
        let phys = self.window.inner_size();
        let scale = self.window.scale_factor();
        let logi: winit::dpi::LogicalSize<f64> = phys.to_logical(scale);
        (logi.width as f32, logi.height as f32)
    }
}

/// GL access outside the frame loop (load, resize, unload).
pub struct GlCtx<'a> {
    pub gl: &'a Rc<glow::Context>,
    pub viewport: Viewport,
}

/// Per-frame context passed to `core::App::on_frame`.
pub struct FrameCtx<'a> {
    pub window: WindowCtx<'a>,
    pub gl: &'a Rc<glow::Context>,
    pub viewport: Viewport,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a> FrameCtx<'a> {
    /// Requests a graceful shutdown after this frame.
    pub fn exit(&mut self) {
        self.runtime.exit();
    }
}
