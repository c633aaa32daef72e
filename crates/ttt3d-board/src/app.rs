use anyhow::{Context, Result};
use ttt3d_engine::core::{App, AppControl, FrameCtx, GlCtx};
use ttt3d_engine::glow;
use ttt3d_engine::render::ShaderProgram;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use crate::board::BoardScene;
use crate::config::BoardConfig;

/// Runtime glue: builds the scene on load, draws it every frame, and tears it
/// down before the context goes away.
pub struct BoardApp {
    config: BoardConfig,
    scene: Option<BoardScene<glow::Context>>,
}

impl BoardApp {
    pub fn new(config: BoardConfig) -> Self {
        Self { config, scene: None }
    }
}

impl App for BoardApp {
    fn on_load(&mut self, ctx: &GlCtx<'_>) -> Result<()> {
        let shader = ShaderProgram::from_files(
            ctx.gl.clone(),
            &self.config.vertex_shader,
            &self.config.fragment_shader,
        )
        .context("failed to build the board shader program")?;

        let scene = BoardScene::new(ctx.gl.clone(), shader, ctx.viewport, self.config.rotation_speed)
            .context("failed to upload the board grid")?;

        log::info!(
            "board loaded ({} vertices, {} deg/s)",
            scene.mesh().vertex_count(),
            self.config.rotation_speed
        );
        self.scene = Some(scene);
        Ok(())
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        match event {
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape) =>
            {
                log::info!("escape pressed, closing");
                AppControl::Exit
            }
            _ => AppControl::Continue,
        }
    }

    fn on_resize(&mut self, ctx: &GlCtx<'_>) {
        if let Some(scene) = self.scene.as_mut() {
            scene.resize(ctx.viewport);
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_>) -> AppControl {
        let Some(scene) = self.scene.as_ref() else {
            return AppControl::Exit;
        };
        scene.draw(ctx.time.elapsed);

        if ctx.time.frame_index == 0 {
            let (w, h) = ctx.window.logical_size();
            log::debug!("first frame presented at {w}x{h} logical px");
        }
        AppControl::Continue
    }

    fn on_unload(&mut self, _ctx: &GlCtx<'_>) {
        if let Some(mut scene) = self.scene.take() {
            scene.dispose();
            log::info!("board resources released");
        }
    }
}
