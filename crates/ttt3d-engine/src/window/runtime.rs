use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::coords::Viewport;
use crate::core::{App as CoreApp, AppControl, FrameCtx, GlCtx, WindowCtx};
use crate::device::{GlContext, GlInit, SurfaceErrorAction};
use crate::time::FrameClock;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "ttt3d".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
            resizable: true,
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs `app` in a single GL window until it is closed.
    ///
    /// Returns the error that stopped the loop, if any (window or context
    /// creation, or `App::on_load`).
    pub fn run<A>(config: RuntimeConfig, gl_init: GlInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gl_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

struct WindowEntry {
    clock: FrameClock,
    gl: GlContext,
}

impl WindowEntry {
    fn viewport(&self) -> Viewport {
        Viewport::from_physical(self.gl.size())
    }
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gl_init: GlInit,

    // Declared before `entry`: if the loop unwinds, the app's GL objects are
    // dropped while the context is still current.
    app: A,
    entry: Option<WindowEntry>,

    error: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gl_init: GlInit, app: A) -> Self {
        Self {
            config,
            gl_init,
            app,
            entry: None,
            error: None,
            exit_requested: false,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(self.config.resizable);

        let gl = GlContext::new(event_loop, attrs, self.gl_init.clone())
            .context("failed to create GL window")?;

        let entry = WindowEntry {
            clock: FrameClock::default(),
            gl,
        };

        let ctx = GlCtx {
            gl: entry.gl.gl(),
            viewport: entry.viewport(),
        };
        self.app.on_load(&ctx).context("application failed to load")?;

        log::info!("window ready: {:?}", entry.gl.size());
        self.entry = Some(entry);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        self.shutdown(event_loop);
    }

    /// Unloads the app, then destroys the window and its context.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        if let Some(entry) = self.entry.take() {
            let ctx = GlCtx {
                gl: entry.gl.gl(),
                viewport: entry.viewport(),
            };
            self.app.on_unload(&ctx);
            drop(entry);
            log::info!("window closed");
        }
        event_loop.exit();
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::Exit => self.exit_requested = true,
            }
        }

        if self.exit_requested {
            self.shutdown(event_loop);
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let mut runtime_ctx = RuntimeCtx::default();
        let time = entry.clock.tick();
        let viewport = entry.viewport();

        // Scope to ensure `ctx` is dropped before presenting.
        let app_control = {
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id: window_id,
                    window: entry.gl.window(),
                },
                gl: entry.gl.gl(),
                viewport,
                time,
                runtime: &mut runtime_ctx,
            };
            self.app.on_frame(&mut ctx)
        };

        if let Err(err) = entry.gl.swap_buffers() {
            if entry.gl.handle_swap_error(&err) == SurfaceErrorAction::Fatal {
                runtime_ctx.exit();
            }
        }

        if app_control == AppControl::Exit {
            runtime_ctx.exit();
        }

        self.apply_commands(event_loop, runtime_ctx);
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() || self.exit_requested {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            self.fail(event_loop, e);
            return;
        }

        if let Some(entry) = self.entry.as_mut() {
            entry.clock.reset();
            entry.gl.window().request_redraw();
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: the board animates every frame.
        if let Some(entry) = self.entry.as_ref() {
            entry.gl.window().request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if self.app.on_window_event(window_id, &event) == AppControl::Exit {
            self.shutdown(event_loop);
            return;
        }

        match event {
            WindowEvent::CloseRequested => self.shutdown(event_loop),

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.gl.resize(new_size);
                    let ctx = GlCtx {
                        gl: entry.gl.gl(),
                        viewport: entry.viewport(),
                    };
                    self.app.on_resize(&ctx);
                    entry.gl.window().request_redraw();
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop, window_id),

            _ => {}
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        // Covers exits not initiated by us (e.g. platform shutdown).
        self.shutdown(event_loop);
    }
}
