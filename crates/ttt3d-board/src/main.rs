use anyhow::Result;
use ttt3d_board::BoardApp;
use ttt3d_board::config::{BoardConfig, USAGE};
use ttt3d_engine::device::GlInit;
use ttt3d_engine::logging::{LoggingConfig, init_logging};
use ttt3d_engine::window::{Runtime, RuntimeConfig};

const TITLE: &str = "3D Tic-Tac-Toe (Player vs AI)";

fn main() -> Result<()> {
    let Some(config) = BoardConfig::from_env()? else {
        print!("{USAGE}");
        return Ok(());
    };

    let mut logging = LoggingConfig::default();
    if let Some(filter) = &config.log_filter {
        logging = logging.with_filter(filter);
    }
    init_logging(logging);

    let runtime = RuntimeConfig {
        title: TITLE.to_string(),
        ..RuntimeConfig::default()
    };
    let gl_init = GlInit {
        vsync: config.vsync,
        ..GlInit::default()
    };

    log::info!(
        "shaders: {} + {}",
        config.vertex_shader.display(),
        config.fragment_shader.display()
    );

    Runtime::run(runtime, gl_init, BoardApp::new(config))
}
