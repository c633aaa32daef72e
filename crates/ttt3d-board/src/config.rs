use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{Result, bail};

pub const USAGE: &str = "\
ttt3d - rotating 3D tic-tac-toe board

USAGE:
    ttt3d [OPTIONS]

OPTIONS:
    --vertex <PATH>      vertex shader source [default: bundled board.vert]
    --fragment <PATH>    fragment shader source [default: bundled board.frag]
    --speed <DEG>        rotation speed in degrees per second [default: 20]
    --no-vsync           present without waiting for the display refresh
    --log <FILTER>       log filter, e.g. \"debug\" (overrides RUST_LOG)
    -h, --help           print this help
";

/// Board application settings.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardConfig {
    pub vertex_shader: PathBuf,
    pub fragment_shader: PathBuf,
    /// Rotation about +Y, in degrees per second.
    pub rotation_speed: f32,
    pub vsync: bool,
    pub log_filter: Option<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        let shaders = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders");
        Self {
            vertex_shader: shaders.join("board.vert"),
            fragment_shader: shaders.join("board.frag"),
            rotation_speed: 20.0,
            vsync: true,
            log_filter: None,
        }
    }
}

impl BoardConfig {
    /// Parses process arguments. Returns `None` when help was requested.
    pub fn from_env() -> Result<Option<Self>> {
        Self::parse(pico_args::Arguments::from_env())
    }

    pub fn from_args(args: Vec<OsString>) -> Result<Option<Self>> {
        Self::parse(pico_args::Arguments::from_vec(args))
    }

    fn parse(mut args: pico_args::Arguments) -> Result<Option<Self>> {
        if args.contains(["-h", "--help"]) {
            return Ok(None);
        }

        let defaults = Self::default();
        let config = Self {
            vertex_shader: args
                .opt_value_from_str("--vertex")?
                .unwrap_or(defaults.vertex_shader),
            fragment_shader: args
                .opt_value_from_str("--fragment")?
                .unwrap_or(defaults.fragment_shader),
            rotation_speed: args
                .opt_value_from_str("--speed")?
                .unwrap_or(defaults.rotation_speed),
            vsync: !args.contains("--no-vsync"),
            log_filter: args.opt_value_from_str("--log")?,
        };

        let rest = args.finish();
        if !rest.is_empty() {
            bail!("unexpected arguments: {rest:?}\n\n{USAGE}");
        }
        if !config.rotation_speed.is_finite() {
            bail!("--speed must be a finite number of degrees per second");
        }

        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn no_arguments_yields_defaults() {
        let config = BoardConfig::from_args(args(&[])).unwrap().unwrap();
        assert_eq!(config, BoardConfig::default());
        assert!(config.vertex_shader.ends_with("shaders/board.vert"));
        assert!(config.fragment_shader.ends_with("shaders/board.frag"));
        assert_eq!(config.rotation_speed, 20.0);
        assert!(config.vsync);
    }

    #[test]
    fn overrides_are_applied() {
        let config = BoardConfig::from_args(args(&[
            "--vertex",
            "a.vert",
            "--fragment",
            "b.frag",
            "--speed",
            "45",
            "--no-vsync",
            "--log",
            "debug",
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(config.vertex_shader, PathBuf::from("a.vert"));
        assert_eq!(config.fragment_shader, PathBuf::from("b.frag"));
        assert_eq!(config.rotation_speed, 45.0);
        assert!(!config.vsync);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn help_short_circuits() {
        assert!(BoardConfig::from_args(args(&["--help"])).unwrap().is_none());
        assert!(BoardConfig::from_args(args(&["-h", "--speed", "x"])).unwrap().is_none());
    }

    #[test]
    fn bad_speed_is_rejected() {
        assert!(BoardConfig::from_args(args(&["--speed", "fast"])).is_err());
        assert!(BoardConfig::from_args(args(&["--speed", "inf"])).is_err());
    }

    #[test]
    fn stray_arguments_are_rejected() {
        let err = BoardConfig::from_args(args(&["--bogus"])).err().unwrap();
        assert!(err.to_string().contains("--bogus"));
    }
}
