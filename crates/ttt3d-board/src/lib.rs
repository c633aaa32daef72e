//! Rotating 3D tic-tac-toe board.
//!
//! A static 3x3 grid drawn as GL lines, spinning slowly about the vertical
//! axis in front of a fixed perspective camera.

mod app;
pub mod board;
pub mod config;

pub use app::BoardApp;
