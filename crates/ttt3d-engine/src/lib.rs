//! ttt3d engine crate.
//!
//! This crate owns the platform + OpenGL runtime pieces used by the board
//! application: window and context creation, the frame loop, and the GL
//! resource wrappers (shader programs, line meshes).

pub mod core;
pub mod device;
pub mod time;
pub mod window;

pub mod coords;
pub mod logging;
pub mod paint;
pub mod render;

// Renderers are generic over `render::GlApi`; the runtime hands out `glow`.
pub use glow;
