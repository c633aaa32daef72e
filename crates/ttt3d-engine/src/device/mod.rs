//! GL context + window surface management.
//!
//! This module is responsible for:
//! - choosing a framebuffer config and creating the window for it
//! - creating and making current an OpenGL core context
//! - resizing and presenting the window surface

mod context;
mod error;
mod init;

pub use context::GlContext;
pub use error::SurfaceErrorAction;
pub use init::GlInit;
