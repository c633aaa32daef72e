//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single GL window, and drives the
//! application callbacks.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
