//! OpenGL rendering subsystem.
//!
//! Renderers talk to the driver only through [`GlApi`], held as `Rc<G>`.
//! Every object they allocate is released by an idempotent `dispose()` that
//! also runs on drop, so teardown is deterministic.
//!
//! Convention:
//! - matrices are `glam::Mat4`, uploaded column-major without transpose
//! - positions are `vec3` at attribute location 0

mod camera;
mod gl;
mod mesh;
mod shader;

#[cfg(any(test, feature = "testing"))]
mod recording;

pub use camera::Camera;
pub use gl::{GlApi, ShaderStage};
pub use mesh::{LineMesh, MeshError, POSITION_ATTRIBUTE};
pub use shader::{ShaderError, ShaderProgram};

#[cfg(any(test, feature = "testing"))]
pub use recording::{GlCall, RecordedUniform, RecordingGl};
