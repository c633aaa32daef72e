use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::Mat4;

use super::gl::{GlApi, ShaderStage};

/// Failure while building a [`ShaderProgram`].
#[derive(Debug)]
pub enum ShaderError {
    /// A shader source file could not be read.
    Io { path: PathBuf, source: io::Error },
    /// The driver refused to allocate a shader or program object.
    CreateFailed { what: &'static str, reason: String },
    /// A stage failed to compile; `log` is the driver's info log, verbatim.
    Compile { stage: ShaderStage, log: String },
    /// Both stages compiled but the program failed to link.
    Link { log: String },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::Io { path, source } => {
                write!(f, "failed to read shader source {}: {source}", path.display())
            }
            ShaderError::CreateFailed { what, reason } => {
                write!(f, "failed to create {what}: {reason}")
            }
            ShaderError::Compile { stage, log } => {
                write!(f, "error compiling {stage} shader: {}", log.trim_end())
            }
            ShaderError::Link { log } => {
                write!(f, "error linking shader program: {}", log.trim_end())
            }
        }
    }
}

impl std::error::Error for ShaderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ShaderError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// A linked vertex + fragment program.
///
/// The program object is released exactly once: by [`dispose`](Self::dispose)
/// or, failing that, when the value is dropped. The GL context must still be
/// current at that point.
pub struct ShaderProgram<G: GlApi> {
    gl: Rc<G>,
    /// `None` once disposed.
    handle: Option<G::Program>,
}

impl<G: GlApi> ShaderProgram<G> {
    /// Reads both stages from disk, then compiles and links them.
    pub fn from_files(
        gl: Rc<G>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
    ) -> Result<Self, ShaderError> {
        let vertex_src = read_source(vertex_path.as_ref())?;
        let fragment_src = read_source(fragment_path.as_ref())?;
        Self::new(gl, &vertex_src, &fragment_src)
    }

    /// Compiles both stages and links them into a program.
    ///
    /// Compilation stops at the first stage that fails. Intermediate shader
    /// objects are deleted on every path.
    pub fn new(gl: Rc<G>, vertex_src: &str, fragment_src: &str) -> Result<Self, ShaderError> {
        let vertex = compile_stage(&*gl, ShaderStage::Vertex, vertex_src)?;
        let fragment = match compile_stage(&*gl, ShaderStage::Fragment, fragment_src) {
            Ok(shader) => shader,
            Err(err) => {
                gl.delete_shader(vertex);
                return Err(err);
            }
        };

        let linked = link(&*gl, vertex, fragment);

        // Stages are owned by the program once linked.
        gl.delete_shader(vertex);
        gl.delete_shader(fragment);

        let handle = linked?;
        log::debug!("linked shader program {handle:?}");

        Ok(Self { gl, handle: Some(handle) })
    }

    /// Program handle, or `None` after disposal.
    pub fn handle(&self) -> Option<G::Program> {
        self.handle
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }

    /// Makes this program current for subsequent draws and uniform writes.
    pub fn activate(&self) {
        let Some(handle) = self.handle else {
            log::warn!("activate() called on a disposed shader program");
            return;
        };
        self.gl.use_program(Some(handle));
    }

    /// Writes `matrix` into uniform `name`.
    ///
    /// The location is looked up on every call. Unknown names are ignored,
    /// matching GL's treatment of location -1. The program should be active.
    pub fn set_matrix4(&self, name: &str, matrix: &Mat4) {
        let Some(handle) = self.handle else {
            log::warn!("set_matrix4({name:?}) called on a disposed shader program");
            return;
        };
        let location = self.gl.uniform_location(handle, name);
        if location.is_none() {
            log::trace!("uniform {name:?} is not active in program {handle:?}");
        }
        self.gl.uniform_matrix4(location.as_ref(), &matrix.to_cols_array());
    }

    /// Deletes the program object. Repeated calls are no-ops.
    pub fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.gl.delete_program(handle);
            log::debug!("deleted shader program {handle:?}");
        }
    }
}

impl<G: GlApi> Drop for ShaderProgram<G> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn compile_stage<G: GlApi>(
    gl: &G,
    stage: ShaderStage,
    source: &str,
) -> Result<G::Shader, ShaderError> {
    let shader = gl
        .create_shader(stage)
        .map_err(|reason| ShaderError::CreateFailed { what: "shader object", reason })?;

    gl.shader_source(shader, source);
    gl.compile_shader(shader);

    if !gl.shader_compile_status(shader) {
        let log = gl.shader_info_log(shader);
        gl.delete_shader(shader);
        log::error!("{stage} shader failed to compile:\n{log}");
        return Err(ShaderError::Compile { stage, log });
    }

    Ok(shader)
}

fn link<G: GlApi>(gl: &G, vertex: G::Shader, fragment: G::Shader) -> Result<G::Program, ShaderError> {
    let program = gl
        .create_program()
        .map_err(|reason| ShaderError::CreateFailed { what: "program object", reason })?;

    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    gl.link_program(program);

    if !gl.program_link_status(program) {
        let log = gl.program_info_log(program);
        gl.delete_program(program);
        log::error!("shader program failed to link:\n{log}");
        return Err(ShaderError::Link { log });
    }

    Ok(program)
}
