use std::fmt;
use std::rc::Rc;

use super::gl::GlApi;

/// Attribute slot the position stream is bound to.
pub const POSITION_ATTRIBUTE: u32 = 0;

const FLOATS_PER_VERTEX: i32 = 3;
const VERTEX_STRIDE: i32 = FLOATS_PER_VERTEX * std::mem::size_of::<f32>() as i32;

/// Failure while allocating mesh storage.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    CreateFailed { what: &'static str, reason: String },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::CreateFailed { what, reason } => write!(f, "failed to create {what}: {reason}"),
        }
    }
}

impl std::error::Error for MeshError {}

/// Static `vec3` position stream drawn as a line list.
///
/// Owns one vertex array and one vertex buffer. Pairs of vertices form
/// segments. Storage is released by [`dispose`](Self::dispose) or on drop,
/// buffer first.
pub struct LineMesh<G: GlApi> {
    gl: Rc<G>,
    vertex_array: Option<G::VertexArray>,
    buffer: Option<G::Buffer>,
    vertex_count: i32,
}

impl<G: GlApi> LineMesh<G> {
    /// Uploads `positions` and describes them as attribute 0.
    pub fn new(gl: Rc<G>, positions: &[[f32; 3]]) -> Result<Self, MeshError> {
        let vertex_array = gl.create_vertex_array().map_err(|reason| MeshError::CreateFailed {
            what: "vertex array",
            reason,
        })?;
        let buffer = match gl.create_buffer() {
            Ok(b) => b,
            Err(reason) => {
                gl.delete_vertex_array(vertex_array);
                return Err(MeshError::CreateFailed { what: "vertex buffer", reason });
            }
        };

        gl.bind_vertex_array(Some(vertex_array));
        gl.bind_array_buffer(Some(buffer));
        gl.array_buffer_data(bytemuck::cast_slice(positions));
        gl.vertex_attrib_f32(POSITION_ATTRIBUTE, FLOATS_PER_VERTEX, VERTEX_STRIDE, 0);
        gl.enable_vertex_attrib_array(POSITION_ATTRIBUTE);

        // Leave no stale bindings behind for later uploads.
        gl.bind_array_buffer(None);
        gl.bind_vertex_array(None);

        log::debug!(
            "uploaded line mesh: {} vertices, {} segments",
            positions.len(),
            positions.len() / 2
        );

        Ok(Self {
            gl,
            vertex_array: Some(vertex_array),
            buffer: Some(buffer),
            vertex_count: positions.len() as i32,
        })
    }

    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    pub fn vertex_array(&self) -> Option<G::VertexArray> {
        self.vertex_array
    }

    pub fn buffer(&self) -> Option<G::Buffer> {
        self.buffer
    }

    /// Issues one line-list draw with the currently active program.
    pub fn draw(&self) {
        let Some(vertex_array) = self.vertex_array else { return };
        self.gl.bind_vertex_array(Some(vertex_array));
        self.gl.draw_lines(0, self.vertex_count);
    }

    /// Deletes the buffer, then the vertex array. Repeated calls are no-ops.
    pub fn dispose(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.gl.delete_buffer(buffer);
        }
        if let Some(vertex_array) = self.vertex_array.take() {
            self.gl.delete_vertex_array(vertex_array);
        }
    }
}

impl<G: GlApi> Drop for LineMesh<G> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recording::{GlCall, RecordingGl};

    const SEGMENT: [[f32; 3]; 2] = [[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0]];

    #[test]
    fn upload_describes_position_attribute() {
        let gl = Rc::new(RecordingGl::new());
        let mesh = LineMesh::new(gl.clone(), &SEGMENT).unwrap();

        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(
            gl.buffer_contents(mesh.buffer().unwrap()).unwrap(),
            vec![-1.0, 0.0, 0.0, 1.0, 0.0, 0.0]
        );
        assert!(gl.calls().contains(&GlCall::VertexAttrib {
            index: 0,
            components: 3,
            stride: 12,
            offset: 0,
        }));
        assert!(gl.calls().contains(&GlCall::EnableVertexAttrib(0)));
        assert_eq!(gl.errors(), 0);
    }

    #[test]
    fn upload_unbinds_when_done() {
        let gl = Rc::new(RecordingGl::new());
        let _mesh = LineMesh::new(gl.clone(), &SEGMENT).unwrap();

        let calls = gl.calls();
        let tail = &calls[calls.len() - 2..];
        assert_eq!(tail, &[GlCall::BindArrayBuffer(None), GlCall::BindVertexArray(None)]);
    }

    #[test]
    fn dispose_deletes_buffer_before_vertex_array() {
        let gl = Rc::new(RecordingGl::new());
        let mut mesh = LineMesh::new(gl.clone(), &SEGMENT).unwrap();
        let vbo = mesh.buffer().unwrap();
        let vao = mesh.vertex_array().unwrap();

        mesh.dispose();
        mesh.dispose();
        drop(mesh);

        let deletes: Vec<GlCall> = gl
            .calls()
            .into_iter()
            .filter(|c| matches!(c, GlCall::DeleteBuffer(_) | GlCall::DeleteVertexArray(_)))
            .collect();
        assert_eq!(deletes, vec![GlCall::DeleteBuffer(vbo), GlCall::DeleteVertexArray(vao)]);
        assert_eq!(gl.live_buffers(), 0);
        assert_eq!(gl.live_vertex_arrays(), 0);
        assert_eq!(gl.errors(), 0);
    }

    #[test]
    fn creation_failure_leaks_nothing() {
        let gl = Rc::new(RecordingGl::new());
        gl.fail_object_creation();

        let err = LineMesh::new(gl.clone(), &SEGMENT).err().unwrap();

        assert_eq!(
            err,
            MeshError::CreateFailed {
                what: "vertex array",
                reason: "out of vertex array objects".to_string(),
            }
        );
        assert_eq!(gl.live_vertex_arrays(), 0);
    }

    #[test]
    fn draw_after_dispose_is_skipped() {
        let gl = Rc::new(RecordingGl::new());
        let mut mesh = LineMesh::new(gl.clone(), &SEGMENT).unwrap();
        mesh.dispose();

        mesh.draw();

        assert_eq!(gl.count_calls(|c| matches!(c, GlCall::DrawLines { .. })), 0);
    }
}
