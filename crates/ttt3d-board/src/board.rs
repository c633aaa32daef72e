//! The board scene: grid geometry, camera, and per-frame transforms.

use std::rc::Rc;

use glam::Mat4;
use ttt3d_engine::coords::Viewport;
use ttt3d_engine::paint::Color;
use ttt3d_engine::render::{Camera, GlApi, LineMesh, MeshError, ShaderProgram};

/// Background clear color.
pub const CLEAR_COLOR: Color = Color::rgb(0.1, 0.1, 0.1);

/// Two vertical and two horizontal lines splitting the unit square into a 3x3
/// grid, on the z = 0 plane.
pub const BOARD_LINES: [[f32; 3]; 8] = [
    // verticals
    [-0.66, 1.0, 0.0],
    [-0.66, -1.0, 0.0],
    [0.66, 1.0, 0.0],
    [0.66, -1.0, 0.0],
    // horizontals
    [-1.0, 0.66, 0.0],
    [1.0, 0.66, 0.0],
    [-1.0, -0.66, 0.0],
    [1.0, -0.66, 0.0],
];

/// Model transform after `elapsed` seconds at `speed` degrees per second.
pub fn model_matrix(speed: f32, elapsed: f32) -> Mat4 {
    Mat4::from_rotation_y((speed * elapsed).to_radians())
}

/// GPU-side board: the grid mesh and the program that draws it.
pub struct BoardScene<G: GlApi> {
    gl: Rc<G>,

    // Field order is teardown order: mesh storage before the program.
    mesh: LineMesh<G>,
    shader: ShaderProgram<G>,

    camera: Camera,
    view: Mat4,
    projection: Mat4,
    rotation_speed: f32,
}

impl<G: GlApi> BoardScene<G> {
    /// Uploads the grid and sets the fixed pipeline state.
    ///
    /// Takes ownership of an already linked `shader`.
    pub fn new(
        gl: Rc<G>,
        shader: ShaderProgram<G>,
        viewport: Viewport,
        rotation_speed: f32,
    ) -> Result<Self, MeshError> {
        gl.clear_color(CLEAR_COLOR);
        gl.enable_depth_test();

        let mesh = LineMesh::new(gl.clone(), &BOARD_LINES)?;

        let camera = Camera::default();
        let mut scene = Self {
            gl,
            mesh,
            shader,
            camera,
            view: camera.view(),
            projection: camera.projection(viewport),
            rotation_speed,
        };
        scene.resize(viewport);
        Ok(scene)
    }

    pub fn shader(&self) -> &ShaderProgram<G> {
        &self.shader
    }

    pub fn mesh(&self) -> &LineMesh<G> {
        &self.mesh
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    /// Tracks a new drawable size. Zero-sized viewports are ignored.
    pub fn resize(&mut self, viewport: Viewport) {
        if !viewport.is_valid() {
            return;
        }
        self.gl
            .viewport(0, 0, viewport.width as i32, viewport.height as i32);
        self.projection = self.camera.projection(viewport);
    }

    /// Draws one frame `elapsed` seconds into the animation.
    pub fn draw(&self, elapsed: f32) {
        self.gl.clear();

        self.shader.activate();
        self.shader
            .set_matrix4("model", &model_matrix(self.rotation_speed, elapsed));
        self.shader.set_matrix4("view", &self.view);
        self.shader.set_matrix4("projection", &self.projection);

        self.mesh.draw();
    }

    /// Releases the buffer, the vertex array, then the program.
    pub fn dispose(&mut self) {
        self.mesh.dispose();
        self.shader.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use ttt3d_engine::render::{GlCall, RecordingGl};

    const VERTEX: &str = include_str!("../shaders/board.vert");
    const FRAGMENT: &str = include_str!("../shaders/board.frag");

    fn scene(gl: &Rc<RecordingGl>) -> BoardScene<RecordingGl> {
        let shader = ShaderProgram::new(gl.clone(), VERTEX, FRAGMENT).unwrap();
        BoardScene::new(gl.clone(), shader, Viewport::new(800.0, 600.0), 20.0).unwrap()
    }

    // ── geometry ──────────────────────────────────────────────────────────

    #[test]
    fn board_is_four_segments_on_z_plane() {
        assert_eq!(BOARD_LINES.len(), 8);
        assert!(BOARD_LINES.iter().all(|v| v[2] == 0.0));

        for seg in BOARD_LINES.chunks(2) {
            let (a, b) = (seg[0], seg[1]);
            // Each segment is axis-aligned and spans the full board.
            let vertical = a[0] == b[0] && (a[1] - b[1]).abs() == 2.0;
            let horizontal = a[1] == b[1] && (a[0] - b[0]).abs() == 2.0;
            assert!(vertical ^ horizontal, "segment {a:?} -> {b:?}");
        }
    }

    // ── transforms ────────────────────────────────────────────────────────

    #[test]
    fn model_starts_unrotated() {
        assert_eq!(model_matrix(20.0, 0.0), Mat4::IDENTITY);
    }

    #[test]
    fn model_rotates_about_y() {
        // 20 deg/s for 4.5 s is a quarter turn.
        let m = model_matrix(20.0, 4.5);
        let x = m.transform_vector3(Vec3::X);
        assert!((x - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);
        assert!((m.transform_vector3(Vec3::Y) - Vec3::Y).length() < 1e-6);
    }

    // ── frame ─────────────────────────────────────────────────────────────

    #[test]
    fn setup_enables_depth_and_clear_color() {
        let gl = Rc::new(RecordingGl::new());
        let _scene = scene(&gl);

        let calls = gl.calls();
        assert!(calls.contains(&GlCall::ClearColor(CLEAR_COLOR)));
        assert!(calls.contains(&GlCall::EnableDepthTest));
        assert!(calls.contains(&GlCall::Viewport { width: 800, height: 600 }));
    }

    #[test]
    fn frame_sets_three_uniforms_then_draws_lines() {
        let gl = Rc::new(RecordingGl::new());
        let scene = scene(&gl);
        let program = scene.shader().handle().unwrap();
        let setup_calls = gl.calls().len();

        scene.draw(0.0);

        let frame: Vec<GlCall> = gl.calls().split_off(setup_calls);
        assert_eq!(frame[0], GlCall::Clear);
        assert_eq!(frame[1], GlCall::UseProgram(Some(program)));
        assert!(matches!(frame[2], GlCall::UniformMatrix4 { location: Some(_) }));
        assert!(matches!(frame[3], GlCall::UniformMatrix4 { location: Some(_) }));
        assert!(matches!(frame[4], GlCall::UniformMatrix4 { location: Some(_) }));
        assert_eq!(frame.last(), Some(&GlCall::DrawLines { first: 0, count: 8 }));
        assert_eq!(gl.errors(), 0);

        assert_eq!(gl.uniform_value(program, "model"), Some(Mat4::IDENTITY.to_cols_array()));
        assert_eq!(
            gl.uniform_value(program, "view"),
            Some(Camera::default().view().to_cols_array())
        );
        assert_eq!(
            gl.uniform_value(program, "projection"),
            Some(scene.projection().to_cols_array())
        );
        assert!(scene.shader().handle().is_some());
    }

    #[test]
    fn identity_passthrough_draw_succeeds() {
        let gl = Rc::new(RecordingGl::new());
        let vertex = "#version 330 core
layout(location = 0) in vec3 aPosition;
uniform mat4 model;
uniform mat4 view;
uniform mat4 projection;
void main() { gl_Position = projection * view * model * vec4(aPosition, 1.0); }
";
        let fragment = "#version 330 core
out vec4 FragColor;
void main() { FragColor = vec4(0.0, 1.0, 0.0, 1.0); }
";
        let shader = ShaderProgram::new(gl.clone(), vertex, fragment).unwrap();
        let mesh = LineMesh::new(gl.clone(), &BOARD_LINES).unwrap();

        shader.activate();
        shader.set_matrix4("model", &Mat4::IDENTITY);
        shader.set_matrix4("view", &Mat4::IDENTITY);
        shader.set_matrix4("projection", &Mat4::IDENTITY);
        mesh.draw();

        assert_eq!(gl.errors(), 0);
        assert!(gl.is_program_live(shader.handle().unwrap()));
    }

    #[test]
    fn missing_uniform_declaration_is_tolerated() {
        let gl = Rc::new(RecordingGl::new());
        let vertex = "layout(location = 0) in vec3 aPosition;
void main() { gl_Position = vec4(aPosition, 1.0); }
";
        let shader = ShaderProgram::new(gl.clone(), vertex, FRAGMENT).unwrap();
        let scene =
            BoardScene::new(gl.clone(), shader, Viewport::new(800.0, 600.0), 20.0).unwrap();

        scene.draw(1.0);

        assert_eq!(gl.errors(), 0);
        assert_eq!(gl.count_calls(|c| matches!(c, GlCall::DrawLines { .. })), 1);
    }

    #[test]
    fn resize_updates_viewport_and_projection() {
        let gl = Rc::new(RecordingGl::new());
        let mut scene = scene(&gl);
        let before = scene.projection();

        scene.resize(Viewport::new(1200.0, 600.0));
        scene.resize(Viewport::new(0.0, 0.0));

        assert_ne!(scene.projection(), before);
        assert_eq!(
            scene.projection(),
            Camera::default().projection(Viewport::new(1200.0, 600.0))
        );
        assert_eq!(gl.count_calls(|c| matches!(c, GlCall::Viewport { .. })), 2);
    }

    // ── teardown ──────────────────────────────────────────────────────────

    #[test]
    fn dispose_releases_in_reverse_acquisition_order() {
        let gl = Rc::new(RecordingGl::new());
        let mut scene = scene(&gl);
        let program = scene.shader().handle().unwrap();
        let vbo = scene.mesh().buffer().unwrap();
        let vao = scene.mesh().vertex_array().unwrap();

        scene.dispose();
        scene.dispose();
        drop(scene);

        let teardown: Vec<GlCall> = gl
            .calls()
            .into_iter()
            .filter(|c| {
                matches!(
                    c,
                    GlCall::DeleteBuffer(_) | GlCall::DeleteVertexArray(_) | GlCall::DeleteProgram(_)
                )
            })
            .collect();
        assert_eq!(
            teardown,
            vec![
                GlCall::DeleteBuffer(vbo),
                GlCall::DeleteVertexArray(vao),
                GlCall::DeleteProgram(program),
            ]
        );
        assert_eq!(gl.errors(), 0);
    }

    #[test]
    fn drop_without_dispose_still_releases_everything() {
        let gl = Rc::new(RecordingGl::new());
        drop(scene(&gl));

        assert_eq!(gl.live_programs(), 0);
        assert_eq!(gl.live_buffers(), 0);
        assert_eq!(gl.live_vertex_arrays(), 0);
    }
}
