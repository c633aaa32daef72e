//! In-memory `GlApi` used by test suites.
//!
//! `RecordingGl` keeps just enough GL object state to check lifecycle
//! behavior without a driver:
//! - a shader fails to compile when its source carries an `#error` directive
//!   or has unbalanced braces; the info log names the offending line
//! - a program fails to link when an attached stage has no `main`
//! - active uniforms are the `uniform <type> <name>;` declarations of the
//!   attached stages
//! - every call is appended to a log and misuse is counted as a GL error

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use super::gl::{GlApi, ShaderStage};
use crate::paint::Color;

/// Call log entry.
#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    CreateShader(ShaderStage, u32),
    CompileShader(u32),
    DeleteShader(u32),
    CreateProgram(u32),
    AttachShader { program: u32, shader: u32 },
    LinkProgram(u32),
    UseProgram(Option<u32>),
    DeleteProgram(u32),
    UniformMatrix4 { location: Option<u32> },
    CreateVertexArray(u32),
    BindVertexArray(Option<u32>),
    DeleteVertexArray(u32),
    CreateBuffer(u32),
    DeleteBuffer(u32),
    BindArrayBuffer(Option<u32>),
    ArrayBufferData { floats: usize },
    VertexAttrib { index: u32, components: i32, stride: i32, offset: i32 },
    EnableVertexAttrib(u32),
    DrawLines { first: i32, count: i32 },
    Viewport { width: i32, height: i32 },
    ClearColor(Color),
    Clear,
    EnableDepthTest,
}

/// Uniform location handed out by `RecordingGl`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RecordedUniform {
    program: u32,
    index: u32,
}

#[derive(Debug)]
struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    info_log: String,
}

#[derive(Debug, Default)]
struct ProgramObject {
    attached: Vec<u32>,
    linked: bool,
    uniforms: Vec<String>,
    info_log: String,
}

#[derive(Debug, Default)]
struct State {
    next_id: u32,
    shaders: HashMap<u32, ShaderObject>,
    programs: HashMap<u32, ProgramObject>,
    vertex_arrays: HashSet<u32>,
    buffers: HashMap<u32, Vec<f32>>,

    active_program: Option<u32>,
    bound_vertex_array: Option<u32>,
    bound_buffer: Option<u32>,
    uniform_values: HashMap<RecordedUniform, [f32; 16]>,

    calls: Vec<GlCall>,
    errors: usize,
    fail_creation: bool,
}

impl State {
    fn alloc(&mut self) -> u32 {
        // 0 is the GL "no object" name.
        self.next_id += 1;
        self.next_id
    }

    fn error(&mut self, what: &str) {
        log::warn!("recorded GL error: {what}");
        self.errors += 1;
    }
}

/// Driverless `GlApi` implementation; see the module docs.
#[derive(Debug, Default)]
pub struct RecordingGl {
    state: RefCell<State>,
}

impl RecordingGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `create_*` call fail.
    pub fn fail_object_creation(&self) {
        self.state.borrow_mut().fail_creation = true;
    }

    /// Snapshot of the call log.
    pub fn calls(&self) -> Vec<GlCall> {
        self.state.borrow().calls.clone()
    }

    /// Number of invalid operations observed (double deletes, use of deleted
    /// objects, uniform writes without an active program).
    pub fn errors(&self) -> usize {
        self.state.borrow().errors
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    pub fn live_vertex_arrays(&self) -> usize {
        self.state.borrow().vertex_arrays.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn is_program_live(&self, program: u32) -> bool {
        self.state.borrow().programs.contains_key(&program)
    }

    pub fn active_program(&self) -> Option<u32> {
        self.state.borrow().active_program
    }

    /// Contents last uploaded into `buffer`.
    pub fn buffer_contents(&self, buffer: u32) -> Option<Vec<f32>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    /// Last matrix written to uniform `name` of `program`.
    pub fn uniform_value(&self, program: u32, name: &str) -> Option<[f32; 16]> {
        let state = self.state.borrow();
        let index = state
            .programs
            .get(&program)?
            .uniforms
            .iter()
            .position(|u| u == name)?;
        state
            .uniform_values
            .get(&RecordedUniform { program, index: index as u32 })
            .copied()
    }

    /// Number of recorded calls matching `pred`.
    pub fn count_calls(&self, pred: impl Fn(&GlCall) -> bool) -> usize {
        self.state.borrow().calls.iter().filter(|c| pred(c)).count()
    }
}

impl GlApi for RecordingGl {
    type Shader = u32;
    type Program = u32;
    type Buffer = u32;
    type VertexArray = u32;
    type UniformLocation = RecordedUniform;

    fn create_shader(&self, stage: ShaderStage) -> Result<u32, String> {
        let mut s = self.state.borrow_mut();
        if s.fail_creation {
            return Err("out of shader objects".to_string());
        }
        let id = s.alloc();
        s.shaders.insert(
            id,
            ShaderObject {
                stage,
                source: String::new(),
                compiled: false,
                info_log: String::new(),
            },
        );
        s.calls.push(GlCall::CreateShader(stage, id));
        Ok(id)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        let mut s = self.state.borrow_mut();
        match s.shaders.get_mut(&shader) {
            Some(obj) => obj.source = source.to_string(),
            None => s.error("glShaderSource on unknown shader"),
        }
    }

    fn compile_shader(&self, shader: u32) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::CompileShader(shader));
        let Some(obj) = s.shaders.get_mut(&shader) else {
            s.error("glCompileShader on unknown shader");
            return;
        };
        match check_source(&obj.source) {
            Ok(()) => {
                obj.compiled = true;
                obj.info_log.clear();
            }
            Err(log) => {
                obj.compiled = false;
                obj.info_log = log;
            }
        }
    }

    fn shader_compile_status(&self, shader: u32) -> bool {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .is_some_and(|obj| obj.compiled)
    }

    fn shader_info_log(&self, shader: u32) -> String {
        self.state
            .borrow()
            .shaders
            .get(&shader)
            .map(|obj| obj.info_log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&self, shader: u32) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::DeleteShader(shader));
        if s.shaders.remove(&shader).is_none() {
            s.error("glDeleteShader on unknown shader");
        }
    }

    fn create_program(&self) -> Result<u32, String> {
        let mut s = self.state.borrow_mut();
        if s.fail_creation {
            return Err("out of program objects".to_string());
        }
        let id = s.alloc();
        s.programs.insert(id, ProgramObject::default());
        s.calls.push(GlCall::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::AttachShader { program, shader });
        if !s.shaders.contains_key(&shader) {
            s.error("glAttachShader with unknown shader");
            return;
        }
        match s.programs.get_mut(&program) {
            Some(p) => p.attached.push(shader),
            None => s.error("glAttachShader on unknown program"),
        }
    }

    fn link_program(&self, program: u32) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::LinkProgram(program));
        let Some(attached) = s.programs.get(&program).map(|p| p.attached.clone()) else {
            s.error("glLinkProgram on unknown program");
            return;
        };

        let mut uniforms = Vec::new();
        let mut log = String::new();
        let mut stages = HashSet::new();
        for id in &attached {
            let Some(obj) = s.shaders.get(id) else { continue };
            stages.insert(obj.stage);
            if !obj.compiled {
                log.push_str(&format!("error: {} shader is not compiled\n", obj.stage));
            } else if !obj.source.contains("void main") {
                log.push_str(&format!("error: {} shader has no entry point 'main'\n", obj.stage));
            }
            for name in declared_uniforms(&obj.source) {
                if !uniforms.contains(&name) {
                    uniforms.push(name);
                }
            }
        }
        if !stages.contains(&ShaderStage::Vertex) {
            log.push_str("error: no vertex shader attached\n");
        }

        if let Some(p) = s.programs.get_mut(&program) {
            p.linked = log.is_empty();
            p.uniforms = if p.linked { uniforms } else { Vec::new() };
            p.info_log = log;
        }
    }

    fn program_link_status(&self, program: u32) -> bool {
        self.state
            .borrow()
            .programs
            .get(&program)
            .is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: u32) -> String {
        self.state
            .borrow()
            .programs
            .get(&program)
            .map(|p| p.info_log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: Option<u32>) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::UseProgram(program));
        if let Some(id) = program {
            if !s.programs.get(&id).is_some_and(|p| p.linked) {
                s.error("glUseProgram with a program that is not linked");
                return;
            }
        }
        s.active_program = program;
    }

    fn delete_program(&self, program: u32) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::DeleteProgram(program));
        if s.programs.remove(&program).is_none() {
            s.error("glDeleteProgram on unknown program");
            return;
        }
        s.uniform_values.retain(|loc, _| loc.program != program);
        if s.active_program == Some(program) {
            s.active_program = None;
        }
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<RecordedUniform> {
        let s = self.state.borrow();
        let p = s.programs.get(&program)?;
        let index = p.uniforms.iter().position(|u| u == name)?;
        Some(RecordedUniform { program, index: index as u32 })
    }

    fn uniform_matrix4(&self, location: Option<&RecordedUniform>, columns: &[f32; 16]) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::UniformMatrix4 { location: location.map(|l| l.index) });
        let Some(loc) = location else { return };
        let active = s.active_program;
        match active {
            Some(active) if active == loc.program => {
                s.uniform_values.insert(*loc, *columns);
            }
            Some(_) => s.error("glUniformMatrix4fv with a location from another program"),
            None => s.error("glUniformMatrix4fv without an active program"),
        }
    }

    fn create_vertex_array(&self) -> Result<u32, String> {
        let mut s = self.state.borrow_mut();
        if s.fail_creation {
            return Err("out of vertex array objects".to_string());
        }
        let id = s.alloc();
        s.vertex_arrays.insert(id);
        s.calls.push(GlCall::CreateVertexArray(id));
        Ok(id)
    }

    fn bind_vertex_array(&self, vertex_array: Option<u32>) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::BindVertexArray(vertex_array));
        if let Some(id) = vertex_array {
            if !s.vertex_arrays.contains(&id) {
                s.error("glBindVertexArray with unknown vertex array");
                return;
            }
        }
        s.bound_vertex_array = vertex_array;
    }

    fn delete_vertex_array(&self, vertex_array: u32) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::DeleteVertexArray(vertex_array));
        if !s.vertex_arrays.remove(&vertex_array) {
            s.error("glDeleteVertexArrays on unknown vertex array");
        }
        if s.bound_vertex_array == Some(vertex_array) {
            s.bound_vertex_array = None;
        }
    }

    fn create_buffer(&self) -> Result<u32, String> {
        let mut s = self.state.borrow_mut();
        if s.fail_creation {
            return Err("out of buffer objects".to_string());
        }
        let id = s.alloc();
        s.buffers.insert(id, Vec::new());
        s.calls.push(GlCall::CreateBuffer(id));
        Ok(id)
    }

    fn bind_array_buffer(&self, buffer: Option<u32>) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::BindArrayBuffer(buffer));
        if let Some(id) = buffer {
            if !s.buffers.contains_key(&id) {
                s.error("glBindBuffer with unknown buffer");
                return;
            }
        }
        s.bound_buffer = buffer;
    }

    fn array_buffer_data(&self, data: &[f32]) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::ArrayBufferData { floats: data.len() });
        let Some(bound) = s.bound_buffer else {
            s.error("glBufferData without a bound array buffer");
            return;
        };
        if let Some(contents) = s.buffers.get_mut(&bound) {
            *contents = data.to_vec();
        }
    }

    fn delete_buffer(&self, buffer: u32) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::DeleteBuffer(buffer));
        if s.buffers.remove(&buffer).is_none() {
            s.error("glDeleteBuffers on unknown buffer");
        }
        if s.bound_buffer == Some(buffer) {
            s.bound_buffer = None;
        }
    }

    fn vertex_attrib_f32(&self, index: u32, components: i32, stride: i32, offset: i32) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::VertexAttrib { index, components, stride, offset });
        if s.bound_vertex_array.is_none() || s.bound_buffer.is_none() {
            s.error("glVertexAttribPointer without a bound vertex array and buffer");
        }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::EnableVertexAttrib(index));
        if s.bound_vertex_array.is_none() {
            s.error("glEnableVertexAttribArray without a bound vertex array");
        }
    }

    fn draw_lines(&self, first: i32, count: i32) {
        let mut s = self.state.borrow_mut();
        s.calls.push(GlCall::DrawLines { first, count });
        if s.active_program.is_none() || s.bound_vertex_array.is_none() {
            s.error("glDrawArrays without an active program and vertex array");
        }
    }

    fn viewport(&self, _x: i32, _y: i32, width: i32, height: i32) {
        self.state
            .borrow_mut()
            .calls
            .push(GlCall::Viewport { width, height });
    }

    fn clear_color(&self, color: Color) {
        self.state.borrow_mut().calls.push(GlCall::ClearColor(color));
    }

    fn clear(&self) {
        self.state.borrow_mut().calls.push(GlCall::Clear);
    }

    fn enable_depth_test(&self) {
        self.state.borrow_mut().calls.push(GlCall::EnableDepthTest);
    }
}

/// Mimics the handful of compiler diagnostics the tests rely on.
fn check_source(source: &str) -> Result<(), String> {
    let mut depth: i64 = 0;
    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;
        let trimmed = line.trim();
        if let Some(msg) = trimmed.strip_prefix("#error") {
            return Err(format!("0:{line_no}(1): error: #error{msg}\n"));
        }
        for ch in trimmed.chars() {
            match ch {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Err(format!("0:{line_no}(1): error: syntax error, unexpected '}}'\n"));
            }
        }
    }
    if depth != 0 {
        return Err(format!(
            "0:{}(1): error: syntax error, unexpected end of file\n",
            source.lines().count()
        ));
    }
    Ok(())
}

fn declared_uniforms(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("uniform ")?;
            let mut parts = rest.split_whitespace();
            let _ty = parts.next()?;
            let name = parts.next()?.trim_end_matches(';');
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_delete_is_logged_and_double_delete_is_an_error() {
        let gl = RecordingGl::new();
        let vbo = gl.create_buffer().unwrap();
        gl.bind_array_buffer(Some(vbo));

        gl.delete_buffer(vbo);
        assert_eq!(gl.live_buffers(), 0);
        assert_eq!(gl.errors(), 0);
        assert_eq!(gl.calls().last(), Some(&GlCall::DeleteBuffer(vbo)));

        gl.delete_buffer(vbo);
        assert_eq!(gl.errors(), 1);
        assert_eq!(gl.count_calls(|c| *c == GlCall::DeleteBuffer(vbo)), 2);
    }
}
