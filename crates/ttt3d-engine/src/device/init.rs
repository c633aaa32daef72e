/// Initialization parameters for the GL layer.
///
/// Keep this structure stable and minimal. Add configuration flags only when a
/// concrete platform or driver requirement exists.
#[derive(Debug, Clone)]
pub struct GlInit {
    /// Requested OpenGL core profile version as `(major, minor)`.
    pub version: (u8, u8),

    /// Depth buffer bits. The board relies on depth testing.
    pub depth_bits: u8,

    /// Synchronize buffer swaps with the display refresh.
    pub vsync: bool,

    /// Prefer configs with multisampling when the platform offers them.
    pub prefer_multisampling: bool,
}

impl Default for GlInit {
    fn default() -> Self {
        Self {
            version: (3, 3),
            depth_bits: 24,
            vsync: true,
            prefer_multisampling: false,
        }
    }
}
