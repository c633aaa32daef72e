use glutin::error::ErrorKind;

/// High-level response after a failed buffer swap.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Transient error; skip the current frame.
    SkipFrame,
    /// The context is gone; terminate gracefully.
    Fatal,
}

impl SurfaceErrorAction {
    pub(crate) fn from_swap_error(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::ContextLost | ErrorKind::BadContext | ErrorKind::BadDisplay => {
                SurfaceErrorAction::Fatal
            }
            _ => SurfaceErrorAction::SkipFrame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lost_context_is_fatal() {
        assert_eq!(
            SurfaceErrorAction::from_swap_error(ErrorKind::ContextLost),
            SurfaceErrorAction::Fatal
        );
    }

    #[test]
    fn bad_surface_skips_frame() {
        assert_eq!(
            SurfaceErrorAction::from_swap_error(ErrorKind::BadSurface),
            SurfaceErrorAction::SkipFrame
        );
    }
}
