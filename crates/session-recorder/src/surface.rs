//! Media capture surface abstraction

/// Container formats in order of preference
pub const MIME_PREFERENCES: [&str; 2] = ["video/webm; codecs=vp8", "video/webm"];

/// External surface producing encoded media chunks
pub trait CaptureSurface {
    /// Whether the surface is attached and producing frames
    fn is_ready(&self) -> bool;

    /// Whether the surface can encode to `mime_type`
    fn supports(&self, mime_type: &str) -> bool;
}

/// First preferred MIME type the surface supports
pub fn select_mime_type<S: CaptureSurface + ?Sized>(surface: &S) -> Option<&'static str> {
    MIME_PREFERENCES.iter().copied().find(|m| surface.supports(m))
}
