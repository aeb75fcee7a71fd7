use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a single annotated frame.
pub trait ImageWriter: Send {
    /// The image format follows the file extension.
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
