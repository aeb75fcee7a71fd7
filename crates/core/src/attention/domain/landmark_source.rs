use crate::attention::domain::landmark_set::LandmarkSet;
use crate::shared::frame::Frame;

/// Domain interface for facial landmark extraction.
///
/// Returns `Ok(None)` when the frame contains no face; `Err` is reserved for
/// failures of the extractor itself (model I/O, malformed output).
pub trait LandmarkSource: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>, Box<dyn std::error::Error>>;
}
