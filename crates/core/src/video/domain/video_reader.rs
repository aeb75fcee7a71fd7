use crate::shared::frame::Frame;
use crate::shared::source_metadata::{SourceMetadata, SourceSpec};

/// Delivers RGB frames from a recorded file or a live capture device.
///
/// Codec and device handling stay behind this port; the monitoring loop only
/// sees `Frame` and `SourceMetadata`.
pub trait VideoReader: Send {
    fn open(&mut self, source: &SourceSpec) -> Result<SourceMetadata, Box<dyn std::error::Error>>;

    /// Lazily decodes frames in presentation order. Live sources never end on
    /// their own.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    fn close(&mut self);
}
