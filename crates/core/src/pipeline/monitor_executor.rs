use crate::shared::source_metadata::SourceMetadata;
use crate::video::domain::video_reader::VideoReader;

use super::monitor_attention_use_case::{MonitorAttentionUseCase, MonitorSummary};

/// Decides how frames travel from a reader into the monitoring loop.
///
/// Infrastructure supplies the concrete strategy (threaded capture with a
/// bounded queue, or anything simpler).
pub trait MonitorExecutor: Send {
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        metadata: &SourceMetadata,
        monitor: &mut MonitorAttentionUseCase,
    ) -> Result<MonitorSummary, Box<dyn std::error::Error>>;
}
