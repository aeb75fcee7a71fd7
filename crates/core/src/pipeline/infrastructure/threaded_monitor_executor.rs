use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::pipeline::monitor_attention_use_case::{MonitorAttentionUseCase, MonitorSummary};
use crate::pipeline::monitor_executor::MonitorExecutor;
use crate::shared::constants::FRAME_QUEUE_CAPACITY;
use crate::shared::frame::Frame;
use crate::shared::source_metadata::SourceMetadata;
use crate::video::domain::video_reader::VideoReader;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Decodes on a capture thread and classifies on the calling thread.
///
/// Layout: `reader → bounded queue → monitor`
///
/// For live sources the queue is lossy: when processing falls behind, new
/// frames are dropped at capture and counted. Recorded files block instead,
/// so every frame reaches the monitor.
pub struct ThreadedMonitorExecutor {
    capacity: usize,
}

impl ThreadedMonitorExecutor {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }
}

impl Default for ThreadedMonitorExecutor {
    fn default() -> Self {
        Self::new(FRAME_QUEUE_CAPACITY)
    }
}

impl MonitorExecutor for ThreadedMonitorExecutor {
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        metadata: &SourceMetadata,
        monitor: &mut MonitorAttentionUseCase,
    ) -> Result<MonitorSummary, Box<dyn std::error::Error>> {
        let dropped = Arc::new(AtomicUsize::new(0));
        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Result<Frame, SendError>>(self.capacity);

        let capture = spawn_capture(
            reader,
            frame_tx,
            monitor.cancel_flag(),
            dropped.clone(),
            metadata.is_live(),
        );

        let frames = frame_rx
            .iter()
            .map(|item| item.map_err(|e| -> Box<dyn std::error::Error> { e.to_string().into() }));
        let mut first_error = monitor.consume(frames, metadata.total_frames).err();

        // Unblocks a capture thread waiting on a full queue.
        drop(frame_rx);
        match capture.join() {
            Ok(mut reader) => reader.close(),
            Err(_) => {
                first_error.get_or_insert_with(|| "Capture thread panicked".into());
            }
        }

        let summary = monitor.finish(dropped.load(Ordering::Relaxed));
        match first_error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

fn spawn_capture(
    mut reader: Box<dyn VideoReader>,
    frame_tx: crossbeam_channel::Sender<Result<Frame, SendError>>,
    cancelled: Arc<AtomicBool>,
    dropped: Arc<AtomicUsize>,
    lossy: bool,
) -> std::thread::JoinHandle<Box<dyn VideoReader>> {
    std::thread::spawn(move || {
        for frame_result in reader.frames() {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let item = frame_result.map_err(|e| -> SendError { e.to_string().into() });
            if lossy {
                match frame_tx.try_send(item) {
                    Ok(()) => {}
                    Err(crossbeam_channel::TrySendError::Full(_)) => {
                        let n = dropped.fetch_add(1, Ordering::Relaxed) + 1;
                        log::debug!("frame queue full, {n} frames dropped");
                    }
                    Err(crossbeam_channel::TrySendError::Disconnected(_)) => break,
                }
            } else if frame_tx.send(item).is_err() {
                break;
            }
        }
        reader
    })
}
