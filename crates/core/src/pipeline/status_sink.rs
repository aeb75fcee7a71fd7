use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::attention::domain::verdict::Verdict;

/// One status update pushed to consumers after each classified frame.
///
/// The verdict travels under `reason`, matching what dashboard clients
/// already parse.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub distracted: bool,
    pub timestamp: DateTime<Utc>,
    pub total_distractions: usize,
    pub reason: Verdict,
    /// Seconds on the monitoring timeline (media time for recorded files).
    /// Not part of the wire format.
    #[serde(skip)]
    pub stream_time: f64,
}

impl StatusEvent {
    pub fn new(verdict: Verdict, total_distractions: usize, timestamp: DateTime<Utc>) -> Self {
        Self {
            distracted: verdict.distracted,
            timestamp,
            total_distractions,
            reason: verdict,
            stream_time: 0.0,
        }
    }

    pub fn at_stream_time(mut self, seconds: f64) -> Self {
        self.stream_time = seconds;
        self
    }

    /// Stamped with the current wall-clock time.
    pub fn now(verdict: Verdict, total_distractions: usize) -> Self {
        Self::new(verdict, total_distractions, Utc::now())
    }
}

/// Receives every status event the monitoring loop produces.
pub trait StatusSink: Send {
    fn publish(&mut self, event: &StatusEvent) -> Result<(), Box<dyn std::error::Error>>;
}

/// Writes one JSON object per line and flushes after each, so a consumer
/// reading a pipe sees updates immediately.
pub struct JsonLinesSink<W: Write + Send> {
    out: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> StatusSink for JsonLinesSink<W> {
    fn publish(&mut self, event: &StatusEvent) -> Result<(), Box<dyn std::error::Error>> {
        serde_json::to_writer(&mut self.out, event)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

/// Hands events to another thread (a transport layer, a UI).
///
/// A full channel drops the event instead of stalling the loop; a
/// disconnected receiver is an error.
pub struct ChannelSink {
    tx: crossbeam_channel::Sender<StatusEvent>,
    dropped: usize,
}

impl ChannelSink {
    pub fn new(tx: crossbeam_channel::Sender<StatusEvent>) -> Self {
        Self { tx, dropped: 0 }
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl StatusSink for ChannelSink {
    fn publish(&mut self, event: &StatusEvent) -> Result<(), Box<dyn std::error::Error>> {
        match self.tx.try_send(event.clone()) {
            Ok(()) => Ok(()),
            Err(crossbeam_channel::TrySendError::Full(_)) => {
                self.dropped += 1;
                log::debug!("status channel full, dropped {} events so far", self.dropped);
                Ok(())
            }
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                Err("status channel receiver disconnected".into())
            }
        }
    }
}
