use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::attention::domain::attention_session::AttentionSession;
use crate::attention::domain::clock::Clock;
use crate::attention::domain::landmark_set::LandmarkSet;
use crate::attention::domain::landmark_source::LandmarkSource;
use crate::attention::domain::verdict::Verdict;
use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::shared::constants::{DEFAULT_MIN_INTERVAL, DEFAULT_SAMPLE_EVERY};
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use super::status_sink::{StatusEvent, StatusSink};

/// Sampling policy for the monitoring loop.
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorConfig {
    /// Classify every Nth admitted frame.
    pub sample_every: usize,
    /// Frames arriving sooner than this after the last admitted one are
    /// skipped without counting.
    pub min_interval: f64,
    /// When set, frames are stamped `index / fps` instead of reading the
    /// clock, so recorded files replay on their own timeline.
    pub media_fps: Option<f64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_every: DEFAULT_SAMPLE_EVERY,
            min_interval: DEFAULT_MIN_INTERVAL,
            media_fps: None,
        }
    }
}

/// Where annotated frames go.
pub struct OverlayOutput {
    pub renderer: OverlayRenderer,
    pub writer: Box<dyn ImageWriter>,
    pub dir: PathBuf,
}

impl OverlayOutput {
    fn write(
        &self,
        mut frame: Frame,
        landmarks: Option<&LandmarkSet>,
        verdict: &Verdict,
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.renderer.draw(&mut frame, landmarks, verdict)?;
        let path = self.dir.join(format!("frame_{:06}.jpg", frame.index()));
        self.writer.write(&path, &frame)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    pub frames_seen: usize,
    pub frames_processed: usize,
    pub dropped_frames: usize,
    pub total_distractions: usize,
}

/// Drives an [`AttentionSession`] from a stream of frames.
///
/// Frames pass a rate gate and a sampling gate; each surviving frame goes
/// through landmark extraction and classification, and the resulting
/// [`StatusEvent`] is published to every sink.
pub struct MonitorAttentionUseCase {
    session: AttentionSession,
    source: Box<dyn LandmarkSource>,
    clock: Box<dyn Clock>,
    sinks: Vec<Box<dyn StatusSink>>,
    overlay: Option<OverlayOutput>,
    logger: Box<dyn PipelineLogger>,
    config: MonitorConfig,
    cancelled: Arc<AtomicBool>,
    admitted: usize,
    last_admitted: Option<f64>,
    frames_seen: usize,
    frames_processed: usize,
}

impl MonitorAttentionUseCase {
    pub fn new(
        session: AttentionSession,
        source: Box<dyn LandmarkSource>,
        clock: Box<dyn Clock>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            session,
            source,
            clock,
            sinks: Vec::new(),
            overlay: None,
            logger: Box::new(NullPipelineLogger),
            config: MonitorConfig {
                sample_every: config.sample_every.max(1),
                ..config
            },
            cancelled: Arc::new(AtomicBool::new(false)),
            admitted: 0,
            last_admitted: None,
            frames_seen: 0,
            frames_processed: 0,
        }
    }

    pub fn with_sink(mut self, sink: Box<dyn StatusSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn with_overlay(mut self, overlay: OverlayOutput) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_cancel_flag(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn session(&self) -> &AttentionSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AttentionSession {
        &mut self.session
    }

    /// Feeds `frames` through [`Self::process_frame`] until they end or the
    /// cancel flag is raised. Reader errors abort. Call [`Self::finish`]
    /// afterwards for the summary.
    pub fn consume<I>(&mut self, frames: I, total: usize) -> Result<(), Box<dyn std::error::Error>>
    where
        I: IntoIterator<Item = Result<Frame, Box<dyn std::error::Error>>>,
    {
        for frame in frames {
            if self.is_cancelled() {
                self.logger.info("Monitoring cancelled");
                break;
            }
            self.process_frame(frame?, total)?;
        }
        Ok(())
    }

    /// Handles one delivered frame. Returns the published event, or `None`
    /// when the frame was skipped by the rate or sampling gate.
    pub fn process_frame(
        &mut self,
        frame: Frame,
        total: usize,
    ) -> Result<Option<StatusEvent>, Box<dyn std::error::Error>> {
        self.frames_seen += 1;
        self.logger.progress(self.frames_seen, total);

        let now = self.timestamp(&frame);
        if !self.admit(now) {
            return Ok(None);
        }

        let started = Instant::now();
        let detected = self.source.detect(&frame);
        self.logger.timing("landmarks", elapsed_ms(started));

        let started = Instant::now();
        let (verdict, landmarks) = match detected {
            Ok(landmarks) => (self.session.observe(landmarks.as_ref(), now), landmarks),
            Err(e) => {
                log::warn!("frame {}: landmark extraction failed: {e}", frame.index());
                let verdict = self
                    .session
                    .observe_failure(format!("Landmark extraction failed: {e}"), now);
                (verdict, None)
            }
        };
        self.logger.timing("classify", elapsed_ms(started));

        let event = StatusEvent::now(verdict, self.session.total_distractions()).at_stream_time(now);
        let started = Instant::now();
        for sink in &mut self.sinks {
            sink.publish(&event)?;
        }
        self.logger.timing("publish", elapsed_ms(started));

        if let Some(overlay) = &self.overlay {
            let started = Instant::now();
            let index = frame.index();
            if let Err(e) = overlay.write(frame, landmarks.as_ref(), &event.reason) {
                log::warn!("frame {index}: overlay not written: {e}");
            }
            self.logger.timing("overlay", elapsed_ms(started));
        }

        self.frames_processed += 1;
        Ok(Some(event))
    }

    /// Reports final counters to the logger and returns them.
    pub fn finish(&mut self, dropped_frames: usize) -> MonitorSummary {
        let summary = MonitorSummary {
            frames_seen: self.frames_seen,
            frames_processed: self.frames_processed,
            dropped_frames,
            total_distractions: self.session.total_distractions(),
        };
        self.logger.metric("dropped_frames", dropped_frames as f64);
        self.logger
            .metric("total_distractions", summary.total_distractions as f64);
        self.logger.info(&format!(
            "Processed {} of {} frames, {} distractions",
            summary.frames_processed, summary.frames_seen, summary.total_distractions
        ));
        self.logger.summary();
        summary
    }

    fn timestamp(&self, frame: &Frame) -> f64 {
        match self.config.media_fps {
            Some(fps) if fps > 0.0 => frame.index() as f64 / fps,
            _ => self.clock.now(),
        }
    }

    fn admit(&mut self, now: f64) -> bool {
        if let Some(last) = self.last_admitted {
            if now - last < self.config.min_interval {
                return false;
            }
        }
        self.last_admitted = Some(now);
        self.admitted += 1;
        self.admitted % self.config.sample_every == 0
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::attention::domain::attention_classifier::AttentionThresholds;
    use crate::attention::domain::clock::ManualClock;
    use crate::attention::domain::landmark_set::LandmarkLayout;
    use crate::attention::domain::synthetic_face::face;
    use crate::attention::domain::verdict::AttentionLevel;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Mutex;

    /// Returns a scripted result per frame index; unknown indices have no face.
    pub(crate) struct ScriptedSource {
        pub script: HashMap<usize, Result<LandmarkSet, String>>,
    }

    impl LandmarkSource for ScriptedSource {
        fn detect(
            &mut self,
            frame: &Frame,
        ) -> Result<Option<LandmarkSet>, Box<dyn std::error::Error>> {
            match self.script.get(&frame.index()) {
                Some(Ok(set)) => Ok(Some(set.clone())),
                Some(Err(msg)) => Err(msg.clone().into()),
                None => Ok(None),
            }
        }
    }

    /// Same face on every frame.
    pub(crate) struct ConstantSource(pub Option<LandmarkSet>);

    impl LandmarkSource for ConstantSource {
        fn detect(
            &mut self,
            _frame: &Frame,
        ) -> Result<Option<LandmarkSet>, Box<dyn std::error::Error>> {
            Ok(self.0.clone())
        }
    }

    #[derive(Clone, Default)]
    pub(crate) struct RecordingSink {
        pub events: Arc<Mutex<Vec<StatusEvent>>>,
    }

    impl StatusSink for RecordingSink {
        fn publish(&mut self, event: &StatusEvent) -> Result<(), Box<dyn std::error::Error>> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl StatusSink for FailingSink {
        fn publish(&mut self, _event: &StatusEvent) -> Result<(), Box<dyn std::error::Error>> {
            Err("broken pipe".into())
        }
    }

    struct FailingWriter;

    impl ImageWriter for FailingWriter {
        fn write(&self, _path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            Err("disk full".into())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingWriter {
        paths: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl ImageWriter for RecordingWriter {
        fn write(&self, path: &Path, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
            self.paths.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    fn run(
        uc: &mut MonitorAttentionUseCase,
        frames: Vec<Result<Frame, Box<dyn std::error::Error>>>,
        total: usize,
    ) -> Result<MonitorSummary, Box<dyn std::error::Error>> {
        uc.consume(frames, total)?;
        Ok(uc.finish(0))
    }

    fn frames(n: usize) -> Vec<Result<Frame, Box<dyn std::error::Error>>> {
        (0..n).map(|i| Ok(Frame::filled(8, 8, [0, 0, 0], i))).collect()
    }

    fn every_frame() -> MonitorConfig {
        MonitorConfig {
            sample_every: 1,
            min_interval: 0.0,
            media_fps: Some(10.0),
        }
    }

    fn monitor(source: Box<dyn LandmarkSource>, config: MonitorConfig) -> MonitorAttentionUseCase {
        MonitorAttentionUseCase::new(
            AttentionSession::default(),
            source,
            Box::new(ManualClock::new(0.0)),
            config,
        )
    }

    #[test]
    fn test_every_third_frame_is_classified() {
        let sink = RecordingSink::default();
        let config = MonitorConfig {
            sample_every: 3,
            min_interval: 0.0,
            media_fps: Some(30.0),
        };
        let mut uc = monitor(Box::new(ConstantSource(Some(face(0.0, 0.0, 0.3)))), config)
            .with_sink(Box::new(sink.clone()));

        let summary = run(&mut uc, frames(9), 9).unwrap();

        assert_eq!(summary.frames_seen, 9);
        assert_eq!(summary.frames_processed, 3);
        assert_eq!(sink.events.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_rate_gate_skips_frames_arriving_too_soon() {
        // 10 fps media clock, 0.25 s gate: every third frame passes.
        let config = MonitorConfig {
            sample_every: 1,
            min_interval: 0.25,
            media_fps: Some(10.0),
        };
        let mut uc = monitor(Box::new(ConstantSource(None)), config);
        let processed: Vec<usize> = (0..10)
            .filter(|&i| {
                uc.process_frame(Frame::filled(4, 4, [0, 0, 0], i), 10)
                    .unwrap()
                    .is_some()
            })
            .collect();
        assert_eq!(processed, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_rate_gate_uses_clock_for_live_sources() {
        let clock = ManualClock::new(0.0);
        let mut uc = MonitorAttentionUseCase::new(
            AttentionSession::default(),
            Box::new(ConstantSource(None)),
            Box::new(clock.clone()),
            MonitorConfig {
                sample_every: 1,
                min_interval: 0.1,
                media_fps: None,
            },
        );
        let frame = || Frame::filled(4, 4, [0, 0, 0], 0);

        assert!(uc.process_frame(frame(), 0).unwrap().is_some());
        clock.advance(0.05);
        assert!(uc.process_frame(frame(), 0).unwrap().is_none());
        clock.advance(0.06);
        assert!(uc.process_frame(frame(), 0).unwrap().is_some());
    }

    #[test]
    fn test_events_carry_verdicts_and_running_total() {
        let script = HashMap::from([
            (0, Ok(face(30.0, 0.0, 0.3))),
            (1, Ok(face(0.0, 0.0, 0.3))),
            (2, Ok(face(0.0, 40.0, 0.3))),
        ]);
        let sink = RecordingSink::default();
        let mut uc = monitor(Box::new(ScriptedSource { script }), every_frame())
            .with_sink(Box::new(sink.clone()));

        run(&mut uc, frames(4), 4).unwrap();

        let events = sink.events.lock().unwrap();
        let levels: Vec<AttentionLevel> =
            events.iter().map(|e| e.reason.attention_level).collect();
        assert_eq!(
            levels,
            vec![
                AttentionLevel::Distracted,
                AttentionLevel::Focused,
                AttentionLevel::Distracted,
                AttentionLevel::Unknown,
            ]
        );
        let totals: Vec<usize> = events.iter().map(|e| e.total_distractions).collect();
        assert_eq!(totals, vec![1, 1, 2, 3]);
        assert!(events.iter().all(|e| e.distracted == e.reason.distracted));
    }

    #[test]
    fn test_landmark_errors_become_degraded_observations() {
        let script = HashMap::from([(0, Err("tensor shape mismatch".to_string()))]);
        let sink = RecordingSink::default();
        let mut uc = monitor(Box::new(ScriptedSource { script }), every_frame())
            .with_sink(Box::new(sink.clone()));

        let summary = run(&mut uc, frames(1), 1).unwrap();

        let events = sink.events.lock().unwrap();
        assert_eq!(summary.total_distractions, 1);
        assert_eq!(events[0].reason.attention_level, AttentionLevel::Unknown);
        assert!(events[0]
            .reason
            .reason
            .as_deref()
            .unwrap()
            .contains("tensor shape mismatch"));
    }

    #[test]
    fn test_sustained_closure_on_media_timeline() {
        // 10 fps, eyes shut from the start: distracted from t = 2.0 (frame 20).
        let sink = RecordingSink::default();
        let mut uc = monitor(Box::new(ConstantSource(Some(face(0.0, 0.0, 0.05)))), every_frame())
            .with_sink(Box::new(sink.clone()));

        run(&mut uc, frames(26), 26).unwrap();

        let events = sink.events.lock().unwrap();
        assert!(events[..20].iter().all(|e| !e.distracted));
        assert!(events[20..].iter().all(|e| e.distracted));
        assert!(events[25].reason.eyes.closed_duration.unwrap() >= 2.0);
    }

    #[test]
    fn test_overlay_written_per_processed_frame() {
        let writer = RecordingWriter::default();
        let overlay = OverlayOutput {
            renderer: OverlayRenderer::new(
                LandmarkLayout::FACE_MESH_REFINED,
                AttentionThresholds::default().yaw,
            ),
            writer: Box::new(writer.clone()),
            dir: PathBuf::from("overlays"),
        };
        let mut uc = monitor(Box::new(ConstantSource(Some(face(0.0, 0.0, 0.3)))), every_frame())
            .with_overlay(overlay);

        run(&mut uc, frames(2), 2).unwrap();

        let paths = writer.paths.lock().unwrap();
        assert_eq!(
            *paths,
            vec![
                PathBuf::from("overlays/frame_000000.jpg"),
                PathBuf::from("overlays/frame_000001.jpg"),
            ]
        );
    }

    #[test]
    fn test_overlay_failure_keeps_sinks_in_step_with_session() {
        let overlay = OverlayOutput {
            renderer: OverlayRenderer::new(
                LandmarkLayout::FACE_MESH_REFINED,
                AttentionThresholds::default().yaw,
            ),
            writer: Box::new(FailingWriter),
            dir: PathBuf::from("overlays"),
        };
        let sink = RecordingSink::default();
        let mut uc = monitor(Box::new(ConstantSource(Some(face(40.0, 0.0, 0.3)))), every_frame())
            .with_sink(Box::new(sink.clone()))
            .with_overlay(overlay);

        let summary = run(&mut uc, frames(3), 3).unwrap();

        let events = sink.events.lock().unwrap();
        assert_eq!(summary.frames_processed, 3);
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].total_distractions, summary.total_distractions);
        assert_eq!(uc.session().total_distractions(), 3);
    }

    #[test]
    fn test_events_carry_media_stream_time() {
        let sink = RecordingSink::default();
        let mut uc =
            monitor(Box::new(ConstantSource(None)), every_frame()).with_sink(Box::new(sink.clone()));

        run(&mut uc, frames(3), 3).unwrap();

        let times: Vec<f64> = sink.events.lock().unwrap().iter().map(|e| e.stream_time).collect();
        assert_eq!(times, vec![0.0, 0.1, 0.2]);
    }

    #[test]
    fn test_cancel_flag_stops_run() {
        let mut uc = monitor(Box::new(ConstantSource(None)), every_frame());
        uc.cancel_flag().store(true, Ordering::Relaxed);
        let summary = run(&mut uc, frames(5), 5).unwrap();
        assert_eq!(summary.frames_seen, 0);
    }

    #[test]
    fn test_reader_error_aborts_run() {
        let mut uc = monitor(Box::new(ConstantSource(None)), every_frame());
        let mut input = frames(2);
        input.insert(1, Err("decode failure".into()));
        assert!(run(&mut uc, input, 3).is_err());
    }

    #[test]
    fn test_sink_error_aborts_run() {
        let mut uc =
            monitor(Box::new(ConstantSource(None)), every_frame()).with_sink(Box::new(FailingSink));
        assert!(run(&mut uc, frames(1), 1).is_err());
    }

    #[test]
    fn test_zero_sample_every_is_treated_as_one() {
        let config = MonitorConfig {
            sample_every: 0,
            ..every_frame()
        };
        let mut uc = monitor(Box::new(ConstantSource(None)), config);
        assert_eq!(run(&mut uc, frames(3), 3).unwrap().frames_processed, 3);
    }

    #[test]
    fn test_intervention_type_is_reachable_through_session() {
        let mut uc = monitor(Box::new(ConstantSource(None)), every_frame());
        uc.session_mut().set_intervention_type(Some("mindless".into()));
        assert_eq!(uc.session().intervention_type(), Some("mindless"));
    }
}
