use std::path::Path;
use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::audio::domain::audio_segment::AudioSegment;
use crate::audio::domain::audio_transformer::AudioTransformer;
use crate::audio::domain::audio_writer::AudioWriter;
use crate::audio::domain::intervention_mode::InterventionMode;
use crate::audio::infrastructure::resample_pitch_transformer::{
    ResamplePitchTransformer, DEFAULT_PITCH_FACTOR,
};
use crate::audio::infrastructure::volume_transformer::{
    VolumeTransformer, LOUDER_GAIN, QUIETER_GAIN,
};
use crate::shared::constants::{AUDIO_CHANNELS, AUDIO_CHUNK_FRAMES, AUDIO_SAMPLE_RATE};
use crate::video::domain::audio_reader::AudioReader;

use super::status_sink::{StatusEvent, StatusSink};

/// Alters playback audio while the subject is distracted.
///
/// Each focused → distracted transition draws a fresh effect; while focused,
/// chunks pass through untouched.
pub struct AudioInterventionController<R: Rng + Send = StdRng> {
    rng: R,
    pitch_factor: f64,
    distracted: bool,
    mode: Option<InterventionMode>,
}

impl AudioInterventionController<StdRng> {
    pub fn new(pitch_factor: f64) -> Self {
        Self::with_rng(pitch_factor, StdRng::from_entropy())
    }
}

impl Default for AudioInterventionController<StdRng> {
    fn default() -> Self {
        Self::new(DEFAULT_PITCH_FACTOR)
    }
}

impl<R: Rng + Send> AudioInterventionController<R> {
    pub fn with_rng(pitch_factor: f64, rng: R) -> Self {
        Self {
            rng,
            pitch_factor,
            distracted: false,
            mode: None,
        }
    }

    pub fn is_distracted(&self) -> bool {
        self.distracted
    }

    /// Effect picked at the most recent distraction onset.
    pub fn mode(&self) -> Option<InterventionMode> {
        self.mode
    }

    pub fn set_distraction_state(&mut self, distracted: bool) {
        if self.distracted == distracted {
            return;
        }
        self.distracted = distracted;
        if distracted {
            self.mode = InterventionMode::ALL.choose(&mut self.rng).copied();
            if let Some(mode) = self.mode {
                log::info!("Distraction onset, audio intervention: {mode}");
            }
        }
    }

    pub fn process(&self, chunk: &mut AudioSegment) -> Result<(), Box<dyn std::error::Error>> {
        match (self.distracted, self.mode) {
            (true, Some(mode)) => self.transformer(mode).transform(chunk),
            _ => Ok(()),
        }
    }

    fn transformer(&self, mode: InterventionMode) -> Box<dyn AudioTransformer> {
        match mode {
            InterventionMode::VolumeDown => Box::new(VolumeTransformer::new(QUIETER_GAIN)),
            InterventionMode::VolumeUp => Box::new(VolumeTransformer::new(LOUDER_GAIN)),
            InterventionMode::PitchUp => Box::new(ResamplePitchTransformer::new(self.pitch_factor)),
            InterventionMode::PitchDown => {
                Box::new(ResamplePitchTransformer::new(1.0 / self.pitch_factor))
            }
        }
    }
}

/// A soundtrack rewritten chunk by chunk as the monitoring timeline advances.
///
/// Each chunk is processed with the controller state in effect when the
/// timeline reached its first sample.
pub struct InterventionTrack {
    source: AudioSegment,
    chunk_frames: usize,
    cursor: usize,
    output: Vec<f32>,
}

impl InterventionTrack {
    pub fn new(source: AudioSegment, chunk_frames: usize) -> Self {
        let capacity = source.samples().len();
        Self {
            source,
            chunk_frames: chunk_frames.max(1),
            cursor: 0,
            output: Vec::with_capacity(capacity),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.source.frame_count()
    }

    /// Renders every chunk that starts before `seconds`.
    pub fn render_until<R: Rng + Send>(
        &mut self,
        seconds: f64,
        controller: &AudioInterventionController<R>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let target = (seconds.max(0.0) * self.source.sample_rate() as f64) as usize;
        let target = target.min(self.source.frame_count());
        while self.cursor < target {
            self.render_chunk(controller)?;
        }
        Ok(())
    }

    pub fn render_remaining<R: Rng + Send>(
        &mut self,
        controller: &AudioInterventionController<R>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        while !self.is_finished() {
            self.render_chunk(controller)?;
        }
        Ok(())
    }

    /// Rendered audio so far.
    pub fn output(&self) -> AudioSegment {
        AudioSegment::new(
            self.output.clone(),
            self.source.sample_rate(),
            self.source.channels(),
        )
    }

    fn render_chunk<R: Rng + Send>(
        &mut self,
        controller: &AudioInterventionController<R>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let channels = self.source.channels() as usize;
        let end = (self.cursor + self.chunk_frames).min(self.source.frame_count());
        let mut chunk = AudioSegment::new(
            self.source.samples()[self.cursor * channels..end * channels].to_vec(),
            self.source.sample_rate(),
            self.source.channels(),
        );
        controller.process(&mut chunk)?;
        self.output.extend_from_slice(chunk.samples());
        self.cursor = end;
        Ok(())
    }
}

/// Feeds status events into a shared controller so an audio thread can
/// keep calling `process` on its own schedule. With a track attached, the
/// track is first rendered up to the event's stream time.
pub struct AudioInterventionSink<R: Rng + Send = StdRng> {
    controller: Arc<Mutex<AudioInterventionController<R>>>,
    track: Option<Arc<Mutex<InterventionTrack>>>,
}

impl<R: Rng + Send> AudioInterventionSink<R> {
    pub fn new(controller: Arc<Mutex<AudioInterventionController<R>>>) -> Self {
        Self {
            controller,
            track: None,
        }
    }

    pub fn with_track(mut self, track: Arc<Mutex<InterventionTrack>>) -> Self {
        self.track = Some(track);
        self
    }
}

impl<R: Rng + Send> StatusSink for AudioInterventionSink<R> {
    fn publish(&mut self, event: &StatusEvent) -> Result<(), Box<dyn std::error::Error>> {
        let mut controller = self
            .controller
            .lock()
            .map_err(|_| "audio intervention controller lock poisoned")?;
        if let Some(track) = &self.track {
            track
                .lock()
                .map_err(|_| "intervention track lock poisoned")?
                .render_until(event.stream_time, &*controller)?;
        }
        controller.set_distraction_state(event.distracted);
        Ok(())
    }
}

/// Rewrites a recorded file's soundtrack according to the verdicts of a
/// monitoring run and writes the result.
///
/// Register [`Self::sink`] with the monitor, run it, then call
/// [`Self::finish`].
pub struct AudioInterventionUseCase<R: Rng + Send = StdRng> {
    writer: Box<dyn AudioWriter>,
    controller: Arc<Mutex<AudioInterventionController<R>>>,
    track: Arc<Mutex<InterventionTrack>>,
}

impl AudioInterventionUseCase<StdRng> {
    /// Returns `None` when `input` has no audio track.
    pub fn load(
        reader: &dyn AudioReader,
        writer: Box<dyn AudioWriter>,
        input: &Path,
    ) -> Result<Option<Self>, Box<dyn std::error::Error>> {
        Self::load_with(reader, writer, input, AudioInterventionController::default())
    }
}

impl<R: Rng + Send> AudioInterventionUseCase<R> {
    pub fn load_with(
        reader: &dyn AudioReader,
        writer: Box<dyn AudioWriter>,
        input: &Path,
        controller: AudioInterventionController<R>,
    ) -> Result<Option<Self>, Box<dyn std::error::Error>> {
        let Some(audio) = reader.read_audio(input, AUDIO_SAMPLE_RATE, AUDIO_CHANNELS)? else {
            log::warn!("{} has no audio track", input.display());
            return Ok(None);
        };
        log::info!(
            "Loaded {:.1}s of audio ({} ch) from {}",
            audio.duration(),
            audio.channels(),
            input.display()
        );
        Ok(Some(Self {
            writer,
            controller: Arc::new(Mutex::new(controller)),
            track: Arc::new(Mutex::new(InterventionTrack::new(audio, AUDIO_CHUNK_FRAMES))),
        }))
    }

    pub fn sink(&self) -> AudioInterventionSink<R> {
        AudioInterventionSink::new(self.controller.clone()).with_track(self.track.clone())
    }

    /// Renders whatever the run did not reach with the last known state and
    /// writes the processed soundtrack to `output`.
    pub fn finish(&self, output: &Path) -> Result<AudioSegment, Box<dyn std::error::Error>> {
        let controller = self
            .controller
            .lock()
            .map_err(|_| "audio intervention controller lock poisoned")?;
        let mut track = self
            .track
            .lock()
            .map_err(|_| "intervention track lock poisoned")?;
        track.render_remaining(&*controller)?;

        let audio = track.output();
        self.writer.write(output, &audio)?;
        Ok(audio)
    }
}
