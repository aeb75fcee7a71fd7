use std::path::Path;

use crate::audio::domain::audio_segment::AudioSegment;
use crate::video::domain::audio_reader::AudioReader;

/// Decodes and resamples a file's best audio stream with ffmpeg-next.
pub struct FfmpegAudioReader;

impl AudioReader for FfmpegAudioReader {
    fn read_audio(
        &self,
        path: &Path,
        sample_rate: u32,
        channels: u16,
    ) -> Result<Option<AudioSegment>, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let mut ictx = ffmpeg_next::format::input(path)?;
        let Some(stream) = ictx.streams().best(ffmpeg_next::media::Type::Audio) else {
            return Ok(None);
        };
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let mut decoder = codec_ctx.decoder().audio()?;

        let (layout, channels) = if channels >= 2 {
            (ffmpeg_next::ChannelLayout::STEREO, 2)
        } else {
            (ffmpeg_next::ChannelLayout::MONO, 1)
        };
        let mut resampler = ffmpeg_next::software::resampling::Context::get(
            decoder.format(),
            decoder.channel_layout(),
            decoder.rate(),
            ffmpeg_next::format::Sample::F32(ffmpeg_next::format::sample::Type::Packed),
            layout,
            sample_rate,
        )?;

        let mut samples: Vec<f32> = Vec::new();
        let mut decoded = ffmpeg_next::util::frame::audio::Audio::empty();
        let mut resampled = ffmpeg_next::util::frame::audio::Audio::empty();

        for (stream, packet) in ictx.packets() {
            if stream.index() != stream_index {
                continue;
            }
            decoder.send_packet(&packet)?;
            while decoder.receive_frame(&mut decoded).is_ok() {
                resampler.run(&decoded, &mut resampled)?;
                extend_interleaved(&resampled, channels, &mut samples);
            }
        }

        decoder.send_eof()?;
        while decoder.receive_frame(&mut decoded).is_ok() {
            resampler.run(&decoded, &mut resampled)?;
            extend_interleaved(&resampled, channels, &mut samples);
        }

        // The resampler may still hold a tail.
        if let Ok(Some(delay)) = resampler.flush(&mut resampled) {
            if delay.output > 0 {
                extend_interleaved(&resampled, channels, &mut samples);
            }
        }

        log::debug!(
            "decoded {} audio frames from {}",
            samples.len() / channels as usize,
            path.display()
        );
        Ok(Some(AudioSegment::new(samples, sample_rate, channels)))
    }
}

/// Appends a packed f32 frame's samples, all channels interleaved in plane 0.
fn extend_interleaved(frame: &ffmpeg_next::util::frame::audio::Audio, channels: u16, out: &mut Vec<f32>) {
    let count = frame.samples() * channels as usize;
    if count == 0 {
        return;
    }
    out.extend(
        frame
            .data(0)
            .chunks_exact(4)
            .take(count)
            .map(|b| f32::from_ne_bytes([b[0], b[1], b[2], b[3]])),
    );
}
