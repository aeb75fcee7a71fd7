use crate::shared::constants::{CAPTURE_FPS, CAPTURE_HEIGHT, CAPTURE_WIDTH};
use crate::shared::frame::Frame;
use crate::shared::source_metadata::{SourceMetadata, SourceSpec};
use crate::video::domain::video_reader::VideoReader;

#[cfg(target_os = "macos")]
const CAPTURE_INPUT_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
const CAPTURE_INPUT_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const CAPTURE_INPUT_FORMAT: &str = "v4l2";

/// Decodes frames with ffmpeg-next, either from a file or from a camera
/// opened through the platform's libavdevice input.
///
/// Every decoded picture is scaled to RGB24 and wrapped in a [`Frame`].
pub struct FfmpegReader {
    input_ctx: Option<ffmpeg_next::format::context::Input>,
    decoder: Option<ffmpeg_next::decoder::Video>,
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    video_stream_index: usize,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self {
            input_ctx: None,
            decoder: None,
            scaler: None,
            video_stream_index: 0,
        }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, source: &SourceSpec) -> Result<SourceMetadata, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = match source {
            SourceSpec::File(path) => ffmpeg_next::format::input(path)?,
            SourceSpec::Device(name) => open_capture_device(name)?,
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("No video stream found")?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        let metadata = SourceMetadata {
            width,
            height,
            fps: rational_to_f64(stream.rate()),
            total_frames: match source {
                SourceSpec::File(_) => stream.frames().max(0) as usize,
                SourceSpec::Device(_) => 0,
            },
            codec: decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default(),
            source: source.clone(),
        };

        log::info!(
            "opened {} ({}x{} @ {:.1} fps, {})",
            metadata.source,
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.codec
        );

        self.video_stream_index = video_stream_index;
        self.decoder = Some(decoder);
        self.scaler = Some(scaler);
        self.input_ctx = Some(ictx);

        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let (Some(ictx), Some(decoder), Some(scaler)) = (
            self.input_ctx.as_mut(),
            self.decoder.as_mut(),
            self.scaler.as_mut(),
        ) else {
            return Box::new(std::iter::once(Err("FfmpegReader: not opened".into())));
        };

        Box::new(DecodedFrames {
            ictx,
            decoder,
            scaler,
            video_stream_index: self.video_stream_index,
            frame_index: 0,
            flushing: false,
            done: false,
        })
    }

    fn close(&mut self) {
        self.scaler = None;
        self.decoder = None;
        self.input_ctx = None;
    }
}

/// Opens a camera through libavdevice, requesting the default capture size
/// and rate. Devices that cannot honor the request fall back to their own.
fn open_capture_device(
    name: &str,
) -> Result<ffmpeg_next::format::context::Input, Box<dyn std::error::Error>> {
    ffmpeg_next::device::register_all();

    let format = ffmpeg_next::device::input::video()
        .find(|f| f.name() == CAPTURE_INPUT_FORMAT)
        .ok_or_else(|| format!("capture input format '{CAPTURE_INPUT_FORMAT}' is not available"))?;

    let mut options = ffmpeg_next::Dictionary::new();
    options.set("video_size", &format!("{CAPTURE_WIDTH}x{CAPTURE_HEIGHT}"));
    options.set("framerate", &CAPTURE_FPS.to_string());

    let ctx = ffmpeg_next::format::open_with(name, &format, options)?;
    Ok(ctx.input())
}

fn rational_to_f64(rate: ffmpeg_next::Rational) -> f64 {
    if rate.denominator() != 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    }
}

/// Pulls packets on demand so a live camera is never buffered ahead.
struct DecodedFrames<'a> {
    ictx: &'a mut ffmpeg_next::format::context::Input,
    decoder: &'a mut ffmpeg_next::decoder::Video,
    scaler: &'a mut ffmpeg_next::software::scaling::Context,
    video_stream_index: usize,
    frame_index: usize,
    flushing: bool,
    done: bool,
}

impl DecodedFrames<'_> {
    fn receive(&mut self) -> Option<Result<Frame, Box<dyn std::error::Error>>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        self.decoder.receive_frame(&mut decoded).ok()?;

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.scaler.run(&decoded, &mut rgb) {
            return Some(Err(Box::new(e)));
        }

        let (width, height) = (rgb.width(), rgb.height());
        let frame = Frame::new(packed_rgb(&rgb, width, height), width, height, self.frame_index);
        self.frame_index += 1;
        Some(Ok(frame))
    }
}

impl Iterator for DecodedFrames<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(result) = self.receive() {
            return Some(result);
        }
        if self.flushing {
            self.done = true;
            return None;
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                let result = self.receive();
                self.done = result.is_none();
                return result;
            };

            if stream.index() != self.video_stream_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("skipping undecodable packet: {e}");
                continue;
            }
            if let Some(result) = self.receive() {
                return Some(result);
            }
        }
    }
}

/// Strips row padding (stride > width * 3) from an RGB24 picture.
fn packed_rgb(rgb: &ffmpeg_next::util::frame::video::Video, width: u32, height: u32) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let row_len = width as usize * 3;

    (0..height as usize)
        .flat_map(|row| &data[row * stride..row * stride + row_len])
        .copied()
        .collect()
}
