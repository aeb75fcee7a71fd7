use crate::shared::constants::JPEG_QUALITY;
use crate::shared::frame::Frame;

/// Compresses frames to JPEG for an MJPEG preview feed or for disk.
#[derive(Clone, Copy, Debug)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    /// `quality` is clamped to 1..=100.
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    pub fn encode(&self, frame: &Frame) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let mut bytes = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, self.quality).encode(
            frame.data(),
            frame.width(),
            frame.height(),
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(bytes)
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(JPEG_QUALITY)
    }
}
