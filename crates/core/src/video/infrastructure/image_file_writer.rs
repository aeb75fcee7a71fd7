use std::path::Path;

use crate::overlay::infrastructure::jpeg_encoder::JpegEncoder;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

/// Writes frames with the `image` crate. JPEG files go through
/// [`JpegEncoder`] so the configured quality applies; other extensions use
/// the crate's format detection.
pub struct ImageFileWriter {
    jpeg: JpegEncoder,
}

impl ImageFileWriter {
    pub fn new(jpeg: JpegEncoder) -> Self {
        Self { jpeg }
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new(JpegEncoder::default())
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(&self, path: &Path, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let is_jpeg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
        if is_jpeg {
            std::fs::write(path, self.jpeg.encode(frame)?)?;
            return Ok(());
        }

        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("frame data does not match its dimensions")?;
        img.save(path)?;
        Ok(())
    }
}
