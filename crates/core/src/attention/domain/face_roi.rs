//! Square crop the face mesh runs on, and the mapping from mesh output back
//! to frame coordinates.

use super::face_detector::FaceBox;
use super::landmark_set::Point3;

/// Depth multiplier applied to width-normalized mesh depth. Pose thresholds
/// are calibrated against this scale.
pub const DEPTH_SCALE: f64 = 3000.0;

/// Square region of the frame, possibly extending past its edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceRoi {
    pub x: f64,
    pub y: f64,
    pub side: f64,
}

impl FaceRoi {
    pub fn new(x: f64, y: f64, side: f64) -> Self {
        Self { x, y, side }
    }

    /// Square of side `scale * max(width, height)` centred on the box.
    pub fn around(face: &FaceBox, scale: f64) -> Self {
        let (cx, cy) = face.center();
        let side = face.width.max(face.height) * scale;
        Self::new(cx - side / 2.0, cy - side / 2.0, side)
    }

    /// Maps one mesh point from `input_size` model pixels back to frame
    /// pixels. Depth is normalized by the frame width like x, then scaled
    /// by [`DEPTH_SCALE`].
    pub fn to_frame(&self, x: f64, y: f64, z: f64, input_size: u32, frame_width: u32) -> Point3 {
        let scale = self.side / input_size as f64;
        let width_normalized_z = z * scale / frame_width as f64;
        Point3::new(
            self.x + x * scale,
            self.y + y * scale,
            width_normalized_z * DEPTH_SCALE,
        )
    }
}
