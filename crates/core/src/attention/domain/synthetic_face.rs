//! Synthetic landmark fixtures with known pose and eye opening.

use super::landmark_set::{LandmarkLayout, LandmarkSet, Point3, FACE_MESH_REFINED_POINTS};

const NOSE: (f64, f64) = (320.0, 240.0);
/// Depth gap between nose tip and eye plane.
const DEPTH: f64 = 100.0;
/// Horizontal offset of each eye centroid from the eye midpoint.
const EYE_SPACING: f64 = 30.0;
/// Half the corner-to-corner eye width.
const EYE_HALF_WIDTH: f64 = 15.0;

/// Face at `yaw`/`pitch` degrees with both eyes at aspect ratio `ear`.
pub fn face(yaw: f64, pitch: f64, ear: f64) -> LandmarkSet {
    face_with_eyes(yaw, pitch, ear, ear)
}

pub fn face_with_eyes(yaw: f64, pitch: f64, left_ear: f64, right_ear: f64) -> LandmarkSet {
    let layout = LandmarkLayout::FACE_MESH_REFINED;
    let mut pts = vec![Point3::new(0.0, 0.0, 0.0); FACE_MESH_REFINED_POINTS];

    pts[layout.nose_tip] = Point3::new(NOSE.0, NOSE.1, 0.0);

    let cx = NOSE.0 + DEPTH * yaw.to_radians().tan();
    let cy = NOSE.1 + DEPTH * pitch.to_radians().tan();
    let z = -DEPTH;

    place_eye(&mut pts, &layout.left_eye, cx - EYE_SPACING, cy, z, left_ear);
    place_eye(&mut pts, &layout.right_eye, cx + EYE_SPACING, cy, z, right_ear);

    LandmarkSet::new(pts).expect("fixture uses refined mesh length")
}

/// Six-point eye whose centroid is `(cx, cy)` and whose EAR equals `ear`.
fn place_eye(pts: &mut [Point3], group: &[usize; 6], cx: f64, cy: f64, z: f64, ear: f64) {
    let w = EYE_HALF_WIDTH;
    let h = ear * w;
    let offsets = [
        (-w, 0.0),
        (-w / 3.0, -h),
        (w / 3.0, -h),
        (w, 0.0),
        (w / 3.0, h),
        (-w / 3.0, h),
    ];
    for (&idx, (ox, oy)) in group.iter().zip(offsets) {
        pts[idx] = Point3::new(cx + ox, cy + oy, z);
    }
}
