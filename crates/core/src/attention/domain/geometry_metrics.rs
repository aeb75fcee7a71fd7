//! Head pose and eye aspect ratio from face-mesh landmarks.
//!
//! Pose is a proxy, not a full PnP solve: the offset from the nose tip to the
//! midpoint between both eye centroids, measured against the depth gap
//! between them.

use serde::{Deserialize, Serialize};

use super::landmark_set::{EyeGroup, LandmarkError, LandmarkLayout, LandmarkSet};

/// Head orientation in degrees.
///
/// Positive yaw: head turned toward increasing x.
/// Positive pitch: eye center below the nose tip in image space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseAngles {
    pub yaw: f64,
    pub pitch: f64,
}

pub fn head_pose(
    landmarks: &LandmarkSet,
    layout: &LandmarkLayout,
) -> Result<PoseAngles, LandmarkError> {
    let left_eye = landmarks.centroid(&layout.left_eye)?;
    let right_eye = landmarks.centroid(&layout.right_eye)?;
    let nose = landmarks.get(layout.nose_tip)?;

    let eye_center = left_eye.midpoint(&right_eye);
    let dx = eye_center.x - nose.x;
    let dy = eye_center.y - nose.y;
    let dz = if landmarks.has_depth() {
        eye_center.z - nose.z
    } else {
        1.0
    };

    Ok(PoseAngles {
        yaw: dx.atan2(dz.abs()).to_degrees(),
        pitch: dy.atan2(dz.abs()).to_degrees(),
    })
}

/// EAR = (|p1 - p5| + |p2 - p4|) / (2 |p0 - p3|).
///
/// Returns 0.0 when the eye corners coincide.
pub fn eye_aspect_ratio(landmarks: &LandmarkSet, eye: &EyeGroup) -> Result<f64, LandmarkError> {
    let p = |k: usize| landmarks.get(eye[k]);

    let v1 = p(1)?.planar_distance(p(5)?);
    let v2 = p(2)?.planar_distance(p(4)?);
    let h = p(0)?.planar_distance(p(3)?);

    if h > 0.0 {
        Ok((v1 + v2) / (2.0 * h))
    } else {
        Ok(0.0)
    }
}

/// Mean EAR of both eyes.
pub fn average_eye_aspect_ratio(
    landmarks: &LandmarkSet,
    layout: &LandmarkLayout,
) -> Result<f64, LandmarkError> {
    let left = eye_aspect_ratio(landmarks, &layout.left_eye)?;
    let right = eye_aspect_ratio(landmarks, &layout.right_eye)?;
    Ok((left + right) / 2.0)
}
