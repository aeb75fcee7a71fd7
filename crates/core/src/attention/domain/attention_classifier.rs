use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::eye_closure_tracker::{
    EyeClosureTracker, DEFAULT_CLOSED_EYES_TIME, DEFAULT_EAR_THRESHOLD,
};
use super::geometry_metrics::{average_eye_aspect_ratio, head_pose};
use super::landmark_set::{LandmarkError, LandmarkLayout, LandmarkSet};
use super::verdict::Verdict;

pub const DEFAULT_YAW_THRESHOLD: f64 = 15.0;
pub const DEFAULT_PITCH_THRESHOLD: f64 = 20.0;

/// Independently tunable classification limits.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionThresholds {
    /// Max |yaw| in degrees before the head counts as turned away.
    pub yaw: f64,
    /// Max |pitch| in degrees before the head counts as nodding.
    pub pitch: f64,
    /// EAR below which the eyes count as closed.
    pub ear: f64,
    /// Seconds of continuous closure before it counts.
    pub closed_eyes_time: f64,
}

impl Default for AttentionThresholds {
    fn default() -> Self {
        Self {
            yaw: DEFAULT_YAW_THRESHOLD,
            pitch: DEFAULT_PITCH_THRESHOLD,
            ear: DEFAULT_EAR_THRESHOLD,
            closed_eyes_time: DEFAULT_CLOSED_EYES_TIME,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("malformed landmark set: {0}")]
    Landmarks(#[from] LandmarkError),
    #[error("non-finite {metric}: {value}")]
    NonFinite { metric: &'static str, value: f64 },
}

/// Turns one frame's landmarks into a [`Verdict`].
///
/// Stateful only through the closed-eye timer, so one classifier serves one
/// monitored subject.
pub struct AttentionClassifier {
    thresholds: AttentionThresholds,
    layout: LandmarkLayout,
    tracker: EyeClosureTracker,
}

impl AttentionClassifier {
    pub fn new(thresholds: AttentionThresholds) -> Self {
        Self::with_layout(thresholds, LandmarkLayout::default())
    }

    pub fn with_layout(thresholds: AttentionThresholds, layout: LandmarkLayout) -> Self {
        Self {
            thresholds,
            layout,
            tracker: EyeClosureTracker::new(thresholds.ear, thresholds.closed_eyes_time),
        }
    }

    pub fn thresholds(&self) -> &AttentionThresholds {
        &self.thresholds
    }

    pub fn layout(&self) -> &LandmarkLayout {
        &self.layout
    }

    /// Classifies one frame. Never fails: a missing face or any internal
    /// fault yields a distracted verdict with `attention_level = unknown`.
    pub fn classify(&mut self, landmarks: Option<&LandmarkSet>, now: f64) -> Verdict {
        let Some(landmarks) = landmarks else {
            return Verdict::no_face();
        };

        match self.assess(landmarks, now) {
            Ok(verdict) => verdict,
            Err(e) => {
                log::warn!("Classification degraded: {e}");
                Verdict::degraded(e.to_string())
            }
        }
    }

    fn assess(&mut self, landmarks: &LandmarkSet, now: f64) -> Result<Verdict, ClassifyError> {
        let pose = head_pose(landmarks, &self.layout)?;
        let ear = average_eye_aspect_ratio(landmarks, &self.layout)?;

        finite("yaw", pose.yaw)?;
        finite("pitch", pose.pitch)?;
        finite("eye aspect ratio", ear)?;

        let eyes = self.tracker.update(ear, now);

        let t = &self.thresholds;
        let distracted = pose.yaw.abs() > t.yaw
            || pose.pitch.abs() > t.pitch
            || (eyes.closed && eyes.duration >= t.closed_eyes_time);

        log::trace!(
            "yaw={:.1} pitch={:.1} ear={ear:.3} closed={} distracted={distracted}",
            pose.yaw,
            pose.pitch,
            eyes.closed
        );

        Ok(Verdict::measured(pose, eyes, distracted))
    }
}

impl Default for AttentionClassifier {
    fn default() -> Self {
        Self::new(AttentionThresholds::default())
    }
}

fn finite(metric: &'static str, value: f64) -> Result<(), ClassifyError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ClassifyError::NonFinite { metric, value })
    }
}
