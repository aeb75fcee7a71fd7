use serde::{Deserialize, Serialize};

use super::eye_closure_tracker::ClosureReading;
use super::geometry_metrics::PoseAngles;

pub const NO_FACE_REASON: &str = "No face detected";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttentionLevel {
    Focused,
    Distracted,
    Unknown,
}

impl std::fmt::Display for AttentionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttentionLevel::Focused => write!(f, "focused"),
            AttentionLevel::Distracted => write!(f, "distracted"),
            AttentionLevel::Unknown => write!(f, "unknown"),
        }
    }
}

/// Head pose as sent to clients: both angles null when no face was measured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPose {
    pub yaw: Option<f64>,
    pub pitch: Option<f64>,
}

/// Eye state as sent to clients.
///
/// `closed` is null when no face was measured; `closed_duration` is null
/// unless the closure is sustained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EyeStatus {
    pub closed: Option<bool>,
    pub closed_duration: Option<f64>,
}

/// Per-frame attention classification.
///
/// Field names are the wire format consumed by status push and overlay
/// clients; `reason` only appears on verdicts that could not be measured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub distracted: bool,
    pub head_pose: HeadPose,
    pub eyes: EyeStatus,
    pub attention_level: AttentionLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verdict {
    /// Verdict for a measured face.
    pub fn measured(pose: PoseAngles, eyes: ClosureReading, distracted: bool) -> Self {
        Self {
            distracted,
            head_pose: HeadPose {
                yaw: Some(pose.yaw),
                pitch: Some(pose.pitch),
            },
            eyes: EyeStatus {
                closed: Some(eyes.closed),
                closed_duration: eyes.closed.then_some(eyes.duration),
            },
            attention_level: if distracted {
                AttentionLevel::Distracted
            } else {
                AttentionLevel::Focused
            },
            reason: None,
        }
    }

    pub fn no_face() -> Self {
        Self::degraded(NO_FACE_REASON)
    }

    /// Fail-safe verdict: nothing measured, assume distracted.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            distracted: true,
            head_pose: HeadPose::default(),
            eyes: EyeStatus::default(),
            attention_level: AttentionLevel::Unknown,
            reason: Some(reason.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.attention_level == AttentionLevel::Unknown
    }

    pub fn pose(&self) -> Option<PoseAngles> {
        match (self.head_pose.yaw, self.head_pose.pitch) {
            (Some(yaw), Some(pitch)) => Some(PoseAngles { yaw, pitch }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_measured_focused_json_shape() {
        let v = Verdict::measured(
            PoseAngles {
                yaw: 2.0,
                pitch: -1.0,
            },
            ClosureReading {
                closed: false,
                duration: 0.0,
            },
            false,
        );
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({
                "distracted": false,
                "head_pose": {"yaw": 2.0, "pitch": -1.0},
                "eyes": {"closed": false, "closed_duration": null},
                "attention_level": "focused"
            })
        );
    }

    #[test]
    fn test_sustained_closure_carries_duration() {
        let v = Verdict::measured(
            PoseAngles {
                yaw: 0.0,
                pitch: 0.0,
            },
            ClosureReading {
                closed: true,
                duration: 2.5,
            },
            true,
        );
        assert_eq!(v.eyes.closed, Some(true));
        assert_eq!(v.eyes.closed_duration, Some(2.5));
        assert_eq!(v.attention_level, AttentionLevel::Distracted);
    }

    #[test]
    fn test_no_face_json_shape() {
        assert_eq!(
            serde_json::to_value(Verdict::no_face()).unwrap(),
            json!({
                "distracted": true,
                "head_pose": {"yaw": null, "pitch": null},
                "eyes": {"closed": null, "closed_duration": null},
                "attention_level": "unknown",
                "reason": "No face detected"
            })
        );
    }

    #[test]
    fn test_degraded_has_no_pose() {
        let v = Verdict::degraded("boom");
        assert!(v.is_degraded());
        assert!(v.pose().is_none());
        assert_eq!(v.reason.as_deref(), Some("boom"));
    }

    #[test]
    fn test_deserializes_without_reason() {
        let v: Verdict = serde_json::from_value(json!({
            "distracted": false,
            "head_pose": {"yaw": 1.0, "pitch": 2.0},
            "eyes": {"closed": false, "closed_duration": null},
            "attention_level": "focused"
        }))
        .unwrap();
        assert_eq!(v.reason, None);
        assert_eq!(v.pose(), Some(PoseAngles { yaw: 1.0, pitch: 2.0 }));
    }

    #[test]
    fn test_attention_level_display() {
        assert_eq!(AttentionLevel::Unknown.to_string(), "unknown");
    }
}
