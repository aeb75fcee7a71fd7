pub mod attention_classifier;
pub mod attention_session;
pub mod clock;
pub mod eye_closure_tracker;
pub mod face_detector;
pub mod face_roi;
pub mod geometry_metrics;
pub mod landmark_set;
pub mod landmark_source;
#[cfg(test)]
pub mod synthetic_face;
pub mod verdict;
