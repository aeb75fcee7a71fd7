use std::collections::VecDeque;

use super::attention_classifier::{AttentionClassifier, AttentionThresholds};
use super::landmark_set::LandmarkSet;
use super::verdict::Verdict;

/// Classification state for one monitored subject.
///
/// Owned by whichever loop feeds it frames; callers on other threads must
/// serialize access to `observe`.
pub struct AttentionSession {
    classifier: AttentionClassifier,
    distraction_timestamps: VecDeque<f64>,
    history_limit: Option<usize>,
    total_distractions: usize,
    intervention_type: Option<String>,
    latest: Option<Verdict>,
}

impl AttentionSession {
    pub fn new(classifier: AttentionClassifier) -> Self {
        Self {
            classifier,
            distraction_timestamps: VecDeque::new(),
            history_limit: None,
            total_distractions: 0,
            intervention_type: None,
            latest: None,
        }
    }

    /// Keeps at most `limit` timestamps, dropping the oldest first.
    /// The running total is unaffected.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self.trim_history();
        self
    }

    pub fn history_limit(&self) -> Option<usize> {
        self.history_limit
    }

    /// Classifies one sampled frame and records it if distracted.
    pub fn observe(&mut self, landmarks: Option<&LandmarkSet>, now: f64) -> Verdict {
        let verdict = self.classifier.classify(landmarks, now);
        self.record(verdict, now)
    }

    /// Records an upstream failure (e.g. landmark extraction error) as a
    /// degraded observation.
    pub fn observe_failure(&mut self, reason: impl Into<String>, now: f64) -> Verdict {
        self.record(Verdict::degraded(reason), now)
    }

    fn record(&mut self, verdict: Verdict, now: f64) -> Verdict {
        if verdict.distracted {
            self.distraction_timestamps.push_back(now);
            self.total_distractions += 1;
            self.trim_history();
        }
        self.latest = Some(verdict.clone());
        verdict
    }

    fn trim_history(&mut self) {
        if let Some(limit) = self.history_limit {
            while self.distraction_timestamps.len() > limit {
                self.distraction_timestamps.pop_front();
            }
        }
    }

    pub fn total_distractions(&self) -> usize {
        self.total_distractions
    }

    /// Retained distraction timestamps, oldest first.
    pub fn distraction_timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.distraction_timestamps.iter().copied()
    }

    pub fn latest_verdict(&self) -> Option<&Verdict> {
        self.latest.as_ref()
    }

    /// Stored verbatim for audio/video layers; never interpreted here.
    pub fn set_intervention_type(&mut self, name: Option<String>) {
        log::info!("Intervention type set to {name:?}");
        self.intervention_type = name;
    }

    pub fn intervention_type(&self) -> Option<&str> {
        self.intervention_type.as_deref()
    }

    pub fn thresholds(&self) -> &AttentionThresholds {
        self.classifier.thresholds()
    }
}

impl Default for AttentionSession {
    fn default() -> Self {
        Self::new(AttentionClassifier::default())
    }
}
