//! Two-state closed-eye timer.
//!
//! `Open` → `Closing { since }` when EAR drops below the threshold;
//! back to `Open` as soon as EAR reaches the threshold again. A closure only
//! counts once it has lasted `closed_eyes_time` seconds. Reopening discards
//! the accumulated time.

/// Default EAR below which the eyes count as closed.
pub const DEFAULT_EAR_THRESHOLD: f64 = 0.15;

/// Default seconds of continuous closure before it counts.
pub const DEFAULT_CLOSED_EYES_TIME: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClosureState {
    Open,
    Closing { since: f64 },
}

/// Result of one tracker tick.
///
/// `duration` is non-zero only when `closed` is set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClosureReading {
    pub closed: bool,
    pub duration: f64,
}

impl ClosureReading {
    pub const NOT_CLOSED: ClosureReading = ClosureReading {
        closed: false,
        duration: 0.0,
    };
}

pub struct EyeClosureTracker {
    ear_threshold: f64,
    closed_eyes_time: f64,
    state: ClosureState,
}

impl EyeClosureTracker {
    pub fn new(ear_threshold: f64, closed_eyes_time: f64) -> Self {
        Self {
            ear_threshold,
            closed_eyes_time,
            state: ClosureState::Open,
        }
    }

    pub fn state(&self) -> ClosureState {
        self.state
    }

    pub fn closed_eyes_time(&self) -> f64 {
        self.closed_eyes_time
    }

    /// Feeds one averaged EAR sample taken at `now` (monotonic seconds).
    pub fn update(&mut self, ear: f64, now: f64) -> ClosureReading {
        if ear < self.ear_threshold {
            if self.state == ClosureState::Open {
                log::debug!("Eyes closing at t={now:.2}s (EAR {ear:.3})");
                self.state = ClosureState::Closing { since: now };
            }
        } else if let ClosureState::Closing { since } = self.state {
            log::debug!("Eyes reopened after {:.2}s", now - since);
            self.state = ClosureState::Open;
        }
        self.reading(now)
    }

    /// Whether the current closure has lasted long enough to count.
    pub fn sustained(&self, now: f64) -> bool {
        match self.state {
            ClosureState::Open => false,
            ClosureState::Closing { since } => now - since >= self.closed_eyes_time,
        }
    }

    pub fn reading(&self, now: f64) -> ClosureReading {
        match self.state {
            ClosureState::Closing { since } if self.sustained(now) => ClosureReading {
                closed: true,
                duration: now - since,
            },
            _ => ClosureReading::NOT_CLOSED,
        }
    }

    pub fn reset(&mut self) {
        self.state = ClosureState::Open;
    }
}

impl Default for EyeClosureTracker {
    fn default() -> Self {
        Self::new(DEFAULT_EAR_THRESHOLD, DEFAULT_CLOSED_EYES_TIME)
    }
}
