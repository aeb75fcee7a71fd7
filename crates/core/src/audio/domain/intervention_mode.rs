use std::fmt;
use std::str::FromStr;

/// Audio effect applied while the subject is distracted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterventionMode {
    VolumeDown,
    VolumeUp,
    PitchUp,
    PitchDown,
}

impl InterventionMode {
    pub const ALL: [InterventionMode; 4] = [
        InterventionMode::VolumeDown,
        InterventionMode::VolumeUp,
        InterventionMode::PitchUp,
        InterventionMode::PitchDown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterventionMode::VolumeDown => "volume_down",
            InterventionMode::VolumeUp => "volume_up",
            InterventionMode::PitchUp => "pitch_up",
            InterventionMode::PitchDown => "pitch_down",
        }
    }
}

impl fmt::Display for InterventionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterventionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown intervention mode '{s}'"))
    }
}
