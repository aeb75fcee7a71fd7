use std::fmt;
use std::path::PathBuf;

/// Where frames come from.
#[derive(Clone, Debug, PartialEq)]
pub enum SourceSpec {
    /// A recorded video file.
    File(PathBuf),
    /// A capture device, e.g. `/dev/video0`, `0` (avfoundation) or
    /// `video=Integrated Camera` (dshow).
    Device(String),
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceSpec::File(path) => write!(f, "{}", path.display()),
            SourceSpec::Device(name) => write!(f, "device {name}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// 0 for live sources.
    pub total_frames: usize,
    pub codec: String,
    pub source: SourceSpec,
}

impl SourceMetadata {
    pub fn is_live(&self) -> bool {
        matches!(self.source, SourceSpec::Device(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(source: SourceSpec) -> SourceMetadata {
        SourceMetadata {
            width: 640,
            height: 480,
            fps: 30.0,
            total_frames: 0,
            codec: "rawvideo".to_string(),
            source,
        }
    }

    #[test]
    fn test_device_is_live() {
        assert!(metadata(SourceSpec::Device("/dev/video0".into())).is_live());
        assert!(!metadata(SourceSpec::File("clip.mp4".into())).is_live());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            SourceSpec::Device("/dev/video0".into()).to_string(),
            "device /dev/video0"
        );
        assert_eq!(SourceSpec::File("a/b.mp4".into()).to_string(), "a/b.mp4");
    }
}
