pub const FACE_MESH_MODEL_NAME: &str = "face_landmark.onnx";

/// Face-mesh model input resolution (square).
pub const FACE_MESH_INPUT_SIZE: u32 = 192;

/// Minimum face-presence probability for the mesh to count as a face.
pub const FACE_PRESENCE_THRESHOLD: f64 = 0.5;

/// Requested capture format for camera devices.
pub const CAPTURE_WIDTH: u32 = 640;
pub const CAPTURE_HEIGHT: u32 = 480;
pub const CAPTURE_FPS: u32 = 30;

/// Classify every Nth delivered frame.
pub const DEFAULT_SAMPLE_EVERY: usize = 3;

/// Minimum seconds between two classifications (10 updates/s).
pub const DEFAULT_MIN_INTERVAL: f64 = 0.1;

/// Frames buffered between capture and processing before drops start.
pub const FRAME_QUEUE_CAPACITY: usize = 10;

pub const JPEG_QUALITY: u8 = 80;

pub const FACE_DETECTOR_MODEL_NAME: &str = "face_detection_short_range.onnx";

/// Minimum detector score for a face box to be kept.
pub const FACE_DETECTION_CONFIDENCE: f64 = 0.5;

/// Side of the square mesh crop relative to the larger face-box side.
pub const FACE_ROI_SCALE: f64 = 1.5;

/// Audio frames (per channel) processed per intervention chunk.
pub const AUDIO_CHUNK_FRAMES: usize = 4096;

/// Sample rate of the extracted soundtrack.
pub const AUDIO_SAMPLE_RATE: u32 = 44100;

/// Channel count of the extracted soundtrack.
pub const AUDIO_CHANNELS: u16 = 2;

/// Distraction timestamps retained by long-running live sessions.
pub const LIVE_HISTORY_LIMIT: usize = 10_000;
