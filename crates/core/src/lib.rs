pub mod attention;
pub mod audio;
pub mod overlay;
pub mod pipeline;
pub mod shared;
pub mod video;
