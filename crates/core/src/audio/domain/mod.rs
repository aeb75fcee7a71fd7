pub mod audio_segment;
pub mod audio_transformer;
pub mod audio_writer;
pub mod intervention_mode;
