pub mod resample_pitch_transformer;
pub mod volume_transformer;
pub mod wav_audio_writer;
