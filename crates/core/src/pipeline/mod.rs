pub mod audio_intervention_use_case;
pub mod infrastructure;
pub mod monitor_attention_use_case;
pub mod monitor_executor;
pub mod pipeline_logger;
pub mod status_sink;
