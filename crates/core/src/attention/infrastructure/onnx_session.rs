use std::path::Path;

/// Opens an ONNX model with the platform's accelerated execution provider,
/// falling back to CPU when it is unavailable.
pub fn load_session(model_path: &Path) -> Result<ort::session::Session, Box<dyn std::error::Error>> {
    Ok(ort::session::Session::builder()?
        .with_execution_providers(preferred_execution_providers())?
        .commit_from_file(model_path)?)
}

fn preferred_execution_providers() -> Vec<ort::execution_providers::ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sigmoid() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(6.0) > 0.99);
        assert!(sigmoid(-6.0) < 0.01);
    }

    #[test]
    fn test_missing_model_fails_to_load() {
        assert!(load_session(Path::new("/nonexistent/model.onnx")).is_err());
    }
}
