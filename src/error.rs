use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictorError {
    #[error("Model load error: {0}")]
    ModelLoad(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("None of the input symptoms are recognized")]
    NoRecognizedSymptoms,

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl PredictorError {
    /// Stable machine-readable discriminator for the error body.
    pub fn code(&self) -> &'static str {
        match self {
            PredictorError::ModelLoad(_) => "model_load",
            PredictorError::InvalidInput(_) => "invalid_input",
            PredictorError::NoRecognizedSymptoms => "no_recognized_symptoms",
            PredictorError::Prediction(_) => "prediction",
            PredictorError::Config(_) => "config",
        }
    }

    /// The single JSON object emitted on stdout when a call fails.
    pub fn to_response_body(&self) -> Value {
        json!({
            "error": self.to_string(),
            "code": self.code(),
        })
    }
}

// Helper for load-time failures around artifact IO and parsing
pub fn model_load_error(context: &str, err: impl std::fmt::Display) -> PredictorError {
    PredictorError::ModelLoad(format!("{}: {}", context, err))
}
