use crate::error::PredictorError;
use serde::{Deserialize, Serialize};

/// Parses the process argument: must be one JSON array of strings.
/// Anything else (non-JSON, a scalar, mixed element types) is an
/// invalid-input failure before any prediction work starts.
pub fn parse_symptoms_json(raw: &str) -> Result<Vec<String>, PredictorError> {
    serde_json::from_str(raw).map_err(|e| {
        PredictorError::InvalidInput(format!("symptoms must be a JSON array of strings: {}", e))
    })
}

/// The single JSON object emitted on stdout for a successful call.
///
/// Three shapes exist: a labeled prediction from the single-model path
/// (confidence present only when the classifier exposes probabilities),
/// a stacked-ensemble prediction carrying the matched symptoms, and the
/// fallback matcher's "no match" outcome serialized as `{"disease": null}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PredictionResponse {
    Stacked {
        prediction: String,
        matched_symptoms: Vec<String>,
    },
    Labeled {
        disease: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        confidence: Option<f64>,
    },
    NoMatch {
        disease: Option<String>,
    },
}

impl PredictionResponse {
    pub fn labeled(disease: impl Into<String>, confidence: Option<f64>) -> Self {
        PredictionResponse::Labeled {
            disease: disease.into(),
            confidence,
        }
    }

    pub fn stacked(prediction: impl Into<String>, matched_symptoms: Vec<String>) -> Self {
        PredictionResponse::Stacked {
            prediction: prediction.into(),
            matched_symptoms,
        }
    }

    pub fn no_match() -> Self {
        PredictionResponse::NoMatch { disease: None }
    }
}
