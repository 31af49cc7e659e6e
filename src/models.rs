use crate::error::{model_load_error, PredictorError};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Capability interface for the single-model path. Probability support
/// is declared per adapter instead of probed at runtime: an adapter
/// without a probability output returns `None` from
/// `class_probabilities` and the engine falls back to the hard label.
pub trait Classifier: std::fmt::Debug + Send + Sync {
    fn classes(&self) -> &[String];

    /// Number of input features the classifier was trained against.
    fn width(&self) -> usize;

    fn predict(&self, features: &[f64]) -> Result<String, PredictorError>;

    /// `None` when the adapter has no probability output. Distribution
    /// order follows `classes()`.
    fn class_probabilities(&self, features: &[f64]) -> Option<Result<Vec<f64>, PredictorError>>;
}

/// Index of the first maximum, so equal scores resolve to the lowest
/// class index. Deterministic given the artifact's class order.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in values.iter().enumerate() {
        match best {
            Some((_, b)) if value <= b => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Linear classifier with softmax probability output: one weight row and
/// one bias term per class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSoftmax {
    pub classes: Vec<String>,
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl LinearSoftmax {
    pub fn validate(&self, context: &str) -> Result<(), PredictorError> {
        if self.classes.is_empty() {
            return Err(PredictorError::ModelLoad(format!("{}: empty class list", context)));
        }
        if self.weights.len() != self.classes.len() || self.bias.len() != self.classes.len() {
            return Err(PredictorError::ModelLoad(format!(
                "{}: {} classes but {} weight rows and {} bias terms",
                context,
                self.classes.len(),
                self.weights.len(),
                self.bias.len()
            )));
        }
        let width = self.weights[0].len();
        if width == 0 || self.weights.iter().any(|row| row.len() != width) {
            return Err(PredictorError::ModelLoad(format!(
                "{}: weight rows must share one nonzero width",
                context
            )));
        }
        Ok(())
    }

    fn logits(&self, features: &[f64]) -> Result<DVector<f64>, PredictorError> {
        let rows = self.weights.len();
        let cols = self.weights[0].len();
        if features.len() != cols {
            return Err(PredictorError::Prediction(format!(
                "feature row has {} values, classifier expects {}",
                features.len(),
                cols
            )));
        }
        let w = DMatrix::from_fn(rows, cols, |r, c| self.weights[r][c]);
        let x = DVector::from_column_slice(features);
        Ok(w * x + DVector::from_column_slice(&self.bias))
    }

    /// Softmax over the logits, shifted by the max for stability.
    pub fn probabilities(&self, features: &[f64]) -> Result<Vec<f64>, PredictorError> {
        let logits = self.logits(features)?;
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
        let sum: f64 = exps.iter().sum();
        if !sum.is_finite() || sum <= 0.0 {
            return Err(PredictorError::Prediction(
                "softmax normalization produced a non-finite distribution".to_string(),
            ));
        }
        Ok(exps.iter().map(|&e| e / sum).collect())
    }
}

impl Classifier for LinearSoftmax {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn width(&self) -> usize {
        self.weights[0].len()
    }

    fn predict(&self, features: &[f64]) -> Result<String, PredictorError> {
        let probabilities = self.probabilities(features)?;
        let idx = argmax(&probabilities)
            .ok_or_else(|| PredictorError::Prediction("empty probability vector".to_string()))?;
        Ok(self.classes[idx].clone())
    }

    fn class_probabilities(&self, features: &[f64]) -> Option<Result<Vec<f64>, PredictorError>> {
        Some(self.probabilities(features))
    }
}

/// Hard-label classifier: one stored centroid row per class, label by
/// best dot product. No probability output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearestCentroid {
    pub classes: Vec<String>,
    pub centroids: Vec<Vec<f64>>,
}

impl NearestCentroid {
    pub fn validate(&self, context: &str) -> Result<(), PredictorError> {
        if self.classes.is_empty() {
            return Err(PredictorError::ModelLoad(format!("{}: empty class list", context)));
        }
        if self.centroids.len() != self.classes.len() {
            return Err(PredictorError::ModelLoad(format!(
                "{}: {} classes but {} centroid rows",
                context,
                self.classes.len(),
                self.centroids.len()
            )));
        }
        let width = self.centroids[0].len();
        if width == 0 || self.centroids.iter().any(|row| row.len() != width) {
            return Err(PredictorError::ModelLoad(format!(
                "{}: centroid rows must share one nonzero width",
                context
            )));
        }
        Ok(())
    }
}

impl Classifier for NearestCentroid {
    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn width(&self) -> usize {
        self.centroids[0].len()
    }

    fn predict(&self, features: &[f64]) -> Result<String, PredictorError> {
        if features.len() != self.width() {
            return Err(PredictorError::Prediction(format!(
                "feature row has {} values, classifier expects {}",
                features.len(),
                self.width()
            )));
        }
        let x = DVector::from_column_slice(features);
        let scores: Vec<f64> = self
            .centroids
            .iter()
            .map(|row| DVector::from_column_slice(row).dot(&x))
            .collect();
        let idx = argmax(&scores)
            .ok_or_else(|| PredictorError::Prediction("empty score vector".to_string()))?;
        Ok(self.classes[idx].clone())
    }

    fn class_probabilities(&self, _features: &[f64]) -> Option<Result<Vec<f64>, PredictorError>> {
        None
    }
}

/// On-disk format for the single-model path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SingleModelArtifact {
    LinearSoftmax(LinearSoftmax),
    NearestCentroid(NearestCentroid),
}

impl SingleModelArtifact {
    pub fn load(path: &Path, schema_width: usize) -> Result<Box<dyn Classifier>, PredictorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| model_load_error(&format!("failed to read model {}", path.display()), e))?;
        let artifact: SingleModelArtifact = serde_json::from_str(&content)
            .map_err(|e| model_load_error(&format!("failed to parse model {}", path.display()), e))?;
        artifact.into_classifier(schema_width)
    }

    pub fn into_classifier(self, schema_width: usize) -> Result<Box<dyn Classifier>, PredictorError> {
        let classifier: Box<dyn Classifier> = match self {
            SingleModelArtifact::LinearSoftmax(model) => {
                model.validate("single model")?;
                Box::new(model)
            }
            SingleModelArtifact::NearestCentroid(model) => {
                model.validate("single model")?;
                Box::new(model)
            }
        };
        if classifier.width() != schema_width {
            return Err(PredictorError::ModelLoad(format!(
                "model expects {} features but schema width is {}",
                classifier.width(),
                schema_width
            )));
        }
        debug!(
            "Loaded single model: {} classes, width {}",
            classifier.classes().len(),
            classifier.width()
        );
        Ok(classifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn softmax_model() -> LinearSoftmax {
        LinearSoftmax {
            classes: vec!["flu".into(), "cold".into()],
            weights: vec![vec![2.0, 0.0, 0.0], vec![0.0, 2.0, 0.0]],
            bias: vec![0.0, 0.0],
        }
    }

    #[test]
    fn test_softmax_probabilities_sum_to_one() {
        let model = softmax_model();
        let probabilities = model.probabilities(&[1.0, 0.0, 1.0]).unwrap();
        let sum: f64 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(probabilities[0] > probabilities[1]);
    }

    #[test]
    fn test_softmax_predict_selects_argmax() {
        let model = softmax_model();
        assert_eq!(model.predict(&[0.0, 1.0, 0.0]).unwrap(), "cold");
        let probabilities = model.class_probabilities(&[0.0, 1.0, 0.0]).unwrap().unwrap();
        assert_eq!(argmax(&probabilities), Some(1));
    }

    #[test]
    fn test_argmax_tie_breaks_to_lowest_index() {
        assert_eq!(argmax(&[0.5, 0.5, 0.2]), Some(0));
        assert_eq!(argmax(&[0.1, 0.4, 0.4]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_shape_mismatch_is_prediction_error() {
        let model = softmax_model();
        let err = model.predict(&[1.0, 0.0]).unwrap_err();
        assert!(matches!(err, PredictorError::Prediction(_)));
    }

    #[test]
    fn test_centroid_has_no_probability_output() {
        let model = NearestCentroid {
            classes: vec!["flu".into(), "cold".into()],
            centroids: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        };
        assert!(model.class_probabilities(&[1.0, 0.0]).is_none());
        assert_eq!(model.predict(&[0.0, 1.0]).unwrap(), "cold");
    }

    #[test]
    fn test_validate_rejects_ragged_weights() {
        let model = LinearSoftmax {
            classes: vec!["flu".into(), "cold".into()],
            weights: vec![vec![1.0, 2.0], vec![1.0]],
            bias: vec![0.0, 0.0],
        };
        assert!(matches!(model.validate("test"), Err(PredictorError::ModelLoad(_))));
    }

    #[test]
    fn test_artifact_rejects_width_mismatch_with_schema() {
        let artifact = SingleModelArtifact::LinearSoftmax(softmax_model());
        let err = artifact.into_classifier(5).unwrap_err();
        assert!(matches!(err, PredictorError::ModelLoad(_)));
    }

    #[test]
    fn test_artifact_json_round_trip() {
        let json = r#"{
            "kind": "linear_softmax",
            "classes": ["flu", "cold"],
            "weights": [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
            "bias": [0.0, 0.0]
        }"#;
        let artifact: SingleModelArtifact = serde_json::from_str(json).unwrap();
        let classifier = artifact.into_classifier(3).unwrap();
        assert_eq!(classifier.predict(&[1.0, 0.0, 0.0]).unwrap(), "flu");
    }
}
