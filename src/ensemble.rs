use crate::error::{model_load_error, PredictorError};
use crate::models::{argmax, LinearSoftmax};
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Meta classifier trained on the concatenated base probability blocks.
/// Output is a hard label index, decoded through the label encoder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaClassifier {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl MetaClassifier {
    fn validate(&self, stacked_width: usize, label_count: usize) -> Result<(), PredictorError> {
        if self.weights.len() != label_count || self.bias.len() != label_count {
            return Err(PredictorError::ModelLoad(format!(
                "meta_model has {} weight rows and {} bias terms for {} labels",
                self.weights.len(),
                self.bias.len(),
                label_count
            )));
        }
        if self.weights.iter().any(|row| row.len() != stacked_width) {
            return Err(PredictorError::ModelLoad(format!(
                "meta_model weight rows must have width {} (|classes A| + |classes B|)",
                stacked_width
            )));
        }
        Ok(())
    }

    fn predict_index(&self, stacked: &[f64]) -> Result<usize, PredictorError> {
        let rows = self.weights.len();
        let cols = self.weights[0].len();
        if stacked.len() != cols {
            return Err(PredictorError::Prediction(format!(
                "stacked row has {} values, meta classifier expects {}",
                stacked.len(),
                cols
            )));
        }
        let w = DMatrix::from_fn(rows, cols, |r, c| self.weights[r][c]);
        let x = DVector::from_column_slice(stacked);
        let logits = w * x + DVector::from_column_slice(&self.bias);
        argmax(logits.as_slice())
            .ok_or_else(|| PredictorError::Prediction("empty meta logit vector".to_string()))
    }
}

/// Two-stage stacked ensemble: class probabilities from both base
/// classifiers, concatenated strictly A-then-B (the order the meta
/// classifier was trained against), then a hard label from the meta
/// classifier decoded back to a disease name.
#[derive(Debug, Clone)]
pub struct StackedBundle {
    extra_model: LinearSoftmax,
    xgb_model: LinearSoftmax,
    meta_model: MetaClassifier,
    label_encoder: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawBundle {
    extra_model: Option<LinearSoftmax>,
    xgb_model: Option<LinearSoftmax>,
    meta_model: Option<MetaClassifier>,
    label_encoder: Option<Vec<String>>,
}

fn require<T>(component: Option<T>, name: &str) -> Result<T, PredictorError> {
    component.ok_or_else(|| {
        PredictorError::ModelLoad(format!("stacked bundle is missing component `{}`", name))
    })
}

impl StackedBundle {
    pub fn load(path: &Path, schema_width: usize) -> Result<Self, PredictorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| model_load_error(&format!("failed to read bundle {}", path.display()), e))?;
        let raw: RawBundle = serde_json::from_str(&content)
            .map_err(|e| model_load_error(&format!("failed to parse bundle {}", path.display()), e))?;
        Self::from_raw(raw, schema_width)
    }

    pub fn from_parts(
        extra_model: LinearSoftmax,
        xgb_model: LinearSoftmax,
        meta_model: MetaClassifier,
        label_encoder: Vec<String>,
        schema_width: usize,
    ) -> Result<Self, PredictorError> {
        let raw = RawBundle {
            extra_model: Some(extra_model),
            xgb_model: Some(xgb_model),
            meta_model: Some(meta_model),
            label_encoder: Some(label_encoder),
        };
        Self::from_raw(raw, schema_width)
    }

    // A partial bundle must never reach prediction, so every component
    // and shape is checked here.
    fn from_raw(raw: RawBundle, schema_width: usize) -> Result<Self, PredictorError> {
        let extra_model = require(raw.extra_model, "extra_model")?;
        let xgb_model = require(raw.xgb_model, "xgb_model")?;
        let meta_model = require(raw.meta_model, "meta_model")?;
        let label_encoder = require(raw.label_encoder, "label_encoder")?;

        extra_model.validate("extra_model")?;
        xgb_model.validate("xgb_model")?;

        let extra_width = extra_model.weights[0].len();
        let xgb_width = xgb_model.weights[0].len();
        if extra_width != schema_width || xgb_width != schema_width {
            return Err(PredictorError::ModelLoad(format!(
                "base classifiers expect widths {} and {} but schema width is {}",
                extra_width, xgb_width, schema_width
            )));
        }

        if label_encoder.is_empty() {
            return Err(PredictorError::ModelLoad(
                "label_encoder has no labels".to_string(),
            ));
        }

        let stacked_width = extra_model.classes.len() + xgb_model.classes.len();
        meta_model.validate(stacked_width, label_encoder.len())?;

        debug!(
            "Loaded stacked bundle: {}+{} base classes, {} labels",
            extra_model.classes.len(),
            xgb_model.classes.len(),
            label_encoder.len()
        );

        Ok(Self {
            extra_model,
            xgb_model,
            meta_model,
            label_encoder,
        })
    }

    pub fn predict_label(&self, features: &[f64]) -> Result<String, PredictorError> {
        let extra_probabilities = self.extra_model.probabilities(features)?;
        let xgb_probabilities = self.xgb_model.probabilities(features)?;

        // Concatenation order is the meta classifier's training contract
        let mut stacked = Vec::with_capacity(extra_probabilities.len() + xgb_probabilities.len());
        stacked.extend_from_slice(&extra_probabilities);
        stacked.extend_from_slice(&xgb_probabilities);

        let idx = self.meta_model.predict_index(&stacked)?;
        self.label_encoder
            .get(idx)
            .cloned()
            .ok_or_else(|| {
                PredictorError::Prediction(format!(
                    "meta classifier produced label index {} outside the label encoder ({} labels)",
                    idx,
                    self.label_encoder.len()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Base A leans towards its first class on feature 0, base B towards
    // its second class on feature 0. The meta classifier below reads the
    // blocks positionally, so swapping A and B changes its output.
    fn base_a() -> LinearSoftmax {
        LinearSoftmax {
            classes: vec!["flu".into(), "cold".into()],
            weights: vec![vec![4.0, 0.0], vec![0.0, 4.0]],
            bias: vec![0.0, 0.0],
        }
    }

    fn base_b() -> LinearSoftmax {
        LinearSoftmax {
            classes: vec!["flu".into(), "cold".into()],
            weights: vec![vec![0.0, 4.0], vec![4.0, 0.0]],
            bias: vec![0.0, 0.0],
        }
    }

    // Label 0 keys on block A's first slot, label 1 on block B's first slot.
    fn meta() -> MetaClassifier {
        MetaClassifier {
            weights: vec![
                vec![3.0, 0.0, 0.0, 0.0],
                vec![0.0, 0.0, 3.0, 0.0],
            ],
            bias: vec![0.0, -0.5],
        }
    }

    fn labels() -> Vec<String> {
        vec!["influenza".into(), "common_cold".into()]
    }

    #[test]
    fn test_stacked_prediction_decodes_label() {
        let bundle = StackedBundle::from_parts(base_a(), base_b(), meta(), labels(), 2).unwrap();
        // Feature 0 active: A says flu strongly, B says cold strongly.
        // Block A slot 0 is high, so label 0 wins.
        assert_eq!(bundle.predict_label(&[1.0, 0.0]).unwrap(), "influenza");
    }

    #[test]
    fn test_swapping_base_order_changes_output() {
        let correct = StackedBundle::from_parts(base_a(), base_b(), meta(), labels(), 2).unwrap();
        let swapped = StackedBundle::from_parts(base_b(), base_a(), meta(), labels(), 2).unwrap();
        let input = [1.0, 0.0];
        let correct_label = correct.predict_label(&input).unwrap();
        let swapped_label = swapped.predict_label(&input).unwrap();
        assert_eq!(correct_label, "influenza");
        assert_ne!(correct_label, swapped_label);
    }

    #[test]
    fn test_missing_component_names_it() {
        let raw = r#"{
            "extra_model": {"classes": ["a"], "weights": [[1.0]], "bias": [0.0]},
            "xgb_model": {"classes": ["a"], "weights": [[1.0]], "bias": [0.0]},
            "label_encoder": ["a"]
        }"#;
        let raw: RawBundle = serde_json::from_str(raw).unwrap();
        let err = StackedBundle::from_raw(raw, 1).unwrap_err();
        match err {
            PredictorError::ModelLoad(msg) => assert!(msg.contains("meta_model")),
            other => panic!("expected ModelLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_meta_width_must_match_stacked_row() {
        let narrow_meta = MetaClassifier {
            weights: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            bias: vec![0.0, 0.0],
        };
        let err =
            StackedBundle::from_parts(base_a(), base_b(), narrow_meta, labels(), 2).unwrap_err();
        assert!(matches!(err, PredictorError::ModelLoad(_)));
    }

    #[test]
    fn test_base_width_must_match_schema() {
        let err = StackedBundle::from_parts(base_a(), base_b(), meta(), labels(), 7).unwrap_err();
        assert!(matches!(err, PredictorError::ModelLoad(_)));
    }

    #[test]
    fn test_meta_rows_must_cover_labels() {
        let short_labels = vec!["influenza".into()];
        let err =
            StackedBundle::from_parts(base_a(), base_b(), meta(), short_labels, 2).unwrap_err();
        assert!(matches!(err, PredictorError::ModelLoad(_)));
    }
}
