use crate::error::{model_load_error, PredictorError};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// The fixed symptom vocabulary a trained model expects: an immutable
/// dense mapping from symptom token to feature index. Source of truth
/// for the feature vector width.
#[derive(Debug, Clone)]
pub struct FeatureSchema {
    index: HashMap<String, usize>,
    names: Vec<String>,
}

impl FeatureSchema {
    /// Validates that the indices form a bijection onto [0, width):
    /// duplicate, out-of-range, or missing indices reject the schema.
    pub fn from_index_map(map: HashMap<String, usize>) -> Result<Self, PredictorError> {
        let width = map.len();
        let mut names = vec![String::new(); width];
        let mut seen = vec![false; width];

        for (symptom, &idx) in &map {
            if idx >= width {
                return Err(PredictorError::ModelLoad(format!(
                    "schema index {} for symptom '{}' out of range (width {})",
                    idx, symptom, width
                )));
            }
            if seen[idx] {
                return Err(PredictorError::ModelLoad(format!(
                    "schema index {} assigned to both '{}' and '{}'",
                    idx, names[idx], symptom
                )));
            }
            seen[idx] = true;
            names[idx] = symptom.clone();
        }

        Ok(Self { index: map, names })
    }

    pub fn load(path: &Path) -> Result<Self, PredictorError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| model_load_error(&format!("failed to read schema {}", path.display()), e))?;
        let map: HashMap<String, usize> = serde_json::from_str(&content)
            .map_err(|e| model_load_error(&format!("failed to parse schema {}", path.display()), e))?;
        let schema = Self::from_index_map(map)?;
        debug!("Loaded feature schema from {}: width {}", path.display(), schema.width());
        Ok(schema)
    }

    pub fn width(&self) -> usize {
        self.names.len()
    }

    pub fn index_of(&self, symptom: &str) -> Option<usize> {
        self.index.get(symptom).copied()
    }
}

/// Symptom -> disease-list mapping used by the fallback matcher.
/// Entries keep the insertion order of the JSON file, which is what
/// makes the tie-break in scoring deterministic.
#[derive(Debug, Clone, Default)]
pub struct SymptomMapping {
    entries: Vec<(String, Vec<String>)>,
}

impl SymptomMapping {
    pub fn from_entries(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, PredictorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            model_load_error(&format!("failed to read symptom mapping {}", path.display()), e)
        })?;
        let mapping = Self::parse(&content).map_err(|e| {
            model_load_error(&format!("failed to parse symptom mapping {}", path.display()), e)
        })?;
        debug!(
            "Loaded symptom mapping from {}: {} entries",
            path.display(),
            mapping.len()
        );
        Ok(mapping)
    }

    /// Parses a JSON object of symptom -> [disease]. serde_json is built
    /// with preserve_order, so iteration follows the file's key order.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let map: serde_json::Map<String, Value> = serde_json::from_str(content)?;
        let mut entries = Vec::with_capacity(map.len());
        for (symptom, diseases) in map {
            let diseases: Vec<String> = serde_json::from_value(diseases)?;
            entries.push((symptom, diseases));
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, Vec<String>)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_map(pairs: &[(&str, usize)]) -> HashMap<String, usize> {
        pairs.iter().map(|(s, i)| (s.to_string(), *i)).collect()
    }

    #[test]
    fn test_schema_accepts_dense_map() {
        let schema =
            FeatureSchema::from_index_map(index_map(&[("fever", 0), ("cough", 1), ("headache", 2)]))
                .unwrap();
        assert_eq!(schema.width(), 3);
        assert_eq!(schema.index_of("cough"), Some(1));
        assert_eq!(schema.index_of("nausea"), None);
    }

    #[test]
    fn test_schema_rejects_gap() {
        // Index 2 with only two symptoms leaves a gap at 1
        let err = FeatureSchema::from_index_map(index_map(&[("fever", 0), ("cough", 2)]))
            .unwrap_err();
        assert!(matches!(err, PredictorError::ModelLoad(_)));
    }

    #[test]
    fn test_schema_rejects_duplicate_index_naming_both_symptoms() {
        let err = FeatureSchema::from_index_map(index_map(&[("fever", 0), ("cough", 0)]))
            .unwrap_err();
        match err {
            PredictorError::ModelLoad(msg) => {
                assert!(msg.contains("fever") && msg.contains("cough"));
            }
            other => panic!("expected ModelLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_mapping_preserves_file_order() {
        let mapping = SymptomMapping::parse(
            r#"{"headache": ["migraine", "tension_headache"], "fever": ["flu"], "cough": ["cold"]}"#,
        )
        .unwrap();
        let keys: Vec<&str> = mapping.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["headache", "fever", "cough"]);
    }

    #[test]
    fn test_mapping_rejects_non_list_values() {
        assert!(SymptomMapping::parse(r#"{"headache": "migraine"}"#).is_err());
    }
}
