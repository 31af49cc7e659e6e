use crate::error::PredictorError;
use crate::schema::FeatureSchema;
use tracing::debug;

/// A fixed-width binary feature row plus the input symptoms that landed
/// in the schema. The vector length always equals the schema width.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub vector: Vec<f64>,
    pub matched: Vec<String>,
}

/// Maps normalized symptoms onto the schema: exact key hits set the
/// corresponding slot to 1.0, unknown symptoms are skipped. Duplicate
/// inputs are idempotent; a symptom is recorded as matched only when it
/// flips its slot. An empty match set is an error, since an all-zero
/// vector would only ever produce a meaningless baseline prediction.
pub fn encode(symptoms: &[String], schema: &FeatureSchema) -> Result<Encoded, PredictorError> {
    let mut vector = vec![0.0; schema.width()];
    let mut matched = Vec::new();

    for symptom in symptoms {
        if let Some(idx) = schema.index_of(symptom) {
            if vector[idx] == 0.0 {
                vector[idx] = 1.0;
                matched.push(symptom.clone());
            }
        }
    }

    if matched.is_empty() {
        return Err(PredictorError::NoRecognizedSymptoms);
    }

    debug!("Encoded {} of {} symptoms onto schema", matched.len(), symptoms.len());
    Ok(Encoded { vector, matched })
}
