use crate::{
    config::{Config, Strategy},
    encoder,
    ensemble::StackedBundle,
    error::PredictorError,
    fuzzy,
    models::{argmax, Classifier, SingleModelArtifact},
    normalize::normalize_all,
    schema::{FeatureSchema, SymptomMapping},
    types::PredictionResponse,
};
use std::path::Path;
use tracing::{debug, info, warn};

enum LoadedStrategy {
    Single {
        schema: FeatureSchema,
        model: Box<dyn Classifier>,
    },
    Stacked {
        schema: FeatureSchema,
        bundle: StackedBundle,
    },
    Mapping {
        mapping: SymptomMapping,
    },
}

/// Holds the loaded artifacts for the lifetime of the process. All
/// loading happens in the constructors; `predict` takes `&self` and
/// mutates nothing, so one engine can serve concurrent callers.
pub struct PredictorEngine {
    strategy: LoadedStrategy,
}

impl PredictorEngine {
    pub fn from_config(config: &Config) -> Result<Self, PredictorError> {
        info!("Initializing predictor engine ({:?} strategy)", config.strategy);

        let mapping_path = Path::new(&config.mapping_path);

        if config.strategy == Strategy::Mapping {
            return Ok(Self::with_mapping(SymptomMapping::load(mapping_path)?));
        }

        let model_path = Path::new(&config.model_path);
        if !model_path.exists() {
            if mapping_path.exists() {
                warn!(
                    "Model artifact {} not found, falling back to symptom mapping",
                    model_path.display()
                );
                return Ok(Self::with_mapping(SymptomMapping::load(mapping_path)?));
            }
            return Err(PredictorError::ModelLoad(format!(
                "model artifact {} not found and no symptom mapping to fall back to",
                model_path.display()
            )));
        }

        let schema = FeatureSchema::load(Path::new(&config.schema_path))?;
        let engine = match config.strategy {
            Strategy::Single => {
                let model = SingleModelArtifact::load(model_path, schema.width())?;
                Self::with_single_model(schema, model)
            }
            Strategy::Stacked => {
                let bundle = StackedBundle::load(model_path, schema.width())?;
                Self::with_stacked_bundle(schema, bundle)
            }
            Strategy::Mapping => unreachable!("handled above"),
        };

        info!("Predictor engine initialized");
        Ok(engine)
    }

    pub fn with_single_model(schema: FeatureSchema, model: Box<dyn Classifier>) -> Self {
        Self {
            strategy: LoadedStrategy::Single { schema, model },
        }
    }

    pub fn with_stacked_bundle(schema: FeatureSchema, bundle: StackedBundle) -> Self {
        Self {
            strategy: LoadedStrategy::Stacked { schema, bundle },
        }
    }

    pub fn with_mapping(mapping: SymptomMapping) -> Self {
        Self {
            strategy: LoadedStrategy::Mapping { mapping },
        }
    }

    pub fn predict(&self, raw: &[String]) -> Result<PredictionResponse, PredictorError> {
        let symptoms = normalize_all(raw);
        debug!("Predicting from {} symptoms", symptoms.len());

        match &self.strategy {
            LoadedStrategy::Single { schema, model } => {
                let encoded = encoder::encode(&symptoms, schema)?;
                match model.class_probabilities(&encoded.vector) {
                    Some(result) => {
                        let probabilities = result?;
                        let idx = argmax(&probabilities).ok_or_else(|| {
                            PredictorError::Prediction("empty probability vector".to_string())
                        })?;
                        Ok(PredictionResponse::labeled(
                            model.classes()[idx].clone(),
                            Some(probabilities[idx]),
                        ))
                    }
                    None => {
                        let disease = model.predict(&encoded.vector)?;
                        Ok(PredictionResponse::labeled(disease, None))
                    }
                }
            }
            LoadedStrategy::Stacked { schema, bundle } => {
                let encoded = encoder::encode(&symptoms, schema)?;
                let label = bundle.predict_label(&encoded.vector)?;
                Ok(PredictionResponse::stacked(label, encoded.matched))
            }
            LoadedStrategy::Mapping { mapping } => {
                match fuzzy::match_disease(&symptoms, mapping) {
                    Some(disease) => Ok(PredictionResponse::labeled(disease, None)),
                    None => Ok(PredictionResponse::no_match()),
                }
            }
        }
    }
}
