use crate::error::PredictorError;
use serde::Deserialize;

/// Which inference path a deployment runs. `single` and `stacked` use
/// the exact-key feature schema encoder; `mapping` skips the trained
/// model entirely and scores against the symptom mapping. A missing
/// model artifact downgrades the model strategies to `mapping` at load
/// time when a mapping file is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Single,
    Stacked,
    Mapping,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub model_path: String,
    pub schema_path: String,
    pub mapping_path: String,
    pub strategy: Strategy,
}

impl Config {
    /// Defaults, then an optional `vaidya.toml`, then `VAIDYA_*`
    /// environment overrides.
    pub fn load() -> Result<Self, PredictorError> {
        let settings = config::Config::builder()
            .set_default("model_path", "models/disease_model.json")?
            .set_default("schema_path", "models/symptom_schema.json")?
            .set_default("mapping_path", "models/symptom_mapping.json")?
            .set_default("strategy", "single")?
            .add_source(config::File::with_name("vaidya").required(false))
            .add_source(config::Environment::with_prefix("VAIDYA"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::load().unwrap();
        assert_eq!(config.model_path, "models/disease_model.json");
        assert_eq!(config.schema_path, "models/symptom_schema.json");
        assert_eq!(config.mapping_path, "models/symptom_mapping.json");
        assert_eq!(config.strategy, Strategy::Single);
    }

    #[test]
    fn test_strategy_parses_lowercase() {
        let strategy: Strategy = serde_json::from_str("\"stacked\"").unwrap();
        assert_eq!(strategy, Strategy::Stacked);
        let strategy: Strategy = serde_json::from_str("\"mapping\"").unwrap();
        assert_eq!(strategy, Strategy::Mapping);
    }
}
