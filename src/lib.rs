pub mod config;
pub mod encoder;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod fuzzy;
pub mod models;
pub mod normalize;
pub mod schema;
pub mod types;

pub use crate::config::{Config, Strategy};
pub use crate::engine::PredictorEngine;
pub use crate::error::PredictorError;
pub use crate::types::PredictionResponse;
