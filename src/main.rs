use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vaidya_engine::types::parse_symptoms_json;
use vaidya_engine::{Config, PredictionResponse, PredictorEngine, PredictorError};

fn main() {
    // Logs go to stderr so stdout carries exactly one JSON object
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vaidya_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run() {
        Ok(response) => match serde_json::to_string(&response) {
            Ok(body) => println!("{}", body),
            Err(e) => {
                let err = PredictorError::Prediction(format!("failed to serialize response: {}", e));
                error!("{}", err);
                println!("{}", err.to_response_body());
                std::process::exit(1);
            }
        },
        Err(err) => {
            error!("{}", err);
            println!("{}", err.to_response_body());
            std::process::exit(1);
        }
    }
}

fn run() -> Result<PredictionResponse, PredictorError> {
    let arg = std::env::args().nth(1).ok_or_else(|| {
        PredictorError::InvalidInput(
            "expected one argument: a JSON array of symptom strings".to_string(),
        )
    })?;
    let raw = parse_symptoms_json(&arg)?;

    let config = Config::load()?;
    let engine = PredictorEngine::from_config(&config)?;

    info!("Predicting disease for {} reported symptoms", raw.len());
    engine.predict(&raw)
}
