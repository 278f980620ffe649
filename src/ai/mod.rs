//! Text generation used for day summaries.

pub mod generator;
pub mod openai;

pub use generator::{GenerationRequest, TextGenerator};
pub use openai::OpenAiGenerator;

use crate::config::AiConfig;

/// Build the configured generator, or `None` when generation is disabled or
/// no API key is available.
pub fn generator_from_config(cfg: &AiConfig) -> Option<Box<dyn TextGenerator>> {
    if !cfg.enabled {
        log::debug!("text generation disabled in config");
        return None;
    }
    match cfg.api_key() {
        Some(key) => match OpenAiGenerator::new(&cfg.endpoint, &cfg.model, &key) {
            Ok(g) => Some(Box::new(g)),
            Err(e) => {
                log::warn!("cannot build HTTP client, day summaries use the place sequence: {}", e);
                None
            }
        },
        None => {
            log::info!(
                "no API key in ${}, day summaries use the place sequence",
                cfg.api_key_env
            );
            None
        }
    }
}
