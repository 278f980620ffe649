use crate::errors::AppResult;

/// A single prompt/response exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Synchronous text generation backend.
pub trait TextGenerator {
    fn generate(&self, req: &GenerationRequest) -> AppResult<String>;
}
