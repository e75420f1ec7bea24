use async_trait::async_trait;
use serde::Serialize;

use super::InferenceError;

/// Output contract requested from the capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    JsonObject,
}

impl ResponseFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JsonObject => "json_object",
        }
    }
}

/// One structured-extraction or classification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferenceRequest {
    pub system_instruction: String,
    pub user_prompt: String,
    pub response_format: ResponseFormat,
}

impl InferenceRequest {
    /// Request that expects a single JSON object back.
    pub fn json(system_instruction: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            user_prompt: user_prompt.into(),
            response_format: ResponseFormat::JsonObject,
        }
    }
}

/// Inference capability abstraction (allows mocking)
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one request and return the raw text of the answer.
    async fn complete(&self, request: &InferenceRequest) -> Result<String, InferenceError>;

    /// Model identifier used for requests, for logging.
    fn model_name(&self) -> &str;
}
