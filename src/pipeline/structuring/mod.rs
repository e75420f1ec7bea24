//! Client side of the external inference capability.
//!
//! The capability accepts a system instruction plus a user prompt and answers
//! with one JSON object. Callers embed the output schema in the prompt text;
//! the capability only guarantees "valid JSON object" (and not always that).

pub mod types;
pub mod openai;
pub mod sanitize;
pub mod parser;

pub use types::*;
pub use openai::*;
pub use sanitize::*;
pub use parser::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Inference service is not reachable at {0}")]
    Connection(String),

    #[error("Inference request timed out after {0}s")]
    Timeout(u64),

    #[error("Inference service returned error (status {status}): {body}")]
    Status { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed inference response: {0}")]
    MalformedResponse(String),
}
