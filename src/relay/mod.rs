//! The chat relay: an HTTP endpoint that forwards one prompt to a hosted
//! language model, and the client the terminal app uses to call it.

pub mod client;
pub mod provider;
pub mod server;

pub use client::RelayClient;
pub use provider::{CompletionProvider, OpenAiCompatProvider};
pub use server::{build_router, run_server};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown in place of an answer when the relay could not be reached.
pub const CLIENT_FALLBACK_ANSWER: &str = "Oops, something went wrong calling the model.";

/// Returned by the relay when the model produced no text.
pub const EMPTY_COMPLETION_ANSWER: &str = "Could not generate an answer.";

pub const EMPTY_PROMPT_ERROR: &str = "Empty prompt";
pub const UPSTREAM_ERROR: &str = "Error calling the language model";

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Upstream returned error: {0}")]
    Upstream(String),

    #[error("No API key found in ${0}")]
    MissingApiKey(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            answer: None,
            error: Some(error.into()),
        }
    }
}
