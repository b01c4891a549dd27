use super::{ChatReply, ChatRequest, RelayError};
use reqwest::blocking::Client;
use std::time::Duration;

/// Blocking client for the relay's `/api/chat`. Meant to run off the UI
/// thread.
#[derive(Clone)]
pub struct RelayClient {
    http: Client,
    url: String,
}

impl RelayClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn ask(&self, prompt: &str) -> Result<String, RelayError> {
        let response = self.http.post(&self.url).json(&ChatRequest::new(prompt)).send()?;
        let status = response.status();
        let body = response.text()?;
        interpret_reply(status.is_success(), status.as_u16(), &body)
    }
}

fn interpret_reply(success: bool, status: u16, body: &str) -> Result<String, RelayError> {
    match serde_json::from_str::<ChatReply>(body) {
        Ok(ChatReply {
            error: Some(error), ..
        }) => Err(RelayError::Upstream(format!("HTTP {}: {}", status, error))),
        _ if !success => Err(RelayError::Upstream(format!("HTTP {}", status))),
        Ok(ChatReply {
            answer: Some(answer),
            ..
        }) => Ok(answer),
        Ok(_) => Err(RelayError::Upstream("reply carried no answer".to_string())),
        Err(e) => Err(RelayError::Json(e)),
    }
}
