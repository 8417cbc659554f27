// src/services/generative.rs

use crate::dispatch::{Dispatcher, GenerativeEndpoint, KeyProbeReport, Params};
use crate::error::{AppError, Result};
use serde_json::Value;
use tracing::{debug, instrument};

/// Text generation on top of a rotating dispatcher.
#[derive(Debug, Clone)]
pub struct GenerativeClient {
    dispatcher: Dispatcher,
    model: String,
}

/// Concatenated text parts of the first candidate, if any.
pub fn completion_text(body: &Value) -> Option<String> {
    let parts = body.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

impl GenerativeClient {
    pub fn new(dispatcher: Dispatcher, model: impl Into<String>) -> Self {
        Self {
            dispatcher,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Generates text for `prompt`.
    ///
    /// A successful response without candidate text is `EmptyCompletion`; it does not rotate.
    #[instrument(level = "debug", skip(self, prompt), fields(prompt.len = prompt.len()))]
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let mut params = Params::new();
        params.insert("prompt".to_string(), prompt.to_string());

        let body = self
            .dispatcher
            .dispatch(GenerativeEndpoint::GENERATE, &params)
            .await?;

        let text = completion_text(&body).ok_or(AppError::EmptyCompletion)?;
        debug!(response.len = text.len(), "Completion received");
        Ok(text)
    }

    pub async fn probe_keys(&self) -> KeyProbeReport {
        self.dispatcher.probe_keys().await
    }
}
