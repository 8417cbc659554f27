// src/dispatch/endpoint.rs

use crate::error::{AppError, Result};
use reqwest::{Client, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt::Debug;
use url::Url;

/// Request parameters of one logical call. Never carries the credential.
pub type Params = BTreeMap<String, String>;

/// Maps a logical operation onto a concrete HTTP request for one service.
pub trait ServiceEndpoint: Send + Sync + Debug {
    /// Service name used in logs and in `ExhaustedError`.
    fn name(&self) -> &str;

    /// Checked once per dispatch, before any credential is spent.
    fn validate(&self, operation: &str, params: &Params) -> Result<()>;

    /// Builds the request for one attempt with `credential` injected.
    fn request(
        &self,
        client: &Client,
        operation: &str,
        params: &Params,
        credential: &SecretString,
    ) -> Result<RequestBuilder>;

    /// Smallest useful request, used when probing keys.
    fn probe(&self) -> (String, Params);
}

fn parse_base(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url)?;
    if url.query().is_some() {
        return Err(AppError::validation("base_url", "base URL must not carry a query string"));
    }
    Ok(url)
}

fn join_path(base: &Url, tail: &str) -> Result<Url> {
    let joined = format!("{}/{}", base.as_str().trim_end_matches('/'), tail);
    Ok(Url::parse(&joined)?)
}

fn check_operation(operation: &str) -> Result<()> {
    let valid = !operation.is_empty()
        && operation
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(AppError::validation(
            "operation",
            format!("'{}' is not a valid operation name", operation),
        ))
    }
}

/// WeatherAPI-style endpoint: `GET {base}/{operation}.json?key=..&{params}`.
#[derive(Debug, Clone)]
pub struct WeatherEndpoint {
    base_url: Url,
}

impl WeatherEndpoint {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: parse_base(base_url)?,
        })
    }

    pub fn url(&self, operation: &str, params: &Params, credential: &SecretString) -> Result<Url> {
        let mut url = join_path(&self.base_url, &format!("{}.json", operation))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", credential.expose_secret());
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }
        Ok(url)
    }
}

impl ServiceEndpoint for WeatherEndpoint {
    fn name(&self) -> &str {
        "weather"
    }

    fn validate(&self, operation: &str, params: &Params) -> Result<()> {
        check_operation(operation)?;
        if params.contains_key("key") {
            return Err(AppError::validation("params", "'key' is reserved for the credential"));
        }
        Ok(())
    }

    fn request(
        &self,
        client: &Client,
        operation: &str,
        params: &Params,
        credential: &SecretString,
    ) -> Result<RequestBuilder> {
        Ok(client.get(self.url(operation, params, credential)?))
    }

    fn probe(&self) -> (String, Params) {
        let mut params = Params::new();
        params.insert("q".to_string(), "London".to_string());
        ("current".to_string(), params)
    }
}

/// Gemini-style endpoint: `POST {base}/models/{model}:{operation}?key=..`.
///
/// The `prompt` parameter becomes the single text part of the request body.
#[derive(Debug, Clone)]
pub struct GenerativeEndpoint {
    base_url: Url,
    model: String,
}

impl GenerativeEndpoint {
    pub const GENERATE: &'static str = "generateContent";

    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        if model.trim().is_empty() {
            return Err(AppError::validation("model", "model name cannot be empty"));
        }
        Ok(Self {
            base_url: parse_base(base_url)?,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn url(&self, operation: &str, credential: &SecretString) -> Result<Url> {
        let mut url = join_path(
            &self.base_url,
            &format!("models/{}:{}", self.model, operation),
        )?;
        url.query_pairs_mut()
            .append_pair("key", credential.expose_secret());
        Ok(url)
    }
}

impl ServiceEndpoint for GenerativeEndpoint {
    fn name(&self) -> &str {
        "generative"
    }

    fn validate(&self, operation: &str, params: &Params) -> Result<()> {
        check_operation(operation)?;
        match params.get("prompt") {
            Some(prompt) if !prompt.trim().is_empty() => Ok(()),
            _ => Err(AppError::validation("prompt", "a non-empty prompt is required")),
        }
    }

    fn request(
        &self,
        client: &Client,
        operation: &str,
        params: &Params,
        credential: &SecretString,
    ) -> Result<RequestBuilder> {
        let prompt = params
            .get("prompt")
            .ok_or_else(|| AppError::validation("prompt", "a prompt is required"))?;
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        Ok(client.post(self.url(operation, credential)?).json(&body))
    }

    fn probe(&self) -> (String, Params) {
        let mut params = Params::new();
        params.insert("prompt".to_string(), "Hello".to_string());
        (Self::GENERATE.to_string(), params)
    }
}
