// src/dispatch/dispatcher.rs

use crate::config::InvalidKeyPolicy;
use crate::dispatch::{CredentialSet, DispatcherState, Params, ServiceEndpoint};
use crate::error::{AppError, ExhaustedError, FailureKind, Result, ServiceFailure};
use futures_util::future::join_all;
use reqwest::Client;
use secrecy::SecretString;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Runs logical calls against one service, rotating through its credentials on failure.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: Client,
    credentials: Arc<CredentialSet>,
    state: Arc<DispatcherState>,
    endpoint: Arc<dyn ServiceEndpoint>,
    timeout: Duration,
    policy: InvalidKeyPolicy,
}

/// Outcome of probing a single credential.
#[derive(Debug, Clone, Serialize)]
pub struct KeyProbe {
    pub index: usize,
    pub preview: String,
    pub working: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<ServiceFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyProbeReport {
    pub total: usize,
    pub working: usize,
    pub failed: usize,
    pub results: Vec<KeyProbe>,
}

impl Dispatcher {
    pub fn new(
        client: Client,
        credentials: CredentialSet,
        state: Arc<DispatcherState>,
        endpoint: Arc<dyn ServiceEndpoint>,
        timeout: Duration,
    ) -> Result<Self> {
        if state.len() != credentials.len() {
            return Err(AppError::validation(
                "state",
                format!(
                    "dispatcher state tracks {} keys but {} credentials were given",
                    state.len(),
                    credentials.len()
                ),
            ));
        }

        Ok(Self {
            client,
            credentials: Arc::new(credentials),
            state,
            endpoint,
            timeout,
            policy: InvalidKeyPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: InvalidKeyPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn service(&self) -> &str {
        self.endpoint.name()
    }

    pub fn state(&self) -> &Arc<DispatcherState> {
        &self.state
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }

    pub fn policy(&self) -> InvalidKeyPolicy {
        self.policy
    }

    /// Performs one logical call, trying each credential at most once.
    ///
    /// Returns the parsed JSON body of the first successful attempt.
    #[instrument(
        level = "debug",
        skip(self, params),
        fields(service = %self.endpoint.name(), dispatch.id = %Uuid::new_v4())
    )]
    pub async fn dispatch(
        &self,
        operation: &str,
        params: &Params,
    ) -> std::result::Result<Value, ExhaustedError> {
        if let Err(e) = self.endpoint.validate(operation, params) {
            warn!(error = %e, "Rejected dispatch before any credential was used");
            return Err(ExhaustedError {
                service: self.service().to_string(),
                attempts: 0,
                last: ServiceFailure::new(
                    FailureKind::BadRequest,
                    None,
                    e.to_string(),
                    self.state.current_index(),
                ),
            });
        }

        self.rotate(|index, credential| self.attempt(operation, params, index, credential))
            .await
    }

    /// The rotation loop, generic over the attempt.
    ///
    /// Starts at the current pointer and tries each credential once in order, wrapping. A
    /// failed attempt moves the pointer past its key; success leaves it where it is. Under
    /// `SkipPermanently`, keys disabled by an earlier auth failure are skipped and not counted.
    pub async fn rotate<T, F, Fut>(&self, mut attempt: F) -> std::result::Result<T, ExhaustedError>
    where
        F: FnMut(usize, SecretString) -> Fut,
        Fut: Future<Output = std::result::Result<T, ServiceFailure>>,
    {
        let total = self.credentials.len();
        let start = self.state.current_index();
        let skip_disabled = self.policy == InvalidKeyPolicy::SkipPermanently;
        let mut attempts = 0;
        let mut skipped = false;
        let mut last: Option<ServiceFailure> = None;

        for offset in 0..total {
            let index = (start + offset) % total;
            if skip_disabled && self.state.is_disabled(index) {
                skipped = true;
                continue;
            }
            let Some(credential) = self.credentials.get(index) else {
                continue;
            };

            attempts += 1;
            match attempt(index, credential.clone()).await {
                Ok(value) => {
                    if skipped {
                        self.state.set_current(index);
                    }
                    debug!(
                        service = %self.service(),
                        attempt = attempts,
                        api_key.preview = %self.credentials.preview(index),
                        "Credential attempt succeeded"
                    );
                    return Ok(value);
                }
                Err(failure) => {
                    warn!(
                        service = %self.service(),
                        attempt = attempts,
                        failure.kind = %failure.kind,
                        http.status_code = ?failure.status,
                        api_key.preview = %self.credentials.preview(index),
                        error.message = %failure.message,
                        "Credential attempt failed, rotating to next key"
                    );
                    if skip_disabled && failure.kind == FailureKind::AuthError {
                        self.state.disable(index);
                        info!(
                            service = %self.service(),
                            api_key.preview = %self.credentials.preview(index),
                            "Key disabled after authentication failure"
                        );
                    }
                    self.state.advance_past(index);
                    last = Some(failure);
                }
            }
        }

        let last = last.unwrap_or_else(|| {
            ServiceFailure::new(
                FailureKind::AuthError,
                None,
                "every credential is disabled",
                start,
            )
        });
        warn!(
            service = %self.service(),
            attempts,
            failure.kind = %last.kind,
            "All credentials exhausted"
        );
        Err(ExhaustedError {
            service: self.service().to_string(),
            attempts,
            last,
        })
    }

    /// Tests every credential independently. The rotation pointer is not touched.
    #[instrument(level = "info", skip(self), fields(service = %self.endpoint.name()))]
    pub async fn probe_keys(&self) -> KeyProbeReport {
        let (operation, params) = self.endpoint.probe();

        let probes = self
            .credentials
            .iter()
            .enumerate()
            .map(|(index, credential)| {
                let operation = operation.as_str();
                let params = &params;
                let credential = credential.clone();
                async move {
                    let outcome = self.attempt(operation, params, index, credential).await;
                    KeyProbe {
                        index,
                        preview: self.credentials.preview(index),
                        working: outcome.is_ok(),
                        failure: outcome.err(),
                    }
                }
            });

        let results = join_all(probes).await;
        let working = results.iter().filter(|r| r.working).count();
        let report = KeyProbeReport {
            total: results.len(),
            working,
            failed: results.len() - working,
            results,
        };

        info!(
            total = report.total,
            working = report.working,
            failed = report.failed,
            "Key probe finished"
        );
        report
    }

    async fn attempt(
        &self,
        operation: &str,
        params: &Params,
        index: usize,
        credential: SecretString,
    ) -> std::result::Result<Value, ServiceFailure> {
        let request = self
            .endpoint
            .request(&self.client, operation, params, &credential)
            .map_err(|e| ServiceFailure::new(FailureKind::BadRequest, None, e.to_string(), index))?;

        // Errors are stripped of their URL, which carries the key.
        let response = request
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ServiceFailure::from_transport(&e.without_url(), index))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceFailure::from_transport(&e.without_url(), index))?;

        if !status.is_success() {
            return Err(ServiceFailure::from_response(status, &body, index));
        }

        serde_json::from_str(&body).map_err(|e| {
            ServiceFailure::new(
                FailureKind::Unknown,
                Some(status.as_u16()),
                format!("Upstream body is not valid JSON: {}", e),
                index,
            )
        })
    }
}
