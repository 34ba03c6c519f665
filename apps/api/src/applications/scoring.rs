//! Client for the external scoring engine.
//!
//! The engine parses a resume file and rates it against a requirement list.
//! `ScoringEngine` is the seam; `HttpScoringEngine` is the production backend
//! and tests substitute stubs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::application::ScoreResult;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    /// Absolute path readable by the engine.
    pub file_path: String,
    pub requirements: Vec<String>,
}

#[derive(Debug, Clone, Error)]
pub enum ScoringError {
    #[error("scoring engine timed out after {0:?}")]
    Timeout(Duration),

    #[error("scoring engine unreachable: {0}")]
    Unreachable(String),

    #[error("scoring engine returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("scoring engine sent an invalid response: {0}")]
    InvalidResponse(String),

    #[error("resume file unavailable: {0}")]
    Input(String),
}

#[derive(Debug, Deserialize)]
struct EngineError {
    error: String,
}

impl ScoringError {
    /// HTTP status reported by the engine, when it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ScoringError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScoringError::Timeout(_) | ScoringError::Unreachable(_) => true,
            ScoringError::Status { status, .. } => *status == 429 || *status >= 500,
            ScoringError::InvalidResponse(_) | ScoringError::Input(_) => false,
        }
    }
}

#[async_trait]
pub trait ScoringEngine: Send + Sync {
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResult, ScoringError>;
}

/// `POST {base_url}/parse` with `{filePath, requirements}`.
#[derive(Clone)]
pub struct HttpScoringEngine {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpScoringEngine {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            endpoint: format!("{}/parse", base_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify(&self, e: reqwest::Error) -> ScoringError {
        if e.is_timeout() {
            ScoringError::Timeout(self.timeout)
        } else if e.is_decode() {
            ScoringError::InvalidResponse(e.to_string())
        } else {
            ScoringError::Unreachable(e.to_string())
        }
    }
}

#[async_trait]
impl ScoringEngine for HttpScoringEngine {
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreResult, ScoringError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<EngineError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(ScoringError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let result: ScoreResult = response.json().await.map_err(|e| self.classify(e))?;
        debug!(
            "Scored {}: {} ({})",
            request.file_path,
            result.score,
            result.classification.as_str()
        );
        Ok(result)
    }
}
