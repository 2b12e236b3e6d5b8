use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::SearchSettings;

use super::model::{RawResult, Track};

/// Failures surfaced by a catalog search. Callers report these and keep
/// the session untouched.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("catalog returned HTTP {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Deserialize)]
pub(super) struct SearchResponse {
    #[serde(default)]
    pub results: Vec<RawResult>,
}

/// Async client for the remote track catalog.
pub struct CatalogClient {
    http: reqwest::Client,
    endpoint: String,
    max_results: usize,
}

impl CatalogClient {
    pub fn new(settings: &SearchSettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            http,
            endpoint: settings.endpoint.clone(),
            max_results: settings.max_results,
        }
    }

    /// Run a search and return playable tracks in catalog order,
    /// dropping entries without an id and capping at `max_results`.
    pub async fn search(&self, query: &str) -> Result<Vec<Track>, CatalogError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("q", query)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status()));
        }
        let decoded: SearchResponse = response.json().await?;
        let tracks: Vec<Track> = decoded
            .results
            .into_iter()
            .filter_map(RawResult::into_track)
            .take(self.max_results)
            .collect();
        debug!(query, count = tracks.len(), "catalog search finished");
        Ok(tracks)
    }
}
