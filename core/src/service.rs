/*
    playlist-analyzer | Fetch and present Spotify playlist analyses.
    Copyright (C) 2025  Israel Alberto Roldan Vega

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::models::{AnalysisResult, Credential};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Analysis not found")]
    NotFound,
    #[error("{}", .message.as_deref().unwrap_or("Failed to fetch playlist analysis"))]
    RequestFailed {
        status: StatusCode,
        message: Option<String>,
    },
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Malformed analysis response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid analysis service URL: {0}")]
    InvalidBaseUrl(String),
}

/// The remote service that computes and stores playlist analyses.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Looks up a previously stored analysis.
    async fn fetch_by_id(&self, analysis_id: &str) -> Result<AnalysisResult, FetchError>;

    /// Analyzes a playlist. The result carries a freshly assigned analysis id.
    async fn fetch_playlist(
        &self,
        playlist_id: &str,
        credential: Option<&Credential>,
    ) -> Result<AnalysisResult, FetchError>;
}

/// Error body returned by the service on non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// `reqwest`-backed client for the analysis service.
#[derive(Debug, Clone)]
pub struct HttpAnalysisService {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpAnalysisService {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, FetchError> {
        if base_url.cannot_be_a_base() {
            return Err(FetchError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    /// Maps a transport failure, keeping the service URL out of the message.
    fn transport_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Network(err.without_url())
        }
    }

    /// `{base}/api/{kind}/{id}`, with `id` percent-encoded as one segment.
    fn endpoint(&self, kind: &str, id: &str) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", kind, id]);
        Ok(url)
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    async fn fetch_by_id(&self, analysis_id: &str) -> Result<AnalysisResult, FetchError> {
        let url = self.endpoint("analysis", analysis_id)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !response.status().is_success() {
            debug!("Analysis lookup returned {}", response.status());
            return Err(FetchError::NotFound);
        }

        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn fetch_playlist(
        &self,
        playlist_id: &str,
        credential: Option<&Credential>,
    ) -> Result<AnalysisResult, FetchError> {
        let url = self.endpoint("playlist", playlist_id)?;
        debug!("GET {} (authenticated: {})", url, credential.is_some());

        let mut request = self.client.get(url);
        if let Some(credential) = credential {
            request = request.bearer_auth(credential.as_str());
        }

        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            return Err(FetchError::RequestFailed {
                status,
                message: error_message(&body),
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

/// Pulls the `error` field out of a failure body, if there is one.
fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
}
