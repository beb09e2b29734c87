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

use crate::config::{AppConfig, AuthPolicy};
use crate::models::{AnalysisRequest, AnalysisResult, RetrievalState};
use crate::navigation::{HistoryMode, NavigationContext, ANALYSIS_QUERY_PARAM};
use crate::service::{AnalysisService, FetchError};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Everything that can end a submission in `Failed`.
///
/// The `Display` text is exactly what the user is shown.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Enter a playlist URL or ID")]
    InputEmpty,
    #[error("You must log in with Spotify first")]
    Unauthenticated,
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// How a single `submit` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// This submission wrote the final state.
    Committed,
    /// A newer submission started first; nothing was written.
    Superseded,
}

struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

/// Drives fetches and owns the [`RetrievalState`].
///
/// Only the latest submission may write the state. Every `submit` bumps a
/// generation counter and cancels the previous submission's token; a fetch
/// that completes under an older generation is dropped. Both the check and
/// the state write happen under the same lock.
pub struct AnalysisOrchestrator {
    service: Arc<dyn AnalysisService>,
    navigation: Arc<dyn NavigationContext>,
    auth_policy: AuthPolicy,
    request_timeout: Duration,
    state: watch::Sender<RetrievalState>,
    inflight: Mutex<InFlight>,
}

impl AnalysisOrchestrator {
    pub fn new(
        service: Arc<dyn AnalysisService>,
        navigation: Arc<dyn NavigationContext>,
        config: &AppConfig,
    ) -> Self {
        let (state, _) = watch::channel(RetrievalState::Idle);
        Self {
            service,
            navigation,
            auth_policy: config.auth_policy,
            request_timeout: config.request_timeout,
            state,
            inflight: Mutex::new(InFlight {
                generation: 0,
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn state(&self) -> RetrievalState {
        self.state.borrow().clone()
    }

    /// Receives every state transition.
    pub fn subscribe(&self) -> watch::Receiver<RetrievalState> {
        self.state.subscribe()
    }

    /// Analysis id of the result currently displayed, if any.
    pub fn displayed_analysis_id(&self) -> Option<String> {
        self.state
            .borrow()
            .result()
            .and_then(|r| r.shareable_id().map(str::to_string))
    }

    /// Runs one request to completion.
    ///
    /// Never fails: every error ends up as `RetrievalState::Failed`. On success
    /// the analysis id is written to the query string, pushing a history entry
    /// for playlist submissions and replacing the current one for lookups by id.
    pub async fn submit(&self, request: AnalysisRequest) -> SubmitOutcome {
        let guard = self.check(&request);
        let (generation, cancel) = self.begin(guard.is_ok());

        if let Err(err) = guard {
            return self.commit(generation, &request, Err(err));
        }

        info!("Fetching {}", request);
        let outcome = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Fetch for {} superseded before completion", request);
                return SubmitOutcome::Superseded;
            }
            result = tokio::time::timeout(self.request_timeout, self.fetch(&request)) => {
                result.unwrap_or_else(|_| Err(AnalysisError::Timeout(self.request_timeout)))
            }
        };

        self.commit(generation, &request, outcome)
    }

    fn check(&self, request: &AnalysisRequest) -> Result<(), AnalysisError> {
        match request {
            AnalysisRequest::ByPlaylist {
                reference,
                credential,
            } => {
                if reference.trim().is_empty() {
                    return Err(AnalysisError::InputEmpty);
                }
                if credential.is_none() && self.auth_policy == AuthPolicy::Required {
                    return Err(AnalysisError::Unauthenticated);
                }
                Ok(())
            }
            AnalysisRequest::ById { analysis_id } => {
                if analysis_id.trim().is_empty() {
                    return Err(FetchError::NotFound.into());
                }
                Ok(())
            }
        }
    }

    async fn fetch(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        let result = match request {
            AnalysisRequest::ById { analysis_id } => self.service.fetch_by_id(analysis_id).await?,
            AnalysisRequest::ByPlaylist {
                reference,
                credential,
            } => {
                self.service
                    .fetch_playlist(reference, credential.as_ref())
                    .await?
            }
        };
        Ok(result)
    }

    fn lock_inflight(&self) -> MutexGuard<'_, InFlight> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims a new generation and supersedes whatever was in flight.
    fn begin(&self, loading: bool) -> (u64, CancellationToken) {
        let mut inflight = self.lock_inflight();
        inflight.cancel.cancel();
        inflight.generation += 1;
        inflight.cancel = CancellationToken::new();

        if loading {
            // Loading clears the previous result or error.
            self.state.send_replace(RetrievalState::Loading);
        }
        (inflight.generation, inflight.cancel.clone())
    }

    fn commit(
        &self,
        generation: u64,
        request: &AnalysisRequest,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> SubmitOutcome {
        let inflight = self.lock_inflight();
        if inflight.generation != generation {
            debug!(
                "Dropping stale response for {} (generation {} < {})",
                request, generation, inflight.generation
            );
            return SubmitOutcome::Superseded;
        }

        let next = match outcome {
            Ok(result) => {
                info!(
                    "Analysis of '{}' ready ({} tracks)",
                    result.playlist_name, result.total_tracks
                );
                if let Some(id) = result.shareable_id() {
                    let mode = match request {
                        AnalysisRequest::ByPlaylist { .. } => HistoryMode::Push,
                        AnalysisRequest::ById { .. } => HistoryMode::Replace,
                    };
                    self.navigation.replace_query(ANALYSIS_QUERY_PARAM, id, mode);
                }
                RetrievalState::Succeeded(result)
            }
            Err(err) => {
                warn!("Fetching {} failed: {}", request, err);
                RetrievalState::Failed(err.to_string())
            }
        };

        self.state.send_replace(next);
        SubmitOutcome::Committed
    }
}
