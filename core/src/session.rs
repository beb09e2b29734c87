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

use crate::auth::capture_token;
use crate::config::AppConfig;
use crate::deeplink;
use crate::models::{AnalysisRequest, Credential, RetrievalState};
use crate::navigation::NavigationContext;
use crate::orchestrator::{AnalysisOrchestrator, SubmitOutcome};
use crate::resolver::resolve_playlist_reference;
use crate::service::AnalysisService;
use log::info;
use std::sync::Arc;

/// One page session: the captured credential plus the orchestrator.
pub struct Session {
    navigation: Arc<dyn NavigationContext>,
    orchestrator: AnalysisOrchestrator,
    credential: Option<Credential>,
}

impl Session {
    /// Page load.
    ///
    /// The token is captured here, before any submission can happen. Call
    /// [`Session::restore_deep_link`] afterwards to open a shared analysis.
    pub fn new(
        config: &AppConfig,
        navigation: Arc<dyn NavigationContext>,
        service: Arc<dyn AnalysisService>,
    ) -> Self {
        let credential = capture_token(&*navigation);
        if credential.is_none() {
            info!("No access token on this page load; session is anonymous");
        }

        let orchestrator = AnalysisOrchestrator::new(service, navigation.clone(), config);
        Self {
            navigation,
            orchestrator,
            credential,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn orchestrator(&self) -> &AnalysisOrchestrator {
        &self.orchestrator
    }

    pub fn state(&self) -> RetrievalState {
        self.orchestrator.state()
    }

    pub async fn restore_deep_link(&self) -> Option<SubmitOutcome> {
        deeplink::sync_from_query(&*self.navigation, &self.orchestrator).await
    }

    /// Call after the history cursor moved (back/forward).
    pub async fn history_changed(&self) -> Option<SubmitOutcome> {
        deeplink::sync_on_history_change(&*self.navigation, &self.orchestrator).await
    }

    /// Handles the playlist form: a link or a bare id, surrounding spaces allowed.
    pub async fn submit_input(&self, raw: &str) -> SubmitOutcome {
        let input = raw.trim();
        // Blank input goes through as an empty reference and fails as InputEmpty.
        let reference = if input.is_empty() {
            String::new()
        } else {
            resolve_playlist_reference(input)
        };

        let request = AnalysisRequest::by_playlist(reference, self.credential.clone());
        self.orchestrator.submit(request).await
    }
}
