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

use crate::models::AnalysisRequest;
use crate::navigation::{NavigationContext, ANALYSIS_QUERY_PARAM};
use crate::orchestrator::{AnalysisOrchestrator, SubmitOutcome};
use log::{debug, info};

/// The analysis id carried by the current address, ignoring blank values.
pub fn deep_link_id(navigation: &dyn NavigationContext) -> Option<String> {
    navigation
        .read_query(ANALYSIS_QUERY_PARAM)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Page-load hook: if the address names an analysis, fetch it by id.
///
/// Shared links must work for anyone, so no credential is involved.
/// Returns `None` when there was nothing to fetch.
pub async fn sync_from_query(
    navigation: &dyn NavigationContext,
    orchestrator: &AnalysisOrchestrator,
) -> Option<SubmitOutcome> {
    let analysis_id = deep_link_id(navigation)?;
    info!("Opening shared analysis {}", analysis_id);
    Some(orchestrator.submit(AnalysisRequest::by_id(analysis_id)).await)
}

/// History-navigation hook (back/forward).
///
/// Fetches the analysis named by the new address unless it is the one already
/// on screen. An address without an analysis id leaves the state as it is.
pub async fn sync_on_history_change(
    navigation: &dyn NavigationContext,
    orchestrator: &AnalysisOrchestrator,
) -> Option<SubmitOutcome> {
    let analysis_id = deep_link_id(navigation)?;
    if orchestrator.displayed_analysis_id().as_deref() == Some(analysis_id.as_str()) {
        debug!("Analysis {} already displayed", analysis_id);
        return None;
    }
    Some(orchestrator.submit(AnalysisRequest::by_id(analysis_id)).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, Mode};
    use crate::navigation::PageNavigation;
    use crate::testing::{sample_result, Reply, ScriptedService};
    use std::sync::Arc;
    use url::Url;

    fn setup(address: &str) -> (Arc<ScriptedService>, Arc<PageNavigation>, AnalysisOrchestrator) {
        let service = Arc::new(ScriptedService::default());
        let navigation = Arc::new(PageNavigation::new(Url::parse(address).unwrap()));
        let config = AppConfig::for_mode(Mode::Development, &navigation.current()).unwrap();
        let orchestrator = AnalysisOrchestrator::new(service.clone(), navigation.clone(), &config);
        (service, navigation, orchestrator)
    }

    #[tokio::test]
    async fn test_deep_link_fetches_by_id_without_credential() {
        let (service, navigation, orchestrator) = setup("http://localhost:5173/?analysis=abc123");
        service.reply("abc123", Reply::Ok(sample_result("abc123", "Road Trip")));

        let outcome = sync_from_query(&*navigation, &orchestrator).await;

        assert_eq!(outcome, Some(SubmitOutcome::Committed));
        assert_eq!(service.calls(), vec![("abc123".to_string(), None)]);
        assert_eq!(orchestrator.state().result().unwrap().playlist_name, "Road Trip");
        assert_eq!(navigation.history_len(), 1);
    }

    #[tokio::test]
    async fn test_deep_link_not_found() {
        let (service, navigation, orchestrator) = setup("http://localhost:5173/?analysis=abc123");
        service.reply("abc123", Reply::NotFound);

        sync_from_query(&*navigation, &orchestrator).await;

        let state = orchestrator.state();
        assert!(state.error().unwrap().to_lowercase().contains("not found"));
    }

    #[tokio::test]
    async fn test_blank_or_missing_parameter_does_nothing() {
        for address in [
            "http://localhost:5173/",
            "http://localhost:5173/?analysis=",
            "http://localhost:5173/?analysis=%20",
        ] {
            let (service, navigation, orchestrator) = setup(address);

            assert_eq!(sync_from_query(&*navigation, &orchestrator).await, None);
            assert!(service.calls().is_empty());
            assert_eq!(orchestrator.state(), crate::models::RetrievalState::Idle);
        }
    }

    #[tokio::test]
    async fn test_history_change_to_displayed_analysis_is_ignored() {
        let (service, navigation, orchestrator) = setup("http://localhost:5173/?analysis=A1");
        service.reply("A1", Reply::Ok(sample_result("A1", "Road Trip")));
        sync_from_query(&*navigation, &orchestrator).await;

        assert_eq!(sync_on_history_change(&*navigation, &orchestrator).await, None);
        assert_eq!(service.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_history_change_to_other_analysis_refetches() {
        let (service, navigation, orchestrator) = setup("http://localhost:5173/?analysis=A1");
        service.reply("A1", Reply::Ok(sample_result("A1", "First")));
        service.reply("A2", Reply::Ok(sample_result("A2", "Second")));
        sync_from_query(&*navigation, &orchestrator).await;

        navigation.replace_query(ANALYSIS_QUERY_PARAM, "A2", crate::navigation::HistoryMode::Push);
        let outcome = sync_on_history_change(&*navigation, &orchestrator).await;

        assert_eq!(outcome, Some(SubmitOutcome::Committed));
        assert_eq!(orchestrator.state().result().unwrap().playlist_name, "Second");
    }
}
