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

pub mod auth;
pub mod config;
pub mod deeplink;
pub mod models;
pub mod navigation;
pub mod orchestrator;
pub mod resolver;
pub mod service;
pub mod session;

#[cfg(test)]
mod testing;

// Re-export key items for convenience
pub use auth::{capture_token, login_url_from_env};
pub use config::{AppConfig, AuthPolicy, Mode};
pub use models::{AnalysisRequest, AnalysisResult, Credential, RetrievalState};
pub use navigation::{HistoryMode, NavigationContext, PageNavigation};
pub use orchestrator::{AnalysisOrchestrator, SubmitOutcome};
pub use resolver::resolve_playlist_reference;
pub use service::{AnalysisService, HttpAnalysisService};
pub use session::Session;
pub use url::Url;
