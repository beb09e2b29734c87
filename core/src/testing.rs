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

//! Scripted stand-ins for the analysis service, shared by the unit tests.

use crate::models::{AnalysisResult, ArtistRef, Credential, RankedEntry, TrackRecord};
use crate::service::{AnalysisService, FetchError};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tokio::sync::oneshot;

pub enum Reply {
    Ok(AnalysisResult),
    NotFound,
    Failed(Option<String>),
    Malformed,
    Hang,
}

struct Scripted {
    gate: Option<oneshot::Receiver<()>>,
    reply: Reply,
}

/// A call as seen by the service: (id, bearer token).
pub type Call = (String, Option<String>);

/// Replies once per scripted id. Unscripted ids answer `NotFound`.
#[derive(Default)]
pub struct ScriptedService {
    scripts: Mutex<HashMap<String, Scripted>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedService {
    pub fn reply(&self, id: &str, reply: Reply) {
        self.insert(id, None, reply);
    }

    /// Scripts a reply that is held back until the returned sender fires.
    pub fn reply_after(&self, id: &str, reply: Reply) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.insert(id, Some(rx), reply);
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Yields until `n` calls have reached the service.
    pub async fn wait_for_calls(&self, n: usize) {
        loop {
            let seen = self.calls.lock().unwrap().len();
            if seen >= n {
                break;
            }
            tokio::task::yield_now().await;
        }
    }

    fn insert(&self, id: &str, gate: Option<oneshot::Receiver<()>>, reply: Reply) {
        self.scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), Scripted { gate, reply });
    }

    async fn answer(&self, id: &str, token: Option<String>) -> Result<AnalysisResult, FetchError> {
        self.calls.lock().unwrap().push((id.to_string(), token));
        let scripted = self.scripts.lock().unwrap().remove(id);
        let Some(Scripted { gate, reply }) = scripted else {
            return Err(FetchError::NotFound);
        };

        if let Some(gate) = gate {
            let _ = gate.await;
        }

        match reply {
            Reply::Ok(result) => Ok(result),
            Reply::NotFound => Err(FetchError::NotFound),
            Reply::Failed(message) => Err(FetchError::RequestFailed {
                status: StatusCode::BAD_REQUEST,
                message,
            }),
            Reply::Malformed => Err(serde_json::from_str::<AnalysisResult>("{").unwrap_err().into()),
            Reply::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl AnalysisService for ScriptedService {
    async fn fetch_by_id(&self, analysis_id: &str) -> Result<AnalysisResult, FetchError> {
        self.answer(analysis_id, None).await
    }

    async fn fetch_playlist(
        &self,
        playlist_id: &str,
        credential: Option<&Credential>,
    ) -> Result<AnalysisResult, FetchError> {
        self.answer(playlist_id, credential.map(|c| c.as_str().to_string()))
            .await
    }
}

pub fn sample_result(analysis_id: &str, playlist_name: &str) -> AnalysisResult {
    AnalysisResult {
        playlist_name: playlist_name.to_string(),
        playlist_owner: "sam".to_string(),
        playlist_id: None,
        analysis_id: Some(analysis_id.to_string()),
        analyzed_at: Some("2025-03-14T09:26:53".to_string()),
        total_tracks: 42,
        average_duration_ms: 201_500,
        year_distribution: BTreeMap::from([("2019".to_string(), 40), ("1999".to_string(), 2)]),
        top_genres: vec![RankedEntry("indie rock".to_string(), 12)],
        top_artists: vec![RankedEntry("Wednesday".to_string(), 4)],
        throwback_index: 4.76,
        explicit_energy: 10.0,
        artist_concentration: 21.43,
        freshness_score: 0.0,
        collab_score: 1.12,
        tracks: vec![TrackRecord {
            id: Some("t1".to_string()),
            name: "Chosen to Deserve".to_string(),
            explicit: true,
            artists: vec![ArtistRef {
                name: "Wednesday".to_string(),
            }],
        }],
    }
}
