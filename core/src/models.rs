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

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Bearer token captured from the identity provider's redirect.
///
/// Lives only in memory for the duration of a session. The `Debug` output is
/// redacted so the token never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

/// A single track as listed in an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    // Local files have no Spotify id.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub explicit: bool,
    #[serde(default)]
    pub artists: Vec<ArtistRef>,
}

impl TrackRecord {
    pub fn artist_names(&self) -> String {
        if self.artists.is_empty() {
            return "Unknown".to_string();
        }
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<&str>>()
            .join(", ")
    }
}

impl fmt::Display for TrackRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let explicit = if self.explicit { " [E]" } else { "" };
        write!(f, "{}{} by {}", self.name, explicit, self.artist_names())
    }
}

/// One `[name, count]` pair of a ranked list (top genres, top artists).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry(pub String, pub u64);

impl RankedEntry {
    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn count(&self) -> u64 {
        self.1
    }
}

/// Precomputed analysis returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub playlist_name: String,
    pub playlist_owner: String,
    #[serde(default)]
    pub playlist_id: Option<String>,
    #[serde(default)]
    pub analysis_id: Option<String>,
    #[serde(default)]
    pub analyzed_at: Option<String>,

    pub total_tracks: u32,
    #[serde(default)]
    pub average_duration_ms: u64,
    #[serde(default)]
    pub year_distribution: BTreeMap<String, u32>,
    #[serde(default)]
    pub top_genres: Vec<RankedEntry>,
    #[serde(default)]
    pub top_artists: Vec<RankedEntry>,

    #[serde(default)]
    pub throwback_index: f64,
    #[serde(default)]
    pub explicit_energy: f64,
    #[serde(default)]
    pub artist_concentration: f64,
    #[serde(default)]
    pub freshness_score: f64,
    #[serde(default)]
    pub collab_score: f64,

    #[serde(default)]
    pub tracks: Vec<TrackRecord>,
}

impl AnalysisResult {
    /// The analysis id, ignoring an empty string sent by the service.
    pub fn shareable_id(&self) -> Option<&str> {
        self.analysis_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Parses `analyzed_at` into local wall-clock time.
    ///
    /// The service emits either an RFC 3339 timestamp or a naive ISO-8601 one
    /// (already in the server's local time).
    pub fn analyzed_at_local(&self) -> Option<NaiveDateTime> {
        let raw = self.analyzed_at.as_deref()?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Local).naive_local());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }

    pub fn average_duration(&self) -> String {
        format_duration(self.average_duration_ms)
    }
}

/// Formats milliseconds as `m:ss`.
pub fn format_duration(ms: u64) -> String {
    let min = ms / 60_000;
    let sec = (ms % 60_000) / 1_000;
    format!("{}:{:02}", min, sec)
}

/// What to fetch. Exactly one variant per submission.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisRequest {
    ByPlaylist {
        reference: String,
        credential: Option<Credential>,
    },
    ById {
        analysis_id: String,
    },
}

impl AnalysisRequest {
    pub fn by_playlist(reference: impl Into<String>, credential: Option<Credential>) -> Self {
        AnalysisRequest::ByPlaylist {
            reference: reference.into(),
            credential,
        }
    }

    pub fn by_id(analysis_id: impl Into<String>) -> Self {
        AnalysisRequest::ById {
            analysis_id: analysis_id.into(),
        }
    }
}

impl fmt::Display for AnalysisRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisRequest::ByPlaylist { reference, .. } => write!(f, "playlist {}", reference),
            AnalysisRequest::ById { analysis_id } => write!(f, "analysis {}", analysis_id),
        }
    }
}

/// The single source of truth for what the user is looking at.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RetrievalState {
    #[default]
    Idle,
    Loading,
    Succeeded(AnalysisResult),
    Failed(String),
}

impl RetrievalState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RetrievalState::Loading)
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        match self {
            RetrievalState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RetrievalState::Failed(message) => Some(message),
            _ => None,
        }
    }
}
