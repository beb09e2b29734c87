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

use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const DEVELOPMENT_API_BASE: &str = "http://localhost:5000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown ANALYZER_MODE '{0}' (expected 'development' or 'production')")]
    UnknownMode(String),
    #[error("Invalid API base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Deployment mode. Decides where the analysis service lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Service runs separately on localhost.
    Development,
    /// Service is served from the same origin as the page.
    Production,
}

impl Mode {
    /// Mode implied by the build profile.
    pub fn from_build() -> Self {
        if cfg!(debug_assertions) {
            Mode::Development
        } else {
            Mode::Production
        }
    }

    pub fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            _ => Err(ConfigError::UnknownMode(value.to_string())),
        }
    }
}

/// Whether playlist submissions need a captured credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// Playlist fetches fail fast without a credential.
    Required,
    /// Playlist fetches go out anonymously when no credential is held.
    Optional,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mode: Mode,
    pub api_base: Url,
    pub auth_policy: AuthPolicy,
    pub request_timeout: Duration,
}

impl AppConfig {
    /// Configuration for `mode`, where `origin` is the page's own origin.
    pub fn for_mode(mode: Mode, origin: &Url) -> Result<Self, ConfigError> {
        let api_base = match mode {
            Mode::Development => Url::parse(DEVELOPMENT_API_BASE)?,
            Mode::Production => Url::parse(&origin.origin().ascii_serialization())?,
        };

        Ok(Self {
            mode,
            api_base,
            auth_policy: AuthPolicy::Required,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Reads `ANALYZER_MODE`, falling back to the build profile.
    pub fn from_env(origin: &Url) -> Result<Self, ConfigError> {
        let mode = match env::var("ANALYZER_MODE") {
            Ok(value) => Mode::parse(&value)?,
            Err(_) => Mode::from_build(),
        };
        Self::for_mode(mode, origin)
    }
}
