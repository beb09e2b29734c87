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

use crate::models::Credential;
use crate::navigation::NavigationContext;
use log::{debug, info};
use rspotify::{scopes, Credentials, OAuth};
use thiserror::Error;
use url::Url;

pub const AUTHORIZE_ENDPOINT: &str = "https://accounts.spotify.com/authorize";

const ACCESS_TOKEN_PARAM: &str = "access_token";

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to initialize Spotify login: {0}")]
    ClientConfig(String),
    #[error("Invalid authorization endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
}

/// Builds the implicit-grant authorization URL.
///
/// The provider redirects back to `oauth.redirect_uri` with the token in the
/// fragment (`#access_token=...&token_type=Bearer&expires_in=3600`), which
/// [`capture_token`] picks up on the next page load. Scopes are sorted so the
/// URL is stable.
pub fn implicit_grant_url(creds: &Credentials, oauth: &OAuth) -> Result<Url, AuthError> {
    let mut scopes: Vec<&str> = oauth.scopes.iter().map(String::as_str).collect();
    scopes.sort_unstable();
    let scope = scopes.join(" ");

    let url = Url::parse_with_params(
        AUTHORIZE_ENDPOINT,
        &[
            ("client_id", creds.id.as_str()),
            ("redirect_uri", oauth.redirect_uri.as_str()),
            ("scope", scope.as_str()),
            ("response_type", "token"),
        ],
    )?;
    Ok(url)
}

/// Builds the login URL from the environment.
///
/// Reads `RSPOTIFY_CLIENT_ID` and `RSPOTIFY_REDIRECT_URI` (a `.env` file is
/// honoured). The implicit grant never sends a client secret, so
/// `RSPOTIFY_CLIENT_SECRET` is not required.
pub fn login_url_from_env() -> Result<Url, AuthError> {
    let creds = Credentials::from_env()
        .ok_or_else(|| AuthError::ClientConfig("Missing RSPOTIFY_CLIENT_ID".to_string()))?;

    // playlist-read-private: the service reads the playlist on the user's behalf.
    let oauth = OAuth::from_env(scopes!("playlist-read-private"))
        .ok_or_else(|| AuthError::ClientConfig("Missing RSPOTIFY_REDIRECT_URI".to_string()))?;

    implicit_grant_url(&creds, &oauth)
}

/// Extracts the access token delivered in the page fragment.
///
/// Meant to run exactly once, on page load. When a token is found the fragment
/// is removed from the visible address in place (no reload, no new history
/// entry). A missing token is not an error: the session simply stays
/// anonymous.
pub fn capture_token(navigation: &dyn NavigationContext) -> Option<Credential> {
    let fragment = navigation.read_fragment()?;

    let token = url::form_urlencoded::parse(fragment.as_bytes())
        .find(|(key, _)| key == ACCESS_TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty());

    match token {
        Some(token) => {
            navigation.clear_fragment();
            info!("Captured access token from redirect");
            Some(Credential::new(token))
        }
        None => {
            debug!("Fragment present but carries no access token");
            None
        }
    }
}
