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

use url::Url;

const PLAYLIST_PATH_PREFIX: &str = "/playlist/";

/// Turns user input into a playlist identifier.
///
/// Accepts either a playlist link (`https://open.spotify.com/playlist/<id>?si=...`)
/// or a bare id. Anything that is not an absolute URL, or is a URL without a
/// `/playlist/` path, is returned as-is and treated as an opaque id.
///
/// Callers are expected to trim and reject empty input first.
pub fn resolve_playlist_reference(input: &str) -> String {
    let url = match Url::parse(input) {
        Ok(url) => url,
        Err(_) => return input.to_string(),
    };

    let Some(rest) = url.path().strip_prefix(PLAYLIST_PATH_PREFIX) else {
        return input.to_string();
    };

    // The path is still percent-encoded; the service expects the plain id.
    let segment = rest.split('/').next().unwrap_or_default();
    match urlencoding::decode(segment) {
        Ok(id) => id.into_owned(),
        Err(_) => input.to_string(),
    }
}
