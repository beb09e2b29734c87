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

use std::sync::{Mutex, MutexGuard, PoisonError};
use url::Url;

/// Query parameter that carries a shareable analysis id (`?analysis=<id>`).
pub const ANALYSIS_QUERY_PARAM: &str = "analysis";

/// How a query-string write affects the session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// Add a new history entry so "back" returns to the previous address.
    Push,
    /// Rewrite the current entry in place.
    Replace,
}

/// Access to the page address and session history.
///
/// The orchestration code never touches a global location object; it only
/// talks to this trait. None of these calls reloads the page.
pub trait NavigationContext: Send + Sync {
    /// The fragment without its leading `#`, if any.
    fn read_fragment(&self) -> Option<String>;

    /// Removes the fragment from the visible address without adding a
    /// history entry.
    fn clear_fragment(&self);

    fn read_query(&self, key: &str) -> Option<String>;

    /// Sets `key=value` in the query string, dropping any fragment.
    fn replace_query(&self, key: &str, value: &str, mode: HistoryMode);
}

/// In-memory address bar with a browser-like history stack.
#[derive(Debug)]
pub struct PageNavigation {
    history: Mutex<History>,
}

#[derive(Debug)]
struct History {
    entries: Vec<Url>,
    cursor: usize,
}

impl History {
    fn current(&self) -> &Url {
        &self.entries[self.cursor]
    }

    fn current_mut(&mut self) -> &mut Url {
        &mut self.entries[self.cursor]
    }
}

impl PageNavigation {
    pub fn new(initial: Url) -> Self {
        Self {
            history: Mutex::new(History {
                entries: vec![initial],
                cursor: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, History> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The address currently shown.
    pub fn current(&self) -> Url {
        self.lock().current().clone()
    }

    pub fn history_len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Moves one entry back. Returns the new address, or `None` at the start.
    pub fn back(&self) -> Option<Url> {
        let mut history = self.lock();
        if history.cursor == 0 {
            return None;
        }
        history.cursor -= 1;
        Some(history.current().clone())
    }

    /// Moves one entry forward. Returns the new address, or `None` at the end.
    pub fn forward(&self) -> Option<Url> {
        let mut history = self.lock();
        if history.cursor + 1 >= history.entries.len() {
            return None;
        }
        history.cursor += 1;
        Some(history.current().clone())
    }
}

impl NavigationContext for PageNavigation {
    fn read_fragment(&self) -> Option<String> {
        self.lock()
            .current()
            .fragment()
            .filter(|f| !f.is_empty())
            .map(str::to_string)
    }

    fn clear_fragment(&self) {
        self.lock().current_mut().set_fragment(None);
    }

    fn read_query(&self, key: &str) -> Option<String> {
        self.lock()
            .current()
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn replace_query(&self, key: &str, value: &str, mode: HistoryMode) {
        let mut history = self.lock();

        let mut next = history.current().clone();
        let kept: Vec<(String, String)> = next
            .query_pairs()
            .filter(|(k, _)| k != key)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        next.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair(key, value);
        next.set_fragment(None);

        match mode {
            HistoryMode::Replace => *history.current_mut() = next,
            HistoryMode::Push => {
                let cursor = history.cursor;
                history.entries.truncate(cursor + 1);
                history.entries.push(next);
                history.cursor += 1;
            }
        }
    }
}
