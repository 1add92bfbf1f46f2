//! Reverse-incremental search sub-mode, entered by Ctrl-R.
//!
//! The query is always matched as a literal substring — never a regex.

use crate::history::History;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Back,
    Forward,
}

impl Direction {
    fn delta(self) -> i64 {
        match self {
            Direction::Back => -1,
            Direction::Forward => 1,
        }
    }
}

/// All the state a single Ctrl-R session carries. Dropped (not reused)
/// once the sub-mode is exited, committed or cancelled.
pub struct ReverseSearchState {
    saved_buffer: String,
    query: String,
    scan_index: i64,
    direction: Direction,
    match_offsets: Vec<usize>,
    active: usize,
    failed: bool,
}

impl ReverseSearchState {
    /// `saved_buffer` and `query` both start out as the live line at the
    /// moment Ctrl-R was pressed; `history_len` seeds `scan_index` one past
    /// the newest entry so the first step walks backward into it.
    pub fn start(saved_buffer: String, history_len: usize) -> Self {
        let query = saved_buffer.clone();
        ReverseSearchState {
            saved_buffer,
            query,
            scan_index: history_len as i64,
            direction: Direction::Back,
            match_offsets: Vec::new(),
            active: 0,
            failed: true,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn saved_buffer(&self) -> &str {
        &self.saved_buffer
    }

    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn scan_index(&self) -> i64 {
        self.scan_index
    }

    pub fn match_offsets(&self) -> &[usize] {
        &self.match_offsets
    }

    /// The offset within the candidate line where the caret should park, or
    /// `None` when there is no current match.
    pub fn active_offset(&self) -> Option<usize> {
        if self.failed || self.match_offsets.is_empty() {
            None
        } else {
            self.match_offsets.get(self.active).copied()
        }
    }

    /// The line currently displayed in the `(reverse-i-search)` banner:
    /// the matched history entry, or the raw query when nothing matches.
    pub fn candidate<'a>(&self, history: &'a History) -> Option<&'a str> {
        if self.scan_index < 0 {
            return None;
        }
        history.at(self.scan_index as usize)
    }

    fn offsets_of(query: &str, haystack: &str) -> Vec<usize> {
        if query.is_empty() {
            return Vec::new();
        }
        haystack.match_indices(query).map(|(i, _)| i).collect()
    }

    /// Runs one iteration of the search-step algorithm, honoring
    /// `direction`. Call after every Ctrl-R/Ctrl-S press.
    pub fn step(&mut self, direction: Direction, history: &History) {
        self.direction = direction;
        if self.query.is_empty() {
            self.failed = true;
            self.match_offsets.clear();
            return;
        }

        if !self.match_offsets.is_empty() {
            let delta = direction.delta();
            let next = self.active as i64 + delta;
            if next >= 0 && (next as usize) < self.match_offsets.len() {
                self.active = next as usize;
                return;
            }
            // Exhausted this candidate's matches: drop it and keep scanning.
            self.match_offsets.clear();
        }

        loop {
            self.scan_index += direction.delta();
            if self.scan_index < 0 || self.scan_index >= history.len() as i64 {
                self.failed = true;
                self.match_offsets.clear();
                return;
            }
            let line = history.at(self.scan_index as usize).unwrap_or("");
            let offsets = Self::offsets_of(&self.query, line);
            if !offsets.is_empty() {
                self.active = match direction {
                    Direction::Forward => 0,
                    Direction::Back => offsets.len() - 1,
                };
                self.match_offsets = offsets;
                self.failed = false;
                return;
            }
        }
    }

    /// Resets scan state and re-searches from the top of history, used
    /// whenever the query text itself changes.
    fn rescan(&mut self, history: &History) {
        self.scan_index = history.len() as i64;
        self.match_offsets.clear();
        self.failed = true;
        self.step(self.direction, history);
    }

    /// Appends a printable character to the query and re-searches.
    pub fn push_char(&mut self, ch: char, history: &History) {
        self.query.push(ch);
        self.rescan(history);
    }

    /// Removes the last query character, if any, and re-searches.
    /// Returns `true` if there was nothing to remove (bell).
    pub fn pop_char(&mut self, history: &History) -> bool {
        if self.query.pop().is_none() {
            return true;
        }
        self.rescan(history);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history() -> History {
        let mut h = History::new(100);
        h.push("echo one");
        h.push("echo two");
        h
    }

    #[test]
    fn finds_substring_walking_backward() {
        let h = sample_history();
        let mut s = ReverseSearchState::start(String::new(), h.len());
        s.push_char('t', &h);
        assert!(!s.failed());
        assert_eq!(s.candidate(&h), Some("echo two"));
        s.push_char('w', &h);
        assert!(!s.failed());
        assert_eq!(s.candidate(&h), Some("echo two"));
    }

    #[test]
    fn no_match_sets_failed() {
        let h = sample_history();
        let mut s = ReverseSearchState::start(String::new(), h.len());
        s.push_char('z', &h);
        assert!(s.failed());
    }

    #[test]
    fn match_offsets_soundness() {
        let h = sample_history();
        let mut s = ReverseSearchState::start(String::new(), h.len());
        s.push_char('o', &h);
        if !s.failed() {
            let candidate = s.candidate(&h).unwrap();
            let expected: Vec<usize> = candidate.match_indices('o').map(|(i, _)| i).collect();
            assert_eq!(s.match_offsets(), expected.as_slice());
            assert!(s
                .active_offset()
                .map(|o| expected.contains(&o))
                .unwrap_or(false));
        }
    }

    #[test]
    fn empty_query_never_matches() {
        let h = sample_history();
        let s = ReverseSearchState::start(String::new(), h.len());
        assert!(s.failed());
        assert!(s.match_offsets().is_empty());
    }
}
