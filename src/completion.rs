//! Tab completion.
//!
//! The completer is asked for successive candidates via `(line, index)`
//! until it returns `None`; both a blocking and an async shape are
//! supported so `Editor` and `AsyncEditor` can drive the same protocol.

use async_trait::async_trait;

/// Synchronous completer: `complete(line, index)` returns the `index`-th
/// suggestion for `line`, or `None` to end enumeration.
pub trait Completer: Send {
    fn complete(&mut self, line: &str, index: usize) -> Option<String>;
}

impl<F> Completer for F
where
    F: FnMut(&str, usize) -> Option<String> + Send,
{
    fn complete(&mut self, line: &str, index: usize) -> Option<String> {
        self(line, index)
    }
}

/// Cooperative-mode completer: same protocol, but each lookup may suspend.
#[async_trait]
pub trait AsyncCompleter: Send {
    async fn complete(&mut self, line: &str, index: usize) -> Option<String>;
}

/// Tracks what the last TAB press produced, so a second TAB with an
/// unchanged buffer can be recognized as the double-tab bell convention
/// instead of re-running the completer.
#[derive(Debug, Default, Clone)]
pub struct LastCompletion {
    line: Option<String>,
    candidates: Option<Vec<String>>,
}

impl LastCompletion {
    pub fn clear(&mut self) {
        self.line = None;
        self.candidates = None;
    }

    pub fn is_repeat(&self, line: &str, candidates: &[String]) -> bool {
        self.line.as_deref() == Some(line) && self.candidates.as_deref() == Some(candidates)
    }

    pub fn record(&mut self, line: &str, candidates: Vec<String>) {
        self.line = Some(line.to_string());
        self.candidates = Some(candidates);
    }
}

/// Drains a synchronous `Completer` for every candidate of `line`, in the
/// `(line, 0), (line, 1), …` protocol order, stopping at the first `None`.
pub fn collect_sync(completer: &mut dyn Completer, line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut index = 0;
    while let Some(candidate) = completer.complete(line, index) {
        out.push(candidate);
        index += 1;
    }
    out
}

pub async fn collect_async(completer: &mut dyn AsyncCompleter, line: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut index = 0;
    while let Some(candidate) = completer.complete(line, index).await {
        out.push(candidate);
        index += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Prefix(&'static [&'static str]);

    impl Completer for Prefix {
        fn complete(&mut self, line: &str, index: usize) -> Option<String> {
            self.0
                .iter()
                .filter(|c| c.starts_with(line))
                .nth(index)
                .map(|s| s.to_string())
        }
    }

    #[test]
    fn collects_all_matches_in_order() {
        let mut c = Prefix(&["help", "history", "hello"]);
        let out = collect_sync(&mut c, "h");
        assert_eq!(out, vec!["help", "history", "hello"]);
    }

    #[test]
    fn empty_set_when_nothing_matches() {
        let mut c = Prefix(&["help", "history"]);
        let out = collect_sync(&mut c, "z");
        assert!(out.is_empty());
    }

    #[test]
    fn last_completion_repeat_detection() {
        let mut last = LastCompletion::default();
        let candidates = vec!["help".to_string(), "history".to_string()];
        assert!(!last.is_repeat("h", &candidates));
        last.record("h", candidates.clone());
        assert!(last.is_repeat("h", &candidates));
        assert!(!last.is_repeat("he", &candidates));
    }
}
