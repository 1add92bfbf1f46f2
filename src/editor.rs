//! Top-level key-dispatch state machine and its two façades:
//! `Editor` (synchronous) and `AsyncEditor` (cooperative, tokio-driven).
//!
//! Both share `EditorCore` for everything that isn't "how do I get the
//! next key" or "how do I ask the completer" — history, bindings, the
//! reverse-search sub-mode, and the bell all live there untouched by
//! either concurrency mode.

use std::time::{Duration, Instant};

use crate::bindings::{KeyBindings, Operation};
use crate::buffer::EditBuffer;
use crate::completion::{collect_sync, AsyncCompleter, Completer, LastCompletion};
use crate::error::{ReadlineError, Result};
use crate::history::History;
use crate::key::SemanticKey;
use crate::key_reader::{AsyncKeyReader, InterruptFlag, KeyReader};
use crate::raw::{default_source, DefaultRawSource, RawModeGuard, RawSource};
use crate::search::{Direction, ReverseSearchState};
use crate::terminal::{StdTerminal, Terminal};

const DEFAULT_BELL_SILENCE: Duration = Duration::from_secs(2);

/// Rings at most once per `silence` and never while `suppress` is set
///. Shared, not duplicated, between the two façades.
struct Bell {
    enabled: bool,
    silence: Duration,
    last: Option<Instant>,
    suppress: bool,
}

impl Bell {
    fn new() -> Self {
        Bell {
            enabled: true,
            silence: DEFAULT_BELL_SILENCE,
            last: None,
            suppress: false,
        }
    }

    fn ring(&mut self, term: &mut dyn Terminal) {
        if self.suppress || !self.enabled {
            return;
        }
        let now = Instant::now();
        if let Some(last) = self.last {
            if now.duration_since(last) < self.silence {
                return;
            }
        }
        self.last = Some(now);
        if let Err(e) = term.bell() {
            log::warn!("bell write failed: {e}");
        }
        let _ = term.flush();
    }

    /// `toggle-bell` writes its feedback unconditionally, bypassing both
    /// the rate limit and `enabled` (it's what flips that flag).
    fn toggle(&mut self, term: &mut dyn Terminal) {
        self.enabled = !self.enabled;
        let _ = term.bell();
        if self.enabled {
            let _ = term.bell();
        }
        let _ = term.flush();
    }
}

/// Long-lived state that outlives any single `readline`/`input` call.
pub struct EditorCore {
    bindings: KeyBindings,
    history: History,
    bell: Bell,
    last_completion: LastCompletion,
    completer: Option<Box<dyn Completer>>,
    async_completer: Option<Box<dyn AsyncCompleter>>,
    current_line: String,
    pending_insert: Option<String>,
}

impl EditorCore {
    pub fn new(history_size: usize) -> Self {
        EditorCore {
            bindings: KeyBindings::with_defaults(),
            history: History::new(history_size),
            bell: Bell::new(),
            last_completion: LastCompletion::default(),
            completer: None,
            async_completer: None,
            current_line: String::new(),
            pending_insert: None,
        }
    }

    /// The live buffer text as of the most recently dispatched key.
    pub fn get_line_buffer(&self) -> &str {
        &self.current_line
    }

    pub fn set_completer(&mut self, completer: impl Completer + 'static) {
        self.completer = Some(Box::new(completer));
    }

    pub fn set_async_completer(&mut self, completer: impl AsyncCompleter + 'static) {
        self.async_completer = Some(Box::new(completer));
    }

    pub fn parse_and_bind(&mut self, binding: &str) {
        self.bindings.parse_and_bind(binding);
    }

    pub fn set_history_size(&mut self, n: usize) {
        self.history.set_max_size(n);
    }

    pub fn set_prepare_history_entry(&mut self, f: impl Fn(&str) -> String + Send + 'static) {
        self.history.set_normalizer(f);
    }

    pub fn enable_bell(&mut self, enable: bool) {
        self.bell.enabled = enable;
    }

    pub fn set_bell_silence_time(&mut self, seconds: f64) {
        self.bell.silence = Duration::from_secs_f64(seconds.max(0.0));
    }
}

/// Ephemeral state that exists only for the duration of one call to
/// `readline`/`input`.
struct Call {
    buffer: EditBuffer,
    bare: bool,
    search: Option<ReverseSearchState>,
    prompt: String,
}

impl Call {
    fn new(bare: bool) -> Self {
        Call {
            buffer: EditBuffer::new(),
            bare,
            search: None,
            prompt: String::new(),
        }
    }
}

/// Outcome of dispatching one key through the normal-mode binding table.
enum Outcome {
    Continue,
    Committed(String),
}

fn print_prompt(prompt: &str, term: &mut dyn Terminal) -> std::io::Result<()> {
    let translated = prompt.replace('\n', "\r\n");
    term.write_raw(&translated)?;
    term.flush()
}

fn search_banner(search: &ReverseSearchState, history: &History) -> (String, usize) {
    let candidate = search.candidate(history).unwrap_or_else(|| search.query());
    let banner = format!(
        "({}reverse-i-search`{}'): {}",
        if search.failed() { "failed " } else { "" },
        search.query(),
        candidate
    );
    let tail = search
        .active_offset()
        .map(|off| candidate.chars().count().saturating_sub(off))
        .unwrap_or(0);
    (banner, tail)
}

/// Renders the `(reverse-i-search)` banner and parks the cursor at the
/// active match offset, or at the end of the query when there is none.
fn render_search(search: &ReverseSearchState, history: &History, term: &mut dyn Terminal) {
    let (banner, tail) = search_banner(search, history);
    let _ = term.write_raw(&banner);
    let _ = term.backspace(tail);
    let _ = term.flush();
}

/// Erases whatever `render_search` last painted, ahead of a repaint or an
/// exit from the sub-mode.
fn erase_search_banner(search: &ReverseSearchState, history: &History, term: &mut dyn Terminal) {
    let (banner, tail) = search_banner(search, history);
    let len = banner.chars().count();
    let _ = term.spaces(len - tail);
    let _ = term.spaces(len);
    let _ = term.backspace(len);
    let _ = term.flush();
}

/// Dispatches one key while the reverse-search sub-mode is active.
/// Returns `Some(op)` when the sub-mode is exited via a key that would
/// also mean something in the normal table, so the caller can re-dispatch
/// it through that table.
fn handle_lookup_key(
    core: &mut EditorCore,
    call: &mut Call,
    key: SemanticKey,
    term: &mut dyn Terminal,
) -> Option<Operation> {
    let search = call.search.as_mut().expect("lookup mode active");
    let op = core.bindings.lookup_op(key);

    erase_search_banner(search, &core.history, term);

    match op {
        Some(Operation::CancelLookupResult) => {
            let saved = search.saved_buffer().to_string();
            call.buffer.set(&saved);
            core.history.set_cursor(core.history.len());
            call.search = None;
            let _ = term.write_raw(&call.buffer.text());
            let _ = term.flush();
            None
        }
        Some(Operation::ForwardLookupResult) => {
            let candidate = search
                .candidate(&core.history)
                .unwrap_or_else(|| search.query())
                .to_string();
            let scan_index = search.scan_index();
            call.buffer.set(&candidate);
            if scan_index >= 0 {
                core.history.set_cursor(scan_index as usize);
            }
            call.search = None;
            let _ = term.write_raw(&call.buffer.text());
            let _ = term.flush();
            Some(core.bindings.normal_op(key))
        }
        Some(Operation::LookupBack) => {
            search.step(Direction::Back, &core.history);
            render_search(search, &core.history, term);
            None
        }
        Some(Operation::LookupForward) => {
            search.step(Direction::Forward, &core.history);
            render_search(search, &core.history, term);
            None
        }
        Some(Operation::LookupBackspace) => {
            if search.pop_char(&core.history) {
                core.bell.ring(term);
            }
            render_search(search, &core.history, term);
            None
        }
        _ => {
            if let SemanticKey::Char(c) = key {
                if key.is_printable() {
                    search.push_char(c, &core.history);
                }
            }
            render_search(search, &core.history, term);
            None
        }
    }
}

/// Everything about the `complete` operation except asking the completer
/// for candidates (sync and async gather those differently).
fn apply_completion(
    core: &mut EditorCore,
    call: &mut Call,
    candidates: Vec<String>,
    term: &mut dyn Terminal,
) {
    let line = call.buffer.text();
    if core.last_completion.is_repeat(&line, &candidates) {
        core.bell.ring(term);
        return;
    }
    if candidates.is_empty() {
        core.bell.ring(term);
        core.last_completion.record(&line, candidates);
        return;
    }

    let _ = term.write_raw("\r\n\r\n");
    for c in &candidates {
        let _ = term.write_raw(c);
        let _ = term.write_raw("\r\n");
    }
    let _ = term.write_raw("\r\n");
    let _ = print_prompt(&call.prompt, term);
    let _ = term.write_raw(&line);
    call.buffer.set(&line);
    let _ = term.flush();

    core.last_completion.record(&line, candidates);
}

/// Dispatches one key through the normal-mode binding table. Returns the
/// loop's next action. `Complete` is intercepted by the caller before it
/// ever reaches here, since gathering candidates differs between the
/// synchronous and cooperative façades.
fn dispatch_normal(
    core: &mut EditorCore,
    call: &mut Call,
    op: Operation,
    term: &mut dyn Terminal,
) -> Result<Outcome> {
    use Operation::*;

    if !matches!(op, Complete) {
        core.last_completion.clear();
    }

    match op {
        CarriageReturn | Newline => {
            let _ = term.write_raw("\r\n");
            let _ = term.flush();
            Ok(Outcome::Committed(call.buffer.text()))
        }
        LineEof => {
            let _ = term.write_raw("\r\n");
            let _ = term.flush();
            Err(ReadlineError::Eof)
        }
        LineCancel => {
            let _ = term.write_raw("\r\n");
            let _ = term.flush();
            Err(ReadlineError::Interrupted)
        }
        Delete => {
            if call.buffer.delete_forward(term)? {
                core.bell.ring(term);
            }
            Ok(Outcome::Continue)
        }
        Backspace => {
            if call.buffer.backspace(term)? {
                core.bell.ring(term);
            }
            Ok(Outcome::Continue)
        }
        GotoLineLeft => {
            if call.buffer.move_left(term)? {
                core.bell.ring(term);
            }
            Ok(Outcome::Continue)
        }
        GotoLineRight => {
            if call.buffer.move_right(term)? {
                core.bell.ring(term);
            }
            Ok(Outcome::Continue)
        }
        GotoLineStart => {
            if call.buffer.move_home(term)? {
                core.bell.ring(term);
            }
            Ok(Outcome::Continue)
        }
        GotoLineEnd => {
            if call.buffer.move_end(term)? {
                core.bell.ring(term);
            }
            Ok(Outcome::Continue)
        }
        LineClear => {
            if call.buffer.clear(term)? {
                core.bell.ring(term);
            }
            Ok(Outcome::Continue)
        }
        ToggleInsertReplace => {
            call.buffer.toggle_replace_mode();
            Ok(Outcome::Continue)
        }
        ToggleBell => {
            core.bell.toggle(term);
            Ok(Outcome::Continue)
        }
        HistoryPrevious if !call.bare => {
            navigate(core, call, term, History::navigate_prev);
            Ok(Outcome::Continue)
        }
        HistoryNext if !call.bare => {
            navigate(core, call, term, History::navigate_next);
            Ok(Outcome::Continue)
        }
        HistoryFirst if !call.bare => {
            navigate(core, call, term, History::navigate_first);
            Ok(Outcome::Continue)
        }
        HistoryLast if !call.bare => {
            navigate(core, call, term, History::navigate_last);
            Ok(Outcome::Continue)
        }
        OpenReverseLookup if !call.bare => {
            call.search = Some(ReverseSearchState::start(
                call.buffer.text(),
                core.history.len(),
            ));
            render_search(call.search.as_ref().unwrap(), &core.history, term);
            Ok(Outcome::Continue)
        }
        HistoryPrevious | HistoryNext | HistoryFirst | HistoryLast | OpenReverseLookup => {
            Ok(Outcome::Continue)
        }
        Complete | LookupBack | LookupForward | LookupBackspace | ForwardLookupResult
        | CancelLookupResult | None => Ok(Outcome::Continue),
    }
}

/// Shared body of the four history-navigation bindings: snapshot/replace
/// the buffer with whatever `nav` returns, or bell on `None`.
fn navigate(
    core: &mut EditorCore,
    call: &mut Call,
    term: &mut dyn Terminal,
    nav: impl FnOnce(&mut History, &str) -> Option<String>,
) {
    match nav(&mut core.history, &call.buffer.text()) {
        Some(line) => {
            let _ = call.buffer.clear(term);
            call.buffer.set(&line);
            let _ = term.write_raw(&line);
            let _ = term.flush();
        }
        None => core.bell.ring(term),
    }
}

/// Replays `s` through the normal dispatcher as if typed, with the bell
/// suppressed for the duration. Shared by both façades since it never
/// touches the completer or the key source.
fn insert_text_impl(core: &mut EditorCore, call: &mut Call, s: &str, term: &mut dyn Terminal) {
    core.bell.suppress = true;
    if call.buffer.move_end(term).is_err() {
        core.bell.suppress = false;
        return;
    }
    for ch in s.chars() {
        let key = SemanticKey::Char(ch);
        let op = core.bindings.normal_op(key);
        if matches!(op, Operation::None) {
            if key.is_printable() {
                let _ = call.buffer.insert(ch, term);
            }
        } else {
            let _ = dispatch_normal(core, call, op, term);
        }
    }
    core.bell.suppress = false;
}

/// Commits `outcome` to history (unless this was a `bare` call) and
/// restores the terminal's mask state. Shared tail of both façades'
/// per-call loop.
fn finish_call(
    core: &mut EditorCore,
    call: Call,
    term: &mut dyn Terminal,
    outcome: Result<String>,
) -> Result<String> {
    term.set_mask(false);
    if let Ok(line) = &outcome {
        if !call.bare {
            core.history.push(line);
        }
    }
    outcome
}

/// Synchronous line editor. `S` supplies keys by blocking the calling
/// thread.
pub struct Editor<S: RawSource> {
    core: EditorCore,
    reader: KeyReader<S>,
    term: StdTerminal<std::io::Stdout>,
}

impl Editor<DefaultRawSource> {
    /// Uses the platform-default `RawSource` and `stdout`.
    pub fn new(history_size: usize) -> std::io::Result<Self> {
        let source = default_source()?;
        Ok(Editor::with_source(history_size, source))
    }
}

impl<S: RawSource> Editor<S> {
    pub fn with_source(history_size: usize, source: S) -> Self {
        Editor {
            core: EditorCore::new(history_size),
            reader: KeyReader::new(source, InterruptFlag::new()),
            term: StdTerminal::new(std::io::stdout()),
        }
    }

    pub fn interrupt_flag(&self) -> InterruptFlag {
        self.reader.interrupt_flag()
    }

    pub fn set_completer(&mut self, completer: impl Completer + 'static) {
        self.core.set_completer(completer);
    }

    pub fn parse_and_bind(&mut self, binding: &str) {
        self.core.parse_and_bind(binding);
    }

    pub fn set_history_size(&mut self, n: usize) {
        self.core.set_history_size(n);
    }

    pub fn set_prepare_history_entry(&mut self, f: impl Fn(&str) -> String + Send + 'static) {
        self.core.set_prepare_history_entry(f);
    }

    pub fn enable_bell(&mut self, enable: bool) {
        self.core.enable_bell(enable);
    }

    pub fn set_bell_silence_time(&mut self, seconds: f64) {
        self.core.set_bell_silence_time(seconds);
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.reader.flush();
        self.term.flush()
    }

    pub fn readline(&mut self, prompt: &str) -> Result<String> {
        self.input_inner(prompt, false, false)
    }

    pub fn input(&mut self, prompt: &str, mask_input: bool) -> Result<String> {
        self.input_inner(prompt, mask_input, true)
    }

    fn input_inner(&mut self, prompt: &str, mask: bool, bare: bool) -> Result<String> {
        let _guard = RawModeGuard::enter()?;
        print_prompt(prompt, &mut self.term)?;
        self.term.set_mask(mask);
        self.core.history.reset_navigation();
        let mut call = Call::new(bare);
        call.prompt = prompt.to_string();
        if let Some(text) = self.core.pending_insert.take() {
            insert_text_impl(&mut self.core, &mut call, &text, &mut self.term);
        }

        let outcome = loop {
            self.core.current_line = call.buffer.text();
            let key = match self.reader.read_one() {
                Ok(k) => k,
                Err(e @ ReadlineError::ReadKey(_)) => break Err(e),
                Err(e) => {
                    log::warn!("read error during active edit: {e}");
                    self.core.bell.ring(&mut self.term);
                    break Ok(call.buffer.text());
                }
            };

            if call.search.is_some() {
                if let Some(op) = handle_lookup_key(&mut self.core, &mut call, key, &mut self.term)
                {
                    match dispatch_normal(&mut self.core, &mut call, op, &mut self.term) {
                        Ok(Outcome::Committed(line)) => break Ok(line),
                        Ok(Outcome::Continue) => continue,
                        Err(e) => break Err(e),
                    }
                }
                continue;
            }

            let op = self.core.bindings.normal_op(key);
            if matches!(op, Operation::Complete) {
                let candidates = match &mut self.core.completer {
                    Some(c) => collect_sync(c.as_mut(), &call.buffer.text()),
                    None => Vec::new(),
                };
                apply_completion(&mut self.core, &mut call, candidates, &mut self.term);
                continue;
            }

            match dispatch_normal(&mut self.core, &mut call, op, &mut self.term) {
                Ok(Outcome::Committed(line)) => break Ok(line),
                Ok(Outcome::Continue) => {
                    if matches!(op, Operation::None) {
                        if let SemanticKey::Char(c) = key {
                            if key.is_printable() && call.buffer.insert(c, &mut self.term).is_err()
                            {
                                self.core.bell.ring(&mut self.term);
                            }
                        }
                    }
                }
                Err(e) => break Err(e),
            }
        };

        finish_call(&mut self.core, call, &mut self.term, outcome)
    }

    /// Queues `s` to be fed through the normal dispatcher, as if typed,
    /// at the very start of the next `readline`/`input` call.
    pub fn insert_text(&mut self, s: &str) {
        self.core.pending_insert = Some(s.to_string());
    }

    pub fn get_line_buffer(&self) -> &str {
        self.core.get_line_buffer()
    }
}

/// Cooperative-mode façade: identical dispatch logic to `Editor`, but the
/// next key and (optionally) completions are awaited instead of blocked
/// on.
pub struct AsyncEditor<R: AsyncKeyReader> {
    core: EditorCore,
    reader: R,
    term: StdTerminal<std::io::Stdout>,
}

impl<R: AsyncKeyReader> AsyncEditor<R> {
    pub fn new(history_size: usize, reader: R) -> Self {
        AsyncEditor {
            core: EditorCore::new(history_size),
            reader,
            term: StdTerminal::new(std::io::stdout()),
        }
    }

    pub fn set_completer(&mut self, completer: impl Completer + 'static) {
        self.core.set_completer(completer);
    }

    pub fn set_async_completer(&mut self, completer: impl AsyncCompleter + 'static) {
        self.core.set_async_completer(completer);
    }

    pub fn parse_and_bind(&mut self, binding: &str) {
        self.core.parse_and_bind(binding);
    }

    pub fn set_history_size(&mut self, n: usize) {
        self.core.set_history_size(n);
    }

    pub fn set_prepare_history_entry(&mut self, f: impl Fn(&str) -> String + Send + 'static) {
        self.core.set_prepare_history_entry(f);
    }

    pub fn enable_bell(&mut self, enable: bool) {
        self.core.enable_bell(enable);
    }

    pub fn set_bell_silence_time(&mut self, seconds: f64) {
        self.core.set_bell_silence_time(seconds);
    }

    pub async fn readline(&mut self, prompt: &str) -> Result<String> {
        self.input_inner(prompt, false, false).await
    }

    pub async fn input(&mut self, prompt: &str, mask_input: bool) -> Result<String> {
        self.input_inner(prompt, mask_input, true).await
    }

    async fn input_inner(&mut self, prompt: &str, mask: bool, bare: bool) -> Result<String> {
        let _guard = RawModeGuard::enter()?;
        print_prompt(prompt, &mut self.term)?;
        self.term.set_mask(mask);
        self.core.history.reset_navigation();
        let mut call = Call::new(bare);
        call.prompt = prompt.to_string();
        if let Some(text) = self.core.pending_insert.take() {
            insert_text_impl(&mut self.core, &mut call, &text, &mut self.term);
        }

        let outcome = loop {
            self.core.current_line = call.buffer.text();
            let key = match self.reader.read_one().await {
                Ok(k) => k,
                Err(e @ ReadlineError::ReadKey(_)) => break Err(e),
                Err(e) => {
                    log::warn!("read error during active edit: {e}");
                    self.core.bell.ring(&mut self.term);
                    break Ok(call.buffer.text());
                }
            };

            if call.search.is_some() {
                if let Some(op) = handle_lookup_key(&mut self.core, &mut call, key, &mut self.term)
                {
                    match dispatch_normal(&mut self.core, &mut call, op, &mut self.term) {
                        Ok(Outcome::Committed(line)) => break Ok(line),
                        Ok(Outcome::Continue) => continue,
                        Err(e) => break Err(e),
                    }
                }
                continue;
            }

            let op = self.core.bindings.normal_op(key);
            if matches!(op, Operation::Complete) {
                let line = call.buffer.text();
                let candidates = if let Some(c) = &mut self.core.async_completer {
                    crate::completion::collect_async(c.as_mut(), &line).await
                } else if let Some(c) = &mut self.core.completer {
                    collect_sync(c.as_mut(), &line)
                } else {
                    Vec::new()
                };
                apply_completion(&mut self.core, &mut call, candidates, &mut self.term);
                continue;
            }

            match dispatch_normal(&mut self.core, &mut call, op, &mut self.term) {
                Ok(Outcome::Committed(line)) => break Ok(line),
                Ok(Outcome::Continue) => {
                    if matches!(op, Operation::None) {
                        if let SemanticKey::Char(c) = key {
                            if key.is_printable() && call.buffer.insert(c, &mut self.term).is_err()
                            {
                                self.core.bell.ring(&mut self.term);
                            }
                        }
                    }
                }
                Err(e) => break Err(e),
            }
        };

        finish_call(&mut self.core, call, &mut self.term, outcome)
    }

    /// Queues `s` to be fed through the normal dispatcher, as if typed,
    /// at the very start of the next `readline`/`input` call.
    pub fn insert_text(&mut self, s: &str) {
        self.core.pending_insert = Some(s.to_string());
    }

    pub fn get_line_buffer(&self) -> &str {
        self.core.get_line_buffer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    struct Scripted(VecDeque<Vec<u8>>);

    impl Scripted {
        fn new(chunks: &[&[u8]]) -> Self {
            Scripted(chunks.iter().map(|c| c.to_vec()).collect())
        }
    }

    impl RawSource for Scripted {
        fn poll_bytes(&mut self, out: &mut Vec<u8>) -> io::Result<bool> {
            match self.0.pop_front() {
                Some(c) => {
                    out.extend_from_slice(&c);
                    Ok(true)
                }
                None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")),
            }
        }
    }

    #[test]
    fn carriage_return_commits_buffer_text() {
        let mut core = EditorCore::new(10);
        let mut call = Call::new(false);
        let mut term = StdTerminal::new(Vec::new());
        call.buffer.set("hello");
        let out =
            dispatch_normal(&mut core, &mut call, Operation::CarriageReturn, &mut term).unwrap();
        match out {
            Outcome::Committed(s) => assert_eq!(s, "hello"),
            _ => panic!("expected commit"),
        }
    }

    #[test]
    fn line_eof_raises_eof_error() {
        let mut core = EditorCore::new(10);
        let mut call = Call::new(false);
        let mut term = StdTerminal::new(Vec::new());
        let err = dispatch_normal(&mut core, &mut call, Operation::LineEof, &mut term).unwrap_err();
        assert!(matches!(err, ReadlineError::Eof));
    }

    #[test]
    fn goto_end_past_buffer_is_a_no_op_not_a_crash() {
        let mut core = EditorCore::new(10);
        let mut call = Call::new(false);
        let mut term = StdTerminal::new(Vec::new());
        call.buffer.set("abc");
        let out = dispatch_normal(&mut core, &mut call, Operation::GotoLineEnd, &mut term).unwrap();
        assert!(matches!(out, Outcome::Continue));
    }

    #[test]
    fn bare_mode_ignores_history_navigation() {
        let mut core = EditorCore::new(10);
        core.history.push("earlier");
        core.history.reset_navigation();
        let mut call = Call::new(true);
        let mut term = StdTerminal::new(Vec::new());
        dispatch_normal(&mut core, &mut call, Operation::HistoryPrevious, &mut term).unwrap();
        assert_eq!(call.buffer.text(), "");
    }

    #[test]
    fn readline_abc_enter_returns_abc() {
        let source = Scripted::new(&[b"a", b"b", b"c", b"\r"]);
        let mut editor = Editor::with_source(10, source);
        let result = editor.readline("> ");
        assert_eq!(result.unwrap(), "abc");
    }

    #[test]
    fn readline_left_then_insert_x() {
        let source = Scripted::new(&[b"a", b"b", b"c", b"\x1b[D", b"X", b"\r"]);
        let mut editor = Editor::with_source(10, source);
        let result = editor.readline("> ");
        assert_eq!(result.unwrap(), "abXc");
    }

    #[test]
    fn committing_twice_then_history_previous_recalls_last() {
        let source = Scripted::new(&[
            b"f", b"o", b"o", b"\r", b"b", b"a", b"r", b"\r", b"\x1b[A", b"\r",
        ]);
        let mut editor = Editor::with_source(10, source);
        assert_eq!(editor.readline("> ").unwrap(), "foo");
        assert_eq!(editor.readline("> ").unwrap(), "bar");
        assert_eq!(editor.readline("> ").unwrap(), "bar");
    }

    #[test]
    fn ctrl_c_raises_interrupted() {
        let source = Scripted::new(&[b"a", &[0x03]]);
        let mut editor = Editor::with_source(10, source);
        let err = editor.readline("> ").unwrap_err();
        assert!(matches!(err, ReadlineError::Interrupted));
    }

    #[test]
    fn ctrl_d_on_empty_line_raises_eof() {
        let source = Scripted::new(&[&[0x04]]);
        let mut editor = Editor::with_source(10, source);
        let err = editor.readline("> ").unwrap_err();
        assert!(matches!(err, ReadlineError::Eof));
    }

    #[test]
    fn reverse_search_finds_and_commits_prior_entry() {
        let source = Scripted::new(&[
            b"e", b"c", b"h", b"o", b" ", b"h", b"i", b"\r", // history: "echo hi"
            &[0x12], b"h", b"i", b"\r", // Ctrl-R, "hi", Enter commits match
        ]);
        let mut editor = Editor::with_source(10, source);
        assert_eq!(editor.readline("> ").unwrap(), "echo hi");
        assert_eq!(editor.readline("> ").unwrap(), "echo hi");
    }
}
