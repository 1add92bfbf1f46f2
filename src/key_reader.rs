//! Turns a byte stream from a `RawSource` into `SemanticKey`s.
//!
//! The parsing rule never looks ahead further than it has to: a byte that
//! isn't part of an escape sequence is emitted immediately, and a sequence
//! that stops matching the CSI/SS3 grammar is flushed as whatever prefix
//! was accumulated so far.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};

use crate::error::{ReadlineError, Result};
use crate::key::SemanticKey;
use crate::raw::RawSource;

/// Cooperative-mode counterpart to `KeyReader`: same parsing rule, but
/// `read_one` may suspend the calling task instead of blocking a thread.
#[async_trait]
pub trait AsyncKeyReader: Send {
    async fn read_one(&mut self) -> Result<SemanticKey>;
}

/// Max number of OS reads `TokioKeyReader` will have in flight on the
/// blocking-thread pool at once.
const MAX_CONCURRENT_BLOCKING_READS: usize = 3;

/// Offloads `RawSource::poll_bytes` to `tokio::task::spawn_blocking`,
/// bounded by a semaphore, and races it against the interrupt flag with
/// `tokio::select!` so an out-of-band `Interrupt` is observed promptly
/// even mid-read.
pub struct TokioKeyReader<S: RawSource + 'static> {
    source: Arc<AsyncMutex<S>>,
    parser: KeyParser,
    interrupt: InterruptFlag,
    permits: Arc<Semaphore>,
}

impl<S: RawSource + 'static> TokioKeyReader<S> {
    pub fn new(source: S, interrupt: InterruptFlag) -> Self {
        TokioKeyReader {
            source: Arc::new(AsyncMutex::new(source)),
            parser: KeyParser::default(),
            interrupt,
            permits: Arc::new(Semaphore::new(MAX_CONCURRENT_BLOCKING_READS)),
        }
    }

    pub fn interrupt_flag(&self) -> InterruptFlag {
        self.interrupt.clone()
    }

    pub fn flush(&mut self) {
        self.parser.flush();
    }
}

#[async_trait]
impl<S: RawSource + 'static> AsyncKeyReader for TokioKeyReader<S> {
    async fn read_one(&mut self) -> Result<SemanticKey> {
        loop {
            if self.interrupt.take() {
                return Err(ReadlineError::Interrupted);
            }
            if let Some(key) = self.parser.pop() {
                return Ok(key);
            }

            let _permit = self
                .permits
                .clone()
                .acquire_owned()
                .await
                .expect("semaphore is never closed");
            let source = self.source.clone();
            let interrupt = self.interrupt.clone();

            // One non-blocking poll per blocking-pool visit; an empty result
            // is handled by the caller (flush a stale pending prefix, or
            // sleep and try again) rather than spun on in here.
            let read = tokio::task::spawn_blocking(move || {
                if interrupt.peek() {
                    return Ok(Vec::new());
                }
                let mut buf = Vec::new();
                let mut guard = source.blocking_lock();
                guard.poll_bytes(&mut buf).map(|_| buf)
            });

            tokio::select! {
                biased;
                _ = interrupt_watch(&self.interrupt) => {
                    return Err(ReadlineError::Interrupted);
                }
                joined = read => {
                    let bytes = joined
                        .expect("blocking read task panicked")
                        .map_err(map_io_err)?;
                    if bytes.is_empty() {
                        if !self.parser.flush_incomplete_prefix() {
                            tokio::time::sleep(Duration::from_millis(5)).await;
                        }
                    } else {
                        self.parser.feed(&bytes);
                    }
                }
            }
        }
    }
}

/// Polls the interrupt flag on a short interval so `select!` can race it
/// against an in-flight blocking read without a dedicated waker.
async fn interrupt_watch(flag: &InterruptFlag) {
    loop {
        if flag.peek() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Shared by `KeyReader` and whatever delivers out-of-band interrupts (a
/// host's own SIGINT handler, or `AsyncEditor`'s cancellation path).
#[derive(Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        InterruptFlag(Arc::new(AtomicBool::new(false)))
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Consumes the flag: `true` at most once per `set()`.
    fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }

    /// Reads the flag without consuming it.
    fn peek(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The byte→key parsing state machine, independent of how the
/// next chunk of bytes is obtained. Shared by `KeyReader` and
/// `TokioKeyReader` so the grammar lives in exactly one place.
#[derive(Default)]
struct KeyParser {
    pending: Vec<u8>,
    cache: VecDeque<SemanticKey>,
}

impl KeyParser {
    fn flush(&mut self) {
        self.cache.clear();
        self.pending.clear();
    }

    fn pop(&mut self) -> Option<SemanticKey> {
        self.cache.pop_front()
    }

    /// Gives up waiting for more bytes to complete whatever's left in
    /// `pending` and emits the best available interpretation of it, per
    /// the "emit whatever prefix was accumulated" rule. Called once a
    /// `RawSource` reports nothing further is ready right now, so a lone
    /// ESC (or a UTF-8 lead byte with no continuation forthcoming) doesn't
    /// wait forever. Returns `true` if a key was produced.
    fn flush_incomplete_prefix(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let key = if self.pending[0] == 0x1b {
            match self.pending.len() {
                1 => SemanticKey::Esc,
                2 => escape_alt_key(self.pending[1]),
                _ => csi3_key(self.pending[1], self.pending[2]),
            }
        } else {
            std::str::from_utf8(&self.pending)
                .ok()
                .and_then(|s| s.chars().next())
                .map(SemanticKey::Char)
                .unwrap_or(SemanticKey::Char(char::REPLACEMENT_CHARACTER))
        };
        self.pending.clear();
        self.cache.push_back(key);
        true
    }

    /// Appends freshly read bytes and parses as many complete keys as
    /// `pending` now holds, leaving an incomplete trailing sequence (if
    /// any) in `pending` for the next call.
    fn feed(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);

        let mut i = 0;
        let buf = &self.pending;
        let mut consumed_keys = Vec::new();

        while i < buf.len() {
            let b0 = buf[i];
            if b0 != 0x1b {
                let need = utf8_seq_len(b0);
                if need == 1 {
                    consumed_keys.push((i + 1, byte_to_key(b0)));
                    i += 1;
                    continue;
                }
                if i + need > buf.len() {
                    break; // incomplete multi-byte code point; wait for more bytes
                }
                let ch = std::str::from_utf8(&buf[i..i + need])
                    .ok()
                    .and_then(|s| s.chars().next())
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                consumed_keys.push((i + need, SemanticKey::Char(ch)));
                i += need;
                continue;
            }

            // ESC: need at least one more byte to decide anything.
            if i + 1 >= buf.len() {
                break; // incomplete; wait for more bytes
            }
            let b1 = buf[i + 1];
            if b1 != 0x5b && b1 != 0x4f {
                consumed_keys.push((i + 2, escape_alt_key(b1)));
                i += 2;
                continue;
            }

            // ESC [ or ESC O: need the byte after that.
            if i + 2 >= buf.len() {
                break;
            }
            let b2 = buf[i + 2];
            if !(b'1'..=b'6').contains(&b2) {
                consumed_keys.push((i + 3, csi3_key(b1, b2)));
                i += 3;
                continue;
            }

            // 4-byte form: ESC [ digit '~'
            if i + 3 >= buf.len() {
                break;
            }
            let b3 = buf[i + 3];
            consumed_keys.push((i + 4, csi4_key(b2, b3)));
            i += 4;
        }

        for (_, key) in &consumed_keys {
            self.cache.push_back(*key);
        }
        if let Some((consumed, _)) = consumed_keys.last() {
            self.pending.drain(..*consumed);
        }
    }
}

/// Accumulates raw bytes from a `RawSource` and parses them into
/// `SemanticKey`s one at a time.
pub struct KeyReader<S: RawSource> {
    source: S,
    parser: KeyParser,
    interrupt: InterruptFlag,
}

impl<S: RawSource> KeyReader<S> {
    pub fn new(source: S, interrupt: InterruptFlag) -> Self {
        KeyReader {
            source,
            parser: KeyParser::default(),
            interrupt,
        }
    }

    pub fn interrupt_flag(&self) -> InterruptFlag {
        self.interrupt.clone()
    }

    /// Discards any cached, not-yet-consumed keys`).
    pub fn flush(&mut self) {
        self.parser.flush();
    }

    /// Blocks until one semantic key is available.
    pub fn read_one(&mut self) -> Result<SemanticKey> {
        loop {
            if self.interrupt.take() {
                return Err(ReadlineError::Interrupted);
            }
            if let Some(key) = self.parser.pop() {
                return Ok(key);
            }
            self.fill_one_blocking()?;
        }
    }

    /// Blocks until at least one key is available, then drains whatever
    /// else is already buffered without blocking further.
    pub fn read_batch(&mut self) -> Result<Vec<SemanticKey>> {
        let first = self.read_one()?;
        let mut out = vec![first];
        while let Some(key) = self.parser.pop() {
            out.push(key);
        }
        Ok(out)
    }

    fn fill_one_blocking(&mut self) -> Result<()> {
        loop {
            let mut bytes = Vec::new();
            match self.source.poll_bytes(&mut bytes) {
                Ok(true) => {
                    self.parser.feed(&bytes);
                    if self.parser.cache.front().is_some() {
                        return Ok(());
                    }
                }
                Ok(false) => {
                    // Nothing ready yet. Give up on any stale pending prefix
                    // (a lone ESC, an unterminated CSI lead-in) rather than
                    // waiting forever for continuation bytes that may never
                    // come; only spin when there's truly nothing to flush.
                    // `RawSource::poll_bytes` never blocks, so this is a
                    // tight readiness poll rather than a busy compute loop.
                    if self.parser.flush_incomplete_prefix() {
                        return Ok(());
                    }
                    std::thread::yield_now();
                }
                Err(e) => return Err(map_io_err(e)),
            }
        }
    }
}

fn map_io_err(e: io::Error) -> ReadlineError {
    match e.kind() {
        io::ErrorKind::Unsupported => ReadlineError::PlatformNotSupported(e.to_string()),
        io::ErrorKind::BrokenPipe => ReadlineError::ReadKey(e.to_string()),
        _ => ReadlineError::Io(e),
    }
}

/// Only ever called with a single-byte code point (`utf8_seq_len` routes
/// anything longer through the multi-byte path in `feed`), so `b as char`
/// is always the exact code point, never a Latin-1 guess.
fn byte_to_key(b: u8) -> SemanticKey {
    match b {
        0x0d => SemanticKey::Cr,
        0x0a => SemanticKey::Lf,
        0x09 => SemanticKey::Tab,
        0x7f => SemanticKey::Backspace,
        0x01..=0x1a => SemanticKey::Ctrl((b'a' + (b - 1)) as char),
        _ => SemanticKey::Char(b as char),
    }
}

/// Number of bytes the UTF-8 code point starting with `b0` needs in total.
/// Stray continuation bytes and invalid lead bytes are treated as a single
/// raw byte rather than desynchronizing the rest of the stream.
fn utf8_seq_len(b0: u8) -> usize {
    match b0 {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => 1,
    }
}

/// `ESC` followed by a byte that isn't `[` or `O`: an ALT combo, or
/// CTRL_ALT_<letter> when that byte is itself a control code.
fn escape_alt_key(b1: u8) -> SemanticKey {
    match b1 {
        0x01..=0x1a => SemanticKey::CtrlAlt((b'a' + (b1 - 1)) as char),
        _ => SemanticKey::Alt(b1 as char),
    }
}

fn csi3_key(kind: u8, b2: u8) -> SemanticKey {
    match (kind, b2) {
        (0x5b, b'A') => SemanticKey::Up,
        (0x5b, b'B') => SemanticKey::Down,
        (0x5b, b'C') => SemanticKey::Right,
        (0x5b, b'D') => SemanticKey::Left,
        (0x5b, b'H') => SemanticKey::Home,
        (0x5b, b'F') => SemanticKey::End,
        (0x4f, b'H') => SemanticKey::Home,
        (0x4f, b'F') => SemanticKey::End,
        _ => SemanticKey::Esc,
    }
}

fn csi4_key(digit: u8, terminator: u8) -> SemanticKey {
    match (digit, terminator) {
        (b'3', b'^') => SemanticKey::CtrlAltDelete,
        (b'2', b'~') => SemanticKey::Insert,
        (b'3', b'~') => SemanticKey::Delete,
        (b'5', b'~') => SemanticKey::PageUp,
        (b'6', b'~') => SemanticKey::PageDown,
        _ => SemanticKey::Esc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct Scripted {
        chunks: VecDeque<Vec<u8>>,
    }

    impl Scripted {
        fn new(chunks: Vec<&[u8]>) -> Self {
            Scripted {
                chunks: chunks.into_iter().map(|c| c.to_vec()).collect(),
            }
        }
    }

    impl RawSource for Scripted {
        fn poll_bytes(&mut self, out: &mut Vec<u8>) -> io::Result<bool> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    out.extend_from_slice(&chunk);
                    Ok(true)
                }
                None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")),
            }
        }
    }

    #[test]
    fn plain_char_emitted_immediately() {
        let mut r = KeyReader::new(Scripted::new(vec![b"a"]), InterruptFlag::new());
        assert_eq!(r.read_one().unwrap(), SemanticKey::Char('a'));
    }

    #[test]
    fn up_arrow_full_sequence() {
        let mut r = KeyReader::new(Scripted::new(vec![b"\x1b[A"]), InterruptFlag::new());
        assert_eq!(r.read_one().unwrap(), SemanticKey::Up);
    }

    #[test]
    fn insert_key_four_byte_sequence() {
        let mut r = KeyReader::new(Scripted::new(vec![b"\x1b[2~"]), InterruptFlag::new());
        assert_eq!(r.read_one().unwrap(), SemanticKey::Insert);
    }

    #[test]
    fn sequence_split_across_reads() {
        let mut r = KeyReader::new(
            Scripted::new(vec![b"\x1b", b"[", b"3", b"~"]),
            InterruptFlag::new(),
        );
        assert_eq!(r.read_one().unwrap(), SemanticKey::Delete);
    }

    #[test]
    fn alt_combo_after_lone_escape_byte() {
        let mut r = KeyReader::new(Scripted::new(vec![b"\x1bx"]), InterruptFlag::new());
        assert_eq!(r.read_one().unwrap(), SemanticKey::Alt('x'));
    }

    #[test]
    fn ctrl_byte_maps_to_ctrl_key() {
        let mut r = KeyReader::new(Scripted::new(vec![&[0x12]]), InterruptFlag::new());
        assert_eq!(r.read_one().unwrap(), SemanticKey::Ctrl('r'));
    }

    #[test]
    fn interrupt_flag_preempts_pending_read() {
        let mut r = KeyReader::new(Scripted::new(vec![b"a"]), InterruptFlag::new());
        r.interrupt_flag().set();
        assert!(r.read_one().is_err());
    }

    #[test]
    fn batch_drains_everything_already_buffered() {
        let mut r = KeyReader::new(Scripted::new(vec![b"ab"]), InterruptFlag::new());
        let batch = r.read_batch().unwrap();
        assert_eq!(batch, vec![SemanticKey::Char('a'), SemanticKey::Char('b')]);
    }
}
