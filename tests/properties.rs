//! Property tests for the invariants reachable through the public API:
//! history dedup/bound, and round-trip of plain typed lines.

use std::collections::VecDeque;
use std::io;

use james_readline::{Editor, History, RawSource};
use proptest::prelude::*;

struct Scripted(VecDeque<Vec<u8>>);

impl Scripted {
    fn from_bytes(mut bytes: Vec<u8>) -> Self {
        bytes.push(b'\r');
        Scripted(bytes.into_iter().map(|b| vec![b]).collect())
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

/// Only printable ASCII, since the round-trip property is scoped to lines
/// "typed with no control keys".
fn printable_line() -> impl Strategy<Value = String> {
    proptest::collection::vec(0x20u8..0x7f, 1..24)
        .prop_map(|bytes| bytes.into_iter().map(|b| b as char).collect())
}

proptest! {
    #[test]
    fn round_trip_plain_lines(line in printable_line()) {
        let mut editor = Editor::with_source(10, Scripted::from_bytes(line.clone().into_bytes()));
        let result = editor.readline("> ").unwrap();
        prop_assert_eq!(result, line);
    }

    #[test]
    fn history_bound_never_exceeds_max_size(
        lines in proptest::collection::vec("[a-z]{1,6}", 0..40),
        max_size in 1usize..8,
    ) {
        let mut h = History::new(max_size);
        for l in &lines {
            h.push(l);
        }
        prop_assert!(h.len() <= max_size);
    }

    #[test]
    fn pushing_same_line_twice_grows_by_at_most_one(line in "[a-z]{1,8}") {
        let mut h = History::new(100);
        let before = h.len();
        h.push(&line);
        h.push(&line);
        prop_assert!(h.len() <= before + 1);
    }
}

#[test]
fn flush_is_idempotent() {
    let mut editor = Editor::with_source(10, Scripted::from_bytes(b"abc".to_vec()));
    editor.flush().unwrap();
    editor.flush().unwrap();
}
