//! Semantic keys and their canonical byte-sequence representations.
//!
//! Byte layout mirrors a well-known readline implementation's key table so
//! the escape sequences line up with what real terminals actually send.

use std::collections::HashMap;
use std::sync::LazyLock;

pub const CR: &[u8] = b"\x0d";
pub const LF: &[u8] = b"\x0a";
pub const BACKSPACE: &[u8] = b"\x7f";
pub const TAB: &[u8] = b"\x09";
pub const ESC: &[u8] = b"\x1b";
pub const INSERT: &[u8] = b"\x1b\x5b\x32\x7e";
pub const DELETE: &[u8] = b"\x1b\x5b\x33\x7e";
pub const PAGE_UP: &[u8] = b"\x1b\x5b\x35\x7e";
pub const PAGE_DOWN: &[u8] = b"\x1b\x5b\x36\x7e";
pub const HOME: &[u8] = b"\x1b\x5b\x48";
pub const END: &[u8] = b"\x1b\x5b\x46";

pub const UP: &[u8] = b"\x1b\x5b\x41";
pub const DOWN: &[u8] = b"\x1b\x5b\x42";
pub const LEFT: &[u8] = b"\x1b\x5b\x44";
pub const RIGHT: &[u8] = b"\x1b\x5b\x43";

pub const CTRL_ALT_DELETE: &[u8] = b"\x1b\x5b\x33\x5e";

/// One semantic key: either a single Unicode scalar value typed by the user,
/// or one of the named control/navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticKey {
    Char(char),
    Tab,
    Cr,
    Lf,
    Esc,
    Backspace,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    Ctrl(char),
    Alt(char),
    CtrlAlt(char),
    CtrlAltDelete,
}

impl SemanticKey {
    /// `true` for a plain printable character (not a control combo).
    pub fn is_printable(&self) -> bool {
        matches!(self, SemanticKey::Char(c) if !c.is_control())
    }

    /// The canonical byte sequence for this key, used by `parse_and_bind`
    /// name lookups and by `EditBuffer::insert_text`'s replay path.
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            SemanticKey::Char(c) => c.to_string().into_bytes(),
            SemanticKey::Tab => TAB.to_vec(),
            SemanticKey::Cr => CR.to_vec(),
            SemanticKey::Lf => LF.to_vec(),
            SemanticKey::Esc => ESC.to_vec(),
            SemanticKey::Backspace => BACKSPACE.to_vec(),
            SemanticKey::Delete => DELETE.to_vec(),
            SemanticKey::Insert => INSERT.to_vec(),
            SemanticKey::Home => HOME.to_vec(),
            SemanticKey::End => END.to_vec(),
            SemanticKey::PageUp => PAGE_UP.to_vec(),
            SemanticKey::PageDown => PAGE_DOWN.to_vec(),
            SemanticKey::Up => UP.to_vec(),
            SemanticKey::Down => DOWN.to_vec(),
            SemanticKey::Left => LEFT.to_vec(),
            SemanticKey::Right => RIGHT.to_vec(),
            SemanticKey::Ctrl(c) => vec![(*c as u8 - b'a' + 1)],
            SemanticKey::Alt(c) => {
                let mut v = ESC.to_vec();
                v.push(*c as u8);
                v
            }
            SemanticKey::CtrlAlt(c) => {
                let mut v = ESC.to_vec();
                v.push(*c as u8 - b'a' + 1);
                v
            }
            SemanticKey::CtrlAltDelete => CTRL_ALT_DELETE.to_vec(),
        }
    }
}

/// `name → SemanticKey`, used by `parse_and_bind`. Case is normalized by the
/// caller before lookup.
///
/// This is the *complete* table. An earlier duplicated code path once kept a
/// second, truncated copy of this map that drifted out of sync with itself
/// (two `"ctrl-d"` entries, one shadowing the other); there is only ever one
/// map here, so that class of bug can't recur.
pub static KEY_NAME_MAP: LazyLock<HashMap<String, SemanticKey>> = LazyLock::new(|| {
    let mut m = HashMap::new();
    m.insert("cr".to_string(), SemanticKey::Cr);
    m.insert("lf".to_string(), SemanticKey::Lf);
    m.insert("tab".to_string(), SemanticKey::Tab);
    m.insert("up".to_string(), SemanticKey::Up);
    m.insert("down".to_string(), SemanticKey::Down);
    m.insert("page-up".to_string(), SemanticKey::PageUp);
    m.insert("page-down".to_string(), SemanticKey::PageDown);
    m.insert("insert".to_string(), SemanticKey::Insert);
    m.insert("delete".to_string(), SemanticKey::Delete);
    m.insert("backspace".to_string(), SemanticKey::Backspace);
    m.insert("home".to_string(), SemanticKey::Home);
    m.insert("end".to_string(), SemanticKey::End);
    m.insert("left".to_string(), SemanticKey::Left);
    m.insert("right".to_string(), SemanticKey::Right);
    m.insert("esc".to_string(), SemanticKey::Esc);
    m.insert("escape".to_string(), SemanticKey::Esc);
    m.insert("ctrl-alt-delete".to_string(), SemanticKey::CtrlAltDelete);

    for c in 'a'..='z' {
        if c == 'h' || c == 'i' || c == 'j' || c == 'm' {
            // ctrl-h/i/j/m alias backspace/tab/lf/cr; the canonical names
            // above win, matching the original table's comments.
            continue;
        }
        m.insert(format!("ctrl-{c}"), SemanticKey::Ctrl(c));
        m.insert(format!("alt-{c}"), SemanticKey::Alt(c));
        m.insert(format!("ctrl-alt-{c}"), SemanticKey::CtrlAlt(c));
    }
    m
});

/// Look up a key by its `parse_and_bind` name (already lower-cased).
pub fn key_by_name(name: &str) -> Option<SemanticKey> {
    KEY_NAME_MAP.get(name).copied()
}
