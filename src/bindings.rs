//! Closed operation vocabulary and the SemanticKey → Operation tables
//!. `parse_and_bind` is a pure string→enum lookup, never a
//! dynamic function reference, by design.

use std::collections::HashMap;

use crate::key::{key_by_name, SemanticKey};

/// The full closed set of operations a key may be bound to. An exhaustive
/// match over this, not a dispatch table of closures, drives the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CarriageReturn,
    Newline,
    Delete,
    Complete,
    Backspace,
    LookupBackspace,
    HistoryPrevious,
    HistoryNext,
    HistoryFirst,
    HistoryLast,
    ToggleInsertReplace,
    GotoLineLeft,
    GotoLineRight,
    GotoLineStart,
    GotoLineEnd,
    LineClear,
    LookupBack,
    LookupForward,
    LineCancel,
    LineEof,
    ToggleBell,
    OpenReverseLookup,
    ForwardLookupResult,
    CancelLookupResult,
    None,
}

impl Operation {
    /// Case-insensitive lookup by the operation's binding name.
    pub fn by_name(name: &str) -> Option<Operation> {
        use Operation::*;
        Some(match name.to_ascii_lowercase().as_str() {
            "carriage-return" => CarriageReturn,
            "newline" => Newline,
            "delete" => Delete,
            "complete" => Complete,
            "backspace" => Backspace,
            "lookup-backspace" => LookupBackspace,
            "history-previous" => HistoryPrevious,
            "history-next" => HistoryNext,
            "history-first" => HistoryFirst,
            "history-last" => HistoryLast,
            "toggle-insert-replace" => ToggleInsertReplace,
            "goto-line-left" => GotoLineLeft,
            "goto-line-right" => GotoLineRight,
            "goto-line-start" => GotoLineStart,
            "goto-line-end" => GotoLineEnd,
            "line-clear" => LineClear,
            "lookup-back" => LookupBack,
            "lookup-forward" => LookupForward,
            "line-cancel" => LineCancel,
            "line-eof" => LineEof,
            "toggle-bell" => ToggleBell,
            "open-reverse-lookup" => OpenReverseLookup,
            "forward-lookup-result" => ForwardLookupResult,
            "cancel-lookup-result" => CancelLookupResult,
            "none" => None,
            _ => return Option::None,
        })
    }
}

/// Whether a bound operation, once dispatched in lookup mode, should stay
/// in the reverse-search sub-mode or exit it. Only meaningful for the
/// lookup table; normal-mode bindings ignore this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupDisposition {
    Stay,
    CommitAndDispatch,
    Cancel,
}

pub struct KeyBindings {
    normal: HashMap<SemanticKey, Operation>,
    lookup: HashMap<SemanticKey, Operation>,
}

impl KeyBindings {
    pub fn with_defaults() -> Self {
        let mut normal = HashMap::new();
        use Operation::*;
        use SemanticKey::*;
        normal.insert(Tab, Complete);
        normal.insert(Up, HistoryPrevious);
        normal.insert(Down, HistoryNext);
        normal.insert(PageUp, HistoryFirst);
        normal.insert(PageDown, HistoryLast);
        normal.insert(Insert, ToggleInsertReplace);
        normal.insert(Delete, Operation::Delete);
        normal.insert(Backspace, Operation::Backspace);
        normal.insert(Home, GotoLineStart);
        normal.insert(End, GotoLineEnd);
        normal.insert(Left, GotoLineLeft);
        normal.insert(Right, GotoLineRight);
        normal.insert(Ctrl('a'), GotoLineStart);
        normal.insert(Ctrl('e'), GotoLineEnd);
        normal.insert(Ctrl('l'), LineClear);
        normal.insert(Ctrl('c'), LineCancel);
        normal.insert(Ctrl('d'), LineEof);
        normal.insert(Lf, Newline);
        normal.insert(Cr, CarriageReturn);
        normal.insert(Ctrl('b'), ToggleBell);
        normal.insert(Ctrl('r'), OpenReverseLookup);

        let mut lookup = HashMap::new();
        lookup.insert(Tab, ForwardLookupResult);
        lookup.insert(Esc, CancelLookupResult);
        lookup.insert(Cr, ForwardLookupResult);
        lookup.insert(Lf, ForwardLookupResult);
        lookup.insert(Up, ForwardLookupResult);
        lookup.insert(Down, ForwardLookupResult);
        lookup.insert(Left, ForwardLookupResult);
        lookup.insert(Right, ForwardLookupResult);
        lookup.insert(Home, ForwardLookupResult);
        lookup.insert(End, ForwardLookupResult);
        lookup.insert(Ctrl('r'), LookupBack);
        lookup.insert(Ctrl('s'), LookupForward);
        lookup.insert(Backspace, LookupBackspace);

        KeyBindings { normal, lookup }
    }

    pub fn normal_op(&self, key: SemanticKey) -> Operation {
        self.normal.get(&key).copied().unwrap_or(Operation::None)
    }

    /// `None` means "not explicitly bound": the caller falls back to
    /// "printable keys append to the query".
    pub fn lookup_op(&self, key: SemanticKey) -> Option<Operation> {
        self.lookup.get(&key).copied()
    }

    /// `"key-name: operation-name"`, case-insensitive on both sides.
    /// Unrecognized names on either side are a silent no-op.
    pub fn parse_and_bind(&mut self, binding: &str) {
        let Some((key_part, op_part)) = binding.split_once(':') else {
            return;
        };
        let key_name = key_part.trim().to_ascii_lowercase();
        let op_name = op_part.trim();
        let (Some(key), Some(op)) = (key_by_name(&key_name), Operation::by_name(op_name)) else {
            return;
        };
        self.normal.insert(key, op);
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tab_completes() {
        let b = KeyBindings::with_defaults();
        assert_eq!(b.normal_op(SemanticKey::Tab), Operation::Complete);
    }

    #[test]
    fn unbound_key_is_none_op() {
        let b = KeyBindings::with_defaults();
        assert_eq!(b.normal_op(SemanticKey::Ctrl('t')), Operation::None);
    }

    #[test]
    fn parse_and_bind_rebinds_case_insensitively() {
        let mut b = KeyBindings::with_defaults();
        b.parse_and_bind("CTRL-L: Complete");
        assert_eq!(b.normal_op(SemanticKey::Ctrl('l')), Operation::Complete);
    }

    #[test]
    fn parse_and_bind_ignores_unknown_names() {
        let mut b = KeyBindings::with_defaults();
        b.parse_and_bind("not-a-key: complete");
        b.parse_and_bind("ctrl-l: not-an-operation");
        assert_eq!(b.normal_op(SemanticKey::Ctrl('l')), Operation::LineClear);
    }

    #[test]
    fn lookup_mode_backspace_distinct_from_normal() {
        let b = KeyBindings::with_defaults();
        assert_eq!(
            b.lookup_op(SemanticKey::Backspace),
            Some(Operation::LookupBackspace)
        );
    }
}
