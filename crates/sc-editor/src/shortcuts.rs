//! Keyboard bindings for the canvas.
//!
//! A binding is a chord (command and shift state) plus the
//! `KeyboardEvent.key` values that trigger it. "Command" is ⌘ on macOS and
//! Ctrl elsewhere; either counts.

use crate::input::{KeyTarget, Modifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    Delete,
    SendBackward,
    BringForward,
    SendToBack,
    BringToFront,
    /// Escape: drop the selection.
    Deselect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chord {
    Plain,
    Command,
    CommandShift,
}

impl Chord {
    /// Alt is ignored. Shift without command binds nothing.
    fn of(modifiers: Modifiers) -> Option<Self> {
        match (modifiers.command(), modifiers.shift) {
            (true, true) => Some(Self::CommandShift),
            (true, false) => Some(Self::Command),
            (false, false) => Some(Self::Plain),
            (false, true) => None,
        }
    }
}

/// Shift changes the reported key (`z` → `Z`, `[` → `{`), so shifted
/// bindings list both spellings.
const BINDINGS: &[(Chord, &[&str], ShortcutAction)] = &[
    (Chord::Plain, &["Delete", "Backspace"], ShortcutAction::Delete),
    (Chord::Plain, &["Escape"], ShortcutAction::Deselect),
    (Chord::Command, &["z", "Z"], ShortcutAction::Undo),
    (Chord::Command, &["y", "Y"], ShortcutAction::Redo),
    (Chord::Command, &["["], ShortcutAction::SendBackward),
    (Chord::Command, &["]"], ShortcutAction::BringForward),
    (Chord::CommandShift, &["z", "Z"], ShortcutAction::Redo),
    (Chord::CommandShift, &["[", "{"], ShortcutAction::SendToBack),
    (Chord::CommandShift, &["]", "}"], ShortcutAction::BringToFront),
];

pub struct ShortcutMap;

impl ShortcutMap {
    /// Look up the binding for `key` under `modifiers`.
    pub fn resolve(key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        let chord = Chord::of(modifiers)?;
        BINDINGS
            .iter()
            .find(|(c, keys, _)| *c == chord && keys.contains(&key))
            .map(|&(_, _, action)| action)
    }

    /// Keys typed into text inputs, text areas and content-editable regions
    /// belong to the field: Backspace deletes a character there and Cmd+Z
    /// undoes typing.
    pub fn resolve_for(target: KeyTarget, key: &str, modifiers: Modifiers) -> Option<ShortcutAction> {
        if target.is_editable() {
            return None;
        }
        Self::resolve(key, modifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn mods(ctrl: bool, shift: bool, meta: bool) -> Modifiers {
        Modifiers {
            ctrl,
            shift,
            meta,
            ..Modifiers::NONE
        }
    }

    #[test]
    fn history_bindings() {
        let cases = [
            ("z", mods(false, false, true), Some(ShortcutAction::Undo)),
            ("z", mods(true, false, false), Some(ShortcutAction::Undo)),
            ("Z", mods(false, true, true), Some(ShortcutAction::Redo)),
            ("z", mods(true, true, false), Some(ShortcutAction::Redo)),
            ("y", mods(true, false, false), Some(ShortcutAction::Redo)),
            ("z", Modifiers::NONE, None),
        ];
        for (key, m, expected) in cases {
            assert_eq!(ShortcutMap::resolve(key, m), expected, "{key} {m:?}");
        }
    }

    #[test]
    fn z_order_bindings() {
        assert_eq!(ShortcutMap::resolve("[", mods(false, false, true)), Some(ShortcutAction::SendBackward));
        assert_eq!(ShortcutMap::resolve("]", mods(true, false, false)), Some(ShortcutAction::BringForward));
        assert_eq!(ShortcutMap::resolve("{", mods(false, true, true)), Some(ShortcutAction::SendToBack));
        assert_eq!(ShortcutMap::resolve("]", mods(true, true, false)), Some(ShortcutAction::BringToFront));
    }

    #[test]
    fn plain_keys() {
        assert_eq!(ShortcutMap::resolve("Backspace", Modifiers::NONE), Some(ShortcutAction::Delete));
        assert_eq!(ShortcutMap::resolve("Delete", Modifiers::NONE), Some(ShortcutAction::Delete));
        assert_eq!(ShortcutMap::resolve("Escape", Modifiers::NONE), Some(ShortcutAction::Deselect));
        assert_eq!(ShortcutMap::resolve("Delete", mods(false, true, false)), None);
        assert_eq!(ShortcutMap::resolve("q", Modifiers::NONE), None);
    }

    #[test]
    fn editable_targets_resolve_nothing() {
        let cmd = mods(false, false, true);
        for target in [KeyTarget::TextInput, KeyTarget::TextArea, KeyTarget::ContentEditable] {
            assert_eq!(ShortcutMap::resolve_for(target, "Backspace", Modifiers::NONE), None);
            assert_eq!(ShortcutMap::resolve_for(target, "z", cmd), None);
        }
        assert_eq!(
            ShortcutMap::resolve_for(KeyTarget::Canvas, "Backspace", Modifiers::NONE),
            Some(ShortcutAction::Delete)
        );
    }
}
