//! Keyboard chords for structural edits.
//!
//! A modifier keydown starts a chord; the next terminal key completes it and
//! is looked up in the [`Keymap`]. The acting path is asked from a
//! [`FocusResolver`] only once a chord resolves to an action, so the action
//! always runs against whatever field holds focus at that moment.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use indexmap::IndexMap;
use json_editor_pointer::Path;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::edit::{AnchorScope, CopyScope};

/// How long a started chord waits for its terminal key.
pub const DEFAULT_CHORD_TIMEOUT_MS: u64 = 1000;

bitflags! {
    /// Modifier keys held during a keydown.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const CTRL = 0b0001;
        const ALT = 0b0010;
        const SHIFT = 0b0100;
        const META = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Mac,
    Other,
}

impl Platform {
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Platform::Mac
        } else {
            Platform::Other
        }
    }

    /// The key written as `mod` in chord strings.
    pub fn mod_key(self) -> Modifiers {
        match self {
            Platform::Mac => Modifiers::META,
            Platform::Other => Modifiers::CTRL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,
    /// A bare modifier press.
    Modifier(Modifiers),
}

impl Key {
    fn parse(token: &str) -> Option<Key> {
        let key = match token {
            "up" => Key::Up,
            "down" => Key::Down,
            "left" => Key::Left,
            "right" => Key::Right,
            "backspace" => Key::Backspace,
            "del" | "delete" => Key::Delete,
            "enter" | "return" => Key::Enter,
            "tab" => Key::Tab,
            "esc" | "escape" => Key::Escape,
            "space" => Key::Char(' '),
            "plus" => Key::Char('+'),
            _ => {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Key::Char(c),
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(' ') => f.write_str("space"),
            Key::Char('+') => f.write_str("plus"),
            Key::Char(c) => write!(f, "{c}"),
            Key::Up => f.write_str("up"),
            Key::Down => f.write_str("down"),
            Key::Left => f.write_str("left"),
            Key::Right => f.write_str("right"),
            Key::Backspace => f.write_str("backspace"),
            Key::Delete => f.write_str("delete"),
            Key::Enter => f.write_str("enter"),
            Key::Tab => f.write_str("tab"),
            Key::Escape => f.write_str("escape"),
            Key::Modifier(m) => write!(f, "{m:?}"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChordError {
    #[error("empty chord")]
    Empty,
    #[error("chord {0:?} has no terminal key")]
    MissingKey(String),
    #[error("chord {chord:?} has unknown key {token:?}")]
    UnknownKey { chord: String, token: String },
    #[error("chord {0:?} has more than one terminal key")]
    MultipleKeys(String),
}

/// A set of modifiers plus one terminal key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chord {
    pub modifiers: Modifiers,
    pub key: Key,
}

impl Chord {
    pub fn new(modifiers: Modifiers, key: Key) -> Self {
        Self { modifiers, key }
    }

    /// Parses strings such as `mod+shift+a` or `alt+c`. `mod` means the
    /// platform's command key.
    pub fn parse(chord: &str, platform: Platform) -> Result<Chord, ChordError> {
        let chord = chord.trim();
        if chord.is_empty() {
            return Err(ChordError::Empty);
        }
        let mut modifiers = Modifiers::empty();
        let mut key = None;
        for token in chord.split('+').map(|t| t.trim().to_ascii_lowercase()) {
            let modifier = match token.as_str() {
                "mod" => Some(platform.mod_key()),
                "ctrl" | "control" => Some(Modifiers::CTRL),
                "alt" | "option" => Some(Modifiers::ALT),
                "shift" => Some(Modifiers::SHIFT),
                "meta" | "cmd" | "command" => Some(Modifiers::META),
                _ => None,
            };
            if let Some(modifier) = modifier {
                modifiers |= modifier;
                continue;
            }
            if key.is_some() {
                return Err(ChordError::MultipleKeys(chord.to_owned()));
            }
            key = Some(Key::parse(&token).ok_or_else(|| ChordError::UnknownKey {
                chord: chord.to_owned(),
                token: token.clone(),
            })?);
        }
        let key = key.ok_or_else(|| ChordError::MissingKey(chord.to_owned()))?;
        Ok(Chord { modifiers, key })
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, name) in [
            (Modifiers::CTRL, "ctrl"),
            (Modifiers::ALT, "alt"),
            (Modifiers::SHIFT, "shift"),
            (Modifiers::META, "meta"),
        ] {
            if self.modifiers.contains(flag) {
                write!(f, "{name}+")?;
            }
        }
        write!(f, "{}", self.key)
    }
}

/// Editor actions reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorAction {
    AddRow,
    AddRowToRoot,
    CopyRow,
    CopyRowFromRoot,
    CopyRecord,
    MoveUp,
    MoveDown,
    Delete,
}

impl EditorAction {
    pub const ALL: [EditorAction; 8] = [
        EditorAction::AddRow,
        EditorAction::AddRowToRoot,
        EditorAction::CopyRow,
        EditorAction::CopyRowFromRoot,
        EditorAction::CopyRecord,
        EditorAction::MoveUp,
        EditorAction::MoveDown,
        EditorAction::Delete,
    ];

    /// Name used in the shortcut override table.
    pub fn name(self) -> &'static str {
        match self {
            EditorAction::AddRow => "addRow",
            EditorAction::AddRowToRoot => "addRowToRoot",
            EditorAction::CopyRow => "copyRow",
            EditorAction::CopyRowFromRoot => "copyRowFromRoot",
            EditorAction::CopyRecord => "copyRecord",
            EditorAction::MoveUp => "moveUp",
            EditorAction::MoveDown => "moveDown",
            EditorAction::Delete => "delete",
        }
    }

    pub fn from_name(name: &str) -> Option<EditorAction> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }

    pub fn default_chord(self) -> &'static str {
        match self {
            EditorAction::AddRow => "alt+a",
            EditorAction::AddRowToRoot => "mod+shift+a",
            EditorAction::CopyRow => "mod+shift+b",
            EditorAction::CopyRowFromRoot => "alt+c",
            EditorAction::CopyRecord => "mod+alt+r",
            EditorAction::MoveUp => "mod+shift+up",
            EditorAction::MoveDown => "mod+shift+down",
            EditorAction::Delete => "mod+backspace",
        }
    }

    /// Row the action anchors on.
    pub fn anchor_scope(self) -> AnchorScope {
        match self {
            EditorAction::AddRowToRoot
            | EditorAction::CopyRowFromRoot
            | EditorAction::CopyRecord => AnchorScope::Root,
            _ => AnchorScope::Nearest,
        }
    }

    pub fn copy_scope(self) -> Option<CopyScope> {
        match self {
            EditorAction::CopyRow | EditorAction::CopyRowFromRoot => Some(CopyScope::Field),
            EditorAction::CopyRecord => Some(CopyScope::Record),
            _ => None,
        }
    }
}

impl FromStr for EditorAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EditorAction::from_name(s).ok_or_else(|| format!("unknown editor action {s:?}"))
    }
}

/// One entry of the shortcut override table: `{"key": "mod+shift+x"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutOverride {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: Vec<(Chord, EditorAction)>,
}

impl Keymap {
    pub fn defaults(platform: Platform) -> Result<Keymap, ChordError> {
        Self::new(platform, &IndexMap::new())
    }

    /// Default bindings with `overrides` replacing the chord of the named
    /// actions. Unknown action names are logged and skipped.
    pub fn new(
        platform: Platform,
        overrides: &IndexMap<String, ShortcutOverride>,
    ) -> Result<Keymap, ChordError> {
        for name in overrides.keys() {
            if EditorAction::from_name(name).is_none() {
                tracing::warn!(action = %name, "ignoring override for unknown shortcut action");
            }
        }
        let mut bindings = Vec::with_capacity(EditorAction::ALL.len());
        for action in EditorAction::ALL {
            let chord = match overrides.get(action.name()) {
                Some(custom) => custom.key.as_str(),
                None => action.default_chord(),
            };
            let chord = Chord::parse(chord, platform)?;
            if let Some((_, other)) = bindings.iter().find(|(c, _)| *c == chord) {
                tracing::warn!(%chord, ?action, shadowed_by = ?other, "duplicate shortcut");
            }
            bindings.push((chord, action));
        }
        Ok(Keymap { bindings })
    }

    pub fn lookup(&self, chord: &Chord) -> Option<EditorAction> {
        self.bindings
            .iter()
            .find(|(bound, _)| bound == chord)
            .map(|(_, action)| *action)
    }

    pub fn chord_for(&self, action: EditorAction) -> Option<&Chord> {
        self.bindings
            .iter()
            .find(|(_, bound)| *bound == action)
            .map(|(chord, _)| chord)
    }
}

/// Supplies the path of the field holding focus.
pub trait FocusResolver {
    fn focused_path(&self) -> Option<Path>;
}

impl<F> FocusResolver for F
where
    F: Fn() -> Option<Path>,
{
    fn focused_path(&self) -> Option<Path> {
        self()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub time_ms: u64,
}

impl KeyEvent {
    pub fn new(key: Key, modifiers: Modifiers, time_ms: u64) -> Self {
        Self {
            key,
            modifiers,
            time_ms,
        }
    }

    /// Keydown of a chord's terminal key with the chord's modifiers held.
    pub fn chord(chord: &Chord, time_ms: u64) -> Self {
        Self::new(chord.key.clone(), chord.modifiers, time_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    Idle,
    Matching { modifiers: Modifiers, started_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A chord was started; the key was consumed.
    Pending,
    Action { action: EditorAction, path: Path },
    /// Not a shortcut; the view handles the key normally.
    PassThrough,
}

#[derive(Debug, Clone)]
pub struct ShortcutDispatcher {
    keymap: Keymap,
    state: MatchState,
    timeout_ms: u64,
}

impl ShortcutDispatcher {
    pub fn new(keymap: Keymap) -> Self {
        Self {
            keymap,
            state: MatchState::Idle,
            timeout_ms: DEFAULT_CHORD_TIMEOUT_MS,
        }
    }

    pub fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    /// Handles a keydown. The chord is read from `event.modifiers`, the set
    /// held when the terminal key goes down; earlier modifier keydowns only
    /// start the chord and its timeout.
    pub fn key_down(&mut self, event: &KeyEvent, focus: &dyn FocusResolver) -> Dispatch {
        self.tick(event.time_ms);
        if let Key::Modifier(modifier) = &event.key {
            self.state = MatchState::Matching {
                modifiers: event.modifiers | *modifier,
                started_ms: event.time_ms,
            };
            return Dispatch::Pending;
        }
        self.state = MatchState::Idle;
        let key = match &event.key {
            Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
            other => other.clone(),
        };
        let chord = Chord::new(event.modifiers, key);
        let Some(action) = self.keymap.lookup(&chord) else {
            return Dispatch::PassThrough;
        };
        match focus.focused_path() {
            Some(path) => {
                tracing::debug!(%chord, ?action, "shortcut matched");
                Dispatch::Action { action, path }
            }
            None => {
                tracing::debug!(%chord, ?action, "shortcut without focused field");
                Dispatch::PassThrough
            }
        }
    }

    /// Handles a keyup. Releasing the last held modifier abandons the chord.
    pub fn key_up(&mut self, event: &KeyEvent) {
        let MatchState::Matching { modifiers, started_ms } = self.state else {
            return;
        };
        let released = match &event.key {
            Key::Modifier(modifier) => *modifier,
            _ => return,
        };
        let held = modifiers.difference(released);
        self.state = if held.is_empty() {
            MatchState::Idle
        } else {
            MatchState::Matching {
                modifiers: held,
                started_ms,
            }
        };
    }

    /// Expires a chord that has waited longer than the timeout.
    pub fn tick(&mut self, now_ms: u64) {
        if let MatchState::Matching { started_ms, .. } = self.state {
            if now_ms.saturating_sub(started_ms) > self.timeout_ms {
                tracing::debug!(started_ms, now_ms, "chord timed out");
                self.state = MatchState::Idle;
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = MatchState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use json_editor_pointer::parse_path;

    fn focused() -> Option<Path> {
        Some(parse_path("/keywords/0/value"))
    }

    #[test]
    fn test_parse_chords() {
        let chord = Chord::parse("mod+shift+a", Platform::Mac).unwrap();
        assert_eq!(chord.modifiers, Modifiers::META | Modifiers::SHIFT);
        assert_eq!(chord.key, Key::Char('a'));
        let chord = Chord::parse("Mod + Backspace", Platform::Other).unwrap();
        assert_eq!(chord, Chord::new(Modifiers::CTRL, Key::Backspace));
        assert_eq!(chord.to_string(), "ctrl+backspace");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Chord::parse("  ", Platform::Other), Err(ChordError::Empty));
        assert_eq!(
            Chord::parse("mod+shift", Platform::Other),
            Err(ChordError::MissingKey("mod+shift".into()))
        );
        assert_eq!(
            Chord::parse("alt+a+b", Platform::Other),
            Err(ChordError::MultipleKeys("alt+a+b".into()))
        );
        assert!(matches!(
            Chord::parse("alt+pageup", Platform::Other),
            Err(ChordError::UnknownKey { .. })
        ));
    }

    #[test]
    fn test_action_names() {
        for action in EditorAction::ALL {
            assert_eq!(action.name().parse::<EditorAction>(), Ok(action));
        }
        assert!("nope".parse::<EditorAction>().is_err());
    }

    #[test]
    fn test_modifier_then_key() {
        let mut d = ShortcutDispatcher::new(Keymap::defaults(Platform::Other).unwrap());
        let alt = KeyEvent::new(Key::Modifier(Modifiers::ALT), Modifiers::ALT, 0);
        assert_eq!(d.key_down(&alt, &focused), Dispatch::Pending);
        let a = KeyEvent::new(Key::Char('a'), Modifiers::ALT, 10);
        assert_eq!(
            d.key_down(&a, &focused),
            Dispatch::Action {
                action: EditorAction::AddRow,
                path: parse_path("/keywords/0/value")
            }
        );
        assert_eq!(d.state(), MatchState::Idle);
    }

    #[test]
    fn test_timeout_drops_held_modifiers() {
        let mut d = ShortcutDispatcher::new(Keymap::defaults(Platform::Other).unwrap());
        d.key_down(&KeyEvent::new(Key::Modifier(Modifiers::ALT), Modifiers::ALT, 0), &focused);
        d.tick(DEFAULT_CHORD_TIMEOUT_MS + 1);
        assert_eq!(d.state(), MatchState::Idle);
        let a = KeyEvent::new(Key::Char('a'), Modifiers::empty(), 1500);
        assert_eq!(d.key_down(&a, &focused), Dispatch::PassThrough);
    }

    #[test]
    fn test_released_modifier_is_not_carried() {
        let mut d = ShortcutDispatcher::new(Keymap::defaults(Platform::Other).unwrap());
        let alt = KeyEvent::new(Key::Modifier(Modifiers::ALT), Modifiers::ALT, 0);
        d.key_down(&alt, &focused);
        d.key_up(&KeyEvent::new(Key::Modifier(Modifiers::ALT), Modifiers::empty(), 100));
        assert_eq!(d.state(), MatchState::Idle);
        let a = KeyEvent::new(Key::Char('a'), Modifiers::empty(), 300);
        assert_eq!(d.key_down(&a, &focused), Dispatch::PassThrough);
    }

    #[test]
    fn test_uppercase_char_matches_lowercase_binding() {
        let mut d = ShortcutDispatcher::new(Keymap::defaults(Platform::Other).unwrap());
        let shifted = KeyEvent::new(Key::Char('A'), Modifiers::CTRL | Modifiers::SHIFT, 0);
        assert!(matches!(
            d.key_down(&shifted, &focused),
            Dispatch::Action {
                action: EditorAction::AddRowToRoot,
                ..
            }
        ));
    }

    #[test]
    fn test_no_focus_passes_through() {
        let mut d = ShortcutDispatcher::new(Keymap::defaults(Platform::Other).unwrap());
        let nothing = || -> Option<Path> { None };
        let ev = KeyEvent::chord(&Chord::parse("alt+a", Platform::Other).unwrap(), 0);
        assert_eq!(d.key_down(&ev, &nothing), Dispatch::PassThrough);
    }
}
