use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use dbnav_core::explorer::ExplorerAction;
use thiserror::Error;

/// Anything a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Explorer(ExplorerAction),
    ToggleHelp,
    Quit,
}

/// Settings name and default keys per command, in help-popup order.
const DEFAULT_BINDINGS: [(&str, Command, &[&str]); 15] = [
    ("move_up", Command::Explorer(ExplorerAction::MoveUp), &["up", "k"]),
    ("move_down", Command::Explorer(ExplorerAction::MoveDown), &["down", "j"]),
    ("page_up", Command::Explorer(ExplorerAction::PageUp), &["pageup", "ctrl+b"]),
    ("page_down", Command::Explorer(ExplorerAction::PageDown), &["pagedown", "ctrl+f"]),
    ("home", Command::Explorer(ExplorerAction::Home), &["home", "g"]),
    ("end", Command::Explorer(ExplorerAction::End), &["end", "G"]),
    ("expand", Command::Explorer(ExplorerAction::Expand), &["right", "l"]),
    ("collapse", Command::Explorer(ExplorerAction::Collapse), &["left", "h"]),
    ("toggle", Command::Explorer(ExplorerAction::Toggle), &["space"]),
    ("activate", Command::Explorer(ExplorerAction::Activate), &["enter"]),
    ("search", Command::Explorer(ExplorerAction::StartSearch), &["/"]),
    ("next_match", Command::Explorer(ExplorerAction::NextMatch), &["n"]),
    ("prev_match", Command::Explorer(ExplorerAction::PrevMatch), &["N"]),
    ("help", Command::ToggleHelp, &["?"]),
    ("quit", Command::Quit, &["q", "ctrl+c"]),
];

impl Command {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        DEFAULT_BINDINGS
            .iter()
            .find(|(candidate, _, _)| *candidate == name)
            .map(|(_, command, _)| *command)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        DEFAULT_BINDINGS
            .iter()
            .find(|(_, command, _)| *command == self)
            .map_or("unknown", |(name, _, _)| name)
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Explorer(ExplorerAction::MoveUp) => "move up",
            Self::Explorer(ExplorerAction::MoveDown) => "move down",
            Self::Explorer(ExplorerAction::PageUp) => "page up",
            Self::Explorer(ExplorerAction::PageDown) => "page down",
            Self::Explorer(ExplorerAction::Home) => "first row",
            Self::Explorer(ExplorerAction::End) => "last row",
            Self::Explorer(ExplorerAction::Expand) => "expand",
            Self::Explorer(ExplorerAction::Collapse) => "collapse / go to parent",
            Self::Explorer(ExplorerAction::Toggle) => "toggle",
            Self::Explorer(ExplorerAction::Activate) => "select column or toggle",
            Self::Explorer(ExplorerAction::StartSearch) => "search",
            Self::Explorer(ExplorerAction::NextMatch) => "next match",
            Self::Explorer(ExplorerAction::PrevMatch) => "previous match",
            Self::ToggleHelp => "toggle help",
            Self::Quit => "quit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeymapError {
    #[error("unknown action `{0}` in key bindings")]
    UnknownAction(String),
    #[error("invalid key `{key}` bound to `{action}`")]
    InvalidKey { action: String, key: String },
}

/// A key plus modifiers, normalized so `N` and `shift+n` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    code: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyBinding {
    #[must_use]
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let mut code = code;
        let mut modifiers =
            modifiers & (KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT);
        if let KeyCode::Char(ch) = code {
            if modifiers.contains(KeyModifiers::SHIFT) {
                code = KeyCode::Char(ch.to_ascii_uppercase());
                modifiers.remove(KeyModifiers::SHIFT);
            }
        }
        Self { code, modifiers }
    }

    /// Parses strings such as `"j"`, `"pagedown"`, `"ctrl+n"` or `"shift+tab"`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let mut modifiers = KeyModifiers::NONE;
        let mut rest = raw;
        while let Some((prefix, tail)) = rest.split_once('+') {
            if tail.is_empty() {
                break;
            }
            match prefix.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                _ => return None,
            }
            rest = tail;
        }

        let mut chars = rest.chars();
        let code = match (chars.next(), chars.next()) {
            (Some(ch), None) => KeyCode::Char(ch),
            _ => match rest.to_ascii_lowercase().as_str() {
                "up" => KeyCode::Up,
                "down" => KeyCode::Down,
                "left" => KeyCode::Left,
                "right" => KeyCode::Right,
                "enter" | "return" => KeyCode::Enter,
                "esc" | "escape" => KeyCode::Esc,
                "tab" => KeyCode::Tab,
                "backspace" => KeyCode::Backspace,
                "space" => KeyCode::Char(' '),
                "pageup" | "pgup" => KeyCode::PageUp,
                "pagedown" | "pgdn" => KeyCode::PageDown,
                "home" => KeyCode::Home,
                "end" => KeyCode::End,
                _ => return None,
            },
        };
        Some(Self::new(code, modifiers))
    }

    #[must_use]
    pub fn from_event(key: KeyEvent) -> Self {
        Self::new(key.code, key.modifiers)
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            f.write_str("ctrl+")?;
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            f.write_str("alt+")?;
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            f.write_str("shift+")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("space"),
            KeyCode::Char(ch) => write!(f, "{ch}"),
            KeyCode::Up => f.write_str("up"),
            KeyCode::Down => f.write_str("down"),
            KeyCode::Left => f.write_str("left"),
            KeyCode::Right => f.write_str("right"),
            KeyCode::Enter => f.write_str("enter"),
            KeyCode::Esc => f.write_str("esc"),
            KeyCode::Tab => f.write_str("tab"),
            KeyCode::Backspace => f.write_str("backspace"),
            KeyCode::PageUp => f.write_str("pageup"),
            KeyCode::PageDown => f.write_str("pagedown"),
            KeyCode::Home => f.write_str("home"),
            KeyCode::End => f.write_str("end"),
            other => write!(f, "{other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: HashMap<KeyBinding, Command>,
}

impl Default for Keymap {
    fn default() -> Self {
        let mut bindings = HashMap::new();
        for (_, command, keys) in DEFAULT_BINDINGS {
            for key in keys {
                if let Some(binding) = KeyBinding::parse(key) {
                    bindings.insert(binding, command);
                }
            }
        }
        Self { bindings }
    }
}

impl Keymap {
    /// Defaults with the `[keys]` table from settings applied on top. An action
    /// listed there loses its default keys.
    pub fn from_overrides(overrides: &BTreeMap<String, Vec<String>>) -> Result<Self, KeymapError> {
        let mut keymap = Self::default();
        for (action, keys) in overrides {
            let command = Command::from_name(action)
                .ok_or_else(|| KeymapError::UnknownAction(action.clone()))?;
            keymap.bindings.retain(|_, bound| *bound != command);
            for key in keys {
                let binding = KeyBinding::parse(key).ok_or_else(|| KeymapError::InvalidKey {
                    action: action.clone(),
                    key: key.clone(),
                })?;
                if let Some(previous) = keymap.bindings.insert(binding, command) {
                    log::info!(
                        "key `{binding}` rebound from {} to {}",
                        previous.name(),
                        command.name()
                    );
                }
            }
        }
        Ok(keymap)
    }

    #[must_use]
    pub fn lookup(&self, key: KeyEvent) -> Option<Command> {
        self.bindings.get(&KeyBinding::from_event(key)).copied()
    }

    /// Keys bound to `command`, sorted for display.
    #[must_use]
    pub fn keys_for(&self, command: Command) -> Vec<String> {
        let mut keys = self
            .bindings
            .iter()
            .filter(|(_, bound)| **bound == command)
            .map(|(binding, _)| binding.to_string())
            .collect::<Vec<_>>();
        keys.sort();
        keys
    }

    /// Every command with its keys, in help order.
    #[must_use]
    pub fn help_entries(&self) -> Vec<(Command, Vec<String>)> {
        DEFAULT_BINDINGS
            .iter()
            .map(|(_, command, _)| (*command, self.keys_for(*command)))
            .collect()
    }
}
