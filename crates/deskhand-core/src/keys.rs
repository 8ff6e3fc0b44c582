//! Logical key identifiers and the case-insensitive name table.
//!
//! Every backend maps a [`Key`] to its native identifier with an exhaustive
//! `match`, so the set of keys here is exactly the set every backend supports.

use crate::error::{DeskError, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Enter,
    Escape,
    Tab,
    Space,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    CapsLock,
    F(u8),
    Control,
    RightControl,
    Shift,
    RightShift,
    Alt,
    Meta,
    /// A character key on the unshifted US layout: `a`-`z`, `0`-`9` and
    /// ``- = [ ] ; ' ` \ , . /``.
    Char(char),
}

/// Word aliases accepted in addition to the characters themselves.
const CHAR_ALIASES: &[(&str, char)] = &[
    ("minus", '-'),
    ("equal", '='),
    ("leftbracket", '['),
    ("rightbracket", ']'),
    ("semicolon", ';'),
    ("quote", '\''),
    ("grave", '`'),
    ("backslash", '\\'),
    ("comma", ','),
    ("period", '.'),
    ("slash", '/'),
];

const NAMED: &[(&str, Key)] = &[
    ("enter", Key::Enter),
    ("return", Key::Enter),
    ("escape", Key::Escape),
    ("esc", Key::Escape),
    ("tab", Key::Tab),
    ("space", Key::Space),
    ("backspace", Key::Backspace),
    ("delete", Key::Delete),
    ("del", Key::Delete),
    ("home", Key::Home),
    ("end", Key::End),
    ("pageup", Key::PageUp),
    ("pagedown", Key::PageDown),
    ("up", Key::Up),
    ("down", Key::Down),
    ("left", Key::Left),
    ("right", Key::Right),
    ("capslock", Key::CapsLock),
    ("control", Key::Control),
    ("ctrl", Key::Control),
    ("leftcontrol", Key::Control),
    ("leftctrl", Key::Control),
    ("rightcontrol", Key::RightControl),
    ("rightctrl", Key::RightControl),
    ("shift", Key::Shift),
    ("leftshift", Key::Shift),
    ("rightshift", Key::RightShift),
    ("alt", Key::Alt),
    ("leftalt", Key::Alt),
    ("option", Key::Alt),
    ("meta", Key::Meta),
    ("super", Key::Meta),
    ("leftsuper", Key::Meta),
    ("cmd", Key::Meta),
    ("command", Key::Meta),
    ("leftcmd", Key::Meta),
    ("win", Key::Meta),
    ("windows", Key::Meta),
    ("leftwin", Key::Meta),
];

const MAX_FUNCTION_KEY: u8 = 12;

impl Key {
    /// Resolve a key name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Result<Key> {
        let lower = name.trim().to_ascii_lowercase();
        if let Some((_, key)) = NAMED.iter().find(|(n, _)| *n == lower) {
            return Ok(*key);
        }
        if let Some((_, c)) = CHAR_ALIASES.iter().find(|(n, _)| *n == lower) {
            return Ok(Key::Char(*c));
        }
        if let Some(n) = lower.strip_prefix('f').and_then(|d| d.parse::<u8>().ok()) {
            if (1..=MAX_FUNCTION_KEY).contains(&n) {
                return Ok(Key::F(n));
            }
        }
        if let Some(d) = lower.strip_prefix("num") {
            if let [c] = d.as_bytes() {
                if c.is_ascii_digit() {
                    return Ok(Key::Char(*c as char));
                }
            }
        }
        let mut chars = lower.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if is_char_key(c) {
                return Ok(Key::Char(c));
            }
        }
        // `name` may be all whitespace, e.g. " "
        if name == " " {
            return Ok(Key::Space);
        }
        Err(DeskError::UnresolvableKey(name.to_string()))
    }

    /// All accepted names, for listing. Single characters are not included.
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = NAMED.iter().map(|(n, _)| *n).collect();
        names.extend(CHAR_ALIASES.iter().map(|(n, _)| *n));
        names
    }

    /// Whether this key is a modifier (control, shift, alt, meta).
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Key::Control
                | Key::RightControl
                | Key::Shift
                | Key::RightShift
                | Key::Alt
                | Key::Meta
        )
    }
}

fn is_char_key(c: char) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || matches!(c, '-' | '=' | '[' | ']' | ';' | '\'' | '`' | '\\' | ',' | '.' | '/')
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::F(n) => write!(f, "f{n}"),
            Key::Char(c) => write!(f, "{c}"),
            other => {
                let name = NAMED
                    .iter()
                    .find(|(_, k)| k == other)
                    .map(|(n, _)| *n)
                    .unwrap_or("?");
                f.write_str(name)
            }
        }
    }
}

impl std::str::FromStr for Key {
    type Err = DeskError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Key::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_is_case_insensitive() {
        let expected = Key::Enter;
        for name in ["ENTER", "enter", "Enter", "Return"] {
            assert_eq!(Key::from_name(name).unwrap(), expected, "{name}");
        }
    }

    #[test]
    fn letters_fold_to_lowercase() {
        assert_eq!(Key::from_name("A").unwrap(), Key::Char('a'));
        assert_eq!(Key::from_name("a").unwrap(), Key::Char('a'));
    }

    #[test]
    fn modifiers_and_aliases() {
        assert_eq!(Key::from_name("Ctrl").unwrap(), Key::Control);
        assert_eq!(Key::from_name("LeftControl").unwrap(), Key::Control);
        assert_eq!(Key::from_name("RightShift").unwrap(), Key::RightShift);
        assert_eq!(Key::from_name("super").unwrap(), Key::Meta);
        assert!(Key::Meta.is_modifier());
        assert!(!Key::Char('c').is_modifier());
    }

    #[test]
    fn function_keys_in_range_only() {
        assert_eq!(Key::from_name("F1").unwrap(), Key::F(1));
        assert_eq!(Key::from_name("f12").unwrap(), Key::F(12));
        assert!(Key::from_name("f13").is_err());
        assert!(Key::from_name("f0").is_err());
    }

    #[test]
    fn punctuation_and_word_aliases() {
        assert_eq!(Key::from_name("Num7").unwrap(), Key::Char('7'));
        assert_eq!(Key::from_name("7").unwrap(), Key::Char('7'));
        assert_eq!(Key::from_name("Slash").unwrap(), Key::Char('/'));
        assert_eq!(Key::from_name("/").unwrap(), Key::Char('/'));
        assert_eq!(Key::from_name(" ").unwrap(), Key::Space);
    }

    #[test]
    fn unknown_names_are_errors() {
        for name in ["", "hyper", "!", "é", "ctrl+c"] {
            let err = Key::from_name(name).unwrap_err();
            assert!(
                matches!(err, DeskError::UnresolvableKey(ref n) if n == name),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn every_listed_name_resolves() {
        for name in Key::names() {
            assert!(Key::from_name(name).is_ok(), "{name}");
            assert!(Key::from_name(&name.to_ascii_uppercase()).is_ok(), "{name}");
        }
    }

    #[test]
    fn display_round_trips() {
        for key in [Key::Enter, Key::F(5), Key::Char('x'), Key::PageDown] {
            assert_eq!(Key::from_name(&key.to_string()).unwrap(), key);
        }
    }
}
