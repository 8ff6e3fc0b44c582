//! Compositor control through external commands.
//!
//! The pointer is positioned through the compositor (`hyprctl dispatch
//! movecursor`) since absolute motion through a virtual pointer device is
//! subject to acceleration. Buttons, keys and text go through `ydotool`,
//! whose daemon keeps key state between invocations, so a key pressed by one
//! process stays down until a later process releases it.

use std::time::Duration;

use async_trait::async_trait;
use deskhand_core::{DeskError, Key, MouseButton, Result};
use tracing::debug;

use crate::backend::InputBackend;
use crate::process::{program_exists, run_tool};

const BACKEND: &str = "shell";

pub struct ShellBackend {
    hyprctl: String,
    ydotool: String,
    timeout: Duration,
}

impl ShellBackend {
    pub fn new(hyprctl: impl Into<String>, ydotool: impl Into<String>, timeout: Duration) -> Self {
        Self {
            hyprctl: hyprctl.into(),
            ydotool: ydotool.into(),
            timeout,
        }
    }

    /// Configured programs that cannot be found.
    pub fn missing_programs(&self) -> Vec<&str> {
        [self.hyprctl.as_str(), self.ydotool.as_str()]
            .into_iter()
            .filter(|p| !program_exists(p))
            .collect()
    }

    async fn run(&self, program: &str, args: Vec<String>) -> Result<()> {
        debug!(program, ?args, "shell input");
        run_tool(program, &args, self.timeout)
            .await
            .map(|_| ())
            .map_err(|e| DeskError::backend(BACKEND, e.to_string()))
    }
}

// ─── Argument builders ────────────────────────────────────────────────────

pub(crate) fn move_args(x: i32, y: i32) -> Vec<String> {
    vec![
        "dispatch".into(),
        "movecursor".into(),
        x.to_string(),
        y.to_string(),
    ]
}

/// `ydotool click` takes a button code with the down (0x40) and up (0x80)
/// bits set: 0xC0 is a full left click, 0xC1 a full right click.
pub(crate) fn click_args(button: MouseButton) -> Vec<String> {
    let code = match button {
        MouseButton::Left => "0xC0",
        MouseButton::Right => "0xC1",
    };
    vec!["click".into(), code.into()]
}

pub(crate) fn key_args(code: u16, pressed: bool) -> Vec<String> {
    vec!["key".into(), format!("{code}:{}", u8::from(pressed))]
}

pub(crate) fn type_args(text: &str) -> Vec<String> {
    vec!["type".into(), "--".into(), escape_text(text)]
}

/// `ydotool type` expands backslash escapes, so a literal backslash must be
/// doubled. Every other character, quotes included, passes through as-is
/// because arguments never go through a shell.
pub fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
}

/// First character `ydotool type` has no key for. It only knows the US
/// layout: printable ASCII plus newline and tab.
pub(crate) fn untypable(text: &str) -> Option<char> {
    text.chars().find(|&c| !matches!(c, ' '..='~' | '\n' | '\t'))
}

/// Linux evdev key code (`linux/input-event-codes.h`) for a logical key.
pub(crate) fn evdev_code(key: Key) -> Result<u16> {
    Ok(match key {
        Key::Escape => 1,
        Key::Backspace => 14,
        Key::Tab => 15,
        Key::Enter => 28,
        Key::Control => 29,
        Key::Shift => 42,
        Key::RightShift => 54,
        Key::Alt => 56,
        Key::Space => 57,
        Key::CapsLock => 58,
        Key::F(n @ 1..=10) => 58 + u16::from(n),
        Key::F(11) => 87,
        Key::F(12) => 88,
        Key::F(_) => return Err(DeskError::UnresolvableKey(key.to_string())),
        Key::RightControl => 97,
        Key::Home => 102,
        Key::Up => 103,
        Key::PageUp => 104,
        Key::Left => 105,
        Key::Right => 106,
        Key::End => 107,
        Key::Down => 108,
        Key::PageDown => 109,
        Key::Delete => 111,
        Key::Meta => 125,
        Key::Char(c) => match c {
            '1'..='9' => 2 + (c as u16 - '1' as u16),
            '0' => 11,
            '-' => 12,
            '=' => 13,
            'q' => 16,
            'w' => 17,
            'e' => 18,
            'r' => 19,
            't' => 20,
            'y' => 21,
            'u' => 22,
            'i' => 23,
            'o' => 24,
            'p' => 25,
            '[' => 26,
            ']' => 27,
            'a' => 30,
            's' => 31,
            'd' => 32,
            'f' => 33,
            'g' => 34,
            'h' => 35,
            'j' => 36,
            'k' => 37,
            'l' => 38,
            ';' => 39,
            '\'' => 40,
            '`' => 41,
            '\\' => 43,
            'z' => 44,
            'x' => 45,
            'c' => 46,
            'v' => 47,
            'b' => 48,
            'n' => 49,
            'm' => 50,
            ',' => 51,
            '.' => 52,
            '/' => 53,
            _ => return Err(DeskError::UnresolvableKey(key.to_string())),
        },
    })
}

#[async_trait]
impl InputBackend for ShellBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn press_key(&self, key: Key) -> Result<()> {
        let code = evdev_code(key)?;
        self.run(&self.ydotool, key_args(code, true)).await
    }

    async fn release_key(&self, key: Key) -> Result<()> {
        let code = evdev_code(key)?;
        self.run(&self.ydotool, key_args(code, false)).await
    }

    async fn move_to(&self, x: i32, y: i32) -> Result<()> {
        self.run(&self.hyprctl, move_args(x, y)).await
    }

    async fn click(&self, button: MouseButton) -> Result<()> {
        self.run(&self.ydotool, click_args(button)).await
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        if let Some(c) = untypable(text) {
            return Err(DeskError::backend(
                BACKEND,
                format!("ydotool cannot type {c:?}; only printable ASCII, newline and tab"),
            ));
        }
        self.run(&self.ydotool, type_args(text)).await
    }
}
