use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use deskhand_core::{DeskError, Key, MouseButton, Result};
use enigo::{Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::backend::InputBackend;

const BACKEND: &str = "native";

// ─── NativeBackend ────────────────────────────────────────────────────────

/// In-process virtual input through `enigo`.
///
/// The `Enigo` handle lives on one dedicated OS thread. Calls are queued to
/// it over a channel and answered through a oneshot, so callers observe each
/// call as complete while the async runtime never blocks on the display
/// server. The connection is opened lazily and retried on the next call if
/// it fails.
pub struct NativeBackend {
    tx: mpsc::Sender<Request>,
}

enum Op {
    Key(enigo::Key, Direction),
    Move(i32, i32),
    Click(Button),
    Text(String),
}

struct Request {
    op: Op,
    reply: oneshot::Sender<std::result::Result<(), String>>,
}

impl NativeBackend {
    /// Start the input thread. Never fails; display errors surface per call.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel::<Request>();
        thread::Builder::new()
            .name("deskhand-input".into())
            .spawn(move || input_thread(rx))
            .map(|_| ())
            .unwrap_or_else(|e| warn!(error = %e, "failed to start native input thread"));
        Self { tx }
    }

    async fn submit(&self, op: Op) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request { op, reply })
            .map_err(|_| DeskError::backend(BACKEND, "input thread is not running"))?;
        rx.await
            .map_err(|_| DeskError::backend(BACKEND, "input thread dropped the request"))?
            .map_err(|msg| DeskError::backend(BACKEND, msg))
    }
}

fn input_thread(rx: mpsc::Receiver<Request>) {
    let mut enigo: Option<Enigo> = None;

    while let Ok(Request { op, reply }) = rx.recv() {
        if enigo.is_none() {
            match Enigo::new(&Settings::default()) {
                Ok(e) => {
                    debug!("connected to display for native input");
                    enigo = Some(e);
                }
                Err(e) => {
                    let _ = reply.send(Err(format!("cannot connect to display: {e}")));
                    continue;
                }
            }
        }
        let Some(handle) = enigo.as_mut() else {
            continue;
        };
        let result = apply(handle, op).map_err(|e| e.to_string());
        let _ = reply.send(result);
    }
}

fn apply(enigo: &mut Enigo, op: Op) -> std::result::Result<(), enigo::InputError> {
    match op {
        Op::Key(key, direction) => enigo.key(key, direction),
        Op::Move(x, y) => enigo.move_mouse(x, y, Coordinate::Abs),
        Op::Click(button) => enigo.button(button, Direction::Click),
        Op::Text(text) => enigo.text(&text),
    }
}

/// Map a logical key onto the `enigo` key.
pub(crate) fn native_key(key: Key) -> Result<enigo::Key> {
    use enigo::Key as E;
    Ok(match key {
        Key::Enter => E::Return,
        Key::Escape => E::Escape,
        Key::Tab => E::Tab,
        Key::Space => E::Space,
        Key::Backspace => E::Backspace,
        Key::Delete => E::Delete,
        Key::Home => E::Home,
        Key::End => E::End,
        Key::PageUp => E::PageUp,
        Key::PageDown => E::PageDown,
        Key::Up => E::UpArrow,
        Key::Down => E::DownArrow,
        Key::Left => E::LeftArrow,
        Key::Right => E::RightArrow,
        Key::CapsLock => E::CapsLock,
        Key::F(n) => match n {
            1 => E::F1,
            2 => E::F2,
            3 => E::F3,
            4 => E::F4,
            5 => E::F5,
            6 => E::F6,
            7 => E::F7,
            8 => E::F8,
            9 => E::F9,
            10 => E::F10,
            11 => E::F11,
            12 => E::F12,
            _ => return Err(DeskError::UnresolvableKey(key.to_string())),
        },
        Key::Control => E::Control,
        Key::RightControl => E::RControl,
        Key::Shift => E::Shift,
        Key::RightShift => E::RShift,
        Key::Alt => E::Alt,
        Key::Meta => E::Meta,
        Key::Char(c) => E::Unicode(c),
    })
}

fn native_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
    }
}

#[async_trait]
impl InputBackend for NativeBackend {
    fn name(&self) -> &'static str {
        BACKEND
    }

    async fn press_key(&self, key: Key) -> Result<()> {
        self.submit(Op::Key(native_key(key)?, Direction::Press)).await
    }

    async fn release_key(&self, key: Key) -> Result<()> {
        self.submit(Op::Key(native_key(key)?, Direction::Release))
            .await
    }

    async fn move_to(&self, x: i32, y: i32) -> Result<()> {
        self.submit(Op::Move(x, y)).await
    }

    async fn click(&self, button: MouseButton) -> Result<()> {
        self.submit(Op::Click(native_button(button))).await
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        self.submit(Op::Text(text.to_string())).await
    }
}
