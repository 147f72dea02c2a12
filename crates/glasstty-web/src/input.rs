//! Keyboard input: DOM key normalization and VT byte encoding.
//!
//! The web host captures `keydown` events and hands them over as a small
//! JSON object (`{"key": "...", "mods": N}`); this module normalizes the
//! DOM `key` string into a [`KeyCode`] and encodes the result as the byte
//! sequence a PTY expects. The encoding table is a contract shared with
//! the terminal engine's own replies: everything leaves through the same
//! keyboard-output channel.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modifier keys held during a key event, encoded as a compact bitset
    /// in the JSON bridge.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

/// Normalized key identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character (what the DOM reports for ordinary keys).
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
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
    /// Function key F1..=F12. Other numbers encode to nothing.
    F(u8),
    /// Anything we do not recognize; encodes to nothing.
    Unidentified,
}

impl KeyCode {
    /// Normalize a DOM `KeyboardEvent.key` value.
    ///
    /// Single-character values are printable input; the named values cover
    /// the editing and navigation keys the encoding table speaks for.
    #[must_use]
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "Enter" => Self::Enter,
            "Escape" => Self::Escape,
            "Backspace" => Self::Backspace,
            "Tab" => Self::Tab,
            "Delete" => Self::Delete,
            "Insert" => Self::Insert,
            "Home" => Self::Home,
            "End" => Self::End,
            "PageUp" => Self::PageUp,
            "PageDown" => Self::PageDown,
            "ArrowUp" => Self::Up,
            "ArrowDown" => Self::Down,
            "ArrowLeft" => Self::Left,
            "ArrowRight" => Self::Right,
            _ => {
                if let Some(n) = parse_function_key(key) {
                    return Self::F(n);
                }
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Self::Char(ch),
                    _ => Self::Unidentified,
                }
            }
        }
    }
}

fn parse_function_key(key: &str) -> Option<u8> {
    let digits = key.strip_prefix('F')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// A key event as delivered over the JSON bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// The DOM `key` value.
    pub key: String,
    /// Modifier bitset ([`Modifiers`] bits).
    #[serde(default)]
    pub mods: u8,
}

impl KeyEvent {
    /// Normalize and encode in one step.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode_key(
            &KeyCode::from_dom_key(&self.key),
            Modifiers::from_bits_truncate(self.mods),
        )
    }
}

/// Parse a JSON key event and encode it. Returns `None` when the JSON does
/// not describe a key event.
#[must_use]
pub fn encode_key_json(json: &str) -> Option<Vec<u8>> {
    let event: KeyEvent = serde_json::from_str(json).ok()?;
    Some(event.encode())
}

/// Encode one normalized key press into the byte sequence the PTY expects.
///
/// Unknown keys return an empty vector. Holding Alt prefixes the sequence
/// with ESC for character and editing keys.
#[must_use]
pub fn encode_key(code: &KeyCode, mods: Modifiers) -> Vec<u8> {
    match code {
        KeyCode::Char(ch) => encode_char(*ch, mods),
        KeyCode::Enter => alt_prefixed(mods, b"\r"),
        KeyCode::Escape => alt_prefixed(mods, b"\x1b"),
        KeyCode::Backspace => alt_prefixed(mods, &[0x7f]),
        KeyCode::Tab => alt_prefixed(mods, b"\t"),
        KeyCode::Up => b"\x1b[A".to_vec(),
        KeyCode::Down => b"\x1b[B".to_vec(),
        KeyCode::Right => b"\x1b[C".to_vec(),
        KeyCode::Left => b"\x1b[D".to_vec(),
        KeyCode::Home => b"\x1b[H".to_vec(),
        KeyCode::End => b"\x1b[F".to_vec(),
        KeyCode::Insert => b"\x1b[2~".to_vec(),
        KeyCode::Delete => b"\x1b[3~".to_vec(),
        KeyCode::PageUp => b"\x1b[5~".to_vec(),
        KeyCode::PageDown => b"\x1b[6~".to_vec(),
        KeyCode::F(n) => encode_function_key(*n),
        KeyCode::Unidentified => Vec::new(),
    }
}

fn alt_prefixed(mods: Modifiers, bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 1);
    if mods.contains(Modifiers::ALT) {
        out.push(0x1b);
    }
    out.extend_from_slice(bytes);
    out
}

fn encode_char(ch: char, mods: Modifiers) -> Vec<u8> {
    let mut out = Vec::with_capacity(5);
    if mods.contains(Modifiers::ALT) {
        out.push(0x1b);
    }
    if mods.contains(Modifiers::CTRL) && ch.is_ascii_alphabetic() {
        out.push((ch.to_ascii_lowercase() as u8) - b'a' + 1);
        return out;
    }
    let mut buf = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
    out
}

fn encode_function_key(n: u8) -> Vec<u8> {
    match n {
        1..=4 => {
            let ss3 = [b'P', b'Q', b'R', b'S'][usize::from(n - 1)];
            vec![0x1b, b'O', ss3]
        }
        5 => b"\x1b[15~".to_vec(),
        6 => b"\x1b[17~".to_vec(),
        7 => b"\x1b[18~".to_vec(),
        8 => b"\x1b[19~".to_vec(),
        9 => b"\x1b[20~".to_vec(),
        10 => b"\x1b[21~".to_vec(),
        11 => b"\x1b[23~".to_vec(),
        12 => b"\x1b[24~".to_vec(),
        _ => Vec::new(),
    }
}
