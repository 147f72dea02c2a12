#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::rc::Rc;

use glasstty_core::{KeyboardOutput, Terminal};
use wasm_bindgen::prelude::*;

use crate::input;

/// Reply sink shared between the engine and the JS host: the engine pushes
/// DA/DSR replies in, the host drains them into the websocket alongside
/// encoded keystrokes.
#[derive(Clone, Default)]
struct SharedReplies(Rc<RefCell<Vec<u8>>>);

impl KeyboardOutput for SharedReplies {
    fn send(&mut self, bytes: &[u8]) {
        self.0.borrow_mut().extend_from_slice(bytes);
    }
}

/// Web/WASM terminal surface.
///
/// The JS shell owns the websocket and the paint loop; this object owns the
/// terminal state. Bytes from the PTY go into [`ingest`](GlassTty::ingest),
/// key events come back out of [`encode_key`](GlassTty::encode_key), and
/// each animation tick drains [`take_dirty`](GlassTty::take_dirty) to
/// repaint only the rows that changed.
#[wasm_bindgen]
pub struct GlassTty {
    term: Terminal,
    replies: SharedReplies,
}

#[wasm_bindgen]
impl GlassTty {
    #[wasm_bindgen(constructor)]
    pub fn new(rows: u16, cols: u16) -> Self {
        let replies = SharedReplies::default();
        let mut term = Terminal::new(rows, cols);
        term.set_keyboard_output(Box::new(replies.clone()));
        Self { term, replies }
    }

    /// Feed PTY output bytes from the transport.
    pub fn ingest(&mut self, bytes: &[u8]) {
        self.term.ingest(bytes);
    }

    /// Resize to the new viewport dimensions (clamped to the engine
    /// minimums; read back `rows`/`cols` for the effective size).
    pub fn resize(&mut self, rows: u16, cols: u16) {
        self.term.resize(rows, cols);
    }

    pub fn rows(&self) -> u16 {
        self.term.rows()
    }

    pub fn cols(&self) -> u16 {
        self.term.cols()
    }

    /// Row indices changed since the last call, ascending.
    #[wasm_bindgen(js_name = takeDirty)]
    pub fn take_dirty(&mut self) -> Vec<u16> {
        self.term.take_dirty()
    }

    /// The glyphs of one row as a string.
    #[wasm_bindgen(js_name = rowText)]
    pub fn row_text(&self, y: u16) -> String {
        self.term.row_text(y)
    }

    /// Cursor position as `[x, y]`.
    pub fn cursor(&self) -> Vec<u16> {
        let (x, y) = self.term.cursor();
        vec![x, y]
    }

    /// Drain buffered query replies (DA/DSR) for the transport.
    #[wasm_bindgen(js_name = takeReplies)]
    pub fn take_replies(&mut self) -> Vec<u8> {
        std::mem::take(&mut *self.replies.0.borrow_mut())
    }

    /// Encode a JSON key event (`{"key": "...", "mods": N}`) into the bytes
    /// to write to the PTY. Unknown keys yield an empty array.
    #[wasm_bindgen(js_name = encodeKey)]
    pub fn encode_key(&self, event_json: &str) -> Vec<u8> {
        input::encode_key_json(event_json).unwrap_or_default()
    }
}
