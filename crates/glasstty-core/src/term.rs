//! Terminal engine: owns the grid, cursor, and parser, and applies parsed
//! actions through the output primitives.
//!
//! Three externally driven entry points touch state, all synchronous and
//! non-reentrant:
//!
//! - [`Terminal::ingest`] — the transport delivers PTY output bytes.
//! - [`Terminal::resize`] — the host viewport changed.
//! - [`Terminal::take_dirty`] — the renderer drains changed rows each frame.
//!
//! Between any two calls the grid, cursor, and scroll region satisfy their
//! invariants; a resize in the middle of an escape sequence is safe because
//! parser state is kept and the sequence completes against the new
//! dimensions. Query replies (DA, DSR) go out through the same
//! [`KeyboardOutput`] collaborator the keyboard uses — the engine never
//! talks to the transport directly.

use core::fmt;

use crate::cell::Cell;
use crate::cursor::{Cursor, Pen};
use crate::grid::Grid;
use crate::parser::{Action, Parser};
use crate::sgr;

/// Collaborator that forwards outbound bytes toward the PTY.
///
/// The input encoder and the engine's DA/DSR replies share this channel.
pub trait KeyboardOutput {
    fn send(&mut self, bytes: &[u8]);
}

/// Collaborator told about completed resizes so the transport can pass the
/// new dimensions to the PTY.
pub trait ResizeNotifier {
    fn notify(&mut self, rows: u16, cols: u16);
}

/// Discards everything; the default collaborator when none is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

impl KeyboardOutput for NullOutput {
    fn send(&mut self, _bytes: &[u8]) {}
}

impl ResizeNotifier for NullOutput {
    fn notify(&mut self, _rows: u16, _cols: u16) {}
}

/// Buffering [`KeyboardOutput`] for hosts that flush reply bytes on their
/// own schedule (for example once per animation tick).
#[derive(Debug, Default)]
pub struct ReplyBuffer {
    bytes: Vec<u8>,
}

impl ReplyBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything buffered so far.
    pub fn take(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.bytes)
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl KeyboardOutput for ReplyBuffer {
    fn send(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }
}

/// The terminal engine.
///
/// Owns all mutable state exclusively; collaborators reach it only through
/// the public entry points.
pub struct Terminal {
    grid: Grid,
    cursor: Cursor,
    parser: Parser,
    /// Inclusive scroll region bounds. Always `top < bottom`.
    scroll_top: u16,
    scroll_bottom: u16,
    keyboard: Box<dyn KeyboardOutput>,
    resize_notifier: Box<dyn ResizeNotifier>,
}

impl Terminal {
    /// Create a terminal with the given dimensions (clamped to the grid
    /// minimums) and no attached collaborators.
    #[must_use]
    pub fn new(rows: u16, cols: u16) -> Self {
        let grid = Grid::new(rows, cols);
        let scroll_bottom = grid.rows() - 1;
        Self {
            grid,
            cursor: Cursor::new(),
            parser: Parser::new(),
            scroll_top: 0,
            scroll_bottom,
            keyboard: Box::new(NullOutput),
            resize_notifier: Box::new(NullOutput),
        }
    }

    /// Attach the collaborator that carries outbound bytes to the PTY.
    pub fn set_keyboard_output(&mut self, keyboard: Box<dyn KeyboardOutput>) {
        self.keyboard = keyboard;
    }

    /// Attach the collaborator notified after each resize.
    pub fn set_resize_notifier(&mut self, notifier: Box<dyn ResizeNotifier>) {
        self.resize_notifier = notifier;
    }

    pub fn rows(&self) -> u16 {
        self.grid.rows()
    }

    pub fn cols(&self) -> u16 {
        self.grid.cols()
    }

    /// Cursor position as `(x, y)`.
    ///
    /// `x` may equal [`cols`](Self::cols) when a wrap is pending.
    pub fn cursor(&self) -> (u16, u16) {
        (self.cursor.x, self.cursor.y)
    }

    /// The current pen.
    pub fn pen(&self) -> Pen {
        self.cursor.pen
    }

    /// Inclusive scroll region bounds `(top, bottom)`.
    pub fn scroll_region(&self) -> (u16, u16) {
        (self.scroll_top, self.scroll_bottom)
    }

    /// Snapshot of one row, or `None` out of range.
    pub fn row(&self, y: u16) -> Option<&[Cell]> {
        self.grid.row_cells(y)
    }

    /// The glyphs of one row as a string. Intended for tests and debug
    /// surfaces, not rendering.
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        self.grid
            .row_cells(y)
            .map(|cells| cells.iter().map(|c| c.glyph).collect())
            .unwrap_or_default()
    }

    /// Drain the dirty row indices accumulated since the last call.
    pub fn take_dirty(&mut self) -> Vec<u16> {
        self.grid.take_dirty()
    }

    /// Consume a chunk of PTY output. The effect of each byte is fully
    /// applied before the next one is read.
    pub fn ingest(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if let Some(action) = self.parser.advance(b) {
                self.apply(action);
            }
        }
    }

    /// Resize the screen. Partially accumulated escape sequences are kept;
    /// the scroll region resets to full height and the cursor is clamped
    /// back into bounds.
    pub fn resize(&mut self, rows: u16, cols: u16) {
        self.grid.resize(rows, cols);
        let (rows, cols) = (self.grid.rows(), self.grid.cols());
        self.scroll_top = 0;
        self.scroll_bottom = rows - 1;
        self.cursor.clamp_to(rows, cols);
        self.resize_notifier.notify(rows, cols);
    }

    fn apply(&mut self, action: Action) {
        let rows = self.grid.rows();
        let cols = self.grid.cols();
        match action {
            Action::Print(ch) => self.write_glyph(ch),
            Action::Backspace => {
                if self.cursor.x > 0 {
                    self.cursor.x -= 1;
                } else if self.cursor.y > 0 {
                    self.cursor.y -= 1;
                    self.cursor.x = cols - 1;
                }
            }
            Action::Tab => self.write_tab(),
            Action::LineFeed => self.line_feed(),
            Action::CarriageReturn => self.cursor.carriage_return(),
            Action::ReverseLineFeed => self.reverse_line_feed(),
            Action::CursorUp(n) => self.cursor.move_up(n),
            Action::CursorDown(n) => self.cursor.move_down(n, rows),
            Action::CursorRight(n) => self.cursor.move_right(n, cols),
            Action::CursorLeft(n) => self.cursor.move_left(n),
            Action::CursorNextLine(n) => {
                self.cursor.move_down(n, rows);
                self.cursor.carriage_return();
            }
            Action::CursorPrevLine(n) => {
                self.cursor.move_up(n);
                self.cursor.carriage_return();
            }
            // Absolute columns may address the pending-wrap position one
            // past the last cell.
            Action::CursorColumn(col) => self.cursor.x = col.min(cols),
            Action::CursorPosition { row, col } => {
                self.cursor.y = row.min(rows - 1);
                self.cursor.x = col.min(cols);
            }
            Action::CursorRow(row) => self.cursor.y = row.min(rows - 1),
            Action::InsertChars(n) => {
                if self.cursor.x < cols {
                    let n = n.min(cols - self.cursor.x);
                    self.grid.insert_blank(self.cursor.y, self.cursor.x, n);
                }
            }
            Action::DeleteChars(n) => {
                if self.cursor.x < cols {
                    let n = n.min(cols - self.cursor.x);
                    self.grid.delete(self.cursor.y, self.cursor.x, n);
                }
            }
            Action::EraseInDisplay(op) => match op {
                0 => self.grid.erase_below(self.cursor.y, self.cursor.x),
                1 => self.grid.erase_above(self.cursor.y, self.cursor.x),
                2 => self.grid.erase_all(),
                // 3 is reserved for hosts that keep history.
                _ => {}
            },
            Action::EraseInLine(op) => match op {
                0 => self.grid.erase_line_right(self.cursor.y, self.cursor.x),
                1 => self.grid.erase_line_left(self.cursor.y, self.cursor.x),
                2 => self.grid.erase_line(self.cursor.y),
                _ => {}
            },
            Action::InsertLines(n) => {
                if self.cursor.y <= self.scroll_bottom {
                    let n = n.min(rows);
                    self.grid.scroll_down(self.cursor.y, self.scroll_bottom, n);
                }
            }
            Action::ScrollUp(n) => self.scroll_region_up(n),
            Action::ScrollDown(n) => self.scroll_region_down(n),
            Action::EraseChars(n) => self.grid.erase_chars(self.cursor.y, self.cursor.x, n),
            Action::DeviceAttributes => self.keyboard.send(b"\x1b[?1;2c"),
            Action::DeviceAttributesSecondary => self.keyboard.send(b"\x1b[0;0;0c"),
            Action::CursorPositionReport => {
                // Report the rightmost cell while a wrap is pending so the
                // reply always names an addressable column.
                let col = self.cursor.x.min(cols - 1);
                let reply = format!("\x1b[{};{}R", self.cursor.y + 1, col + 1);
                self.keyboard.send(reply.as_bytes());
            }
            Action::SetScrollRegion { top, bottom } => self.set_scroll_region(top, bottom),
            Action::Sgr(params) => sgr::apply(&mut self.cursor.pen, &params),
        }
    }

    // ── Output primitives ───────────────────────────────────────────

    /// Stamp one glyph with the pen and advance, wrapping first if a wrap
    /// is pending from the previous write.
    fn write_glyph(&mut self, ch: char) {
        if self.cursor.x >= self.grid.cols() {
            self.cursor.x = 0;
            self.line_feed();
        }
        let pen = self.cursor.pen;
        if let Some(cell) = self.grid.cell_mut(self.cursor.y, self.cursor.x) {
            *cell = Cell {
                glyph: ch,
                attr: pen.attr,
                fg: pen.fg,
                bg: pen.bg,
            };
        }
        self.cursor.x += 1;
    }

    /// Advance to the next 8-column tab stop, wrapping to a new line when
    /// the stop lies past the right edge.
    fn write_tab(&mut self) {
        self.cursor.x = self.cursor.x.saturating_add(8) & !7;
        if self.cursor.x > self.grid.cols() {
            self.cursor.x = 0;
            self.line_feed();
        }
    }

    /// Move down one line, scrolling the region up when leaving it through
    /// the bottom margin.
    fn line_feed(&mut self) {
        self.cursor.y += 1;
        if self.cursor.y == self.scroll_bottom + 1 {
            self.scroll_region_up(1);
            self.cursor.y = self.scroll_bottom;
        } else if self.cursor.y >= self.grid.rows() {
            self.cursor.y = self.grid.rows() - 1;
        }
    }

    /// Move up one line, scrolling the region down when leaving it through
    /// the top margin.
    fn reverse_line_feed(&mut self) {
        if self.cursor.y == self.scroll_top {
            self.scroll_region_down(1);
        } else if self.cursor.y > 0 {
            self.cursor.y -= 1;
        }
    }

    fn scroll_region_up(&mut self, n: u16) {
        let n = n.min(self.grid.rows());
        self.grid.scroll_up(self.scroll_top, self.scroll_bottom, n);
    }

    fn scroll_region_down(&mut self, n: u16) {
        let n = n.min(self.grid.rows());
        self.grid.scroll_down(self.scroll_top, self.scroll_bottom, n);
    }

    /// DECSTBM. A region must span at least three rows after clamping or
    /// the request is dropped; on success the cursor homes to the origin.
    fn set_scroll_region(&mut self, top: u16, bottom: Option<u16>) {
        let rows = self.grid.rows();
        let top = top.min(rows - 1);
        let bottom = bottom.unwrap_or(rows - 1).min(rows - 1);
        if top + 1 >= bottom {
            tracing::debug!(top, bottom, "dropping scroll region request");
            return;
        }
        self.scroll_top = top;
        self.scroll_bottom = bottom;
        self.cursor.x = 0;
        self.cursor.y = 0;
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Terminal")
            .field("rows", &self.grid.rows())
            .field("cols", &self.grid.cols())
            .field("cursor", &self.cursor)
            .field("scroll_top", &self.scroll_top)
            .field("scroll_bottom", &self.scroll_bottom)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{AttrFlags, Rgb};

    fn term() -> Terminal {
        let mut t = Terminal::new(24, 80);
        t.take_dirty();
        t
    }

    #[test]
    fn write_advances_cursor_and_marks_row() {
        let mut t = term();
        t.ingest(b"abc");
        assert_eq!(t.cursor(), (3, 0));
        assert_eq!(&t.row_text(0)[..4], "abc ");
        assert_eq!(t.take_dirty(), vec![0]);
    }

    #[test]
    fn wrap_is_deferred_until_next_glyph() {
        let mut t = term();
        t.ingest("x".repeat(80).as_bytes());
        // The cursor parks one past the last column; no wrap yet.
        assert_eq!(t.cursor(), (80, 0));
        t.ingest(b"y");
        assert_eq!(t.cursor(), (1, 1));
        assert_eq!(&t.row_text(1)[..1], "y");
    }

    #[test]
    fn carriage_return_cancels_pending_wrap() {
        let mut t = term();
        t.ingest("x".repeat(80).as_bytes());
        t.ingest(b"\rZ");
        assert_eq!(t.cursor(), (1, 0));
        assert_eq!(&t.row_text(0)[..2], "Zx");
    }

    #[test]
    fn backspace_steps_back_and_unwraps_lines() {
        let mut t = term();
        t.ingest(b"ab\x08");
        assert_eq!(t.cursor(), (1, 0));
        t.ingest(b"\x08\x08");
        // At the origin backspace has nothing to undo.
        assert_eq!(t.cursor(), (0, 0));

        t.ingest(b"\n");
        t.ingest(b"\x08");
        assert_eq!(t.cursor(), (79, 0));
    }

    #[test]
    fn tab_advances_to_eight_column_stops() {
        let mut t = term();
        t.ingest(b"\t");
        assert_eq!(t.cursor(), (8, 0));
        t.ingest(b"ab\t");
        assert_eq!(t.cursor(), (16, 0));
    }

    #[test]
    fn tab_at_right_edge_wraps_to_next_line() {
        let mut t = term();
        t.ingest(b"\x1b[77G\t");
        // 76 rounds to 80 which is the pending-wrap column, not past it.
        assert_eq!(t.cursor(), (80, 0));
        t.ingest(b"\t");
        assert_eq!(t.cursor(), (0, 1));
    }

    #[test]
    fn line_feed_scrolls_at_region_bottom() {
        let mut t = term();
        t.ingest(b"top\x1b[24;1Hbottom");
        t.ingest(b"\n");
        assert_eq!(t.cursor().1, 23);
        // Row 0 scrolled away.
        assert_eq!(&t.row_text(0)[..3], "   ");
        assert_eq!(&t.row_text(22)[..6], "bottom");
    }

    #[test]
    fn reverse_line_feed_scrolls_at_region_top() {
        let mut t = term();
        t.ingest(b"first");
        t.ingest(b"\x1bM");
        assert_eq!(t.cursor().1, 0);
        assert_eq!(&t.row_text(1)[..5], "first");
        assert_eq!(&t.row_text(0)[..5], "     ");
    }

    #[test]
    fn reverse_line_feed_above_region_clamps_at_screen_top() {
        let mut t = term();
        t.ingest(b"\x1b[5;10r");
        // DECSTBM homed the cursor above the region; RI just moves up.
        t.ingest(b"\x1b[2;1H\x1bM\x1bM\x1bM");
        assert_eq!(t.cursor().1, 0);
        assert_eq!(t.scroll_region(), (4, 9));
    }

    #[test]
    fn insert_and_delete_chars_clamp_to_line_tail() {
        let mut t = term();
        t.ingest(b"abcdef\x1b[1;2H\x1b[2@");
        assert_eq!(&t.row_text(0)[..8], "a  bcdef");
        t.ingest(b"\x1b[3P");
        assert_eq!(&t.row_text(0)[..5], "acdef");
        // Counts larger than the tail are harmless.
        t.ingest(b"\x1b[999@");
        assert_eq!(&t.row_text(0)[..2], "a ");
    }

    #[test]
    fn insert_lines_pushes_rows_within_region() {
        let mut t = term();
        t.ingest(b"one\r\ntwo\r\nthree\x1b[1;1H\x1b[2L");
        assert_eq!(&t.row_text(0)[..3], "   ");
        assert_eq!(&t.row_text(1)[..3], "   ");
        assert_eq!(&t.row_text(2)[..3], "one");
        assert_eq!(&t.row_text(3)[..3], "two");
    }

    #[test]
    fn insert_lines_below_region_is_ignored() {
        let mut t = term();
        t.ingest(b"\x1b[2;10r");
        t.ingest(b"\x1b[12;1Hmark\x1b[12;1H\x1b[3L");
        assert_eq!(&t.row_text(11)[..4], "mark");
    }

    #[derive(Clone, Default)]
    struct SharedReplies(std::rc::Rc<std::cell::RefCell<Vec<u8>>>);

    impl SharedReplies {
        fn take(&self) -> Vec<u8> {
            core::mem::take(&mut *self.0.borrow_mut())
        }
    }

    impl KeyboardOutput for SharedReplies {
        fn send(&mut self, bytes: &[u8]) {
            self.0.borrow_mut().extend_from_slice(bytes);
        }
    }

    #[test]
    fn device_attributes_replies_go_through_keyboard_output() {
        let replies = SharedReplies::default();
        let mut t = term();
        t.set_keyboard_output(Box::new(replies.clone()));

        t.ingest(b"\x1b[c");
        assert_eq!(replies.take(), b"\x1b[?1;2c");
        t.ingest(b"\x1b[>c");
        assert_eq!(replies.take(), b"\x1b[0;0;0c");
        t.ingest(b"\x1b[=c");
        assert!(replies.take().is_empty());
        // Queries leave the screen and cursor alone.
        assert_eq!(t.cursor(), (0, 0));
        assert!(t.take_dirty().is_empty());
    }

    #[test]
    fn reply_buffer_accumulates_until_drained() {
        let mut buf = ReplyBuffer::new();
        assert!(buf.is_empty());
        buf.send(b"\x1b[?1;2c");
        buf.send(b"\x1b[1;1R");
        assert_eq!(buf.take(), b"\x1b[?1;2c\x1b[1;1R");
        assert!(buf.is_empty());
    }

    #[test]
    fn cursor_position_report_is_one_based_and_clamped() {
        let replies = SharedReplies::default();
        let mut t = term();
        t.set_keyboard_output(Box::new(replies.clone()));

        t.ingest(b"\x1b[5;12H\x1b[6n");
        assert_eq!(replies.take(), b"\x1b[5;12R");

        // With a wrap pending the report names the last real column.
        t.ingest(b"\x1b[1;1H");
        t.ingest("q".repeat(80).as_bytes());
        t.ingest(b"\x1b[6n");
        assert_eq!(replies.take(), b"\x1b[1;80R");
    }

    #[test]
    fn scroll_region_request_validates_bounds() {
        let mut t = term();
        t.ingest(b"\x1b[5;6r");
        // Too narrow: a region must be at least three rows.
        assert_eq!(t.scroll_region(), (0, 23));
        t.ingest(b"\x1b[5;7r");
        assert_eq!(t.scroll_region(), (4, 6));
        assert_eq!(t.cursor(), (0, 0));
        // Reset to full height.
        t.ingest(b"\x1b[r");
        assert_eq!(t.scroll_region(), (0, 23));
    }

    #[test]
    fn one_argument_scroll_region_uses_row_directly() {
        let mut t = term();
        t.ingest(b"\x1b[3r");
        assert_eq!(t.scroll_region(), (3, 23));
    }

    #[test]
    fn resize_preserves_parser_state_mid_sequence() {
        let mut t = term();
        t.ingest(b"\x1b[3");
        t.resize(30, 100);
        t.ingest(b"1mx");
        let cell = t.row(0).unwrap()[0];
        assert_eq!(cell.glyph, 'x');
        assert_eq!(cell.fg, Rgb::new(0xD0, 0x00, 0x00));
    }

    #[test]
    fn resize_clamps_dimensions_and_cursor() {
        let mut t = term();
        t.ingest(b"\x1b[24;80H");
        t.resize(3, 5);
        assert_eq!(t.rows(), 10);
        assert_eq!(t.cols(), 20);
        let (x, y) = t.cursor();
        assert!(x <= 20 && y <= 9);
        assert_eq!(t.scroll_region(), (0, 9));
    }

    #[test]
    fn resize_notifier_receives_clamped_dimensions() {
        struct Recorder(std::rc::Rc<std::cell::RefCell<Vec<(u16, u16)>>>);
        impl ResizeNotifier for Recorder {
            fn notify(&mut self, rows: u16, cols: u16) {
                self.0.borrow_mut().push((rows, cols));
            }
        }

        let calls = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut t = term();
        t.set_resize_notifier(Box::new(Recorder(calls.clone())));
        t.resize(5, 5);
        t.resize(40, 120);
        assert_eq!(*calls.borrow(), vec![(10, 20), (40, 120)]);
    }

    #[test]
    fn pen_changes_do_not_touch_written_cells() {
        let mut t = term();
        t.ingest(b"\x1b[1mA\x1b[0mB");
        let row = t.row(0).unwrap();
        assert!(row[0].attr.contains(AttrFlags::BOLD));
        assert!(!row[1].attr.contains(AttrFlags::BOLD));
        assert_eq!(t.pen(), Pen::default());
    }

    #[test]
    fn erase_chars_runs_across_wrapped_lines() {
        let mut t = term();
        t.ingest("a".repeat(160).as_bytes());
        t.ingest(b"\x1b[1;79H\x1b[4X");
        assert_eq!(&t.row_text(0)[75..], "aaa  ");
        assert_eq!(&t.row_text(1)[..3], "  a");
    }
}
