//! Cursor position and the rendering pen.

use crate::cell::{AttrFlags, Rgb};

/// The attribute triple applied to every newly written cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pen {
    pub attr: AttrFlags,
    pub fg: Rgb,
    pub bg: Rgb,
}

impl Default for Pen {
    fn default() -> Self {
        Self {
            attr: AttrFlags::empty(),
            fg: Rgb::WHITE,
            bg: Rgb::BLACK,
        }
    }
}

impl Pen {
    /// Reset to the default pen (SGR 0).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// The active write position.
///
/// `x` may equal the column count transiently: that marks a pending wrap,
/// and the next printed glyph wraps to the following line before writing.
/// `y` is always strictly inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Column, 0-based. At most `cols`.
    pub x: u16,
    /// Row, 0-based. At most `rows - 1`.
    pub y: u16,
    /// Attributes for newly written cells.
    pub pen: Pen,
}

impl Cursor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            pen: Pen::default(),
        }
    }

    pub fn move_up(&mut self, n: u16) {
        self.y = self.y.saturating_sub(n);
    }

    pub fn move_down(&mut self, n: u16, rows: u16) {
        self.y = self.y.saturating_add(n).min(rows - 1);
    }

    pub fn move_left(&mut self, n: u16) {
        self.x = self.x.saturating_sub(n);
    }

    pub fn move_right(&mut self, n: u16, cols: u16) {
        self.x = self.x.saturating_add(n).min(cols - 1);
    }

    pub fn carriage_return(&mut self) {
        self.x = 0;
    }

    /// Re-establish the position invariants after a resize.
    pub fn clamp_to(&mut self, rows: u16, cols: u16) {
        self.x = self.x.min(cols);
        self.y = self.y.min(rows - 1);
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}
