//! Terminal cell: the fundamental unit of the grid.
//!
//! Each cell stores one character and the rendering attributes it was
//! stamped with. Colors are always resolved 24-bit RGB, even when the
//! stream selected a palette index — snapshots are self-describing and the
//! renderer needs no palette of its own.

use bitflags::bitflags;

bitflags! {
    /// Text attribute flags stamped into cells by the pen.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttrFlags: u8 {
        const BOLD          = 1 << 0;
        const ITALIC        = 1 << 1;
        const UNDERLINE     = 1 << 2;
        const STRIKETHROUGH = 1 << 3;
    }
}

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0x00, 0x00, 0x00);
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A single cell in the terminal grid.
///
/// Plain `Copy` value: cells never share attribute storage with the cursor,
/// they hold whatever the pen was at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// The character content. A space for empty/erased cells.
    pub glyph: char,
    /// Text attribute flags.
    pub attr: AttrFlags,
    /// Foreground color.
    pub fg: Rgb,
    /// Background color.
    pub bg: Rgb,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            glyph: ' ',
            attr: AttrFlags::empty(),
            fg: Rgb::WHITE,
            bg: Rgb::BLACK,
        }
    }
}

impl Cell {
    /// Reset this cell to a blank space with default attributes.
    ///
    /// Erase operations use this rather than stamping the pen: erased
    /// cells always revert to the default colors.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
