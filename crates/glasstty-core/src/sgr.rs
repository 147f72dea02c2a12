//! Select Graphic Rendition decoder.
//!
//! Translates the numeric parameter vector of a `CSI ... m` sequence into
//! pen mutations: attribute flags, palette colors, 256-color palette
//! lookups, and 24-bit truecolor. Parameters are consumed left to right;
//! 38 and 48 pull their extended-color subform out of the same vector.
//! Unknown parameters are skipped.

use crate::cell::{AttrFlags, Rgb};
use crate::cursor::Pen;

/// The standard palette (SGR 30-37 / 40-47 and 256-color indices 0-7).
pub const NORMAL_COLORS: [Rgb; 8] = [
    Rgb::new(0x00, 0x00, 0x00),
    Rgb::new(0xD0, 0x00, 0x00),
    Rgb::new(0x00, 0xC0, 0x00),
    Rgb::new(0xF0, 0x80, 0x00),
    Rgb::new(0x00, 0x00, 0xD0),
    Rgb::new(0xA0, 0x00, 0xA0),
    Rgb::new(0x10, 0xB0, 0xB0),
    Rgb::new(0xA0, 0xA0, 0xA0),
];

/// The bright palette (SGR 90-97 / 100-107 and 256-color indices 8-15).
pub const BRIGHT_COLORS: [Rgb; 8] = [
    Rgb::new(0x50, 0x50, 0x50),
    Rgb::new(0xFF, 0x30, 0x30),
    Rgb::new(0x20, 0xFF, 0x20),
    Rgb::new(0xFF, 0xFF, 0x40),
    Rgb::new(0x30, 0x30, 0xFF),
    Rgb::new(0xFF, 0x20, 0xFF),
    Rgb::new(0x30, 0xFF, 0xFF),
    Rgb::new(0xFF, 0xFF, 0xFF),
];

/// Resolve a 256-color palette index to RGB.
///
/// 0-7 and 8-15 map to the two named palettes, 16-231 is the 6x6x6 color
/// cube in 51-step increments, and 232-255 is the 24-step grayscale ramp.
#[must_use]
pub fn indexed_color(n: u8) -> Rgb {
    match n {
        0..=7 => NORMAL_COLORS[n as usize],
        8..=15 => BRIGHT_COLORS[(n - 8) as usize],
        16..=231 => {
            let m = n - 16;
            let b = (m % 6) * 51;
            let g = ((m / 6) % 6) * 51;
            let r = ((m / 36) % 6) * 51;
            Rgb::new(r, g, b)
        }
        _ => {
            let level = 8 + 10 * (n - 232);
            Rgb::new(level, level, level)
        }
    }
}

/// Apply an SGR parameter vector to the pen, left to right.
pub fn apply(pen: &mut Pen, params: &[u16]) {
    let mut i = 0;
    while i < params.len() {
        match params[i] {
            0 => pen.reset(),
            1 => pen.attr.insert(AttrFlags::BOLD),
            21 | 22 => pen.attr.remove(AttrFlags::BOLD),
            3 => pen.attr.insert(AttrFlags::ITALIC),
            23 => pen.attr.remove(AttrFlags::ITALIC),
            4 => pen.attr.insert(AttrFlags::UNDERLINE),
            24 => pen.attr.remove(AttrFlags::UNDERLINE),
            // Reverse video is a plain swap: no stored "reverse" bit, a
            // second 7 (or a 27) swaps back.
            7 | 27 => core::mem::swap(&mut pen.fg, &mut pen.bg),
            9 => pen.attr.insert(AttrFlags::STRIKETHROUGH),
            29 => pen.attr.remove(AttrFlags::STRIKETHROUGH),
            n @ 30..=37 => pen.fg = NORMAL_COLORS[(n - 30) as usize],
            39 => pen.fg = Rgb::WHITE,
            n @ 40..=47 => pen.bg = NORMAL_COLORS[(n - 40) as usize],
            49 => pen.bg = Rgb::BLACK,
            n @ 90..=97 => pen.fg = BRIGHT_COLORS[(n - 90) as usize],
            n @ 100..=107 => pen.bg = BRIGHT_COLORS[(n - 100) as usize],
            38 => {
                let (color, consumed) = extended_color(&params[i + 1..]);
                if let Some(color) = color {
                    pen.fg = color;
                }
                i += consumed;
            }
            48 => {
                let (color, consumed) = extended_color(&params[i + 1..]);
                if let Some(color) = color {
                    pen.bg = color;
                }
                i += consumed;
            }
            // 2 (dim), 5 (blink), and 50-74 are reserved; everything else
            // is unknown. Both are skipped without effect.
            _ => {}
        }
        i += 1;
    }
}

/// Decode the subform following a 38/48 introducer.
///
/// Returns the resolved color (if any) and the number of parameters
/// consumed after the introducer. An unrecognized subtype consumes only
/// itself; missing components leave the color unchanged.
fn extended_color(rest: &[u16]) -> (Option<Rgb>, usize) {
    match rest.first() {
        Some(5) => match rest.get(1) {
            Some(&n) => (Some(indexed_color(n.min(255) as u8)), 2),
            None => (None, 1),
        },
        Some(2) => {
            if rest.len() >= 4 {
                let r = rest[1].min(255) as u8;
                let g = rest[2].min(255) as u8;
                let b = rest[3].min(255) as u8;
                (Some(Rgb::new(r, g, b)), 4)
            } else {
                (None, rest.len())
            }
        }
        Some(_) => (None, 1),
        None => (None, 0),
    }
}
