//! Escape-sequence state machine.
//!
//! A deterministic per-byte state machine that turns a PTY output stream
//! into a sequence of actions for the terminal engine. It covers:
//!
//! - printable characters (ASCII + multi-byte UTF-8) -> [`Action::Print`]
//! - the C0 controls a shell actually emits (BS, HT, LF, CR)
//! - CSI sequences: cursor movement, erase, insert/delete, scroll region,
//!   SGR, and the DA/DSR query pair
//! - string-type sequences (DCS/OSC/SOS/PM/APC), consumed and discarded
//! - ESC intermediates, consumed and discarded
//!
//! Unknown or malformed sequences never fault: they are logged at debug
//! level and the machine returns to ground. Partial sequences survive
//! across `feed` calls, so chunk boundaries in the transport are invisible.

use smallvec::SmallVec;

/// Inline capacity for CSI parameter lists.
///
/// Most sequences carry at most four parameters; this avoids a heap
/// allocation for the common case.
pub type CsiParams = SmallVec<[u16; 4]>;

/// Parser output actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print a single character at the cursor.
    Print(char),
    /// Backspace (`0x08`): step left, or to the end of the previous line.
    Backspace,
    /// Horizontal tab (`0x09`): advance to the next 8-column stop.
    Tab,
    /// Line feed (`0x0A`).
    LineFeed,
    /// Carriage return (`0x0D`).
    CarriageReturn,
    /// RI (`ESC M`): move up one line, scrolling down at the top margin.
    ReverseLineFeed,
    /// ICH (`CSI Ps @`): insert blank cells at the cursor column.
    InsertChars(u16),
    /// CUU (`CSI Ps A`): move the cursor up.
    CursorUp(u16),
    /// CUD (`CSI Ps B`): move the cursor down.
    CursorDown(u16),
    /// CUF (`CSI Ps C`): move the cursor right.
    CursorRight(u16),
    /// CUB (`CSI Ps D`): move the cursor left.
    CursorLeft(u16),
    /// CNL (`CSI Ps E`): move down and to column 0.
    CursorNextLine(u16),
    /// CPL (`CSI Ps F`): move up and to column 0.
    CursorPrevLine(u16),
    /// CHA (`CSI Ps G`): absolute column, 0-based.
    CursorColumn(u16),
    /// CUP/HVP (`CSI Pr ; Pc H|f`): absolute position, 0-based.
    CursorPosition { row: u16, col: u16 },
    /// VPA (`CSI Ps d`): absolute row, 0-based.
    CursorRow(u16),
    /// ED (`CSI Ps J`): erase in display. Mode 3 is accepted and ignored
    /// (reserved for hosts with history).
    EraseInDisplay(u8),
    /// EL (`CSI Ps K`): erase in line.
    EraseInLine(u8),
    /// IL (`CSI Ps L`): insert blank lines at the cursor row.
    InsertLines(u16),
    /// DCH (`CSI Ps P`): delete cells at the cursor column.
    DeleteChars(u16),
    /// SU (`CSI Ps S`): scroll the region up. Defaults to 0.
    ScrollUp(u16),
    /// SD (`CSI Ps T`): scroll the region down. Defaults to 0.
    ScrollDown(u16),
    /// ECH (`CSI Ps X`): erase cells forward from the cursor, crossing
    /// line boundaries.
    EraseChars(u16),
    /// DA1 (`CSI c`): primary device attributes query.
    DeviceAttributes,
    /// DA2 (`CSI > c`): secondary device attributes query.
    DeviceAttributesSecondary,
    /// CPR request (`CSI 6 n`): report the cursor position.
    CursorPositionReport,
    /// DECSTBM (`CSI Pt ; Pb r`): set the scroll region. `top` is 0-based.
    /// `bottom` is 0-based when present; `None` means the last row (the
    /// parser does not know the grid height).
    SetScrollRegion { top: u16, bottom: Option<u16> },
    /// SGR (`CSI ... m`): raw parameters for the attribute decoder.
    Sgr(CsiParams),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Esc,
    Csi,
    /// ESC followed by intermediate bytes (0x20..=0x2F); the sequence is
    /// consumed but not acted upon.
    Intermediate,
    /// Inside a DCS/OSC/SOS/PM/APC string; content is discarded.
    Str,
    /// Saw ESC inside a string; `\` completes the ST terminator.
    StrEsc,
    /// Accumulating a multi-byte UTF-8 character.
    Utf8 { bytes_remaining: u8 },
}

/// Escape-sequence parser state.
///
/// Feed bytes with [`Parser::advance`] or [`Parser::feed_into`]; the state
/// survives arbitrary chunk boundaries and resizes.
#[derive(Debug, Clone)]
pub struct Parser {
    state: State,
    /// Accumulated CSI parameter and private-marker bytes.
    buf: Vec<u8>,
    utf8_buf: [u8; 4],
    utf8_len: u8,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a new parser in ground state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            buf: Vec::new(),
            utf8_buf: [0; 4],
            utf8_len: 0,
        }
    }

    /// Feed a chunk of bytes and return the parsed actions.
    #[must_use]
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Action> {
        let mut out = Vec::new();
        self.feed_into(bytes, &mut out);
        out
    }

    /// Feed a chunk of bytes, appending parsed actions to `out`.
    pub fn feed_into(&mut self, bytes: &[u8], out: &mut Vec<Action>) {
        for &b in bytes {
            if let Some(action) = self.advance(b) {
                out.push(action);
            }
        }
    }

    /// Advance the parser by one byte, returning an action when a complete
    /// token is recognized.
    pub fn advance(&mut self, b: u8) -> Option<Action> {
        match self.state {
            State::Ground => self.advance_ground(b),
            State::Esc => self.advance_esc(b),
            State::Csi => self.advance_csi(b),
            State::Intermediate => self.advance_intermediate(b),
            State::Str => self.advance_str(b),
            State::StrEsc => self.advance_str_esc(b),
            State::Utf8 { bytes_remaining } => self.advance_utf8(b, bytes_remaining),
        }
    }

    fn advance_ground(&mut self, b: u8) -> Option<Action> {
        match b {
            0x08 => Some(Action::Backspace),
            b'\t' => Some(Action::Tab),
            b'\n' => Some(Action::LineFeed),
            b'\r' => Some(Action::CarriageReturn),
            0x1b => {
                self.state = State::Esc;
                None
            }
            0x00..=0x1f => None,
            0x20..=0x7f => Some(Action::Print(b as char)),
            // UTF-8 leading bytes; code points above 0x7F print one column.
            0xC2..=0xDF => {
                self.utf8_buf[0] = b;
                self.utf8_len = 1;
                self.state = State::Utf8 { bytes_remaining: 1 };
                None
            }
            0xE0..=0xEF => {
                self.utf8_buf[0] = b;
                self.utf8_len = 1;
                self.state = State::Utf8 { bytes_remaining: 2 };
                None
            }
            0xF0..=0xF4 => {
                self.utf8_buf[0] = b;
                self.utf8_len = 1;
                self.state = State::Utf8 { bytes_remaining: 3 };
                None
            }
            // Stray continuation bytes and invalid leading bytes.
            _ => None,
        }
    }

    fn advance_utf8(&mut self, b: u8, bytes_remaining: u8) -> Option<Action> {
        if (0x80..=0xBF).contains(&b) {
            let idx = self.utf8_len as usize;
            if idx < 4 {
                self.utf8_buf[idx] = b;
                self.utf8_len += 1;
            }
            if bytes_remaining == 1 {
                self.state = State::Ground;
                let len = self.utf8_len as usize;
                let ch = core::str::from_utf8(&self.utf8_buf[..len])
                    .ok()
                    .and_then(|s| s.chars().next());
                self.utf8_len = 0;
                ch.map(Action::Print)
            } else {
                self.state = State::Utf8 {
                    bytes_remaining: bytes_remaining - 1,
                };
                None
            }
        } else {
            // Invalid continuation: drop the partial character and
            // reprocess this byte in ground state.
            self.state = State::Ground;
            self.utf8_len = 0;
            self.advance_ground(b)
        }
    }

    fn advance_esc(&mut self, b: u8) -> Option<Action> {
        match b {
            b'[' => {
                self.state = State::Csi;
                self.buf.clear();
                None
            }
            b'M' => {
                self.state = State::Ground;
                Some(Action::ReverseLineFeed)
            }
            // DCS, OSC, SOS, PM, APC open a string-type sequence.
            b'P' | b']' | b'X' | b'^' | b'_' => {
                self.state = State::Str;
                None
            }
            0x40..=0x5F => {
                tracing::debug!(final_byte = b, "unhandled C1 escape");
                self.state = State::Ground;
                None
            }
            0x20..=0x2F => {
                self.state = State::Intermediate;
                None
            }
            _ => {
                self.state = State::Ground;
                None
            }
        }
    }

    fn advance_intermediate(&mut self, b: u8) -> Option<Action> {
        if !(0x20..=0x2F).contains(&b) {
            self.state = State::Ground;
        }
        None
    }

    fn advance_str(&mut self, b: u8) -> Option<Action> {
        match b {
            0x07 => self.state = State::Ground,
            0x1b => self.state = State::StrEsc,
            _ => {}
        }
        None
    }

    fn advance_str_esc(&mut self, b: u8) -> Option<Action> {
        match b {
            b'\\' => self.state = State::Ground,
            0x1b => {}
            _ => self.state = State::Str,
        }
        None
    }

    fn advance_csi(&mut self, b: u8) -> Option<Action> {
        // Parameter and private-marker bytes accumulate; anything else is
        // the final byte.
        if (0x30..=0x3F).contains(&b) {
            self.buf.push(b);
            return None;
        }
        self.state = State::Ground;
        let action = Self::decode_csi(&self.buf, b);
        self.buf.clear();
        action
    }

    /// Split the parameter buffer on `;` into numeric fields.
    ///
    /// Empty fields decode as 0, so an empty buffer yields `[0]` and a
    /// trailing `;` contributes a trailing 0. A buffer containing any byte
    /// that is neither a digit nor `;` is malformed and yields an empty
    /// list.
    fn parse_params(buf: &[u8]) -> CsiParams {
        let mut out = CsiParams::new();
        if buf.iter().any(|b| !b.is_ascii_digit() && *b != b';') {
            return out;
        }
        let mut value: u32 = 0;
        for &b in buf {
            if b == b';' {
                out.push(value as u16);
                value = 0;
            } else {
                value = (value * 10 + u32::from(b - b'0')).min(u32::from(u16::MAX));
            }
        }
        out.push(value as u16);
        out
    }

    fn count_or_one(params: &CsiParams) -> u16 {
        params.first().copied().unwrap_or(1).max(1)
    }

    /// Decode a complete CSI sequence.
    ///
    /// Commands with more arguments than they document are dropped, as are
    /// sequences whose argument values cannot be used. Unknown final bytes
    /// are logged and discarded.
    fn decode_csi(buf: &[u8], final_byte: u8) -> Option<Action> {
        let params = Self::parse_params(buf);

        match final_byte {
            b'@' if params.len() <= 1 => Some(Action::InsertChars(Self::count_or_one(&params))),
            b'A' if params.len() <= 1 => Some(Action::CursorUp(Self::count_or_one(&params))),
            b'B' if params.len() <= 1 => Some(Action::CursorDown(Self::count_or_one(&params))),
            b'C' if params.len() <= 1 => Some(Action::CursorRight(Self::count_or_one(&params))),
            b'D' if params.len() <= 1 => Some(Action::CursorLeft(Self::count_or_one(&params))),
            b'E' if params.len() <= 1 => Some(Action::CursorNextLine(Self::count_or_one(&params))),
            b'F' if params.len() <= 1 => Some(Action::CursorPrevLine(Self::count_or_one(&params))),
            b'G' if params.len() <= 1 => Some(Action::CursorColumn(
                Self::count_or_one(&params).saturating_sub(1),
            )),
            b'H' | b'f' if params.len() <= 2 => {
                let row = params.first().copied().unwrap_or(1).max(1) - 1;
                let col = params.get(1).copied().unwrap_or(1).max(1) - 1;
                Some(Action::CursorPosition { row, col })
            }
            b'J' if params.len() <= 1 => {
                let op = params.first().copied().unwrap_or(0);
                if op <= 3 {
                    Some(Action::EraseInDisplay(op as u8))
                } else {
                    None
                }
            }
            b'K' if params.len() <= 1 => {
                let op = params.first().copied().unwrap_or(0);
                if op <= 2 {
                    Some(Action::EraseInLine(op as u8))
                } else {
                    None
                }
            }
            b'L' if params.len() <= 1 => Some(Action::InsertLines(Self::count_or_one(&params))),
            b'P' if params.len() <= 1 => Some(Action::DeleteChars(Self::count_or_one(&params))),
            b'S' if params.len() <= 1 => {
                Some(Action::ScrollUp(params.first().copied().unwrap_or(0)))
            }
            b'T' if params.len() <= 1 => {
                Some(Action::ScrollDown(params.first().copied().unwrap_or(0)))
            }
            b'X' if params.len() <= 1 => Some(Action::EraseChars(Self::count_or_one(&params))),
            b'c' => match buf.first() {
                Some(b'>') => Some(Action::DeviceAttributesSecondary),
                Some(b'=') => None,
                _ => Some(Action::DeviceAttributes),
            },
            b'd' if params.len() <= 1 => Some(Action::CursorRow(
                Self::count_or_one(&params).saturating_sub(1),
            )),
            b'm' => {
                let mut params = params;
                if params.is_empty() {
                    params.push(0);
                }
                Some(Action::Sgr(params))
            }
            b'n' => {
                if params.len() == 1 && params[0] == 6 {
                    Some(Action::CursorPositionReport)
                } else {
                    None
                }
            }
            b'r' => match params.len() {
                // No usable parameters: full-height region.
                0 => Some(Action::SetScrollRegion {
                    top: 0,
                    bottom: None,
                }),
                // One parameter gives the top row directly (0-based).
                1 => Some(Action::SetScrollRegion {
                    top: params[0],
                    bottom: None,
                }),
                2 => Some(Action::SetScrollRegion {
                    top: params[0].saturating_sub(1),
                    bottom: Some(params[1].saturating_sub(1)),
                }),
                _ => None,
            },
            _ => {
                tracing::debug!(final_byte, "unimplemented CSI");
                None
            }
        }
    }
}
