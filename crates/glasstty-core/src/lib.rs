#![forbid(unsafe_code)]

//! Host-agnostic VT/ANSI terminal engine for a browser-hosted terminal.
//!
//! `glasstty-core` is the platform-independent model at the heart of
//! glasstty. It consumes a PTY output byte stream and maintains a visible
//! screen of character cells — without any host I/O dependencies.
//!
//! # Primary responsibilities
//!
//! - **Grid**: 2D cell matrix with per-row dirty tracking for the renderer.
//! - **Cell**: character content plus resolved 24-bit colors and attributes.
//! - **Parser**: escape-sequence state machine (ground / escape / CSI /
//!   intermediate / string states) driven one byte at a time.
//! - **SGR**: attribute and color decoder, including the 256-color cube and
//!   truecolor subforms.
//! - **Terminal**: the engine tying the above together behind three entry
//!   points (`ingest`, `resize`, `take_dirty`).
//!
//! # Design principles
//!
//! - **No I/O**: the transport feeds bytes in, the renderer reads rows out,
//!   and query replies leave through the keyboard-output collaborator.
//! - **Deterministic**: identical byte sequences always produce identical
//!   state, regardless of how the stream is chunked.
//! - **Infallible**: no input can make the engine fault; malformed and
//!   unknown sequences are dropped and logged.

pub mod cell;
pub mod cursor;
pub mod grid;
pub mod parser;
pub mod sgr;
pub mod term;

pub use cell::{AttrFlags, Cell, Rgb};
pub use cursor::{Cursor, Pen};
pub use grid::{Grid, MIN_COLS, MIN_ROWS};
pub use parser::{Action, CsiParams, Parser};
pub use sgr::{BRIGHT_COLORS, NORMAL_COLORS, indexed_color};
pub use term::{KeyboardOutput, NullOutput, ReplyBuffer, ResizeNotifier, Terminal};
