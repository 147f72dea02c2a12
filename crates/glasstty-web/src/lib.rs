#![forbid(unsafe_code)]

//! Browser frontend for glasstty.
//!
//! This crate is the host-specific half of the terminal: it normalizes DOM
//! keyboard events into a stable schema, encodes them as VT byte sequences
//! for the PTY, and exposes a `wasm-bindgen` surface that feeds the engine
//! and drains dirty rows for whatever paints the screen.
//!
//! The input layer ([`input`]) is plain Rust and compiles on every target;
//! only the wasm bindings are gated on `wasm32`, so
//! `cargo check --workspace` stays green on native hosts.

pub mod input;

#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use wasm::GlassTty;
