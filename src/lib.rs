//! Purpose: Library crate behind the `worksheet` CLI and its tests.
//! Exports: `api` (public surface), `core` (rewriter, scanner, errors), `json`, `notice`.
//! Role: Keeps the embedded-block rewrite pure and the I/O at the edges.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
pub mod json;
pub mod notice;
