//! Purpose: JSON decoding boundary shared by the sync driver, manifest, and worksheet loader.
//! Exports: `parse` module with decode helpers and failure categories.
//! Role: Single seam so callsites map decode failures to domain errors the same way.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub mod parse;
