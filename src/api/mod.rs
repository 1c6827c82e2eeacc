//! Purpose: Define the public Rust API boundary for worksheet tooling.
//! Exports: Rewriter, sync driver, worksheet model, markup, and answer session types.
//! Role: Public, additive-only surface used by the CLI and integration tests.
//! Invariants: This module is the only public path to the sync and session primitives.

mod render;
mod session;
mod sync;
mod worksheet;

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::rewrite::{EmbeddedBlock, extract, locate, rewrite, rewrite_with};
pub use crate::core::scan::ScanMode;
pub use render::{escape_html, render_question, render_worksheet};
pub use session::{ANSWER_CATEGORY, AnswerStore, MemoryStore, SavedAnswer, Session, Submission};
pub use sync::{
    DEFAULT_MARKER, ErrorPolicy, FileHost, FileSource, HostDocument, PairOutcome, PairStatus,
    SourceProvider, SyncOptions, SyncPair, SyncReport, sync_files, sync_pair,
};
pub use worksheet::{AnswerOption, Question, Worksheet, WorksheetId, load_worksheet};
