//! Purpose: Drive embedded-block rewrites from JSON sources into host documents.
//! Exports: `SourceProvider`, `HostDocument`, `FileSource`, `FileHost`, `SyncOptions`,
//!          `ErrorPolicy`, `SyncPair`, `PairStatus`, `PairOutcome`, `SyncReport`,
//!          `sync_pair`, `sync_files`.
//! Role: One read-modify-write per pair; the batch tallies outcomes in input order.
//! Invariants: A failed pair never writes its host; other pairs still run under `Skip`.
//! Invariants: `Stop` ends the batch after the first failure but still returns the report.
//! Invariants: Hosts whose text would not change are never rewritten.
//! Invariants: Pairs with a missing source or host are skipped, not failed.
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::rewrite::rewrite_with;
use crate::core::scan::ScanMode;
use crate::json::parse;

pub const DEFAULT_MARKER: &str = "const worksheetJSONData = ";

/// Supplies the JSON value to embed.
pub trait SourceProvider {
    fn describe(&self) -> String;
    fn load(&self) -> Result<Value, Error>;
}

/// Supplies the current host text and persists the rewritten text.
pub trait HostDocument {
    fn describe(&self) -> String;
    fn read(&self) -> Result<String, Error>;
    fn write(&self, text: &str) -> Result<(), Error>;
}

#[derive(Clone, Debug)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SourceProvider for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<Value, Error> {
        let text = fs::read_to_string(&self.path).map_err(|err| {
            Error::new(ErrorKind::SourceRead)
                .with_message("failed to read source JSON")
                .with_path(&self.path)
                .with_source(err)
        })?;
        parse::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::SourceParse)
                .with_message("source is not valid JSON")
                .with_hint(parse::hint_for_error(&err, &self.describe()))
                .with_path(&self.path)
                .with_source(err)
        })
    }
}

#[derive(Clone, Debug)]
pub struct FileHost {
    path: PathBuf,
}

impl FileHost {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{name}.worksheet-tmp"))
    }
}

impl HostDocument for FileHost {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<String, Error> {
        fs::read_to_string(&self.path).map_err(|err| {
            Error::new(ErrorKind::HostRead)
                .with_message("failed to read host document")
                .with_path(&self.path)
                .with_source(err)
        })
    }

    fn write(&self, text: &str) -> Result<(), Error> {
        let host_write_error = |err: std::io::Error| {
            Error::new(ErrorKind::HostWrite)
                .with_message("failed to write host document")
                .with_path(&self.path)
                .with_source(err)
        };
        // Replace via rename so readers never observe a half-written page.
        let temp = self.temp_path();
        let permissions = fs::metadata(&self.path).map(|meta| meta.permissions()).ok();
        let replaced = fs::write(&temp, text)
            .and_then(|()| match permissions {
                Some(permissions) => fs::set_permissions(&temp, permissions),
                None => Ok(()),
            })
            .and_then(|()| fs::rename(&temp, &self.path));
        replaced.map_err(|err| {
            let _ = fs::remove_file(&temp);
            host_write_error(err)
        })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorPolicy {
    Stop,
    Skip,
}

#[derive(Clone, Debug)]
pub struct SyncOptions {
    pub marker: String,
    pub scan_mode: ScanMode,
    /// Compute outcomes without writing any host.
    pub dry_run: bool,
    pub errors: ErrorPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            scan_mode: ScanMode::Naive,
            dry_run: false,
            errors: ErrorPolicy::Skip,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PairStatus {
    /// Host rewritten with the source value.
    Updated,
    /// Host already embeds exactly the serialized source value.
    Unchanged,
    /// Host differs from the source, but `dry_run` kept it as is.
    Stale,
    /// Source or host file does not exist.
    Skipped,
    Failed,
}

impl PairStatus {
    pub fn label(self) -> &'static str {
        match self {
            PairStatus::Updated => "updated",
            PairStatus::Unchanged => "unchanged",
            PairStatus::Stale => "stale",
            PairStatus::Skipped => "skipped",
            PairStatus::Failed => "failed",
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncPair {
    pub source: PathBuf,
    pub host: PathBuf,
}

impl SyncPair {
    pub fn new(source: impl Into<PathBuf>, host: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            host: host.into(),
        }
    }

    pub fn resolve(&self, root: &Path) -> SyncPair {
        SyncPair {
            source: root.join(&self.source),
            host: root.join(&self.host),
        }
    }
}

#[derive(Debug)]
pub struct PairOutcome {
    pub pair: SyncPair,
    pub status: PairStatus,
    pub error: Option<Error>,
}

#[derive(Debug, Default)]
pub struct SyncReport {
    pub outcomes: Vec<PairOutcome>,
}

impl SyncReport {
    fn count(&self, status: PairStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.status == status)
            .count()
    }

    /// Pairs that completed without error, whether or not they were written.
    pub fn succeeded(&self) -> usize {
        self.count(PairStatus::Updated) + self.count(PairStatus::Unchanged) + self.stale()
    }

    pub fn updated(&self) -> usize {
        self.count(PairStatus::Updated)
    }

    pub fn stale(&self) -> usize {
        self.count(PairStatus::Stale)
    }

    pub fn skipped(&self) -> usize {
        self.count(PairStatus::Skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(PairStatus::Failed)
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn first_error(&self) -> Option<&Error> {
        self.outcomes.iter().find_map(|outcome| outcome.error.as_ref())
    }
}

/// Runs one read-modify-write cycle for a single source/host pair.
pub fn sync_pair(
    source: &dyn SourceProvider,
    host: &dyn HostDocument,
    options: &SyncOptions,
) -> Result<PairStatus, Error> {
    let value = source.load()?;
    let current = host.read()?;
    let rewritten = rewrite_with(&current, &options.marker, &value, options.scan_mode)
        .map_err(|err| err.with_path(host.describe()))?;

    if rewritten == current {
        return Ok(PairStatus::Unchanged);
    }
    if options.dry_run {
        return Ok(PairStatus::Stale);
    }
    host.write(&rewritten)?;
    Ok(PairStatus::Updated)
}

/// Syncs file pairs in order, resolving relative paths against `root`.
///
/// Per-pair failures are recorded in the report, never returned as `Err`.
pub fn sync_files(
    pairs: &[SyncPair],
    root: &Path,
    options: &SyncOptions,
) -> Result<SyncReport, Error> {
    let mut report = SyncReport::default();

    for pair in pairs {
        let resolved = pair.resolve(root);
        if !resolved.source.exists() || !resolved.host.exists() {
            tracing::info!(
                source = %pair.source.display(),
                host = %pair.host.display(),
                "skipping pair: files not found"
            );
            report.outcomes.push(PairOutcome {
                pair: pair.clone(),
                status: PairStatus::Skipped,
                error: None,
            });
            continue;
        }

        let source = FileSource::new(&resolved.source);
        let host = FileHost::new(&resolved.host);
        match sync_pair(&source, &host, options) {
            Ok(status) => {
                tracing::info!(
                    source = %pair.source.display(),
                    host = %pair.host.display(),
                    status = status.label(),
                    "pair synced"
                );
                report.outcomes.push(PairOutcome {
                    pair: pair.clone(),
                    status,
                    error: None,
                });
            }
            Err(err) => {
                tracing::error!(
                    source = %pair.source.display(),
                    host = %pair.host.display(),
                    error = %err,
                    "pair failed"
                );
                report.outcomes.push(PairOutcome {
                    pair: pair.clone(),
                    status: PairStatus::Failed,
                    error: Some(err),
                });
                if options.errors == ErrorPolicy::Stop {
                    break;
                }
            }
        }
    }

    Ok(report)
}
