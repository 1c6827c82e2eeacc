//! Purpose: Locate and replace a JSON literal assigned after a marker in host text.
//! Exports: `EmbeddedBlock`, `locate`, `extract`, `rewrite`, `rewrite_with`, `serialize_block`.
//! Role: Pure text transform behind `worksheet sync`; performs no I/O.
//! Invariants: Only the first marker occurrence is considered.
//! Invariants: Bytes outside the statement span are copied through unchanged.
//! Invariants: Output carries exactly one `;` after the serialized literal.
use std::ops::Range;

use serde_json::Value;

use super::error::{Error, ErrorKind};
use super::scan::{ScanMode, matching_brace_end};

/// Position of an embedded block inside a host document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EmbeddedBlock {
    /// Offset of the first marker byte.
    pub marker_start: usize,
    /// Marker text without any trailing `{`.
    pub prefix: String,
    /// `[open brace, one past closing brace)`.
    pub literal: Range<usize>,
    /// Literal range extended over one directly following `;`.
    pub statement_end: usize,
}

impl EmbeddedBlock {
    pub fn literal_text<'a>(&self, host_text: &'a str) -> &'a str {
        &host_text[self.literal.clone()]
    }
}

pub fn locate(host_text: &str, marker: &str, mode: ScanMode) -> Result<EmbeddedBlock, Error> {
    let prefix = marker.strip_suffix('{').unwrap_or(marker);
    if prefix.is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("marker must not be empty"));
    }

    let marker_start = host_text.find(marker).ok_or_else(|| {
        Error::new(ErrorKind::MarkerNotFound)
            .with_message(format!("marker `{marker}` not found"))
            .with_hint("Check that the host page embeds the data block, or pass --marker.")
    })?;
    let open = marker_start + prefix.len();

    if host_text.as_bytes().get(open) != Some(&b'{') {
        return Err(Error::new(ErrorKind::MarkerNotFound)
            .with_message(format!("marker `{marker}` is not followed by an object literal"))
            .with_offset(open));
    }

    let end = matching_brace_end(host_text, open, mode).ok_or_else(|| {
        let err = Error::new(ErrorKind::UnbalancedBraces)
            .with_message("embedded literal has no matching closing brace")
            .with_offset(open);
        match mode {
            ScanMode::Naive => err.with_hint(
                "Braces inside string values are counted too; try --string-aware.",
            ),
            ScanMode::StringAware => err,
        }
    })?;

    let statement_end = if host_text.as_bytes().get(end) == Some(&b';') {
        end + 1
    } else {
        end
    };

    Ok(EmbeddedBlock {
        marker_start,
        prefix: prefix.to_string(),
        literal: open..end,
        statement_end,
    })
}

/// Parses the literal currently embedded after `marker`.
pub fn extract(host_text: &str, marker: &str, mode: ScanMode) -> Result<Value, Error> {
    let block = locate(host_text, marker, mode)?;
    serde_json::from_str(block.literal_text(host_text)).map_err(|err| {
        Error::new(ErrorKind::HostRead)
            .with_message("embedded literal is not valid JSON")
            .with_hint("Re-run sync to replace the malformed embedded block.")
            .with_offset(block.literal.start)
            .with_source(err)
    })
}

/// Pretty JSON with two-space indentation, keys in insertion order.
pub fn serialize_block(value: &Value) -> Result<String, Error> {
    serde_json::to_string_pretty(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to serialize value")
            .with_source(err)
    })
}

pub fn rewrite(host_text: &str, marker: &str, value: &Value) -> Result<String, Error> {
    rewrite_with(host_text, marker, value, ScanMode::Naive)
}

pub fn rewrite_with(
    host_text: &str,
    marker: &str,
    value: &Value,
    mode: ScanMode,
) -> Result<String, Error> {
    let block = locate(host_text, marker, mode)?;
    let serialized = serialize_block(value)?;

    let before = &host_text[..block.marker_start];
    let after = &host_text[block.statement_end..];

    let capacity = before.len() + block.prefix.len() + serialized.len() + 1 + after.len();
    let mut out = String::with_capacity(capacity);
    out.push_str(before);
    out.push_str(&block.prefix);
    out.push_str(&serialized);
    out.push(';');
    out.push_str(after);
    Ok(out)
}
