//! Purpose: Resolve which source/host pairs `worksheet sync` operates on.
//! Exports: `Manifest`, `load_manifest`, `default_pairs`, `parse_pair_arg`.
//! Role: Keeps the CLI's pair selection (manifest, flags, defaults) in one place.
//! Invariants: Default pairs match the historical worksheet layout under the root dir.
//! Invariants: Manifest files reject unknown fields so typos surface as errors.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use worksheet::api::{Error, ErrorKind, SyncPair};
use worksheet::json::parse;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ManifestPair {
    pub source: String,
    pub host: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct Manifest {
    #[serde(default)]
    pub marker: Option<String>,
    pub pairs: Vec<ManifestPair>,
}

impl Manifest {
    pub(crate) fn sync_pairs(&self) -> Vec<SyncPair> {
        self.pairs
            .iter()
            .map(|pair| SyncPair::new(&pair.source, &pair.host))
            .collect()
    }
}

pub(crate) fn load_manifest(path: &Path) -> Result<Manifest, Error> {
    let text = fs::read_to_string(path).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("failed to read manifest")
            .with_path(path)
            .with_source(err)
    })?;
    parse::from_str(&text).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid manifest: {err}"))
            .with_hint(r#"Expected {"marker"?: "...", "pairs": [{"source": "...", "host": "..."}]}."#)
            .with_path(path)
    })
}

pub(crate) fn default_pairs() -> Vec<SyncPair> {
    vec![
        SyncPair::new("dev-tools/worksheet-1-qa-export.json", "worksheet-1.html"),
        SyncPair::new("dev-tools/worksheet-1-qa-export.json", "worksheet-1-json.html"),
    ]
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum PairArgError {
    MissingSeparator,
    EmptySide,
}

/// Parses `<source>:<host>`; the last `:` separates the two paths.
pub(crate) fn parse_pair_arg(arg: &str) -> Result<SyncPair, PairArgError> {
    let (source, host) = arg.rsplit_once(':').ok_or(PairArgError::MissingSeparator)?;
    if source.is_empty() || host.is_empty() {
        return Err(PairArgError::EmptySide);
    }
    Ok(SyncPair::new(source, host))
}

#[cfg(test)]
mod tests {
    use super::{Manifest, ManifestPair, PairArgError, default_pairs, load_manifest, parse_pair_arg};
    use std::fs;
    use worksheet::api::{ErrorKind, SyncPair};

    #[test]
    fn pair_arg_splits_on_last_colon() {
        assert_eq!(
            parse_pair_arg("data/q.json:page.html"),
            Ok(SyncPair::new("data/q.json", "page.html"))
        );
        assert_eq!(
            parse_pair_arg(r"C:\data\q.json:page.html"),
            Ok(SyncPair::new(r"C:\data\q.json", "page.html"))
        );
        assert_eq!(
            parse_pair_arg("page.html"),
            Err(PairArgError::MissingSeparator)
        );
        assert_eq!(parse_pair_arg(":page.html"), Err(PairArgError::EmptySide));
    }

    #[test]
    fn default_pairs_share_one_export() {
        let pairs = default_pairs();
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|pair| pair.source == pairs[0].source));
    }

    #[test]
    fn manifest_loads_pairs_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("sync.json");
        fs::write(
            &path,
            r#"{"marker": "const DATA = ", "pairs": [
                {"source": "b.json", "host": "b.html"},
                {"source": "a.json", "host": "a.html"}
            ]}"#,
        )
        .expect("write");

        let manifest = load_manifest(&path).expect("manifest");
        assert_eq!(
            manifest,
            Manifest {
                marker: Some("const DATA = ".to_string()),
                pairs: vec![
                    ManifestPair {
                        source: "b.json".to_string(),
                        host: "b.html".to_string(),
                    },
                    ManifestPair {
                        source: "a.json".to_string(),
                        host: "a.html".to_string(),
                    },
                ],
            }
        );
        assert_eq!(manifest.sync_pairs()[1], SyncPair::new("a.json", "a.html"));
    }

    #[test]
    fn manifest_rejects_unknown_fields() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("sync.json");
        fs::write(&path, r#"{"pairs": [], "markr": "x"}"#).expect("write");
        let err = load_manifest(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.message().expect("message").contains("markr"));
    }
}
