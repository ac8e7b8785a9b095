//! Document store: loads, classifies and holds the immutable advisory
//! snapshot.
//!
//! The snapshot is built once at startup and shared read-only across all
//! requests. An externally triggered reload builds a fresh snapshot and
//! swaps it atomically; in-flight requests keep reading the snapshot
//! they started with.

pub mod validator;

pub use validator::{AdvisoryValidator, Classification, SchemaValidator};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use thiserror::Error;
use walkdir::WalkDir;

use crate::models::{Advisory, ContentHashes, TlpLabel};

/// Fatal snapshot-construction failures. Any of these prevents service
/// startup; none is recoverable at request time.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("unable to walk document directory {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("unable to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unable to decode advisory {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("advisory {} carries unknown TLP label {label:?}", path.display())]
    UnknownTlpLabel { label: String, path: PathBuf },
}

/// An advisory plus its storage sidecars. Created once at load time and
/// never mutated.
#[derive(Debug, Clone)]
pub struct AdvisoryRecord {
    /// The decoded document
    pub advisory: Advisory,

    /// Path the document was loaded from
    pub path: PathBuf,

    /// Content hashes from sibling `.sha256`/`.sha512` files, keyed by
    /// algorithm name
    pub hashes: ContentHashes,

    /// Detached signature from a sibling `.asc` file
    pub signature: Option<String>,
}

/// The immutable, ordered advisory collection shared by all requests
#[derive(Debug, Default)]
pub struct Snapshot {
    records: Vec<AdvisoryRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<AdvisoryRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[AdvisoryRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads and holds the advisory snapshot
pub struct DocumentStore {
    root: PathBuf,
    validator: Arc<dyn AdvisoryValidator>,
    snapshot: RwLock<Arc<Snapshot>>,
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl DocumentStore {
    /// Walk `root` and build the initial snapshot. Fails fatally on I/O
    /// errors, malformed JSON or an unclassifiable TLP label.
    pub fn open(
        root: impl Into<PathBuf>,
        validator: Arc<dyn AdvisoryValidator>,
    ) -> Result<Self, LoadError> {
        let root = root.into();
        let snapshot = Arc::new(build_snapshot(&root, validator.as_ref())?);
        Ok(Self {
            root,
            validator,
            snapshot: RwLock::new(snapshot),
        })
    }

    /// The current snapshot. Callers clone the `Arc` once and read from
    /// it for the rest of the request, unaffected by concurrent reloads.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.read().clone()
    }

    /// Rebuild the snapshot from the same root and swap it in atomically.
    /// On failure the previous snapshot stays in place.
    pub fn reload(&self) -> Result<(), LoadError> {
        let fresh = Arc::new(build_snapshot(&self.root, self.validator.as_ref())?);
        *self.snapshot.write() = fresh;
        Ok(())
    }
}

fn build_snapshot(root: &Path, validator: &dyn AdvisoryValidator) -> Result<Snapshot, LoadError> {
    // a provider web root keeps rendered pages under html/; never
    // advisories
    let html_subtree = root.join("html");
    let mut records = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        if path.starts_with(&html_subtree) {
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        if let Some(record) = load_record(path, validator)? {
            records.push(record);
        }
    }

    for label in TlpLabel::iter() {
        let count = records
            .iter()
            .filter(|record| record.advisory.label() == label)
            .count();
        tracing::info!(label = %label, count, "loaded advisories");
    }

    Ok(Snapshot::new(records))
}

/// Load one JSON file. Returns None when the validator classifies it as
/// something other than an advisory (e.g. a feed index).
fn load_record(
    path: &Path,
    validator: &dyn AdvisoryValidator,
) -> Result<Option<AdvisoryRecord>, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let raw: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    match validator.classify(&raw) {
        Classification::Accepted => {}
        Classification::NotAnAdvisory(diagnostics) => {
            tracing::debug!(
                path = %path.display(),
                issues = diagnostics.len(),
                "skipping JSON file that is not an advisory"
            );
            return Ok(None);
        }
    }

    // check the label against the closed set before the full decode so
    // the failure names the offending value
    let label = raw
        .pointer("/document/distribution/tlp/label")
        .and_then(serde_json::Value::as_str)
        .unwrap_or_default();
    if TlpLabel::from_str(label).is_err() {
        return Err(LoadError::UnknownTlpLabel {
            label: label.to_string(),
            path: path.to_path_buf(),
        });
    }

    let advisory: Advisory =
        serde_json::from_value(raw).map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    let mut hashes = ContentHashes::new();
    for algorithm in ["sha256", "sha512"] {
        if let Some(digest) = read_sidecar_digest(path, algorithm)? {
            hashes.insert(algorithm.to_string(), digest);
        }
    }

    if let Some(expected) = hashes.get("sha256") {
        let actual = format!("{:x}", Sha256::digest(&bytes));
        if !actual.eq_ignore_ascii_case(expected) {
            tracing::warn!(
                path = %path.display(),
                "sha256 sidecar does not match advisory content"
            );
        }
    }

    let signature = read_sidecar(path, "asc")?;

    Ok(Some(AdvisoryRecord {
        advisory,
        path: path.to_path_buf(),
        hashes,
        signature,
    }))
}

/// Read an optional sidecar file (`<name>.json.<ext>`). A missing file
/// is None; any other I/O failure propagates.
fn read_sidecar(path: &Path, ext: &str) -> Result<Option<String>, LoadError> {
    let mut sidecar = path.as_os_str().to_os_string();
    sidecar.push(".");
    sidecar.push(ext);
    match std::fs::read_to_string(&sidecar) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(LoadError::Io {
            path: PathBuf::from(sidecar),
            source,
        }),
    }
}

/// Hash sidecars hold `<hex digest>  <filename>`; only the digest matters
fn read_sidecar_digest(path: &Path, algorithm: &str) -> Result<Option<String>, LoadError> {
    Ok(read_sidecar(path, algorithm)?
        .and_then(|content| content.split_whitespace().next().map(str::to_string)))
}
