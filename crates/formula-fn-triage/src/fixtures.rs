//! Fixture corpus scanning.
//!
//! Fixture files declare one record per test case: a brace block with a
//! `name:` field, usually a `category:` field, and optionally an
//! `expectedValues:` sub-block pinning cell results. Records are recovered
//! as balanced spans; every field lookup is scoped to its record span so a
//! distant record can never contribute a category or an `expectedValues`
//! block to the wrong name. A malformed record is skipped with a warning and
//! the scan continues.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use globset::{Glob, GlobSet, GlobSetBuilder};
use regex::Regex;
use thiserror::Error;
use walkdir::WalkDir;

use crate::block::{self, BlockError, BlockSpan, BRACES};

/// Extensions recognized as fixture sources.
pub const DEFAULT_EXTENSIONS: &[&str] = &["ts", "tsx"];

#[derive(Debug, Clone)]
pub struct FixtureScanOptions {
    /// File extensions (without the dot) recognized as fixture sources.
    pub extensions: Vec<String>,
    /// Optional glob patterns restricting which files are scanned, matched
    /// against paths relative to the scan root.
    pub include: Vec<String>,
}

impl Default for FixtureScanOptions {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            include: Vec::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FixtureError {
    /// The fixture root is missing. Its own variant, so a mistyped path
    /// cannot read as an empty corpus.
    #[error("fixture directory {} not found", .dir.display())]
    DirNotFound { dir: PathBuf },
    #[error("invalid include pattern `{pattern}`: {source}")]
    InvalidInclude {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Non-fatal problems encountered during a scan. Reported, never aborting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanWarning {
    /// A `name:` field whose enclosing record span could not be balanced.
    UnbalancedRecord {
        file: PathBuf,
        offset: usize,
        name: String,
        detail: String,
    },
    /// The same name appears in multiple records with disagreeing
    /// categories. First-seen wins; the disagreement is surfaced.
    CategoryConflict {
        file: PathBuf,
        name: String,
        kept: String,
        conflicting: String,
    },
    /// A file or directory entry that could not be read.
    Io { path: PathBuf, detail: String },
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanWarning::UnbalancedRecord {
                file,
                offset,
                name,
                detail,
            } => write!(
                f,
                "{}: record `{name}` at offset {offset} skipped: {detail}",
                file.display()
            ),
            ScanWarning::CategoryConflict {
                file,
                name,
                kept,
                conflicting,
            } => write!(
                f,
                "{}: `{name}` declared with category `{conflicting}` but already recorded as `{kept}`",
                file.display()
            ),
            ScanWarning::Io { path, detail } => {
                write!(f, "{}: {detail}", path.display())
            }
        }
    }
}

/// What the corpus asserts about one function name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureEntry {
    pub category: Option<String>,
    /// Whether any record for this name carries an `expectedValues:` block.
    pub expected_values: bool,
}

#[derive(Debug, Default)]
pub struct FixtureScan {
    pub entries: BTreeMap<String, FixtureEntry>,
    pub warnings: Vec<ScanWarning>,
    pub files_scanned: usize,
}

/// One fixture record resolved to spans within its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FixtureRecord {
    pub name: String,
    pub span: BlockSpan,
    pub category: Option<String>,
    /// Span covering the `expectedValues` key through its block close.
    pub expected_values: Option<BlockSpan>,
}

#[derive(Debug)]
pub(crate) struct RecordIssue {
    pub offset: usize,
    pub name: String,
    pub error: BlockError,
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"name\s*:\s*['"]([^'"]+)['"]"#).expect("name regex"))
}

fn category_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"category\s*:\s*['"]([^'"]+)['"]"#).expect("category regex"))
}

fn expected_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"expectedValues\s*:").expect("expectedValues regex"))
}

/// Resolves every fixture record in `text`.
///
/// Records whose span cannot be balanced land in the issue list; an
/// `expectedValues:` key whose sub-block cannot be balanced degrades to
/// "absent" with an issue, keeping the record itself.
pub(crate) fn scan_records(text: &str) -> (Vec<FixtureRecord>, Vec<RecordIssue>) {
    let mut records = Vec::new();
    let mut issues = Vec::new();

    for caps in name_re().captures_iter(text) {
        let field = caps.get(0).expect("capture 0");
        let name = caps[1].to_string();

        let span = match block::enclosing_span(text, field.start(), BRACES) {
            Ok(span) => span,
            Err(error) => {
                issues.push(RecordIssue {
                    offset: field.start(),
                    name,
                    error,
                });
                continue;
            }
        };

        let body = span.slice(text);
        let category = category_re().captures(body).map(|c| c[1].to_string());

        let expected_values = match expected_key_re().find(body) {
            Some(key) => {
                let key_abs = span.start + key.start();
                let after_key = span.start + key.end();
                match text[after_key..span.end].find('{') {
                    Some(rel) => match block::forward_span(text, after_key + rel, BRACES) {
                        Ok(sub) => Some(BlockSpan {
                            start: key_abs,
                            end: sub.end,
                        }),
                        Err(error) => {
                            issues.push(RecordIssue {
                                offset: key_abs,
                                name: name.clone(),
                                error,
                            });
                            None
                        }
                    },
                    None => None,
                }
            }
            None => None,
        };

        records.push(FixtureRecord {
            name,
            span,
            category,
            expected_values,
        });
    }

    (records, issues)
}

/// Lists fixture files under `dir`, sorted, filtered by extension and the
/// optional include globs.
pub(crate) fn fixture_files(
    dir: &Path,
    options: &FixtureScanOptions,
) -> Result<(Vec<PathBuf>, Vec<ScanWarning>), FixtureError> {
    if !dir.is_dir() {
        return Err(FixtureError::DirNotFound {
            dir: dir.to_path_buf(),
        });
    }

    let include = build_include_set(&options.include)?;
    let mut files = Vec::new();
    let mut warnings = Vec::new();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warnings.push(ScanWarning::Io {
                    path: err
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| dir.to_path_buf()),
                    detail: err.to_string(),
                });
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let recognized = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| options.extensions.iter().any(|e| e == ext));
        if !recognized {
            continue;
        }
        if let Some(set) = &include {
            let rel = path.strip_prefix(dir).unwrap_or(path);
            if !set.is_match(rel) {
                continue;
            }
        }
        files.push(path.to_path_buf());
    }

    Ok((files, warnings))
}

fn build_include_set(patterns: &[String]) -> Result<Option<GlobSet>, FixtureError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| FixtureError::InvalidInclude {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    let set = builder
        .build()
        .map_err(|source| FixtureError::InvalidInclude {
            pattern: patterns.join(", "),
            source,
        })?;
    Ok(Some(set))
}

/// Scans every fixture file under `dir` and aggregates what the corpus
/// asserts per function name.
pub fn scan_fixture_dir(
    dir: &Path,
    options: &FixtureScanOptions,
) -> Result<FixtureScan, FixtureError> {
    let (files, mut warnings) = fixture_files(dir, options)?;
    let mut entries: BTreeMap<String, FixtureEntry> = BTreeMap::new();
    let mut files_scanned = 0usize;

    for path in files {
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                warnings.push(ScanWarning::Io {
                    path,
                    detail: err.to_string(),
                });
                continue;
            }
        };
        files_scanned += 1;

        let (records, issues) = scan_records(&text);
        for issue in issues {
            warnings.push(ScanWarning::UnbalancedRecord {
                file: path.clone(),
                offset: issue.offset,
                name: issue.name,
                detail: issue.error.to_string(),
            });
        }

        for record in records {
            match entries.entry(record.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(FixtureEntry {
                        category: record.category,
                        expected_values: record.expected_values.is_some(),
                    });
                }
                Entry::Occupied(mut slot) => {
                    let entry = slot.get_mut();
                    match (&entry.category, &record.category) {
                        (Some(kept), Some(new)) if kept != new => {
                            warnings.push(ScanWarning::CategoryConflict {
                                file: path.clone(),
                                name: record.name,
                                kept: kept.clone(),
                                conflicting: new.clone(),
                            });
                        }
                        (None, Some(new)) => entry.category = Some(new.clone()),
                        _ => {}
                    }
                    entry.expected_values |= record.expected_values.is_some();
                }
            }
        }
    }

    Ok(FixtureScan {
        entries,
        warnings,
        files_scanned,
    })
}
