//! In-place removal of `expectedValues` assertions.
//!
//! Stripping is span-exact: for each targeted record the removal covers the
//! `expectedValues` key through its balanced block close, plus at most one
//! trailing comma separator. Every modified file must shrink by exactly the
//! sum of its removed spans; a file violating that invariant is reported and
//! left untouched. Removal is destructive and one-way, so files are replaced
//! atomically (temp file in the same directory, sync, rename into place) and
//! only when something actually changed.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::block::BlockSpan;
use crate::fixtures::{self, FixtureError, FixtureScanOptions, ScanWarning};

#[derive(Debug, Clone, Default)]
pub struct StripOptions {
    pub scan: FixtureScanOptions,
    /// Report what would change without writing anything back.
    pub dry_run: bool,
}

#[derive(Debug, Default)]
pub struct StripOutcome {
    /// Files rewritten, or that would be rewritten under `dry_run`.
    pub modified_files: Vec<PathBuf>,
    /// `expectedValues` blocks removed across all files.
    pub records_stripped: usize,
    /// Files whose post-edit length failed the shrink invariant; left
    /// untouched.
    pub integrity_failures: Vec<PathBuf>,
    pub warnings: Vec<ScanWarning>,
}

impl StripOutcome {
    pub fn files_modified(&self) -> usize {
        self.modified_files.len()
    }
}

/// Removes the `expectedValues` block of every fixture record whose name is
/// in `targets`, across all fixture files under `dir`.
///
/// Idempotent: a second run over the same tree removes nothing and modifies
/// no files. Records outside `targets` are never touched.
pub fn strip_expected_values(
    dir: &Path,
    targets: &BTreeSet<String>,
    options: &StripOptions,
) -> Result<StripOutcome, FixtureError> {
    let (files, warnings) = fixtures::fixture_files(dir, &options.scan)?;
    let mut outcome = StripOutcome {
        warnings,
        ..StripOutcome::default()
    };

    for path in files {
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                outcome.warnings.push(ScanWarning::Io {
                    path,
                    detail: err.to_string(),
                });
                continue;
            }
        };

        let (records, issues) = fixtures::scan_records(&text);
        for issue in issues {
            outcome.warnings.push(ScanWarning::UnbalancedRecord {
                file: path.clone(),
                offset: issue.offset,
                name: issue.name,
                detail: issue.error.to_string(),
            });
        }

        let mut removals: BTreeSet<BlockSpan> = BTreeSet::new();
        for record in &records {
            if !targets.contains(&record.name) {
                continue;
            }
            if let Some(span) = record.expected_values {
                removals.insert(BlockSpan {
                    start: span.start,
                    end: removal_end(&text, span.end),
                });
            }
        }
        if removals.is_empty() {
            continue;
        }

        let removed_total: usize = removals.iter().map(BlockSpan::len).sum();
        let mut updated = text.clone();
        for span in removals.iter().rev() {
            updated.replace_range(span.start..span.end, "");
        }

        // Shrink invariant: overlapping or stale spans would corrupt the
        // file, so refuse to write anything that removed more or less than
        // the spans account for.
        if updated.len() != text.len() - removed_total {
            outcome.integrity_failures.push(path);
            continue;
        }

        outcome.records_stripped += removals.len();
        if !options.dry_run {
            if let Err(err) = replace_file(&path, &updated) {
                outcome.warnings.push(ScanWarning::Io {
                    path,
                    detail: err.to_string(),
                });
                continue;
            }
        }
        outcome.modified_files.push(path);
    }

    Ok(outcome)
}

/// Extends a removal past one trailing comma separator, including inline
/// whitespace before it and at most one newline after it. Anything else
/// after the block stays.
fn removal_end(text: &str, block_end: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = block_end;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b',' {
        i += 1;
        while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'\r' {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'\n' {
            i += 1;
        }
        return i;
    }
    block_end
}

/// Atomic replace: temp file next to the destination, sync, rename. The
/// destination is untouched if any step fails.
fn replace_file(dest: &Path, contents: &str) -> std::io::Result<()> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn targets(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn removal_end_consumes_one_trailing_separator() {
        let text = "expectedValues: { a: 1 },\n  next: 2";
        let block_end = text.find('}').unwrap() + 1;
        let end = removal_end(text, block_end);
        assert_eq!(&text[end..], "  next: 2");
    }

    #[test]
    fn removal_end_leaves_text_without_separator_alone() {
        let text = "expectedValues: { a: 1 }\n}";
        let block_end = text.find('}').unwrap() + 1;
        assert_eq!(removal_end(text, block_end), block_end);
    }

    #[test]
    fn strips_only_targeted_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.ts");
        fs::write(
            &path,
            "[\n  { name: 'KEEP', expectedValues: { A1: 1 } },\n  { name: 'DROP', expectedValues: { A1: 2 } },\n]",
        )
        .unwrap();

        let outcome =
            strip_expected_values(dir.path(), &targets(&["DROP"]), &StripOptions::default())
                .unwrap();
        assert_eq!(outcome.files_modified(), 1);
        assert_eq!(outcome.records_stripped, 1);

        let updated = fs::read_to_string(&path).unwrap();
        assert!(updated.contains("{ name: 'KEEP', expectedValues: { A1: 1 } }"));
        assert!(updated.contains("{ name: 'DROP',  }"));
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.ts");
        let original = "[{ name: 'DROP', expectedValues: { A1: 2 } }]";
        fs::write(&path, original).unwrap();

        let options = StripOptions {
            dry_run: true,
            ..StripOptions::default()
        };
        let outcome = strip_expected_values(dir.path(), &targets(&["DROP"]), &options).unwrap();
        assert_eq!(outcome.files_modified(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn file_shrinks_by_exactly_the_removed_span() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fixtures.ts");
        let original =
            "[{ name: 'DROP', category: '02. Statistical', expectedValues: { a: 1, b: { c: 2 } } }]";
        fs::write(&path, original).unwrap();

        let before = fs::read_to_string(&path).unwrap();
        let (records, _) = fixtures::scan_records(&before);
        let span = records[0].expected_values.unwrap();
        let expected_len = before.len() - (removal_end(&before, span.end) - span.start);

        strip_expected_values(dir.path(), &targets(&["DROP"]), &StripOptions::default()).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap().len(), expected_len);
    }
}
