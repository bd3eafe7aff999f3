//! Text and JSON rendering of a coverage report.
//!
//! Text goes to a caller-supplied writer so tests can capture it and broken
//! pipes surface as ordinary `io::Error`s. JSON mirrors the text content as
//! a serialized struct for tooling.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::reconcile::{CoverageReport, FailingFunction};

/// Run metadata threaded into both output formats.
pub struct ReportContext<'a> {
    pub registry: &'a Path,
    pub fixtures: &'a Path,
    pub files_scanned: usize,
    pub registered_total: usize,
    pub known_total: usize,
}

pub fn render_text(
    ctx: &ReportContext<'_>,
    report: &CoverageReport,
    volatile_pinned: &[String],
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "Function coverage report")?;
    writeln!(out, "  registry: {}", ctx.registry.display())?;
    writeln!(
        out,
        "  fixtures: {} ({} files)",
        ctx.fixtures.display(),
        ctx.files_scanned
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "Summary: registered={} known-failing={} implemented-failing={} unimplemented-known={} unimplemented-tested={}",
        ctx.registered_total,
        ctx.known_total,
        report.implemented_failing_count(),
        report.unimplemented_known_count(),
        report.unimplemented_tested_count()
    )?;

    writeln!(out)?;
    writeln!(out, "Implemented but failing (fix first)")?;
    if report.implemented_but_failing.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (category, members) in &report.implemented_but_failing {
        writeln!(out, "  {category}:")?;
        for f in members {
            if f.failures > 0 {
                writeln!(
                    out,
                    "    - {}: {} failing {}",
                    f.name,
                    f.failures,
                    if f.failures == 1 { "cell" } else { "cells" }
                )?;
            } else {
                writeln!(out, "    - {}: failing (no per-cell detail)", f.name)?;
            }
        }
    }

    writeln!(out)?;
    writeln!(out, "In the known-failure catalog but not registered")?;
    if report.unimplemented_known.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (category, members) in &report.unimplemented_known {
        writeln!(out, "  {category}:")?;
        for f in members {
            writeln!(out, "    - {}", f.name)?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Fixtures without a registered implementation")?;
    if report.unimplemented_tested.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for (category, names) in &report.unimplemented_tested {
        writeln!(out, "  {category}:")?;
        for name in names {
            writeln!(out, "    - {name}")?;
        }
    }

    if !report.top_failures.is_empty() {
        writeln!(out)?;
        writeln!(out, "Top failures")?;
        for (rank, f) in report.top_failures.iter().enumerate() {
            writeln!(
                out,
                "  {:>2}. {} ({}): {}",
                rank + 1,
                f.name,
                f.category,
                f.failures
            )?;
        }
    }

    if !volatile_pinned.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "Volatile functions with pinned expectedValues: {}",
            volatile_pinned.join(", ")
        )?;
        writeln!(
            out,
            "  These depend on the evaluation instant; strip them with `strip-expected --include-volatile`."
        )?;
    }

    Ok(())
}

#[derive(Debug, Serialize)]
pub struct JsonCounts {
    pub registered: usize,
    pub known_failing: usize,
    pub implemented_failing: usize,
    pub unimplemented_known: usize,
    pub unimplemented_tested: usize,
}

#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub registry: String,
    pub fixtures: String,
    pub files_scanned: usize,
    pub counts: JsonCounts,
    pub implemented_but_failing: &'a BTreeMap<String, Vec<FailingFunction>>,
    pub unimplemented_known: &'a BTreeMap<String, Vec<FailingFunction>>,
    pub unimplemented_tested: &'a BTreeMap<String, Vec<String>>,
    pub top_failures: &'a [FailingFunction],
    pub volatile_with_pinned_values: &'a [String],
}

pub fn json_report<'a>(
    ctx: &ReportContext<'_>,
    report: &'a CoverageReport,
    volatile_pinned: &'a [String],
) -> JsonReport<'a> {
    JsonReport {
        registry: ctx.registry.to_string_lossy().into_owned(),
        fixtures: ctx.fixtures.to_string_lossy().into_owned(),
        files_scanned: ctx.files_scanned,
        counts: JsonCounts {
            registered: ctx.registered_total,
            known_failing: ctx.known_total,
            implemented_failing: report.implemented_failing_count(),
            unimplemented_known: report.unimplemented_known_count(),
            unimplemented_tested: report.unimplemented_tested_count(),
        },
        implemented_but_failing: &report.implemented_but_failing,
        unimplemented_known: &report.unimplemented_known,
        unimplemented_tested: &report.unimplemented_tested,
        top_failures: &report.top_failures,
        volatile_with_pinned_values: volatile_pinned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::known::KnownFailure;
    use crate::reconcile::{self, DEFAULT_TOP_FAILURES};

    fn sample_report() -> CoverageReport {
        let known = vec![
            KnownFailure {
                name: "EXPAND".to_string(),
                category: "12. Dynamic Arrays".to_string(),
                failures: 12,
            },
            KnownFailure {
                name: "SERIESSUM".to_string(),
                category: "01. Math".to_string(),
                failures: 1,
            },
        ];
        let implemented: BTreeSet<String> = [String::from("EXPAND")].into_iter().collect();
        reconcile::reconcile(&known, &implemented, &BTreeMap::new(), DEFAULT_TOP_FAILURES)
    }

    #[test]
    fn text_report_lists_groups_and_ranks() {
        let report = sample_report();
        let ctx = ReportContext {
            registry: Path::new("src/index.ts"),
            fixtures: Path::new("src/data"),
            files_scanned: 3,
            registered_total: 1,
            known_total: 2,
        };
        let mut out = Vec::new();
        render_text(&ctx, &report, &[], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("implemented-failing=1"));
        assert!(text.contains("    - EXPAND: 12 failing cells"));
        assert!(text.contains("In the known-failure catalog but not registered"));
        assert!(text.contains("    - SERIESSUM"));
        assert!(text.contains("   1. EXPAND (12. Dynamic Arrays): 12"));
    }

    #[test]
    fn json_report_serializes_counts_and_groups() {
        let report = sample_report();
        let ctx = ReportContext {
            registry: Path::new("src/index.ts"),
            fixtures: Path::new("src/data"),
            files_scanned: 3,
            registered_total: 1,
            known_total: 2,
        };
        let json = serde_json::to_value(json_report(&ctx, &report, &[])).unwrap();
        assert_eq!(json["counts"]["implemented_failing"], 1);
        assert_eq!(json["counts"]["unimplemented_known"], 1);
        assert_eq!(
            json["top_failures"][0]["name"],
            serde_json::Value::String("EXPAND".to_string())
        );
    }
}
