//! Registry and fixture scans feeding reconciliation, over real files.

use std::fs;

use formula_fn_triage::{
    known_failures, reconcile, scan_fixture_dir, scan_registry, FixtureScanOptions, KnownFailure,
    RegistryScanOptions, DEFAULT_TOP_FAILURES,
};
use pretty_assertions::assert_eq;

fn known(name: &str, category: &str, failures: u32) -> KnownFailure {
    KnownFailure {
        name: name.to_string(),
        category: category.to_string(),
        failures,
    }
}

#[test]
fn implemented_catalog_entry_ranks_first_in_its_category() {
    let dir = tempfile::tempdir().unwrap();
    let registry_src = "export const ALL_FUNCTIONS = [\n  EXPAND,\n  VSTACK,\n] as CustomFormula[];";
    fs::write(
        dir.path().join("fixtures.ts"),
        "[{ name: 'EXPAND', category: '12. Dynamic Arrays', expectedValues: { A1: 1 } }]",
    )
    .unwrap();

    let implemented = scan_registry(registry_src, &RegistryScanOptions::default()).unwrap();
    let scan = scan_fixture_dir(dir.path(), &FixtureScanOptions::default()).unwrap();
    let catalog = vec![
        known("VSTACK", "12. Dynamic Arrays", 8),
        known("EXPAND", "12. Dynamic Arrays", 12),
    ];

    let report = reconcile(&catalog, &implemented, &scan.entries, DEFAULT_TOP_FAILURES);
    let members = &report.implemented_but_failing["12. Dynamic Arrays"];
    assert_eq!(members[0].name, "EXPAND");
    assert_eq!(report.top_failures[0].name, "EXPAND");
    assert_eq!(report.top_failures[0].failures, 12);
}

#[test]
fn unregistered_catalog_entry_lands_in_the_unimplemented_group() {
    let implemented = scan_registry(
        "ALL_FUNCTIONS = [SUM]",
        &RegistryScanOptions::default(),
    )
    .unwrap();
    let catalog = vec![known("SERIESSUM", "01. Math", 1)];

    let report = reconcile(
        &catalog,
        &implemented,
        &Default::default(),
        DEFAULT_TOP_FAILURES,
    );
    assert!(report.implemented_but_failing.is_empty());
    assert_eq!(report.unimplemented_known["01. Math"][0].name, "SERIESSUM");
}

#[test]
fn fixture_only_names_group_by_their_fixture_category() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("02-statistics.ts"),
        "[\n  { name: 'NORM.S.DIST', category: '02. Statistical', expectedValues: { B2: 0.5 } },\n  { name: 'MYSTERY' },\n]",
    )
    .unwrap();

    let implemented = scan_registry("ALL_FUNCTIONS = [SUM]", &RegistryScanOptions::default()).unwrap();
    let scan = scan_fixture_dir(dir.path(), &FixtureScanOptions::default()).unwrap();
    let report = reconcile(&[], &implemented, &scan.entries, DEFAULT_TOP_FAILURES);

    assert_eq!(
        report.unimplemented_tested["02. Statistical"],
        vec!["NORM.S.DIST".to_string()]
    );
    assert_eq!(
        report.unimplemented_tested["Unknown"],
        vec!["MYSTERY".to_string()]
    );
}

#[test]
fn builtin_catalog_keeps_the_triage_snapshot() {
    let catalog = known_failures();
    let expand = catalog.iter().find(|k| k.name == "EXPAND").unwrap();
    assert_eq!(expand.category, "12. Dynamic Arrays");
    assert_eq!(expand.failures, 12);

    let seriessum = catalog.iter().find(|k| k.name == "SERIESSUM").unwrap();
    assert_eq!(seriessum.category, "01. Math");
    assert_eq!(seriessum.failures, 1);
}
