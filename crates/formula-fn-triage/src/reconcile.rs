//! Coverage reconciliation across the three catalogs.
//!
//! Pure function over (known-failure catalog, implemented set, tested map).
//! Every grouping is a `BTreeMap` and every member list has an explicit sort
//! key, so identical inputs always render identical reports.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::fixtures::FixtureEntry;
use crate::known::KnownFailure;

/// Default truncation for the ranked failure listing.
pub const DEFAULT_TOP_FAILURES: usize = 10;

/// Category assigned to tested functions whose fixtures never declare one.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailingFunction {
    pub name: String,
    pub category: String,
    pub failures: u32,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct CoverageReport {
    /// Registered in the engine yet present in the known-failure catalog.
    /// Grouped by category; members ordered by descending failure count,
    /// catalog declaration order breaking ties.
    pub implemented_but_failing: BTreeMap<String, Vec<FailingFunction>>,
    /// In the known-failure catalog but absent from the registry. Grouped by
    /// category in declaration order.
    pub unimplemented_known: BTreeMap<String, Vec<FailingFunction>>,
    /// Fixture names neither registered nor covered by the catalog, grouped
    /// by the category their fixtures assert.
    pub unimplemented_tested: BTreeMap<String, Vec<String>>,
    /// Registered functions with the highest failure counts, descending,
    /// truncated to the requested length.
    pub top_failures: Vec<FailingFunction>,
}

impl CoverageReport {
    pub fn implemented_failing_count(&self) -> usize {
        self.implemented_but_failing.values().map(Vec::len).sum()
    }

    pub fn unimplemented_known_count(&self) -> usize {
        self.unimplemented_known.values().map(Vec::len).sum()
    }

    pub fn unimplemented_tested_count(&self) -> usize {
        self.unimplemented_tested.values().map(Vec::len).sum()
    }
}

fn to_failing(entry: &KnownFailure) -> FailingFunction {
    FailingFunction {
        name: entry.name.clone(),
        category: entry.category.clone(),
        failures: entry.failures,
    }
}

pub fn reconcile(
    known: &[KnownFailure],
    implemented: &BTreeSet<String>,
    tested: &BTreeMap<String, FixtureEntry>,
    top_n: usize,
) -> CoverageReport {
    let known_names: BTreeSet<&str> = known.iter().map(|k| k.name.as_str()).collect();

    let mut implemented_but_failing: BTreeMap<String, Vec<FailingFunction>> = BTreeMap::new();
    let mut unimplemented_known: BTreeMap<String, Vec<FailingFunction>> = BTreeMap::new();
    for entry in known {
        let group = if implemented.contains(&entry.name) {
            &mut implemented_but_failing
        } else {
            &mut unimplemented_known
        };
        group
            .entry(entry.category.clone())
            .or_default()
            .push(to_failing(entry));
    }
    for members in implemented_but_failing.values_mut() {
        // Stable sort: declaration order survives as the tie-break.
        members.sort_by(|a, b| b.failures.cmp(&a.failures));
    }

    let mut unimplemented_tested: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, entry) in tested {
        if implemented.contains(name) || known_names.contains(name.as_str()) {
            continue;
        }
        let category = entry
            .category
            .clone()
            .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());
        unimplemented_tested.entry(category).or_default().push(name.clone());
    }

    let mut top_failures: Vec<FailingFunction> = known
        .iter()
        .filter(|k| k.failures > 0 && implemented.contains(&k.name))
        .map(to_failing)
        .collect();
    top_failures.sort_by(|a, b| b.failures.cmp(&a.failures));
    top_failures.truncate(top_n);

    CoverageReport {
        implemented_but_failing,
        unimplemented_known,
        unimplemented_tested,
        top_failures,
    }
}
