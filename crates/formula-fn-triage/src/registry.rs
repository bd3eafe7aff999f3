//! Scans engine source text for the function registration collection.
//!
//! The engine registers every built-in through one top-level collection
//! literal (`ALL_FUNCTIONS = [...]`). The scanner isolates that literal with
//! a balanced bracket span and harvests every identifier matching the
//! function-name shape, minus a stoplist of structural tokens that share the
//! shape without naming a function.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::block::{self, BlockError, BRACKETS};

/// Marker introducing the registration literal in the engine source.
pub const DEFAULT_MARKER: &str = "ALL_FUNCTIONS";

/// Uppercase tokens that appear inside the registration block but are not
/// function names.
pub const DEFAULT_STOPLIST: &[&str] = &["ALL_FUNCTIONS", "FUNCTION_CATEGORIES"];

#[derive(Debug, Clone)]
pub struct RegistryScanOptions {
    pub marker: String,
    pub stoplist: BTreeSet<String>,
}

impl Default for RegistryScanOptions {
    fn default() -> Self {
        Self {
            marker: DEFAULT_MARKER.to_string(),
            stoplist: DEFAULT_STOPLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The marker is absent. Surfaced as its own variant instead of an empty
    /// set so a misconfigured source path cannot read as "zero functions".
    #[error("registration marker `{marker}` not found")]
    MarkerNotFound { marker: String },
    #[error("registration list for `{marker}` is malformed: {source}")]
    Malformed {
        marker: String,
        #[source]
        source: BlockError,
    },
}

/// Function-name shape: uppercase token, two or more characters, optionally
/// dotted (`NORM.S.DIST`). Single-letter names are indistinguishable from
/// loop variables and type parameters in source text, so they are excluded.
fn function_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Z][A-Z0-9_]+(?:\.[A-Z0-9_]+)*\b").expect("function name regex")
    })
}

/// Extracts the set of function names declared in the registration literal
/// introduced by `options.marker`.
pub fn scan_registry(
    text: &str,
    options: &RegistryScanOptions,
) -> Result<BTreeSet<String>, RegistryError> {
    let marker_at = text
        .find(&options.marker)
        .ok_or_else(|| RegistryError::MarkerNotFound {
            marker: options.marker.clone(),
        })?;

    let after_marker = marker_at + options.marker.len();
    let open_at = text[after_marker..]
        .find('[')
        .map(|rel| after_marker + rel)
        .ok_or_else(|| RegistryError::Malformed {
            marker: options.marker.clone(),
            source: BlockError::NoOpeningDelimiter {
                hint: after_marker,
                open: '[',
            },
        })?;

    let span =
        block::forward_span(text, open_at, BRACKETS).map_err(|source| RegistryError::Malformed {
            marker: options.marker.clone(),
            source,
        })?;

    let names = function_name_re()
        .find_iter(span.slice(text))
        .map(|m| m.as_str().to_string())
        .filter(|name| !options.stoplist.contains(name))
        .collect();

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(text: &str) -> BTreeSet<String> {
        scan_registry(text, &RegistryScanOptions::default()).unwrap()
    }

    #[test]
    fn collects_identifiers_from_registration_literal() {
        let src = "export const ALL_FUNCTIONS = [\n  SUM,\n  SUMIF,\n  COUNTIF,\n];";
        let got = names(src);
        let want: BTreeSet<String> = ["SUM", "SUMIF", "COUNTIF"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn collapses_duplicates() {
        let got = names("ALL_FUNCTIONS = [SUM, SUM, MAX]");
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn accepts_dotted_names() {
        let got = names("ALL_FUNCTIONS = ['CEILING.MATH', 'NORM.S.DIST']");
        assert!(got.contains("CEILING.MATH"));
        assert!(got.contains("NORM.S.DIST"));
    }

    #[test]
    fn ignores_lowercase_and_mixed_case_tokens() {
        let got = names("ALL_FUNCTIONS = [SUM, Object.values(helpers), customFn]");
        let want: BTreeSet<String> = [String::from("SUM")].into_iter().collect();
        assert_eq!(got, want);
    }

    #[test]
    fn stoplist_entries_never_appear_regardless_of_position() {
        let got = names("ALL_FUNCTIONS = [FUNCTION_CATEGORIES, SUM, FUNCTION_CATEGORIES]");
        assert!(!got.contains("FUNCTION_CATEGORIES"));
        assert!(got.contains("SUM"));
    }

    #[test]
    fn stoplist_is_configurable() {
        let mut options = RegistryScanOptions::default();
        options.stoplist.insert("SUM".to_string());
        let got = scan_registry("ALL_FUNCTIONS = [SUM, MAX]", &options).unwrap();
        assert!(!got.contains("SUM"));
        assert!(got.contains("MAX"));
    }

    #[test]
    fn scan_is_scoped_to_the_literal() {
        // Names mentioned after the closing bracket are not registrations.
        let got = names("ALL_FUNCTIONS = [SUM]; const LATER = [MAX];");
        assert!(!got.contains("MAX"));
        assert!(!got.contains("LATER"));
    }

    #[test]
    fn missing_marker_is_a_distinct_error() {
        let err = scan_registry("const x = [SUM];", &RegistryScanOptions::default()).unwrap_err();
        assert!(matches!(err, RegistryError::MarkerNotFound { .. }));
    }

    #[test]
    fn unterminated_literal_is_malformed() {
        let err = scan_registry("ALL_FUNCTIONS = [SUM,", &RegistryScanOptions::default())
            .unwrap_err();
        assert!(matches!(err, RegistryError::Malformed { .. }));
    }
}
