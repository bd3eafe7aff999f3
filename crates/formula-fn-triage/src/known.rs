//! The known-failure catalog.
//!
//! A hand-maintained snapshot of the fixture run: every function the last
//! full pass reported as failing, with its display category and observed
//! failure count. A count of zero means the run flagged the function without
//! per-cell detail. The snapshot is data, not derived state; refresh it by
//! re-running the fixture suite and editing the table.

use serde::{Deserialize, Serialize};

/// One entry of the known-failure catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownFailure {
    /// Function name: uppercase, dot-allowed (`NORM.S.DIST`). Unique key.
    pub name: String,
    /// Numbered display category (`"12. Dynamic Arrays"`). The numeric
    /// prefix makes lexical order the canonical report order.
    pub category: String,
    /// Failing fixture cells observed in the last run; 0 = no detail.
    #[serde(default)]
    pub failures: u32,
}

/// Serde shape of an external catalog file (`--catalog`), mirroring the
/// shared `functionCatalog.json` layout.
#[derive(Debug, Deserialize)]
pub struct KnownFailureCatalog {
    pub functions: Vec<KnownFailure>,
}

/// Functions whose results depend on the evaluation instant or an RNG.
/// Pinned `expectedValues` for these can never be stable; the report calls
/// them out and `strip-expected --include-volatile` removes them.
pub const VOLATILE_FUNCTIONS: &[&str] = &["RAND", "RANDBETWEEN", "TODAY", "NOW", "RANDARRAY"];

fn known(name: &str, category: &str, failures: u32) -> KnownFailure {
    KnownFailure {
        name: name.to_string(),
        category: category.to_string(),
        failures,
    }
}

/// The built-in catalog, in declaration order. Declaration order is the
/// tie-break for equal failure counts, so keep related functions grouped.
pub fn known_failures() -> Vec<KnownFailure> {
    vec![
        known("SERIESSUM", "01. Math", 1),
        known("SKEW", "02. Statistical", 0),
        known("GEOMEAN", "02. Statistical", 0),
        known("HARMEAN", "02. Statistical", 0),
        known("TRIMMEAN", "02. Statistical", 0),
        known("GAMMALN", "02. Statistical", 0),
        known("GAUSS", "02. Statistical", 0),
        known("STEYX", "02. Statistical", 0),
        known("TEXT", "03. Text", 0),
        known("NUMBERVALUE", "03. Text", 0),
        known("SEARCHB", "03. Text", 0),
        known("EDATE", "04. Date & Time", 0),
        known("EOMONTH", "04. Date & Time", 0),
        known("DATEVALUE", "04. Date & Time", 0),
        known("TIMEVALUE", "04. Date & Time", 0),
        known("ISOWEEKNUM", "04. Date & Time", 0),
        known("HLOOKUP", "06. Lookup", 0),
        known("INDIRECT", "06. Lookup", 0),
        known("HYPERLINK", "06. Lookup", 0),
        known("FORMULATEXT", "06. Lookup", 0),
        known("GETPIVOTDATA", "06. Lookup", 0),
        known("RATE", "07. Financial", 0),
        known("NPER", "07. Financial", 0),
        known("IRR", "07. Financial", 0),
        known("XNPV", "07. Financial", 0),
        known("XIRR", "07. Financial", 0),
        known("IPMT", "07. Financial", 0),
        known("PPMT", "07. Financial", 0),
        known("MIRR", "07. Financial", 0),
        known("SLN", "07. Financial", 0),
        known("ACCRINT", "07. Financial", 0),
        known("DURATION", "07. Financial", 0),
        known("MDURATION", "07. Financial", 0),
        known("PRICE", "07. Financial", 0),
        known("COUPDAYS", "07. Financial", 0),
        known("COUPNCD", "07. Financial", 0),
        known("AMORDEGRC", "07. Financial", 0),
        known("CUMIPMT", "07. Financial", 0),
        known("CUMPRINC", "07. Financial", 0),
        known("ODDFPRICE", "07. Financial", 0),
        known("ODDLPRICE", "07. Financial", 0),
        known("ODDLYIELD", "07. Financial", 0),
        known("TBILLPRICE", "07. Financial", 0),
        known("PRICEDISC", "07. Financial", 0),
        known("RECEIVED", "07. Financial", 0),
        known("INTRATE", "07. Financial", 0),
        known("PRICEMAT", "07. Financial", 0),
        known("YIELDMAT", "07. Financial", 0),
        known("MINVERSE", "08. Matrix", 0),
        known("ISTEXT", "09. Information", 0),
        known("ISNUMBER", "09. Information", 0),
        known("TYPE", "09. Information", 0),
        known("SHEET", "09. Information", 0),
        known("SHEETS", "09. Information", 0),
        known("CELL", "09. Information", 0),
        known("INFO", "09. Information", 0),
        known("DSUM", "10. Database", 0),
        known("DAVERAGE", "10. Database", 0),
        known("DCOUNT", "10. Database", 0),
        known("DCOUNTA", "10. Database", 0),
        known("DPRODUCT", "10. Database", 0),
        known("DGET", "10. Database", 0),
        known("IMABS", "11. Engineering", 0),
        known("IMSUM", "11. Engineering", 0),
        known("IMDIV", "11. Engineering", 0),
        known("IMPOWER", "11. Engineering", 0),
        known("IMLOG10", "11. Engineering", 0),
        known("IMLOG2", "11. Engineering", 0),
        known("PHONETIC", "11. Engineering", 0),
        known("IMSQRT", "11. Engineering", 0),
        known("IMEXP", "11. Engineering", 0),
        known("IMLN", "11. Engineering", 0),
        known("IMSIN", "11. Engineering", 0),
        known("IMCOS", "11. Engineering", 0),
        known("IMTAN", "11. Engineering", 0),
        known("BESSELY", "11. Engineering", 0),
        known("BITAND", "11. Engineering", 0),
        known("BITXOR", "11. Engineering", 0),
        known("TRANSPOSE", "12. Dynamic Arrays", 2),
        known("SEQUENCE", "12. Dynamic Arrays", 5),
        known("LAMBDA", "12. Dynamic Arrays", 2),
        known("HSTACK", "12. Dynamic Arrays", 4),
        known("VSTACK", "12. Dynamic Arrays", 8),
        known("BYROW", "12. Dynamic Arrays", 3),
        known("BYCOL", "12. Dynamic Arrays", 3),
        known("MAKEARRAY", "12. Dynamic Arrays", 4),
        known("MAP", "12. Dynamic Arrays", 4),
        known("REDUCE", "12. Dynamic Arrays", 1),
        known("SCAN", "12. Dynamic Arrays", 4),
        known("TAKE", "12. Dynamic Arrays", 3),
        known("DROP", "12. Dynamic Arrays", 4),
        known("EXPAND", "12. Dynamic Arrays", 12),
        known("TOCOL", "12. Dynamic Arrays", 4),
        known("TOROW", "12. Dynamic Arrays", 4),
        known("CHOOSEROWS", "12. Dynamic Arrays", 4),
        known("CHOOSECOLS", "12. Dynamic Arrays", 6),
        known("WRAPROWS", "12. Dynamic Arrays", 6),
        known("WRAPCOLS", "12. Dynamic Arrays", 6),
        known("CUBEVALUE", "13. Cube", 0),
        known("CUBESETCOUNT", "13. Cube", 0),
        known("REGEXEXTRACT", "14. Web & Import", 0),
        known("REGEXMATCH", "14. Web & Import", 0),
        known("REGEXREPLACE", "14. Web & Import", 0),
        known("SORTN", "14. Web & Import", 0),
        known("WEBSERVICE", "14. Web & Import", 0),
        known("SPARKLINE", "14. Web & Import", 0),
        known("IMPORTDATA", "14. Web & Import", 0),
        known("IMPORTFEED", "14. Web & Import", 0),
        known("IMPORTHTML", "14. Web & Import", 0),
        known("IMPORTXML", "14. Web & Import", 0),
        known("IMPORTRANGE", "14. Web & Import", 0),
        known("IMAGE", "14. Web & Import", 0),
        known("GOOGLEFINANCE", "14. Web & Import", 0),
        known("GOOGLETRANSLATE", "14. Web & Import", 0),
        known("DETECTLANGUAGE", "14. Web & Import", 0),
        known("TO_DATE", "14. Web & Import", 0),
        known("TO_PERCENT", "14. Web & Import", 0),
        known("TO_TEXT", "14. Web & Import", 0),
        known("ISOMITTED", "15. Other", 0),
        known("STOCKHISTORY", "15. Other", 0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let catalog = known_failures();
        let mut seen = std::collections::BTreeSet::new();
        for entry in &catalog {
            assert!(seen.insert(entry.name.as_str()), "duplicate: {}", entry.name);
        }
    }

    #[test]
    fn categories_follow_the_numbered_taxonomy() {
        for entry in known_failures() {
            let prefix: String = entry.category.chars().take(4).collect();
            assert!(
                prefix.as_bytes()[0].is_ascii_digit()
                    && prefix.as_bytes()[1].is_ascii_digit()
                    && prefix.ends_with(". "),
                "bad category label: {}",
                entry.category
            );
        }
    }

    #[test]
    fn catalog_json_round_trips() {
        let json = r#"{"functions": [{"name": "FOO", "category": "01. Math", "failures": 3}]}"#;
        let catalog: KnownFailureCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.functions, vec![known("FOO", "01. Math", 3)]);
    }

    #[test]
    fn failures_field_defaults_to_zero() {
        let json = r#"{"functions": [{"name": "FOO", "category": "01. Math"}]}"#;
        let catalog: KnownFailureCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.functions[0].failures, 0);
    }
}
