//! Scan matcher
//!
//! Resolves one scanned code against the catalog. Lookup order, first hit
//! wins:
//!
//! 1. exact (trimmed) equality within the assigned box
//! 2. digit-only equality within the assigned box
//! 3. suffix containment within the assigned box
//! 4. rules 1-3 against the whole catalog, yielding [`ScanMatch::MatchedOtherBox`]
//! 5. otherwise [`ScanMatch::Unrecognized`]
//!
//! A hit outside the assigned box is a different failure class from a code
//! absent from the catalog, so the two are separate variants.

mod normalize;

pub use normalize::{digits_only, normalize_code, suffix_contains};

use std::fmt;

use crate::catalog::{Catalog, CatalogRecord};

/// Which rule produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    Exact,
    Digits,
    Suffix,
}

impl MatchRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchRule::Exact => "exact",
            MatchRule::Digits => "digits",
            MatchRule::Suffix => "suffix",
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of resolving a scanned code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanMatch<'a> {
    /// Found in the assigned box
    Matched {
        record: &'a CatalogRecord,
        rule: MatchRule,
    },
    /// Found, but the catalog places it in another box
    MatchedOtherBox {
        record: &'a CatalogRecord,
        box_id: &'a str,
        rule: MatchRule,
    },
    /// Not in the catalog at all
    Unrecognized,
}

/// Resolve `code` against `catalog`, preferring records in `assigned_box`.
///
/// Pure lookup; callers decide what to do with the result. With no box
/// assigned every hit is reported as [`ScanMatch::MatchedOtherBox`].
pub fn match_code<'a>(catalog: &'a Catalog, code: &str, assigned_box: Option<&str>) -> ScanMatch<'a> {
    let code = normalize_code(code);
    if code.is_empty() {
        return ScanMatch::Unrecognized;
    }
    let code_digits = digits_only(code);

    if let Some(box_id) = assigned_box {
        if let Some((record, rule)) = find(catalog.in_box(box_id), code, &code_digits) {
            return ScanMatch::Matched { record, rule };
        }
    }

    match find(catalog.records().iter(), code, &code_digits) {
        Some((record, rule)) => ScanMatch::MatchedOtherBox {
            record,
            box_id: record.box_id.as_str(),
            rule,
        },
        None => ScanMatch::Unrecognized,
    }
}

/// Apply the three rules in order over `candidates`.
///
/// Each rule scans the full candidate list before the next rule is tried, so
/// an exact hit late in the catalog beats a suffix hit early in it.
fn find<'a, I>(candidates: I, code: &str, code_digits: &str) -> Option<(&'a CatalogRecord, MatchRule)>
where
    I: Iterator<Item = &'a CatalogRecord> + Clone,
{
    if let Some(r) = candidates.clone().find(|r| normalize_code(&r.sku) == code) {
        return Some((r, MatchRule::Exact));
    }

    if !code_digits.is_empty() {
        if let Some(r) = candidates
            .clone()
            .find(|r| digits_only(&r.sku) == code_digits)
        {
            return Some((r, MatchRule::Digits));
        }
    }

    candidates
        .into_iter()
        .find(|r| suffix_contains(normalize_code(&r.sku), code))
        .map(|r| (r, MatchRule::Suffix))
}
