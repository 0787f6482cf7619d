//! Scope algebra for space-separated scope strings.
//!
//! The intersection here is the single source of truth for every
//! scope-reduction point: authorization request validation, consent
//! approval, and refresh grants.

use std::collections::HashSet;

/// Split a scope string into its non-empty tokens
pub fn split(scope: &str) -> Vec<&str> {
    scope.split_whitespace().collect()
}

/// Intersect two scope strings, preserving the order of `requested`
///
/// Returns a space-joined string containing, in the order of `requested`,
/// every token that also appears in `owned`. The empty intersection is the
/// empty string. Not commutative: ordering follows `requested`.
pub fn intersect(owned: &str, requested: &str) -> String {
    let owned_set: HashSet<&str> = split(owned).into_iter().collect();

    split(requested)
        .into_iter()
        .filter(|token| owned_set.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Check whether every token in `requested` appears in `existing`
pub fn is_subset(requested: &str, existing: &str) -> bool {
    let existing_set: HashSet<&str> = split(existing).into_iter().collect();
    split(requested)
        .into_iter()
        .all(|token| existing_set.contains(token))
}
