// Attribute-set utilities backing the projection rewriter's pattern tests.
//
// Plain set operations over `AttributeSet`/`Vec<String>`: the IR keeps
// attribute names as structured lists rather than delimiter-joined text,
// so these never need to re-parse anything.

use crate::algebra::token::{AttributeSet, PostfixExpr};
use crate::catalog::SchemaCatalog;
use crate::error::DbError;

/// Returns true iff every element of `subset_of` appears in `set`.
///
/// Duplicates on either side are tolerated; only membership matters, so
/// the result doesn't depend on either list's order.
pub fn subset(set: &AttributeSet, subset_of: &AttributeSet) -> bool {
    subset_of.as_slice().iter().all(|a| set.contains(a))
}

/// Returns true iff every attribute referenced by `condition` is present in
/// `projection_attrs` — the commute test for Rule 1 (projection/selection).
pub fn commutes(projection_attrs: &AttributeSet, condition: &PostfixExpr) -> bool {
    condition
        .attributes()
        .iter()
        .all(|a| projection_attrs.contains(a))
}

/// Filters `attrs` down to the names present in `table`'s schema, with the
/// result ordered the way the schema lists them.
pub fn filter_to_schema(
    attrs: &AttributeSet,
    table: &str,
    catalog: &dyn SchemaCatalog,
) -> Result<AttributeSet, DbError> {
    let schema = catalog
        .schema(table)
        .ok_or_else(|| DbError::UnknownTable(table.to_string()))?;
    Ok(AttributeSet::new(
        schema
            .into_iter()
            .filter(|col| attrs.contains(col))
            .collect(),
    ))
}

/// The set of attribute names a condition references, in first-seen order.
pub fn collect_condition_attributes(condition: &PostfixExpr) -> Vec<String> {
    condition.attributes().to_vec()
}

/// Stable, first-wins deduplication.
pub fn dedup(attrs: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for a in attrs {
        if !seen.contains(a) {
            seen.push(a.clone());
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(names: &[&str]) -> AttributeSet {
        AttributeSet::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn subset_law() {
        let a = attrs(&["a", "b", "c"]);
        let b = attrs(&["a", "b"]);
        assert!(subset(&a, &b));
        assert!(!subset(&b, &a));

        let equal = attrs(&["a", "b"]);
        assert!(subset(&b, &equal));
        assert!(subset(&equal, &b));
    }

    #[test]
    fn subset_tolerates_duplicates() {
        let a = attrs(&["a", "a", "b"]);
        let b = attrs(&["a", "a"]);
        assert!(subset(&a, &b));
    }

    #[test]
    fn commutes_checks_condition_attributes() {
        let proj = attrs(&["a", "b"]);
        let cond = PostfixExpr::parse("`a`5>");
        assert!(commutes(&proj, &cond));

        let cond2 = PostfixExpr::parse("`c`5>");
        assert!(!commutes(&proj, &cond2));
    }

    #[test]
    fn dedup_is_stable_first_wins() {
        let v = vec!["a".to_string(), "b".to_string(), "a".to_string(), "c".to_string()];
        assert_eq!(dedup(&v), vec!["a", "b", "c"]);
    }
}
