// The projection-equivalence rewriter.
//
// Applies four rules (cascade, commute-with-selection, distribute-over-union,
// distribute-over-theta-join) in a single forward pass that builds its
// output stream `T` left to right, treating `T`'s tail as an implicit
// stack: cascade and commute look at the last one or two tokens already
// emitted, and distribution removes a pending projection from the tail and
// re-emits it on both sides of a binary operator.
//
// A projection is "pending" when its `Operator(Projection)`/`Attributes`
// pair are the very last two tokens in `T` — nothing has been appended
// after it yet, meaning its operand hasn't been read. A pending selection
// (`Operator(Selection)`/`Condition` with no operand following) is
// transparent to the backward search for a commute target: stacked
// selections probe through each other to find the nearest enclosing
// projection.

use thiserror::Error;

use crate::algebra::attrs::{commutes, subset};
use crate::algebra::token::{AlgebraToken, AttributeSet, OpKind, PostfixExpr};
use crate::catalog::SchemaCatalog;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RewriteError {
    /// `schema(table)` returned nothing for a table referenced while
    /// distributing a projection over a theta-join.
    #[error("no schema registered for table '{0}'")]
    UnknownSchema(String),

    /// An operator token lacked its expected operand or configuration
    /// successor.
    #[error("malformed IR: {0}")]
    MalformedIr(String),
}

type RewriteResult<T> = std::result::Result<T, RewriteError>;

/// Rewrites `input` left to right, applying the cascade, commute,
/// distribute-over-union/intersect, and distribute-over-theta-join rules.
pub fn rewrite(input: &[AlgebraToken], catalog: &dyn SchemaCatalog) -> RewriteResult<Vec<AlgebraToken>> {
    let mut out: Vec<AlgebraToken> = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        match &input[i] {
            AlgebraToken::Operator(OpKind::Projection) => {
                let attrs = expect_attributes(input, i + 1)?;
                if let Some(prev) = last_attribute_set(&out) {
                    if subset(attrs, prev) {
                        // Rule 2: the already-emitted projection already
                        // narrows at least as far as this one would;
                        // eliding it still leaves prev's output correct.
                        i += 2;
                        continue;
                    }
                }
                out.push(input[i].clone());
                out.push(input[i + 1].clone());
                i += 2;
            }

            AlgebraToken::Operator(OpKind::Selection) => {
                let cond = expect_condition(input, i + 1)?;
                if let Some(target) = commute_target(&out) {
                    let AlgebraToken::Attributes(proj_attrs) = &out[target + 1] else {
                        unreachable!("commute_target only returns projection positions");
                    };
                    if commutes(proj_attrs, cond) {
                        out.insert(target, input[i + 1].clone());
                        out.insert(target, input[i].clone());
                        i += 2;
                        continue;
                    }
                }
                out.push(input[i].clone());
                out.push(input[i + 1].clone());
                i += 2;
            }

            AlgebraToken::Operator(op @ (OpKind::Union | OpKind::Intersect)) => {
                if let Some(attrs) = pop_pending_projection(&mut out) {
                    let (left, next_i) = copy_operand(input, i + 1)?;
                    let (right, next_i) = copy_operand(input, next_i)?;
                    out.push(AlgebraToken::Operator(*op));
                    push_projected(&mut out, &attrs, left);
                    push_projected(&mut out, &attrs, right);
                    i = next_i;
                } else {
                    out.push(input[i].clone());
                    i += 1;
                }
            }

            AlgebraToken::Operator(OpKind::ThetaJoin) => {
                let cond = expect_condition(input, i + 1)?.clone();
                let cond_attrs = AttributeSet::new(cond.attributes().to_vec());

                if let Some(outer_attrs) = pop_pending_projection(&mut out) {
                    let (left, next_i) = copy_operand(input, i + 2)?;
                    let (right, next_i) = copy_operand(input, next_i)?;
                    let left_schema = schema_of(&left, catalog)?;
                    let right_schema = schema_of(&right, catalog)?;

                    let l1 = outer_attrs.intersect_bare(&left_schema);
                    let l2 = outer_attrs.intersect_bare(&right_schema);
                    let combined = l1.union(&l2);

                    out.push(AlgebraToken::Operator(OpKind::ThetaJoin));
                    out.push(AlgebraToken::Condition(cond));

                    if subset(&combined, &cond_attrs) {
                        // Rule 3a: the join condition reads nothing the
                        // two narrowed projections wouldn't already carry.
                        push_projected(&mut out, &l1, left);
                        push_projected(&mut out, &l2, right);
                    } else {
                        // Rule 3b: extend each side with the condition
                        // attributes that belong to its own schema.
                        let l1_ext = l1.union(&cond_attrs.intersect_bare(&left_schema));
                        let l2_ext = l2.union(&cond_attrs.intersect_bare(&right_schema));
                        push_projected(&mut out, &l1_ext, left);
                        push_projected(&mut out, &l2_ext, right);
                    }
                    i = next_i;
                } else {
                    out.push(input[i].clone());
                    out.push(AlgebraToken::Condition(cond));
                    i += 2;
                }
            }

            AlgebraToken::Operator(OpKind::NaturalJoin | OpKind::Except | OpKind::Rename) => {
                out.push(input[i].clone());
                i += 1;
            }

            AlgebraToken::Operand(_) => {
                out.push(input[i].clone());
                i += 1;
            }

            AlgebraToken::Attributes(_) | AlgebraToken::Condition(_) => {
                return Err(RewriteError::MalformedIr(format!(
                    "token at position {i} appeared without a preceding operator"
                )));
            }
        }
    }

    Ok(out)
}

fn expect_attributes(input: &[AlgebraToken], idx: usize) -> RewriteResult<&AttributeSet> {
    match input.get(idx) {
        Some(AlgebraToken::Attributes(attrs)) => Ok(attrs),
        _ => Err(RewriteError::MalformedIr(format!(
            "expected an attribute-set token at position {idx}"
        ))),
    }
}

fn expect_condition(input: &[AlgebraToken], idx: usize) -> RewriteResult<&PostfixExpr> {
    match input.get(idx) {
        Some(AlgebraToken::Condition(cond)) => Ok(cond),
        _ => Err(RewriteError::MalformedIr(format!(
            "expected a condition token at position {idx}"
        ))),
    }
}

/// The last attribute-set token in `out`, used as *prev_top* for the
/// cascade rule.
fn last_attribute_set(out: &[AlgebraToken]) -> Option<&AttributeSet> {
    out.iter().rev().find_map(|t| t.as_attributes())
}

/// Finds the position of a projection's `Operator` token that `out`'s tail
/// can still commute past: either the pending projection itself, or one
/// reachable by skipping over stacked pending selections.
fn commute_target(out: &[AlgebraToken]) -> Option<usize> {
    let mut end = out.len();
    loop {
        if end < 2 {
            return None;
        }
        let op_idx = end - 2;
        match (&out[op_idx], out.get(end - 1)) {
            (AlgebraToken::Operator(OpKind::Projection), Some(AlgebraToken::Attributes(_))) => {
                return Some(op_idx);
            }
            (AlgebraToken::Operator(OpKind::Selection), Some(AlgebraToken::Condition(_))) => {
                end = op_idx;
            }
            _ => return None,
        }
    }
}

/// Removes and returns a pending projection's attribute set from the tail
/// of `out`, if the last two tokens are exactly `Operator(Projection)`,
/// `Attributes`.
fn pop_pending_projection(out: &mut Vec<AlgebraToken>) -> Option<AttributeSet> {
    if out.len() < 2 {
        return None;
    }
    let tail_is_pending = matches!(
        (&out[out.len() - 2], &out[out.len() - 1]),
        (AlgebraToken::Operator(OpKind::Projection), AlgebraToken::Attributes(_))
    );
    if !tail_is_pending {
        return None;
    }
    let AlgebraToken::Attributes(attrs) = out.pop().unwrap() else {
        unreachable!()
    };
    out.pop();
    Some(attrs)
}

/// Copies one full operand subtree verbatim starting at `idx`, without
/// applying further rewriting inside it — matching the single-pass
/// contract, which only rewrites the positions it visits in the main loop.
fn copy_operand(input: &[AlgebraToken], idx: usize) -> RewriteResult<(Vec<AlgebraToken>, usize)> {
    match input.get(idx) {
        Some(AlgebraToken::Operand(_)) => Ok((vec![input[idx].clone()], idx + 1)),
        Some(AlgebraToken::Operator(op)) => {
            let op = *op;
            let mut tokens = vec![input[idx].clone()];
            let mut next = idx + 1;

            let carries_arg = matches!(op, OpKind::Projection | OpKind::Selection | OpKind::ThetaJoin);
            if carries_arg {
                let arg = input
                    .get(next)
                    .ok_or_else(|| RewriteError::MalformedIr(format!("operator at {idx} missing its argument")))?;
                tokens.push(arg.clone());
                next += 1;
            }

            if op.is_binary() {
                let (left, n) = copy_operand(input, next)?;
                tokens.extend(left);
                let (right, n) = copy_operand(input, n)?;
                tokens.extend(right);
                next = n;
            } else {
                let (operand, n) = copy_operand(input, next)?;
                tokens.extend(operand);
                next = n;
            }

            Ok((tokens, next))
        }
        _ => Err(RewriteError::MalformedIr(format!(
            "expected an operand subtree at position {idx}"
        ))),
    }
}

/// Appends `Operator(Projection)`, `Attributes(attrs)`, then `operand`'s
/// tokens to `out`.
fn push_projected(out: &mut Vec<AlgebraToken>, attrs: &AttributeSet, operand: Vec<AlgebraToken>) {
    out.push(AlgebraToken::Operator(OpKind::Projection));
    out.push(AlgebraToken::Attributes(attrs.clone()));
    out.extend(operand);
}

/// The schema of a just-copied operand subtree: the table name of its
/// leftmost operand token.
fn schema_of(operand: &[AlgebraToken], catalog: &dyn SchemaCatalog) -> RewriteResult<Vec<String>> {
    let table = operand
        .iter()
        .find_map(|t| t.as_operand())
        .ok_or_else(|| RewriteError::MalformedIr("operand subtree has no table token".to_string()))?;
    catalog
        .schema(table)
        .ok_or_else(|| RewriteError::UnknownSchema(table.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::token::AlgebraToken as T;
    use crate::catalog::{Catalog, Column, DataType, Schema};

    fn attrs(names: &[&str]) -> AlgebraToken {
        T::Attributes(AttributeSet::new(names.iter().map(|s| s.to_string()).collect()))
    }

    fn catalog_with(tables: &[(&str, &[&str])]) -> Catalog {
        let catalog = Catalog::new();
        for (table, cols) in tables {
            let columns = cols
                .iter()
                .map(|c| Column {
                    name: c.to_string(),
                    data_type: DataType::Text,
                    nullable: false,
                })
                .collect();
            catalog.create_table(Schema::new(*table, columns));
        }
        catalog
    }

    #[test]
    fn o1_cascade_elides_the_redundant_inner_projection() {
        let input = vec![
            T::Operator(OpKind::Projection),
            attrs(&["a", "b", "c"]),
            T::Operator(OpKind::Projection),
            attrs(&["a", "b", "c", "d"]),
            T::Operand("R".to_string()),
        ];
        let catalog = catalog_with(&[]);
        let out = rewrite(&input, &catalog).unwrap();
        assert_eq!(
            out,
            vec![T::Operator(OpKind::Projection), attrs(&["a", "b", "c"]), T::Operand("R".to_string())]
        );
    }

    #[test]
    fn o2_commute_splices_selection_before_projection() {
        let input = vec![
            T::Operator(OpKind::Projection),
            attrs(&["a", "b"]),
            T::Operator(OpKind::Selection),
            T::Condition(PostfixExpr::parse("`a`5>")),
            T::Operand("R".to_string()),
        ];
        let catalog = catalog_with(&[]);
        let out = rewrite(&input, &catalog).unwrap();
        assert_eq!(
            out,
            vec![
                T::Operator(OpKind::Selection),
                T::Condition(PostfixExpr::parse("`a`5>")),
                T::Operator(OpKind::Projection),
                attrs(&["a", "b"]),
                T::Operand("R".to_string()),
            ]
        );
    }

    #[test]
    fn o3_distributes_projection_over_union() {
        let input = vec![
            T::Operator(OpKind::Projection),
            attrs(&["a"]),
            T::Operator(OpKind::Union),
            T::Operand("R".to_string()),
            T::Operand("S".to_string()),
        ];
        let catalog = catalog_with(&[]);
        let out = rewrite(&input, &catalog).unwrap();
        assert_eq!(
            out,
            vec![
                T::Operator(OpKind::Union),
                T::Operator(OpKind::Projection),
                attrs(&["a"]),
                T::Operand("R".to_string()),
                T::Operator(OpKind::Projection),
                attrs(&["a"]),
                T::Operand("S".to_string()),
            ]
        );
    }

    #[test]
    fn o4_theta_join_split_narrows_each_side() {
        let input = vec![
            T::Operator(OpKind::Projection),
            attrs(&["r.x", "s.y"]),
            T::Operator(OpKind::ThetaJoin),
            T::Condition(PostfixExpr::parse("`r.x``s.y`=")),
            T::Operand("R".to_string()),
            T::Operand("S".to_string()),
        ];
        let catalog = catalog_with(&[("R", &["x", "z"]), ("S", &["y", "w"])]);
        let out = rewrite(&input, &catalog).unwrap();
        assert_eq!(
            out,
            vec![
                T::Operator(OpKind::ThetaJoin),
                T::Condition(PostfixExpr::parse("`r.x``s.y`=")),
                T::Operator(OpKind::Projection),
                attrs(&["x"]),
                T::Operand("R".to_string()),
                T::Operator(OpKind::Projection),
                attrs(&["y"]),
                T::Operand("S".to_string()),
            ]
        );
    }

    #[test]
    fn unknown_schema_surfaces_as_rewrite_error() {
        let input = vec![
            T::Operator(OpKind::Projection),
            attrs(&["x", "y"]),
            T::Operator(OpKind::ThetaJoin),
            T::Condition(PostfixExpr::parse("`x``y`=")),
            T::Operand("R".to_string()),
            T::Operand("S".to_string()),
        ];
        let catalog = catalog_with(&[("R", &["x"])]);
        let err = rewrite(&input, &catalog).unwrap_err();
        assert!(matches!(err, RewriteError::UnknownSchema(t) if t == "S"));
    }

    #[test]
    fn malformed_ir_reports_missing_argument() {
        let input = vec![T::Operator(OpKind::Projection)];
        let catalog = catalog_with(&[]);
        assert!(rewrite(&input, &catalog).is_err());
    }
}
