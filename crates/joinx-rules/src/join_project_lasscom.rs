//! # Join Project L-Asscom Rule
//!
//! Left-associative commute across a projection between two inner joins:
//!
//! ```text
//!          topJoin                     newTopJoin
//!          /     \                     /        \
//!      project    C     ──►   newLeftProject  newRightProject
//!         |                         |               |
//!     bottomJoin                newBottomJoin       B
//!       /   \                     /   \
//!      A     B                   A     C
//! ```
//!
//! ## Conditions
//!
//! Both joins must carry a condition; a conditionless inner join reaching this rule is
//! an invariant violation. The conjuncts are redistributed by
//! [`crate::conditions::split_conditions`]: those over A and C only move to the new
//! bottom join, the rest stay on the new top join.
//!
//! ## Projection Split
//!
//! Each projection entry goes to the **right** project (over B) iff it reads only
//! B's columns (and at least one); every other entry goes to the **left** project
//! (over the new bottom join). A left entry that reads B as well as A cannot be
//! evaluated on either side after the rewrite and declines the rule.
//!
//! The new projects also pass through every column the rewritten tree still needs
//! above them: the left project passes C's output (the old top join exposed it) and
//! any A column the new top condition reads; the right project passes any B column
//! the new top condition reads.
//!
//! When no entry belongs on the right, B is joined directly. The left project is
//! dropped too if it would only pass columns through; computed entries keep it.
//!
//! ## Reorder Context
//!
//! The new top join is marked `has_lasscom` so neither L-Asscom rule can reverse it
//! right away; the new bottom join starts with a fresh context.

use crate::conditions::{lasscom_guard, split_conditions, ThreeWayInputs};
use joinx_core::error::ExploreResult;
use joinx_core::expr::{ColumnRef, ColumnSet, NamedExpr};
use joinx_core::pattern::{Bindings, Pattern};
use joinx_core::plan::{JoinReorderContext, Plan, PlanRef};
use joinx_core::rule::{Rejection, Rule, RuleId, RuleOutcome};
use tracing::trace;

/// Join project L-Asscom: `project(A ⋈ B) ⋈ C → project(A ⋈ C) ⋈ project(B)`.
pub fn rule() -> Rule {
    Rule::new(RuleId::JoinProjectLAsscom, pattern(), lasscom_guard, transform)
}

fn pattern() -> Pattern {
    Pattern::inner_join(
        Pattern::project(
            Pattern::inner_join(Pattern::Any.bind("a"), Pattern::Any.bind("b")).bind("bottom"),
        )
        .bind("project"),
        Pattern::Any.bind("c"),
    )
    .bind("top")
}

/// Projection entries split by the side of the rewritten tree they can be
/// evaluated on.
#[derive(Debug, Default)]
struct ProjectSplit {
    left: Vec<NamedExpr>,
    right: Vec<NamedExpr>,
}

fn split_project(exprs: &[NamedExpr], inputs: &ThreeWayInputs) -> Result<ProjectSplit, Rejection> {
    let mut split = ProjectSplit::default();
    for named in exprs {
        let used = named.column_ids();
        // Column-free entries stay left so they never force a Project over B.
        if !used.is_empty() && used.is_subset(&inputs.b) {
            split.right.push(named.clone());
        } else if inputs.within_a_or_c(&used) {
            split.left.push(named.clone());
        } else {
            trace!("Projection entry {} reads both moved and kept inputs", named);
            return Err(Rejection::ProjectionSpansMovedInput);
        }
    }
    Ok(split)
}

/// Append pass-throughs for `columns`, skipping any column `entries` already binds.
fn pass_through<'a>(entries: &mut Vec<NamedExpr>, columns: impl IntoIterator<Item = &'a ColumnRef>) {
    let mut produced: ColumnSet = entries.iter().map(|e| e.output.id).collect();
    for column in columns {
        if produced.insert(column.id) {
            entries.push(NamedExpr::column(column.clone()));
        }
    }
}

fn transform(bindings: &Bindings) -> ExploreResult<RuleOutcome> {
    if !lasscom_guard(bindings.root()) {
        return Ok(RuleOutcome::Declined(Rejection::GuardFailed));
    }
    let top = bindings.join("top")?;
    let project = bindings.project("project")?;
    let bottom = bindings.join("bottom")?;
    let a = bindings.get("a")?;
    let b = bindings.get("b")?;
    let c = bindings.get("c")?;

    let inputs = ThreeWayInputs::new(a, b, c);
    let conditions = match split_conditions(top, bottom, &inputs)? {
        Ok(split) => split,
        Err(reason) => return Ok(RuleOutcome::Declined(reason)),
    };
    let ProjectSplit {
        left: mut left_exprs,
        right: mut right_exprs,
    } = match split_project(project.exprs(), &inputs) {
        Ok(split) => split,
        Err(reason) => return Ok(RuleOutcome::Declined(reason)),
    };

    let new_bottom = Plan::join(
        bottom.join_type(),
        conditions.bottom_condition(),
        a.clone(),
        c.clone(),
        JoinReorderContext::default(),
    );

    let top_needs = conditions.top_column_ids();
    let keep_left_project = if right_exprs.is_empty() {
        left_exprs.iter().any(|e| !e.is_pass_through())
    } else {
        !left_exprs.is_empty()
    };

    let left: PlanRef = if keep_left_project {
        pass_through(&mut left_exprs, c.output());
        pass_through(
            &mut left_exprs,
            a.output().iter().filter(|col| top_needs.contains(&col.id)),
        );
        Plan::project(left_exprs, new_bottom)?
    } else {
        new_bottom
    };

    let right: PlanRef = if right_exprs.is_empty() {
        b.clone()
    } else {
        pass_through(
            &mut right_exprs,
            b.output().iter().filter(|col| top_needs.contains(&col.id)),
        );
        Plan::project(right_exprs, b.clone())?
    };

    Ok(RuleOutcome::Rewritten(Plan::join(
        top.join_type(),
        conditions.top_condition(),
        left,
        right,
        JoinReorderContext::default().with_lasscom(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinx_core::expr::{BinaryOp, ColumnId, Expr};
    use joinx_core::literal::Literal;
    use joinx_core::plan::GroupId;
    use joinx_core::types::DataType;

    fn col(id: u32, name: &str) -> ColumnRef {
        ColumnRef::new(ColumnId(id), name, DataType::BigInt)
    }

    /// A = {1, 2}, B = {3, 4}, C = {5}.
    fn inputs() -> ThreeWayInputs {
        ThreeWayInputs::new(
            &Plan::group(GroupId(0), vec![col(1, "a1"), col(2, "a2")]),
            &Plan::group(GroupId(1), vec![col(3, "b1"), col(4, "b2")]),
            &Plan::group(GroupId(2), vec![col(5, "c1")]),
        )
    }

    #[test]
    fn test_split_project_by_side() {
        let exprs = vec![
            NamedExpr::column(col(1, "a1")),
            NamedExpr::column(col(3, "b1")),
            NamedExpr::alias(
                Expr::binary(
                    BinaryOp::Add,
                    Expr::column(col(4, "b2")),
                    Expr::literal(Literal::int64(1)),
                ),
                col(10, "b2_inc"),
            ),
            NamedExpr::alias(Expr::literal(Literal::int64(7)), col(11, "seven")),
        ];
        let split = split_project(&exprs, &inputs()).unwrap();
        let names = |v: &[NamedExpr]| v.iter().map(|e| e.output.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&split.left), vec!["a1", "seven"]);
        assert_eq!(names(&split.right), vec!["b1", "b2_inc"]);
    }

    #[test]
    fn test_split_project_rejects_mixed_entry() {
        let exprs = vec![NamedExpr::alias(
            Expr::binary(BinaryOp::Add, Expr::column(col(1, "a1")), Expr::column(col(3, "b1"))),
            col(10, "mixed"),
        )];
        assert_eq!(
            split_project(&exprs, &inputs()).unwrap_err(),
            Rejection::ProjectionSpansMovedInput
        );
    }

    #[test]
    fn test_pass_through_skips_bound_columns() {
        let mut entries = vec![NamedExpr::column(col(1, "a1"))];
        pass_through(&mut entries, &[col(1, "a1"), col(5, "c1")]);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.is_pass_through()));
    }

    #[test]
    fn test_pattern_shape() {
        assert_eq!(
            pattern().to_string(),
            "top@InnerJoin(project@Project(bottom@InnerJoin(a@Any, b@Any)), c@Any)"
        );
    }
}
