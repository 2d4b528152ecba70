//! # Condition Redistribution for L-Asscom Rewrites
//!
//! Both L-Asscom rules turn `(A ⋈₁ B) ⋈₂ C` into `(A ⋈ C) ⋈ B`. For inner joins the
//! conjuncts of both conditions can be freely redistributed as long as each one is
//! placed on a join where all of its columns are available:
//!
//! 1. **New bottom join (A, C)**: conjuncts whose columns all come from A or C.
//! 2. **New top join**: everything else (conjuncts that need B, or that read columns
//!    computed above the old bottom join).
//!
//! Conjuncts are pooled top condition first, then bottom condition, and each pooled
//! conjunct lands in exactly one of the two lists.
//!
//! The rewrite is declined when a top conjunct reads all three inputs at once, and
//! when either list comes out empty: an empty list would leave a join without a
//! condition, i.e. a cross product, which the rule family never introduces.

use joinx_core::error::{ExploreError, ExploreResult};
use joinx_core::expr::{ColumnSet, Expr};
use joinx_core::plan::{Join, Plan};
use joinx_core::rule::Rejection;
use tracing::trace;

/// Output column sets of the three inputs of an L-Asscom rewrite.
#[derive(Debug, Clone)]
pub struct ThreeWayInputs {
    pub a: ColumnSet,
    pub b: ColumnSet,
    pub c: ColumnSet,
}

impl ThreeWayInputs {
    pub fn new(a: &Plan, b: &Plan, c: &Plan) -> Self {
        Self {
            a: a.output_set(),
            b: b.output_set(),
            c: c.output_set(),
        }
    }

    /// Whether every column in `ids` is produced by A or C.
    pub fn within_a_or_c(&self, ids: &ColumnSet) -> bool {
        ids.iter().all(|id| self.a.contains(id) || self.c.contains(id))
    }

    /// Whether `ids` intersects all three inputs.
    pub fn spans_all(&self, ids: &ColumnSet) -> bool {
        let touches = |side: &ColumnSet| ids.iter().any(|id| side.contains(id));
        touches(&self.a) && touches(&self.b) && touches(&self.c)
    }
}

/// Conditions for the two joins of the rewritten tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionSplit {
    /// Conjuncts of the new `A ⋈ C` join.
    pub bottom: Vec<Expr>,
    /// Conjuncts of the new top join.
    pub top: Vec<Expr>,
}

impl ConditionSplit {
    /// Columns referenced by the new top condition.
    pub fn top_column_ids(&self) -> ColumnSet {
        self.top.iter().flat_map(|e| e.column_ids()).collect()
    }

    pub fn bottom_condition(&self) -> Option<Expr> {
        Expr::conjunction(self.bottom.clone())
    }

    pub fn top_condition(&self) -> Option<Expr> {
        Expr::conjunction(self.top.clone())
    }
}

/// Guard shared by the L-Asscom rules: the top join must not come out of a
/// commute or an earlier L-Asscom rewrite.
pub fn lasscom_guard(plan: &Plan) -> bool {
    plan.as_join().is_some_and(|j| {
        let ctx = j.reorder();
        !ctx.has_commute() && !ctx.has_lasscom()
    })
}

/// Conjuncts of a join that must carry a condition.
pub fn required_conjuncts<'a>(join: &'a Join, role: &str) -> ExploreResult<Vec<&'a Expr>> {
    match join.condition() {
        Some(cond) => Ok(cond.conjuncts()),
        None => Err(ExploreError::invariant(format!(
            "{} join is an {} join without a condition",
            role,
            join.join_type()
        ))),
    }
}

/// Redistribute the conditions of `top` and `bottom` over the reassociated joins.
///
/// Fails when either join lacks a condition. Returns the rejection reason when the
/// conjuncts cannot be redistributed.
pub fn split_conditions(
    top: &Join,
    bottom: &Join,
    inputs: &ThreeWayInputs,
) -> ExploreResult<Result<ConditionSplit, Rejection>> {
    let top_conjuncts = required_conjuncts(top, "top")?;
    let bottom_conjuncts = required_conjuncts(bottom, "bottom")?;
    Ok(partition(&top_conjuncts, &bottom_conjuncts, inputs))
}

fn partition(
    top_conjuncts: &[&Expr],
    bottom_conjuncts: &[&Expr],
    inputs: &ThreeWayInputs,
) -> Result<ConditionSplit, Rejection> {
    if let Some(spanning) = top_conjuncts
        .iter()
        .find(|c| inputs.spans_all(&c.column_ids()))
    {
        trace!("Top conjunct {} references all three inputs", spanning);
        return Err(Rejection::ConjunctSpansAllInputs);
    }

    let mut split = ConditionSplit {
        bottom: Vec::new(),
        top: Vec::new(),
    };
    for conjunct in top_conjuncts.iter().chain(bottom_conjuncts) {
        if inputs.within_a_or_c(&conjunct.column_ids()) {
            split.bottom.push((*conjunct).clone());
        } else {
            split.top.push((*conjunct).clone());
        }
    }

    if split.bottom.is_empty() || split.top.is_empty() {
        trace!(
            "Condition partition leaves a cross product: bottom={} top={}",
            split.bottom.len(),
            split.top.len()
        );
        return Err(Rejection::EmptyConditionPartition);
    }
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinx_core::expr::{ColumnId, ColumnRef};
    use joinx_core::plan::{GroupId, JoinReorderContext, JoinType};
    use joinx_core::types::DataType;

    fn col(id: u32) -> ColumnRef {
        ColumnRef::new(ColumnId(id), format!("c{}", id), DataType::BigInt)
    }

    fn eq_cond(l: u32, r: u32) -> Expr {
        Expr::equal(Expr::column(col(l)), Expr::column(col(r)))
    }

    /// A = {1, 2}, B = {3, 4}, C = {5, 6}.
    fn inputs() -> ThreeWayInputs {
        ThreeWayInputs::new(
            &Plan::group(GroupId(0), vec![col(1), col(2)]),
            &Plan::group(GroupId(1), vec![col(3), col(4)]),
            &Plan::group(GroupId(2), vec![col(5), col(6)]),
        )
    }

    #[test]
    fn test_partition_moves_a_c_conjuncts_down() {
        // top: A.1 = C.5 AND B.4 = C.6, bottom: A.2 = B.3
        let top = [eq_cond(1, 5), eq_cond(4, 6)];
        let bottom = [eq_cond(2, 3)];
        let top_refs: Vec<&Expr> = top.iter().collect();
        let bottom_refs: Vec<&Expr> = bottom.iter().collect();

        let split = partition(&top_refs, &bottom_refs, &inputs()).unwrap();
        assert_eq!(split.bottom, vec![eq_cond(1, 5)]);
        assert_eq!(split.top, vec![eq_cond(4, 6), eq_cond(2, 3)]);
        assert_eq!(
            split.top_column_ids(),
            ColumnSet::from([ColumnId(2), ColumnId(3), ColumnId(4), ColumnId(6)])
        );
    }

    #[test]
    fn test_partition_rejects_cross_product() {
        let top = [eq_cond(4, 6)];
        let bottom = [eq_cond(2, 3)];
        let top_refs: Vec<&Expr> = top.iter().collect();
        let bottom_refs: Vec<&Expr> = bottom.iter().collect();
        assert_eq!(
            partition(&top_refs, &bottom_refs, &inputs()),
            Err(Rejection::EmptyConditionPartition)
        );
    }

    #[test]
    fn test_partition_rejects_three_way_conjunct() {
        let three_way = Expr::equal(
            Expr::binary(
                joinx_core::expr::BinaryOp::Add,
                Expr::column(col(1)),
                Expr::column(col(3)),
            ),
            Expr::column(col(5)),
        );
        let top = [three_way, eq_cond(1, 5)];
        let bottom = [eq_cond(2, 3)];
        let top_refs: Vec<&Expr> = top.iter().collect();
        let bottom_refs: Vec<&Expr> = bottom.iter().collect();
        assert_eq!(
            partition(&top_refs, &bottom_refs, &inputs()),
            Err(Rejection::ConjunctSpansAllInputs)
        );
    }

    #[test]
    fn test_missing_condition_is_invariant_violation() {
        let a = Plan::group(GroupId(0), vec![col(1)]);
        let b = Plan::group(GroupId(1), vec![col(3)]);
        let join = Join::new(JoinType::Inner, None, a, b, JoinReorderContext::default());
        assert!(matches!(
            required_conjuncts(&join, "bottom"),
            Err(ExploreError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_lasscom_guard() {
        let a = Plan::group(GroupId(0), vec![col(1)]);
        let b = Plan::group(GroupId(1), vec![col(3)]);
        let join = |ctx| Plan::join(JoinType::Inner, Some(eq_cond(1, 3)), a.clone(), b.clone(), ctx);

        assert!(lasscom_guard(&join(JoinReorderContext::default())));
        assert!(!lasscom_guard(&join(JoinReorderContext::default().with_commute())));
        assert!(!lasscom_guard(&join(JoinReorderContext::default().with_lasscom())));
        assert!(!lasscom_guard(&a));
    }
}
