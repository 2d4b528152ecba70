//! # Join L-Asscom Rule
//!
//! Left-associative commute for inner joins:
//!
//! ```text
//!        topJoin                newTopJoin
//!        /     \                 /      \
//!   bottomJoin  C    ──►   newBottomJoin  B
//!     /   \                   /   \
//!    A     B                 A     C
//! ```
//!
//! Conditions are redistributed by [`crate::conditions::split_conditions`]. The new
//! top join carries `has_lasscom`, the new bottom join a fresh context.

use crate::conditions::{lasscom_guard, split_conditions, ThreeWayInputs};
use joinx_core::error::ExploreResult;
use joinx_core::pattern::{Bindings, Pattern};
use joinx_core::plan::{JoinReorderContext, Plan};
use joinx_core::rule::{Rejection, Rule, RuleId, RuleOutcome};

/// Join L-Asscom: `(A ⋈ B) ⋈ C → (A ⋈ C) ⋈ B`.
pub fn rule() -> Rule {
    Rule::new(
        RuleId::JoinLAsscom,
        Pattern::inner_join(
            Pattern::inner_join(Pattern::Any.bind("a"), Pattern::Any.bind("b")).bind("bottom"),
            Pattern::Any.bind("c"),
        )
        .bind("top"),
        lasscom_guard,
        transform,
    )
}

fn transform(bindings: &Bindings) -> ExploreResult<RuleOutcome> {
    if !lasscom_guard(bindings.root()) {
        return Ok(RuleOutcome::Declined(Rejection::GuardFailed));
    }
    let top = bindings.join("top")?;
    let bottom = bindings.join("bottom")?;
    let a = bindings.get("a")?;
    let b = bindings.get("b")?;
    let c = bindings.get("c")?;

    let inputs = ThreeWayInputs::new(a, b, c);
    let split = match split_conditions(top, bottom, &inputs)? {
        Ok(split) => split,
        Err(reason) => return Ok(RuleOutcome::Declined(reason)),
    };

    let new_bottom = Plan::join(
        bottom.join_type(),
        split.bottom_condition(),
        a.clone(),
        c.clone(),
        JoinReorderContext::default(),
    );
    Ok(RuleOutcome::Rewritten(Plan::join(
        top.join_type(),
        split.top_condition(),
        new_bottom,
        b.clone(),
        JoinReorderContext::default().with_lasscom(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use joinx_core::expr::{ColumnId, ColumnRef, Expr};
    use joinx_core::plan::{GroupId, JoinType, PlanRef};
    use joinx_core::types::DataType;
    use std::sync::Arc;

    fn col(id: u32, name: &str) -> ColumnRef {
        ColumnRef::new(ColumnId(id), name, DataType::BigInt)
    }

    fn eq_cond(l: &ColumnRef, r: &ColumnRef) -> Expr {
        Expr::equal(Expr::column(l.clone()), Expr::column(r.clone()))
    }

    fn inner(cond: Expr, left: PlanRef, right: PlanRef) -> PlanRef {
        Plan::join(JoinType::Inner, Some(cond), left, right, JoinReorderContext::default())
    }

    #[test]
    fn test_lasscom_reassociates() {
        let (a1, b1, c1) = (col(1, "a1"), col(2, "b1"), col(3, "c1"));
        let a = Plan::group(GroupId(0), vec![a1.clone()]);
        let b = Plan::group(GroupId(1), vec![b1.clone()]);
        let c = Plan::group(GroupId(2), vec![c1.clone()]);
        let plan = inner(
            eq_cond(&a1, &c1),
            inner(eq_cond(&a1, &b1), a.clone(), b.clone()),
            c.clone(),
        );

        let rewritten = rule().apply(&plan).unwrap().outcome.into_plan().unwrap();
        let top = rewritten.as_join().unwrap();
        assert_eq!(top.condition(), Some(&eq_cond(&a1, &b1)));
        assert!(top.reorder().has_lasscom());
        assert!(Arc::ptr_eq(top.right(), &b));

        let new_bottom = top.left().as_join().unwrap();
        assert_eq!(new_bottom.condition(), Some(&eq_cond(&a1, &c1)));
        assert_eq!(new_bottom.reorder(), JoinReorderContext::default());
        assert!(Arc::ptr_eq(new_bottom.left(), &a));
        assert!(Arc::ptr_eq(new_bottom.right(), &c));
        assert_eq!(rewritten.output_set(), plan.output_set());
    }

    #[test]
    fn test_lasscom_result_is_not_rewritten_again() {
        let (a1, b1, c1) = (col(1, "a1"), col(2, "b1"), col(3, "c1"));
        let plan = inner(
            eq_cond(&a1, &c1),
            inner(
                eq_cond(&a1, &b1),
                Plan::group(GroupId(0), vec![a1.clone()]),
                Plan::group(GroupId(1), vec![b1.clone()]),
            ),
            Plan::group(GroupId(2), vec![c1.clone()]),
        );
        let once = rule().apply(&plan).unwrap().outcome.into_plan().unwrap();
        let twice = rule().apply(&once).unwrap();
        assert_eq!(twice.outcome, RuleOutcome::Declined(Rejection::GuardFailed));
    }
}
