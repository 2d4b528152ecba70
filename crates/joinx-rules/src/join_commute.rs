//! # Join Commutativity Rule
//!
//! Implements `A ⋈ B = B ⋈ A` for the symmetric join types (inner and cross).
//! Left, right, full, semi and anti joins have fixed left/right semantics and are
//! declined with [`Rejection::UnsupportedJoinType`]. An inner join must carry a
//! condition; only a cross join may commute without one.
//!
//! The rewritten join keeps the original reorder context and adds `has_commute`, so
//! the guard stops the rule from immediately swapping the children back. The
//! L-Asscom rules check the same flag.
//!
//! ## Condition Swapping
//!
//! Comparisons between the two sides have their operands swapped (`A.x = B.y`
//! becomes `B.y = A.x`, `A.x < B.y` becomes `B.y > A.x`), recursively through `AND`.
//! The rewrite is equivalent without it; it keeps the condition reading left to
//! right in the new child order.

use joinx_core::error::ExploreResult;
use joinx_core::expr::Expr;
use joinx_core::pattern::{Bindings, Pattern};
use joinx_core::plan::{JoinType, Plan};
use joinx_core::rule::{Rejection, Rule, RuleId, RuleOutcome};

use crate::conditions::required_conjuncts;

/// Join commutativity: `A ⋈ B → B ⋈ A`.
pub fn rule() -> Rule {
    Rule::new(
        RuleId::JoinCommute,
        Pattern::join(Pattern::Any, Pattern::Any).bind("join"),
        guard,
        transform,
    )
}

fn guard(plan: &Plan) -> bool {
    plan.as_join().is_some_and(|j| !j.reorder().has_commute())
}

fn transform(bindings: &Bindings) -> ExploreResult<RuleOutcome> {
    let join = bindings.join("join")?;
    if !matches!(join.join_type(), JoinType::Inner | JoinType::Cross) {
        return Ok(RuleOutcome::Declined(Rejection::UnsupportedJoinType));
    }
    if !guard(bindings.root()) {
        return Ok(RuleOutcome::Declined(Rejection::GuardFailed));
    }
    if join.join_type() == JoinType::Inner {
        required_conjuncts(join, "commuted")?;
    }

    Ok(RuleOutcome::Rewritten(Plan::join(
        join.join_type(),
        join.condition().map(swap_condition_sides),
        join.right().clone(),
        join.left().clone(),
        join.reorder().with_commute(),
    )))
}

/// Swap the operand order of comparisons, recursing through conjunctions.
fn swap_condition_sides(expr: &Expr) -> Expr {
    match expr {
        Expr::BinaryOp { op, left, right } if op.is_comparison() => match op.flip() {
            Some(flipped) => Expr::BinaryOp {
                op: flipped,
                left: right.clone(),
                right: left.clone(),
            },
            None => expr.clone(),
        },
        Expr::And(conjuncts) => Expr::And(conjuncts.iter().map(swap_condition_sides).collect()),
        other => other.clone(),
    }
}
