//! # Rule System
//!
//! A rule is a plain value: a stable [`RuleId`], a [`Pattern`], a cheap guard and a
//! transform. New rules are new registry entries, not new types.
//!
//! ## Application
//!
//! [`Rule::apply`] runs three steps against a candidate root:
//!
//! 1. **Match** the pattern, binding named handles.
//! 2. **Guard**: a cheap predicate on the root, typically reading the join's reorder
//!    context so that mutually inverse rules do not undo each other forever.
//! 3. **Transform**: builds the replacement plan from the bindings, or declines.
//!
//! A declined application is the normal, frequent outcome and is reported as
//! [`RuleOutcome::Declined`] with the reason, never as an error. Errors are reserved
//! for broken invariants in the input plan. The driver calling `apply` receives the
//! rule id alongside every result so it can do its own deduplication bookkeeping.
//!
//! Transforms are pure functions of their bindings: they never mutate matched nodes
//! and always allocate new ones, so any number of applications may run in parallel
//! over shared subtrees.

use crate::error::ExploreResult;
use crate::pattern::{match_plan, Bindings, Pattern};
use crate::plan::{Plan, PlanRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// Stable identifier of an exploration rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleId {
    #[serde(rename = "LOGICAL_JOIN_COMMUTE")]
    JoinCommute,
    #[serde(rename = "LOGICAL_JOIN_L_ASSCOM")]
    JoinLAsscom,
    #[serde(rename = "LOGICAL_JOIN_PROJECT_L_ASSCOM")]
    JoinProjectLAsscom,
}

impl RuleId {
    pub const ALL: [RuleId; 3] = [
        RuleId::JoinCommute,
        RuleId::JoinLAsscom,
        RuleId::JoinProjectLAsscom,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            RuleId::JoinCommute => "LOGICAL_JOIN_COMMUTE",
            RuleId::JoinLAsscom => "LOGICAL_JOIN_L_ASSCOM",
            RuleId::JoinProjectLAsscom => "LOGICAL_JOIN_PROJECT_L_ASSCOM",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown rule id '{0}'")]
pub struct UnknownRuleId(pub String);

impl FromStr for RuleId {
    type Err = UnknownRuleId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleId::ALL
            .into_iter()
            .find(|id| id.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRuleId(s.to_string()))
    }
}

/// Why a rule did not produce a rewrite. Diagnostics only: callers treat every
/// reason as "this rule does not apply here".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Rejection {
    /// The root does not have the rule's shape.
    PatternMismatch,
    /// The reorder context records that this node already came out of a rewrite the
    /// rule would undo.
    GuardFailed,
    /// The join type is outside the rule's algebraic identity.
    UnsupportedJoinType,
    /// A top-join conjunct references all three inputs and cannot be placed on
    /// either of the reassociated joins.
    ConjunctSpansAllInputs,
    /// One of the reassociated joins would have no condition (a cross product).
    EmptyConditionPartition,
    /// A projection entry reads both the input that moves up and one that stays
    /// below, so it cannot be evaluated on either side after the rewrite.
    ProjectionSpansMovedInput,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::PatternMismatch => "pattern mismatch",
            Rejection::GuardFailed => "guard failed",
            Rejection::UnsupportedJoinType => "unsupported join type",
            Rejection::ConjunctSpansAllInputs => "conjunct references all three inputs",
            Rejection::EmptyConditionPartition => "empty condition partition",
            Rejection::ProjectionSpansMovedInput => "projection spans the moved input",
        };
        write!(f, "{}", s)
    }
}

/// Result of a transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// A candidate plan equivalent to the matched root.
    Rewritten(PlanRef),
    Declined(Rejection),
}

impl RuleOutcome {
    pub fn plan(&self) -> Option<&PlanRef> {
        match self {
            RuleOutcome::Rewritten(plan) => Some(plan),
            RuleOutcome::Declined(_) => None,
        }
    }

    pub fn into_plan(self) -> Option<PlanRef> {
        match self {
            RuleOutcome::Rewritten(plan) => Some(plan),
            RuleOutcome::Declined(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            RuleOutcome::Rewritten(_) => None,
            RuleOutcome::Declined(reason) => Some(*reason),
        }
    }
}

/// Outcome of one rule application, tagged with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleResult {
    pub rule: RuleId,
    pub outcome: RuleOutcome,
}

/// Cheap precondition on the matched root.
pub type Guard = fn(&Plan) -> bool;

/// Builds the rewrite from the matched handles.
pub type Transform = fn(&Bindings) -> ExploreResult<RuleOutcome>;

/// An exploration rule.
#[derive(Clone)]
pub struct Rule {
    pub id: RuleId,
    pub pattern: Pattern,
    pub guard: Guard,
    pub transform: Transform,
}

impl Rule {
    pub fn new(id: RuleId, pattern: Pattern, guard: Guard, transform: Transform) -> Self {
        Self {
            id,
            pattern,
            guard,
            transform,
        }
    }

    /// Match, guard and transform `root`.
    pub fn apply(&self, root: &PlanRef) -> ExploreResult<RuleResult> {
        let Some(bindings) = match_plan(root, &self.pattern) else {
            trace!("Rule {} does not match root {:?}", self.id, root.kind());
            return Ok(self.declined(Rejection::PatternMismatch));
        };

        if !(self.guard)(root) {
            debug!("Rule {} declined: {}", self.id, Rejection::GuardFailed);
            return Ok(self.declined(Rejection::GuardFailed));
        }

        let outcome = (self.transform)(&bindings)?;
        match &outcome {
            RuleOutcome::Rewritten(plan) => {
                debug!("Rule {} produced:\n{}", self.id, plan.display(1));
            }
            RuleOutcome::Declined(reason) => {
                debug!("Rule {} declined: {}", self.id, reason);
            }
        }
        Ok(RuleResult {
            rule: self.id,
            outcome,
        })
    }

    fn declined(&self, reason: Rejection) -> RuleResult {
        RuleResult {
            rule: self.id,
            outcome: RuleOutcome::Declined(reason),
        }
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("pattern", &self.pattern.to_string())
            .finish_non_exhaustive()
    }
}

/// Registry of exploration rules keyed by identifier.
#[derive(Debug, Clone, Default)]
pub struct RuleRegistry {
    rules: BTreeMap<RuleId, Rule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, replacing any rule with the same id.
    pub fn add_rule(&mut self, rule: Rule) -> Option<Rule> {
        self.rules.insert(rule.id, rule)
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }

    /// All rules in identifier order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = RuleId> + '_ {
        self.rules.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every enabled rule to `root`.
    ///
    /// The first invariant violation aborts the whole call.
    pub fn apply_all(
        &self,
        root: &PlanRef,
        enabled: impl Fn(RuleId) -> bool,
    ) -> ExploreResult<Vec<RuleResult>> {
        let mut results = Vec::new();
        for rule in self.rules.values().filter(|r| enabled(r.id)) {
            results.push(rule.apply(root)?);
        }
        debug!(
            "Applied {} rules: {} rewrites",
            results.len(),
            results.iter().filter(|r| r.outcome.plan().is_some()).count()
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExploreError;
    use crate::expr::{ColumnId, ColumnRef};
    use crate::plan::{GroupId, JoinReorderContext, JoinType};
    use crate::types::DataType;

    fn col(id: u32) -> ColumnRef {
        ColumnRef::new(ColumnId(id), format!("c{}", id), DataType::BigInt)
    }

    fn cross_join() -> PlanRef {
        Plan::join(
            JoinType::Cross,
            None,
            Plan::group(GroupId(0), vec![col(1)]),
            Plan::group(GroupId(1), vec![col(2)]),
            JoinReorderContext::default(),
        )
    }

    fn swap_children(bindings: &Bindings) -> ExploreResult<RuleOutcome> {
        let join = bindings.join("join")?;
        Ok(RuleOutcome::Rewritten(Plan::join(
            join.join_type(),
            None,
            join.right().clone(),
            join.left().clone(),
            join.reorder().with_commute(),
        )))
    }

    fn not_commuted(plan: &Plan) -> bool {
        plan.as_join().is_some_and(|j| !j.reorder().has_commute())
    }

    fn swap_rule() -> Rule {
        Rule::new(
            RuleId::JoinCommute,
            Pattern::join(Pattern::Any, Pattern::Any).bind("join"),
            not_commuted,
            swap_children,
        )
    }

    #[test]
    fn test_rule_id_names_round_trip() {
        for id in RuleId::ALL {
            assert_eq!(id.name().parse::<RuleId>(), Ok(id));
        }
        assert_eq!(
            "logical_join_commute".parse::<RuleId>(),
            Ok(RuleId::JoinCommute)
        );
        assert!("NOPE".parse::<RuleId>().is_err());
        assert_eq!(
            serde_json::to_string(&RuleId::JoinProjectLAsscom).unwrap(),
            r#""LOGICAL_JOIN_PROJECT_L_ASSCOM""#
        );
    }

    #[test]
    fn test_apply_rewrites_and_tags() {
        let plan = cross_join();
        let result = swap_rule().apply(&plan).unwrap();
        assert_eq!(result.rule, RuleId::JoinCommute);
        let rewritten = result.outcome.into_plan().expect("rewrite");
        assert_eq!(rewritten.output()[0].id, ColumnId(2));
        assert!(rewritten.as_join().unwrap().reorder().has_commute());
    }

    #[test]
    fn test_guard_blocks_second_application() {
        let once = swap_rule().apply(&cross_join()).unwrap().outcome.into_plan().unwrap();
        let twice = swap_rule().apply(&once).unwrap();
        assert_eq!(twice.outcome, RuleOutcome::Declined(Rejection::GuardFailed));
    }

    #[test]
    fn test_pattern_mismatch_is_declined_not_error() {
        let leaf = Plan::group(GroupId(0), vec![col(1)]);
        let result = swap_rule().apply(&leaf).unwrap();
        assert_eq!(
            result.outcome.rejection(),
            Some(Rejection::PatternMismatch)
        );
    }

    #[test]
    fn test_transform_error_propagates() {
        fn broken(bindings: &Bindings) -> ExploreResult<RuleOutcome> {
            bindings.project("join")?;
            unreachable!()
        }
        let rule = Rule::new(
            RuleId::JoinCommute,
            Pattern::join(Pattern::Any, Pattern::Any).bind("join"),
            |_| true,
            broken,
        );
        assert!(matches!(
            rule.apply(&cross_join()),
            Err(ExploreError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_registry_apply_all_respects_enabled() {
        let mut registry = RuleRegistry::new();
        assert!(registry.add_rule(swap_rule()).is_none());
        assert!(registry.add_rule(swap_rule()).is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.get(RuleId::JoinCommute).is_some());
        assert!(registry.get(RuleId::JoinLAsscom).is_none());

        let plan = cross_join();
        let all = registry.apply_all(&plan, |_| true).unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].outcome.plan().is_some());

        let none = registry.apply_all(&plan, |id| id != RuleId::JoinCommute).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_plans_and_rules_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Plan>();
        assert_send_sync::<Rule>();
        assert_send_sync::<RuleRegistry>();
    }
}
