//! # Declarative Pattern Matching for Exploration Rules
//!
//! Each rule declares a [`Pattern`] describing the shape of plans it can rewrite.
//! Matching walks the pattern once against the candidate root, so its cost is
//! proportional to the pattern size, not to the plan size.
//!
//! ## Pattern Language
//!
//! - `Pattern::Operator(matcher, children)`: the node must satisfy `matcher` and
//!   have exactly one child per child pattern, each matching in order.
//! - `Pattern::Any`: matches any subtree, including opaque group placeholders.
//! - `Pattern::Leaf`: matches only nodes without children (group placeholders).
//! - `Pattern::Bind(name, pattern)`: matches like `pattern` and records the matched
//!   node under `name`, so a transform can address "the bottom join" or "child C"
//!   directly through [`Bindings`] instead of re-deriving it.
//!
//! ## Example
//!
//! The L-Asscom-through-project shape `topJoin(project(bottomJoin(A, B)), C)`:
//!
//! ```
//! use joinx_core::pattern::Pattern;
//!
//! let pattern = Pattern::inner_join(
//!     Pattern::project(Pattern::inner_join(Pattern::Any.bind("a"), Pattern::Any.bind("b"))
//!         .bind("bottom"))
//!     .bind("project"),
//!     Pattern::Any.bind("c"),
//! )
//! .bind("top");
//! assert_eq!(
//!     pattern.to_string(),
//!     "top@InnerJoin(project@Project(bottom@InnerJoin(a@Any, b@Any)), c@Any)"
//! );
//! ```

use crate::error::{ExploreError, ExploreResult};
use crate::plan::{Join, JoinType, Plan, PlanKind, PlanRef, Project};
use std::fmt;

/// Structural template for a plan subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Match an operator with child patterns.
    Operator(OpMatcher, Vec<Pattern>),
    /// Match any subtree.
    Any,
    /// Match a node with no children.
    Leaf,
    /// Match the inner pattern and bind the node to a name.
    Bind(&'static str, Box<Pattern>),
}

/// Matcher for a single node (without looking at its children).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMatcher {
    /// Any node of this kind.
    Kind(PlanKind),
    /// A join of exactly this type.
    Join(JoinType),
}

impl OpMatcher {
    pub fn matches(&self, plan: &Plan) -> bool {
        match (self, plan) {
            (OpMatcher::Kind(kind), plan) => plan.kind() == *kind,
            (OpMatcher::Join(join_type), Plan::Join(j)) => j.join_type() == *join_type,
            (OpMatcher::Join(_), _) => false,
        }
    }
}

impl Pattern {
    /// A join of any type.
    pub fn join(left: Pattern, right: Pattern) -> Self {
        Pattern::Operator(OpMatcher::Kind(PlanKind::Join), vec![left, right])
    }

    /// An inner join.
    pub fn inner_join(left: Pattern, right: Pattern) -> Self {
        Pattern::Operator(OpMatcher::Join(JoinType::Inner), vec![left, right])
    }

    pub fn project(child: Pattern) -> Self {
        Pattern::Operator(OpMatcher::Kind(PlanKind::Project), vec![child])
    }

    /// Bind whatever this pattern matches to `name`.
    pub fn bind(self, name: &'static str) -> Self {
        Pattern::Bind(name, Box::new(self))
    }

    /// Number of nodes the pattern constrains.
    pub fn size(&self) -> usize {
        match self {
            Pattern::Operator(_, children) => 1 + children.iter().map(|c| c.size()).sum::<usize>(),
            Pattern::Any | Pattern::Leaf => 1,
            Pattern::Bind(_, inner) => inner.size(),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => write!(f, "Any"),
            Pattern::Leaf => write!(f, "Leaf"),
            Pattern::Bind(name, inner) => write!(f, "{}@{}", name, inner),
            Pattern::Operator(matcher, children) => {
                match matcher {
                    OpMatcher::Kind(kind) => write!(f, "{:?}", kind)?,
                    OpMatcher::Join(join_type) => write!(f, "{}Join", join_type)?,
                }
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Named handles produced by a successful match.
#[derive(Debug, Clone)]
pub struct Bindings {
    root: PlanRef,
    handles: Vec<(&'static str, PlanRef)>,
}

impl Bindings {
    pub fn root(&self) -> &PlanRef {
        &self.root
    }

    /// The node bound to `name`. A missing handle means the transform asked for
    /// something its own pattern never binds.
    pub fn get(&self, name: &str) -> ExploreResult<&PlanRef> {
        self.handles
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, plan)| plan)
            .ok_or_else(|| ExploreError::invariant(format!("pattern binds no handle '{}'", name)))
    }

    pub fn join(&self, name: &str) -> ExploreResult<&Join> {
        self.get(name)?
            .as_join()
            .ok_or_else(|| ExploreError::invariant(format!("handle '{}' is not a join", name)))
    }

    pub fn project(&self, name: &str) -> ExploreResult<&Project> {
        self.get(name)?
            .as_project()
            .ok_or_else(|| ExploreError::invariant(format!("handle '{}' is not a project", name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handles.iter().map(|(n, _)| *n)
    }
}

/// Check whether `plan` has the shape described by `pattern`.
pub fn matches(plan: &Plan, pattern: &Pattern) -> bool {
    match pattern {
        Pattern::Any => true,
        Pattern::Leaf => plan.children().is_empty(),
        Pattern::Bind(_, inner) => matches(plan, inner),
        Pattern::Operator(matcher, child_patterns) => {
            if !matcher.matches(plan) {
                return false;
            }
            let children = plan.children();
            children.len() == child_patterns.len()
                && children
                    .iter()
                    .zip(child_patterns)
                    .all(|(child, p)| matches(child, p))
        }
    }
}

/// Match `root` against `pattern`, collecting the named handles.
pub fn match_plan(root: &PlanRef, pattern: &Pattern) -> Option<Bindings> {
    let mut handles = Vec::new();
    if bind(root, pattern, &mut handles) {
        Some(Bindings {
            root: root.clone(),
            handles,
        })
    } else {
        None
    }
}

fn bind(plan: &PlanRef, pattern: &Pattern, out: &mut Vec<(&'static str, PlanRef)>) -> bool {
    match pattern {
        Pattern::Any => true,
        Pattern::Leaf => plan.children().is_empty(),
        Pattern::Bind(name, inner) => {
            if !bind(plan, inner, out) {
                return false;
            }
            out.push((name, plan.clone()));
            true
        }
        Pattern::Operator(matcher, child_patterns) => {
            if !matcher.matches(plan) {
                return false;
            }
            let children = plan.children();
            if children.len() != child_patterns.len() {
                return false;
            }
            children
                .into_iter()
                .zip(child_patterns)
                .all(|(child, p)| bind(child, p, out))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{ColumnId, ColumnRef, Expr, NamedExpr};
    use crate::plan::{GroupId, JoinReorderContext};
    use crate::types::DataType;
    use std::sync::Arc;

    fn col(id: u32) -> ColumnRef {
        ColumnRef::new(ColumnId(id), format!("c{}", id), DataType::BigInt)
    }

    fn inner(left: PlanRef, right: PlanRef, l: u32, r: u32) -> PlanRef {
        Plan::join(
            JoinType::Inner,
            Some(Expr::equal(Expr::column(col(l)), Expr::column(col(r)))),
            left,
            right,
            JoinReorderContext::default(),
        )
    }

    fn join_project_join() -> PlanRef {
        let a = Plan::group(GroupId(0), vec![col(1)]);
        let b = Plan::group(GroupId(1), vec![col(2)]);
        let c = Plan::group(GroupId(2), vec![col(3)]);
        let bottom = inner(a, b, 1, 2);
        let project = Plan::project(
            vec![NamedExpr::column(col(1)), NamedExpr::column(col(2))],
            bottom,
        )
        .unwrap();
        inner(project, c, 2, 3)
    }

    fn lasscom_project_pattern() -> Pattern {
        Pattern::inner_join(
            Pattern::project(
                Pattern::inner_join(Pattern::Any.bind("a"), Pattern::Any.bind("b")).bind("bottom"),
            )
            .bind("project"),
            Pattern::Any.bind("c"),
        )
        .bind("top")
    }

    #[test]
    fn test_match_binds_handles() {
        let plan = join_project_join();
        let bindings = match_plan(&plan, &lasscom_project_pattern()).expect("should match");

        assert!(Arc::ptr_eq(bindings.root(), &plan));
        assert!(Arc::ptr_eq(bindings.get("top").unwrap(), &plan));
        assert_eq!(bindings.join("bottom").unwrap().join_type(), JoinType::Inner);
        assert_eq!(bindings.project("project").unwrap().exprs().len(), 2);
        assert_eq!(bindings.get("c").unwrap().output()[0].id, ColumnId(3));
        assert_eq!(bindings.names().count(), 6);
    }

    #[test]
    fn test_missing_handle_is_invariant_violation() {
        let plan = join_project_join();
        let bindings = match_plan(&plan, &lasscom_project_pattern()).unwrap();
        assert!(matches!(
            bindings.get("nope"),
            Err(ExploreError::InvariantViolation(_))
        ));
        assert!(bindings.project("top").is_err());
    }

    #[test]
    fn test_mismatch_on_shape() {
        let a = Plan::group(GroupId(0), vec![col(1)]);
        let b = Plan::group(GroupId(1), vec![col(2)]);
        let c = Plan::group(GroupId(2), vec![col(3)]);
        // Join(Join(A, B), C): no project in between.
        let plan = inner(inner(a, b, 1, 2), c, 2, 3);
        assert!(match_plan(&plan, &lasscom_project_pattern()).is_none());
        assert!(!matches(&plan, &lasscom_project_pattern()));
        assert!(matches(&plan, &Pattern::inner_join(Pattern::join(Pattern::Leaf, Pattern::Leaf), Pattern::Leaf)));
    }

    #[test]
    fn test_join_type_matcher() {
        let a = Plan::group(GroupId(0), vec![col(1)]);
        let b = Plan::group(GroupId(1), vec![col(2)]);
        let left_join = Plan::join(
            JoinType::Left,
            Some(Expr::equal(Expr::column(col(1)), Expr::column(col(2)))),
            a,
            b,
            JoinReorderContext::default(),
        );
        assert!(matches(&left_join, &Pattern::join(Pattern::Any, Pattern::Any)));
        assert!(!matches(&left_join, &Pattern::inner_join(Pattern::Any, Pattern::Any)));
    }

    #[test]
    fn test_leaf_rejects_inner_nodes() {
        let plan = join_project_join();
        assert!(!matches(&plan, &Pattern::Leaf));
        assert!(matches(&Plan::group(GroupId(9), vec![]), &Pattern::Leaf));
    }

    #[test]
    fn test_size_and_display() {
        let pattern = lasscom_project_pattern();
        assert_eq!(pattern.size(), 6);
        assert_eq!(
            Pattern::join(Pattern::Any, Pattern::Leaf).to_string(),
            "Join(Any, Leaf)"
        );
    }
}
