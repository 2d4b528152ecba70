//! # Logical Plan Trees
//!
//! Plans are immutable operator trees shared through [`PlanRef`] (`Arc<Plan>`). A
//! rewrite never edits a node: it builds new nodes and links them to whichever
//! existing subtrees it reuses unchanged. Because nothing is mutated after
//! construction, the same subtree may be read by any number of concurrent rule
//! invocations without locking.
//!
//! ## Variants
//!
//! - **`Join`**: join type, optional condition, two children and the reorder
//!   context flags consulted by the join-reorder rule guards.
//! - **`Project`**: an ordered list of [`NamedExpr`] over exactly one child.
//! - **`Group`**: an opaque leaf standing for "some plan with this output schema".
//!   Exploration rules look one or two levels deep, so everything below that depth
//!   is represented by a group placeholder.
//!
//! ## Output Columns
//!
//! Every node computes its ordered output columns once, at construction, from its
//! children (and, for a Project, its expression list). Accessors return the cached
//! slice.

use crate::error::{ExploreError, ExploreResult};
use crate::expr::{ColumnRef, ColumnSet, Expr, NamedExpr};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

/// Shared handle to an immutable plan node.
pub type PlanRef = Arc<Plan>;

/// Identifier of the equivalence group a [`GroupPlan`] stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SQL join types.
///
/// Only `Inner` and `Cross` are commutative. `Cross` is the unconditioned join and is
/// distinct from an `Inner` join that lost its condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    /// Left rows with at least one match; outputs left columns only.
    Semi,
    /// Left rows with no match; outputs left columns only.
    Anti,
    Cross,
}

impl JoinType {
    /// Whether the join outputs the right child's columns.
    pub fn outputs_right(&self) -> bool {
        !matches!(self, JoinType::Semi | JoinType::Anti)
    }
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JoinType::Inner => "Inner",
            JoinType::Left => "Left",
            JoinType::Right => "Right",
            JoinType::Full => "Full",
            JoinType::Semi => "Semi",
            JoinType::Anti => "Anti",
            JoinType::Cross => "Cross",
        };
        write!(f, "{}", s)
    }
}

/// Records which reorder rules produced a join node.
///
/// Guards read these flags to stop mutually inverse rules from undoing each other
/// forever. The flags are fixed when the node is built; a rule constructing a join
/// passes the context it wants that node to carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JoinReorderContext {
    has_commute: bool,
    has_lasscom: bool,
}

impl JoinReorderContext {
    /// Node produced by join commutativity.
    pub fn with_commute(self) -> Self {
        Self {
            has_commute: true,
            ..self
        }
    }

    /// Node produced by a left-associative commute (L-Asscom) rewrite.
    pub fn with_lasscom(self) -> Self {
        Self {
            has_lasscom: true,
            ..self
        }
    }

    pub fn has_commute(&self) -> bool {
        self.has_commute
    }

    pub fn has_lasscom(&self) -> bool {
        self.has_lasscom
    }
}

impl fmt::Display for JoinReorderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut flags = Vec::new();
        if self.has_commute {
            flags.push("commute");
        }
        if self.has_lasscom {
            flags.push("lasscom");
        }
        write!(f, "{}", flags.join(","))
    }
}

/// Kind discriminant for pattern matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlanKind {
    Join,
    Project,
    Group,
}

/// Logical join node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Join {
    join_type: JoinType,
    condition: Option<Expr>,
    left: PlanRef,
    right: PlanRef,
    reorder: JoinReorderContext,
    output: Vec<ColumnRef>,
}

impl Join {
    pub fn new(
        join_type: JoinType,
        condition: Option<Expr>,
        left: PlanRef,
        right: PlanRef,
        reorder: JoinReorderContext,
    ) -> Self {
        let mut output = left.output().to_vec();
        if join_type.outputs_right() {
            output.extend(right.output().iter().cloned());
        }
        Self {
            join_type,
            condition,
            left,
            right,
            reorder,
            output,
        }
    }

    pub fn join_type(&self) -> JoinType {
        self.join_type
    }

    pub fn condition(&self) -> Option<&Expr> {
        self.condition.as_ref()
    }

    /// Conjuncts of the condition; empty when there is none.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        self.condition
            .as_ref()
            .map(|c| c.conjuncts())
            .unwrap_or_default()
    }

    pub fn left(&self) -> &PlanRef {
        &self.left
    }

    pub fn right(&self) -> &PlanRef {
        &self.right
    }

    pub fn reorder(&self) -> JoinReorderContext {
        self.reorder
    }

    pub fn output(&self) -> &[ColumnRef] {
        &self.output
    }
}

/// Logical projection node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Project {
    exprs: Vec<NamedExpr>,
    child: PlanRef,
    output: Vec<ColumnRef>,
}

impl Project {
    /// Build a projection, checking that every referenced column is produced by
    /// `child` and that no output column is bound twice.
    pub fn try_new(exprs: Vec<NamedExpr>, child: PlanRef) -> ExploreResult<Self> {
        let available = child.output_set();
        let mut produced = ColumnSet::new();
        for named in &exprs {
            if let Some(missing) = named
                .expr
                .columns()
                .into_iter()
                .find(|c| !available.contains(&c.id))
            {
                return Err(ExploreError::invariant(format!(
                    "project expression {} references {} which its child does not output",
                    named, missing
                )));
            }
            if !produced.insert(named.output.id) {
                return Err(ExploreError::invariant(format!(
                    "project binds output column {} more than once",
                    named.output
                )));
            }
        }
        let output = exprs.iter().map(|e| e.output.clone()).collect();
        Ok(Self {
            exprs,
            child,
            output,
        })
    }

    pub fn exprs(&self) -> &[NamedExpr] {
        &self.exprs
    }

    pub fn child(&self) -> &PlanRef {
        &self.child
    }

    pub fn output(&self) -> &[ColumnRef] {
        &self.output
    }
}

/// Opaque leaf placeholder for an equivalence group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupPlan {
    id: GroupId,
    output: Vec<ColumnRef>,
}

impl GroupPlan {
    pub fn new(id: GroupId, output: Vec<ColumnRef>) -> Self {
        Self { id, output }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn output(&self) -> &[ColumnRef] {
        &self.output
    }
}

/// Logical plan node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Plan {
    Join(Join),
    Project(Project),
    Group(GroupPlan),
}

impl Plan {
    pub fn join(
        join_type: JoinType,
        condition: Option<Expr>,
        left: PlanRef,
        right: PlanRef,
        reorder: JoinReorderContext,
    ) -> PlanRef {
        Arc::new(Plan::Join(Join::new(
            join_type, condition, left, right, reorder,
        )))
    }

    pub fn project(exprs: Vec<NamedExpr>, child: PlanRef) -> ExploreResult<PlanRef> {
        Ok(Arc::new(Plan::Project(Project::try_new(exprs, child)?)))
    }

    pub fn group(id: GroupId, output: Vec<ColumnRef>) -> PlanRef {
        Arc::new(Plan::Group(GroupPlan::new(id, output)))
    }

    pub fn kind(&self) -> PlanKind {
        match self {
            Plan::Join(_) => PlanKind::Join,
            Plan::Project(_) => PlanKind::Project,
            Plan::Group(_) => PlanKind::Group,
        }
    }

    pub fn output(&self) -> &[ColumnRef] {
        match self {
            Plan::Join(j) => j.output(),
            Plan::Project(p) => p.output(),
            Plan::Group(g) => g.output(),
        }
    }

    pub fn output_set(&self) -> ColumnSet {
        self.output().iter().map(|c| c.id).collect()
    }

    pub fn children(&self) -> Vec<&PlanRef> {
        match self {
            Plan::Join(j) => vec![j.left(), j.right()],
            Plan::Project(p) => vec![p.child()],
            Plan::Group(_) => vec![],
        }
    }

    pub fn as_join(&self) -> Option<&Join> {
        match self {
            Plan::Join(j) => Some(j),
            _ => None,
        }
    }

    pub fn as_project(&self) -> Option<&Project> {
        match self {
            Plan::Project(p) => Some(p),
            _ => None,
        }
    }

    /// Indented multi-line rendering of the tree.
    pub fn display(&self, indent: usize) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, indent);
        out
    }

    fn write_tree(&self, out: &mut String, indent: usize) {
        let pad = "  ".repeat(indent);
        match self {
            Plan::Join(j) => {
                let _ = write!(out, "{}Join({})", pad, j.join_type());
                if let Some(cond) = j.condition() {
                    let _ = write!(out, " on {}", cond);
                }
                let flags = j.reorder().to_string();
                if !flags.is_empty() {
                    let _ = write!(out, " [{}]", flags);
                }
                out.push('\n');
            }
            Plan::Project(p) => {
                let exprs: Vec<String> = p.exprs().iter().map(|e| e.to_string()).collect();
                let _ = writeln!(out, "{}Project [{}]", pad, exprs.join(", "));
            }
            Plan::Group(g) => {
                let cols: Vec<String> = g.output().iter().map(|c| c.to_string()).collect();
                let _ = writeln!(out, "{}Group #{} [{}]", pad, g.id(), cols.join(", "));
            }
        }
        for child in self.children() {
            child.write_tree(out, indent + 1);
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::ColumnId;
    use crate::types::DataType;

    fn col(id: u32, name: &str) -> ColumnRef {
        ColumnRef::new(ColumnId(id), name, DataType::BigInt)
    }

    fn eq(l: &ColumnRef, r: &ColumnRef) -> Expr {
        Expr::equal(Expr::column(l.clone()), Expr::column(r.clone()))
    }

    #[test]
    fn test_join_output_concatenates_children() {
        let a = Plan::group(GroupId(0), vec![col(1, "a1"), col(2, "a2")]);
        let b = Plan::group(GroupId(1), vec![col(3, "b1")]);
        let join = Plan::join(
            JoinType::Inner,
            Some(eq(&col(1, "a1"), &col(3, "b1"))),
            a.clone(),
            b.clone(),
            JoinReorderContext::default(),
        );
        let ids: Vec<u32> = join.output().iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let semi = Plan::join(
            JoinType::Semi,
            Some(eq(&col(1, "a1"), &col(3, "b1"))),
            a,
            b,
            JoinReorderContext::default(),
        );
        assert_eq!(semi.output().len(), 2);
    }

    #[test]
    fn test_project_rejects_unknown_column() {
        let a = Plan::group(GroupId(0), vec![col(1, "a1")]);
        let err = Plan::project(vec![NamedExpr::column(col(7, "zz"))], a).unwrap_err();
        assert!(matches!(err, ExploreError::InvariantViolation(_)));
    }

    #[test]
    fn test_project_rejects_duplicate_output() {
        let a = Plan::group(GroupId(0), vec![col(1, "a1")]);
        let err = Plan::project(
            vec![NamedExpr::column(col(1, "a1")), NamedExpr::column(col(1, "a1"))],
            a,
        )
        .unwrap_err();
        assert!(matches!(err, ExploreError::InvariantViolation(_)));
    }

    #[test]
    fn test_project_output_is_bound_columns() {
        let a = Plan::group(GroupId(0), vec![col(1, "a1"), col(2, "a2")]);
        let p = Plan::project(
            vec![
                NamedExpr::column(col(2, "a2")),
                NamedExpr::alias(Expr::column(col(1, "a1")), col(10, "renamed")),
            ],
            a,
        )
        .unwrap();
        let ids: Vec<u32> = p.output().iter().map(|c| c.id.0).collect();
        assert_eq!(ids, vec![2, 10]);
        assert_eq!(p.kind(), PlanKind::Project);
    }

    #[test]
    fn test_reorder_context_flags() {
        let ctx = JoinReorderContext::default();
        assert!(!ctx.has_commute() && !ctx.has_lasscom());
        let ctx = ctx.with_commute();
        assert!(ctx.has_commute() && !ctx.has_lasscom());
        let ctx = ctx.with_lasscom();
        assert!(ctx.has_commute() && ctx.has_lasscom());
        assert_eq!(ctx.to_string(), "commute,lasscom");
    }

    #[test]
    fn test_display_tree() {
        let a = Plan::group(GroupId(0), vec![col(1, "a1")]);
        let b = Plan::group(GroupId(1), vec![col(2, "b1")]);
        let join = Plan::join(
            JoinType::Inner,
            Some(eq(&col(1, "a1"), &col(2, "b1"))),
            a,
            b,
            JoinReorderContext::default().with_commute(),
        );
        assert_eq!(
            join.display(0),
            "Join(Inner) on (a1#1 = b1#2) [commute]\n  Group #0 [a1#1]\n  Group #1 [b1#2]\n"
        );
    }
}
