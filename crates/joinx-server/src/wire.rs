//! # JSON Wire Protocol
//!
//! Plans travel as tagged JSON objects, one per node:
//!
//! ```json
//! {"op": "join", "joinType": "inner",
//!  "condition": {"binaryOp": {"op": "eq",
//!      "left":  {"column": {"id": 0, "name": "a.x", "type": "bigint"}},
//!      "right": {"column": {"id": 2, "name": "b.x", "type": "bigint"}}}},
//!  "left":  {"op": "group", "id": 0, "output": [{"id": 0, "name": "a.x", "type": "bigint"}]},
//!  "right": {"op": "group", "id": 1, "output": [{"id": 2, "name": "b.x", "type": "bigint"}]}}
//! ```
//!
//! Expressions use the core serde encoding, so literals are domain-checked while the
//! request is decoded. Building the plan from the decoded tree runs the same checks
//! as in-process construction (a Project must only read columns its child outputs).

use axum::http::StatusCode;
use joinx_core::error::ExploreError;
use joinx_core::expr::{ColumnRef, Expr, NamedExpr};
use joinx_core::plan::{GroupId, JoinReorderContext, JoinType, Plan, PlanRef};
use joinx_core::rule::UnknownRuleId;
use serde::{Deserialize, Serialize};

/// Errors raised while decoding a request.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("malformed request: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid plan: {0}")]
    Plan(#[from] ExploreError),
    #[error(transparent)]
    UnknownRule(#[from] UnknownRuleId),
}

impl WireError {
    /// Every decoding failure is the client's fault.
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl From<WireError> for (StatusCode, String) {
    fn from(err: WireError) -> Self {
        (err.status(), err.to_string())
    }
}

/// Wire form of a plan node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PlanJson {
    Join {
        #[serde(rename = "joinType")]
        join_type: JoinType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<Expr>,
        left: Box<PlanJson>,
        right: Box<PlanJson>,
        #[serde(default)]
        reorder: JoinReorderContext,
    },
    Project {
        exprs: Vec<NamedExpr>,
        child: Box<PlanJson>,
    },
    Group {
        id: GroupId,
        output: Vec<ColumnRef>,
    },
}

impl PlanJson {
    /// Build the plan tree, validating every Project.
    pub fn into_plan(self) -> Result<PlanRef, WireError> {
        Ok(match self {
            PlanJson::Join {
                join_type,
                condition,
                left,
                right,
                reorder,
            } => Plan::join(
                join_type,
                condition,
                left.into_plan()?,
                right.into_plan()?,
                reorder,
            ),
            PlanJson::Project { exprs, child } => Plan::project(exprs, child.into_plan()?)?,
            PlanJson::Group { id, output } => Plan::group(id, output),
        })
    }

    pub fn from_plan(plan: &Plan) -> Self {
        match plan {
            Plan::Join(j) => PlanJson::Join {
                join_type: j.join_type(),
                condition: j.condition().cloned(),
                left: Box::new(Self::from_plan(j.left())),
                right: Box::new(Self::from_plan(j.right())),
                reorder: j.reorder(),
            },
            Plan::Project(p) => PlanJson::Project {
                exprs: p.exprs().to_vec(),
                child: Box::new(Self::from_plan(p.child())),
            },
            Plan::Group(g) => PlanJson::Group {
                id: g.id(),
                output: g.output().to_vec(),
            },
        }
    }
}
