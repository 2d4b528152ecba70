//! # Scalar Expressions
//!
//! Expressions are immutable, strictly owned trees: a composite expression owns its
//! children through `Box`/`Vec`, and reusing a sub-expression in a new tree means
//! cloning it. They appear as join conditions and projection entries.
//!
//! ## Column Identity
//!
//! A [`ColumnRef`] is identified by its [`ColumnId`] alone. Two columns named `id`
//! coming from different tables have different ids and compare unequal; the name and
//! type are carried for display and typing only. All dependency tests in the rules
//! ("does this conjunct only reference columns of A and C?") are set operations on
//! ids, see [`Expr::column_ids`].
//!
//! ## Conjuncts
//!
//! [`Expr::conjuncts`] splits a top-level `AND` into its terms (flattening nested
//! `AND`s) and [`Expr::conjunction`] rebuilds one. Every join-reorder rule
//! decomposes conditions this way before redistributing them.

use crate::literal::Literal;
use crate::types::DataType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Session-unique column identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(pub u32);

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order-insensitive set of referenced columns.
pub type ColumnSet = HashSet<ColumnId>;

/// Reference to a column. Equality and hashing use `id` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRef {
    pub id: ColumnId,
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl ColumnRef {
    pub fn new(id: ColumnId, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id,
            name: name.into(),
            data_type,
        }
    }
}

impl PartialEq for ColumnRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ColumnRef {}

impl Hash for ColumnRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// Scalar expression tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Expr {
    Column(ColumnRef),
    Literal(Literal),
    /// Comparison or arithmetic (`a = b`, `price > 100`, `x + 1`).
    BinaryOp {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Conjunction, stored flat so conditions decompose without walking binary trees.
    And(Vec<Expr>),
    Or(Vec<Expr>),
}

impl Expr {
    pub fn column(c: ColumnRef) -> Self {
        Expr::Column(c)
    }

    pub fn literal(lit: Literal) -> Self {
        Expr::Literal(lit)
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `left = right`.
    pub fn equal(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Eq, left, right)
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Static result type.
    pub fn data_type(&self) -> DataType {
        match self {
            Expr::Column(c) => c.data_type,
            Expr::Literal(l) => l.data_type(),
            Expr::BinaryOp { op, left, right } => {
                if op.is_comparison() {
                    DataType::Boolean
                } else if left.data_type() == DataType::Double
                    || right.data_type() == DataType::Double
                {
                    DataType::Double
                } else {
                    left.data_type()
                }
            }
            Expr::UnaryOp { op, operand } => match op {
                UnaryOp::Neg => operand.data_type(),
                UnaryOp::Not | UnaryOp::IsNull | UnaryOp::IsNotNull => DataType::Boolean,
            },
            Expr::And(_) | Expr::Or(_) => DataType::Boolean,
        }
    }

    /// Return all column references in this expression, in tree order.
    pub fn columns(&self) -> Vec<&ColumnRef> {
        let mut cols = Vec::new();
        self.collect_columns(&mut cols);
        cols
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a ColumnRef>) {
        match self {
            Expr::Column(c) => out.push(c),
            Expr::Literal(_) => {}
            Expr::BinaryOp { left, right, .. } => {
                left.collect_columns(out);
                right.collect_columns(out);
            }
            Expr::UnaryOp { operand, .. } => operand.collect_columns(out),
            Expr::And(exprs) | Expr::Or(exprs) => {
                for e in exprs {
                    e.collect_columns(out);
                }
            }
        }
    }

    /// Ids of all referenced columns.
    pub fn column_ids(&self) -> ColumnSet {
        self.columns().into_iter().map(|c| c.id).collect()
    }

    /// Flatten AND-chains: `(A AND (B AND C))` → `[A, B, C]`. Anything else is a
    /// single conjunct.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        match self {
            Expr::And(exprs) => exprs.iter().flat_map(|e| e.conjuncts()).collect(),
            other => vec![other],
        }
    }

    /// Combine predicates with AND. A single predicate is returned unwrapped; an
    /// empty list has no conjunction.
    pub fn conjunction(mut preds: Vec<Expr>) -> Option<Expr> {
        match preds.len() {
            0 => None,
            1 => preds.pop(),
            _ => Some(Expr::And(preds)),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(c) => write!(f, "{}", c),
            Expr::Literal(l) => write!(f, "{}", l),
            Expr::BinaryOp { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expr::UnaryOp { op, operand } => match op {
                UnaryOp::Not => write!(f, "NOT {}", operand),
                UnaryOp::Neg => write!(f, "-{}", operand),
                UnaryOp::IsNull => write!(f, "{} IS NULL", operand),
                UnaryOp::IsNotNull => write!(f, "{} IS NOT NULL", operand),
            },
            Expr::And(exprs) | Expr::Or(exprs) => {
                let sep = if matches!(self, Expr::And(_)) { " AND " } else { " OR " };
                write!(f, "(")?;
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", sep)?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Binary operators for comparison and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::NotEq
                | BinaryOp::Lt
                | BinaryOp::LtEq
                | BinaryOp::Gt
                | BinaryOp::GtEq
        )
    }

    /// The operator that gives the same result with operands swapped, if any.
    pub fn flip(&self) -> Option<BinaryOp> {
        match self {
            BinaryOp::Eq => Some(BinaryOp::Eq),
            BinaryOp::NotEq => Some(BinaryOp::NotEq),
            BinaryOp::Lt => Some(BinaryOp::Gt),
            BinaryOp::LtEq => Some(BinaryOp::GtEq),
            BinaryOp::Gt => Some(BinaryOp::Lt),
            BinaryOp::GtEq => Some(BinaryOp::LtEq),
            BinaryOp::Add => Some(BinaryOp::Add),
            BinaryOp::Mul => Some(BinaryOp::Mul),
            BinaryOp::Sub | BinaryOp::Div => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::LtEq => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        write!(f, "{}", s)
    }
}

/// Unary operators for boolean logic and null checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnaryOp {
    Not,
    Neg,
    IsNull,
    IsNotNull,
}

/// A projection entry: an expression bound to the output column it produces.
///
/// A bare column bound to itself is a pass-through; anything else is an alias that
/// introduces a new column id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NamedExpr {
    pub expr: Expr,
    pub output: ColumnRef,
}

impl NamedExpr {
    /// Re-expose a child column under its own identity.
    pub fn column(c: ColumnRef) -> Self {
        Self {
            expr: Expr::Column(c.clone()),
            output: c,
        }
    }

    pub fn alias(expr: Expr, output: ColumnRef) -> Self {
        Self { expr, output }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(&self.expr, Expr::Column(c) if *c == self.output)
    }

    /// Columns the expression reads (not the column it produces).
    pub fn column_ids(&self) -> ColumnSet {
        self.expr.column_ids()
    }
}

impl fmt::Display for NamedExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_pass_through() {
            write!(f, "{}", self.output)
        } else {
            write!(f, "{} AS {}", self.expr, self.output)
        }
    }
}
