//! # joinx-core: Join-Reorder Exploration Core
//!
//! Data structures and mechanics shared by the join-reorder exploration rules: the
//! expression and plan models, declarative pattern matching and the rule registry.
//! The rules themselves live in `joinx-rules`; the search driver that schedules them
//! and the cost model that ranks their output are external.
//!
//! ## Module Overview
//!
//! - **`types`**: Data types, including bounded `varchar(n)`.
//! - **`literal`**: Typed, domain-validated scalar constants.
//! - **`expr`**: Scalar expressions, column identity and conjunct decomposition.
//! - **`plan`**: Immutable logical plan trees (`Join`, `Project`, `Group`) shared
//!   through `Arc`, and the per-join reorder context flags.
//! - **`pattern`**: Declarative pattern matching with named bindings.
//! - **`rule`**: Rules as data (`id`, pattern, guard, transform) and the registry.
//! - **`catalog`**: Column id allocation and table metadata lookup.
//! - **`error`**: Validation and invariant-violation errors.

pub mod catalog;
pub mod error;
pub mod expr;
pub mod literal;
pub mod pattern;
pub mod plan;
pub mod rule;
pub mod types;
