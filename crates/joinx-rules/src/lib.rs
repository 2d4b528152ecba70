//! # Join-Reorder Exploration Rules
//!
//! The built-in rule family for exploring join orders. Every rule is a plain
//! [`Rule`](joinx_core::rule::Rule) value built by its module's `rule()` function:
//!
//! - **`join_commute`**: `A ⋈ B → B ⋈ A` for inner and cross joins.
//! - **`join_lasscom`**: `(A ⋈ B) ⋈ C → (A ⋈ C) ⋈ B` for inner joins.
//! - **`join_project_lasscom`**: the same reassociation when a projection sits
//!   between the two joins; the projection is split over the new inputs.
//!
//! ## Cycle Prevention
//!
//! Commute and L-Asscom are each their own inverse, and composing them can also
//! restore an earlier shape. Each join records which rewrite produced it
//! (`has_commute`, `has_lasscom` in its reorder context) and the guards refuse to
//! rewrite a join carrying a flag that would let the family undo itself:
//!
//! | rule                   | declines when the matched top join has |
//! |------------------------|-----------------------------------------|
//! | commute                | `has_commute`                           |
//! | L-Asscom (both forms)  | `has_commute` or `has_lasscom`          |

pub mod conditions;
pub mod join_commute;
pub mod join_lasscom;
pub mod join_project_lasscom;

use joinx_core::rule::RuleRegistry;

/// Create a registry holding every built-in exploration rule.
pub fn default_rule_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    registry.add_rule(join_commute::rule());
    registry.add_rule(join_lasscom::rule());
    registry.add_rule(join_project_lasscom::rule());
    registry
}
