//! # Catalog Interface
//!
//! Column identity is session-scoped: every column a plan can mention, whether read
//! from a table or produced by a projection alias, gets its [`ColumnId`] from one
//! [`ColumnIdGenerator`]. The rules themselves never allocate ids; they only move
//! existing columns around.
//!
//! The `Catalog` trait sits behind a trait object so tests and tooling can use the
//! in-memory implementation while a real session plugs in its own metadata source.

use crate::expr::{ColumnId, ColumnRef};
use crate::types::DataType;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Hands out column ids unique within one session.
#[derive(Debug, Default)]
pub struct ColumnIdGenerator {
    next: AtomicU32,
}

impl ColumnIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start allocating at `first`, e.g. above the ids of an already decoded plan.
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    pub fn next_id(&self) -> ColumnId {
        ColumnId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// Catalog provides the columns of named tables.
pub trait Catalog: Send + Sync {
    fn table_columns(&self, table: &str) -> Option<Vec<ColumnRef>>;
}

/// In-memory catalog for testing and development.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    ids: ColumnIdGenerator,
    tables: HashMap<String, Vec<ColumnRef>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table, allocating fresh ids for its columns.
    pub fn add_table(&mut self, table: &str, columns: &[(&str, DataType)]) -> Vec<ColumnRef> {
        let cols: Vec<ColumnRef> = columns
            .iter()
            .map(|(name, data_type)| self.new_column(format!("{}.{}", table, name), *data_type))
            .collect();
        self.tables.insert(table.to_string(), cols.clone());
        cols
    }

    /// Allocate a column that belongs to no table, such as a projection alias.
    pub fn new_column(&self, name: impl Into<String>, data_type: DataType) -> ColumnRef {
        ColumnRef::new(self.ids.next_id(), name, data_type)
    }
}

impl Catalog for InMemoryCatalog {
    fn table_columns(&self, table: &str) -> Option<Vec<ColumnRef>> {
        self.tables.get(table).cloned()
    }
}
