//! Resolved entity metadata: tables, descriptors and reference graphs.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{MappingError, MappingResult};
use crate::sql::expr::{table_col, Expr, ExprExt};

use super::declaration::FieldDeclaration;

/// A table name with the alias that qualifies its columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Table {
    pub name: String,
    pub alias: String,
}

impl Table {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }

    /// Column reference qualified by this table's alias.
    pub fn column(&self, field: &str) -> Expr {
        table_col(&self.alias, field)
    }

    /// Parameter placeholder bound to a field of this table: `@` + alias + field.
    pub fn parameter(&self, field: &str) -> String {
        format!("@{}{}", self.alias, field)
    }
}

/// Immutable mapping of one entity type to its table.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    entity: &'static str,
    table: Table,
    fields: Vec<FieldDeclaration>,
}

impl EntityDescriptor {
    pub(crate) fn new(entity: &'static str, table: Table, fields: Vec<FieldDeclaration>) -> Self {
        Self {
            entity,
            table,
            fields,
        }
    }

    /// Rust type name of the entity.
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn table_name(&self) -> &str {
        &self.table.name
    }

    pub fn alias(&self) -> &str {
        &self.table.alias
    }

    pub fn fields(&self) -> &[FieldDeclaration] {
        &self.fields
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Fields that become columns, in declaration order.
    pub fn selectable_fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields
            .iter()
            .filter(|f| f.kind.is_selectable())
            .map(|f| f.name.as_str())
    }
}

/// One resolved LEFT JOIN in a reference graph.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDescriptor {
    /// Table owning the foreign key.
    pub source: Table,
    /// Field on the owning entity that holds the reference.
    pub field: String,
    pub foreign_key: String,
    pub target: Arc<EntityDescriptor>,
    pub target_column: String,
    /// Distance from the root; direct references of the root are at depth 0.
    pub depth: usize,
}

impl ReferenceDescriptor {
    /// `source.fk = target.column`
    pub fn on_expr(&self) -> Expr {
        self.source
            .column(&self.foreign_key)
            .eq(self.target.table().column(&self.target_column))
    }
}

/// Preorder list of every reference reachable from a root entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceGraph {
    root: Arc<EntityDescriptor>,
    references: Vec<ReferenceDescriptor>,
}

impl ReferenceGraph {
    pub(crate) fn new(root: Arc<EntityDescriptor>, references: Vec<ReferenceDescriptor>) -> Self {
        Self { root, references }
    }

    /// A graph with no joins, for entities mapped on their own.
    pub fn single(root: Arc<EntityDescriptor>) -> Self {
        Self::new(root, Vec::new())
    }

    pub fn root(&self) -> &Arc<EntityDescriptor> {
        &self.root
    }

    pub fn references(&self) -> &[ReferenceDescriptor] {
        &self.references
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    /// Root descriptor followed by every join target, in graph order.
    pub fn descriptors(&self) -> impl Iterator<Item = &EntityDescriptor> + '_ {
        std::iter::once(self.root.as_ref()).chain(self.references.iter().map(|r| r.target.as_ref()))
    }

    /// Check that no two tables of the resolved query share an alias.
    pub fn validate_aliases(&self) -> MappingResult<()> {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for descriptor in self.descriptors() {
            if let Some(first) = seen.insert(descriptor.alias(), descriptor.entity()) {
                return Err(MappingError::DuplicateAlias {
                    alias: descriptor.alias().to_string(),
                    first: first.to_string(),
                    second: descriptor.entity().to_string(),
                });
            }
        }
        Ok(())
    }
}
