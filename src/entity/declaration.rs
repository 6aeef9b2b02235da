//! Entity declaration surface.
//!
//! Entity types describe their table mapping once, through [`Entity::declare`],
//! instead of being introspected at runtime:
//!
//! ```ignore
//! impl Entity for Order {
//!     fn declare(entity: &mut EntityDeclaration) {
//!         entity
//!             .table("orders", "o")
//!             .join_root()
//!             .field("id", FieldKind::Integer)
//!             .field("customerId", FieldKind::Integer)
//!             .reference_on::<Customer>("customer", "customerId", "id");
//!     }
//! }
//! ```

use std::any::{type_name, TypeId};
use std::fmt;

/// Join column used on the target side when a reference does not name one.
pub const DEFAULT_TARGET_COLUMN: &str = "Id";

/// A data record type mapped to a table.
pub trait Entity: 'static {
    /// Register the table, fields and references of this entity.
    fn declare(entity: &mut EntityDeclaration);
}

/// Type-erased handle to an [`Entity`] implementation.
#[derive(Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
    declare: fn(&mut EntityDeclaration),
}

impl EntityType {
    pub fn of<T: Entity>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            declare: T::declare,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified Rust type name, used in error messages.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the entity's declaration step.
    pub fn declaration(&self) -> EntityDeclaration {
        let mut declaration = EntityDeclaration::default();
        (self.declare)(&mut declaration);
        declaration
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityType").field(&self.name).finish()
    }
}

/// Runtime kind of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Integer,
    Float,
    Decimal,
    Bool,
    DateTime,
    Text,
    Bytes,
    /// Nested object; represented through joins only.
    Object,
    /// Collection of values or objects; never selected.
    Sequence,
}

impl FieldKind {
    /// Whether fields of this kind become columns in a SELECT list.
    pub fn is_selectable(self) -> bool {
        !matches!(self, FieldKind::Object | FieldKind::Sequence)
    }
}

/// A declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDeclaration {
    pub name: String,
    pub kind: FieldKind,
}

/// A declared foreign-key reference from one field to another entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDeclaration {
    /// Name of the owning field.
    pub field: String,
    /// Foreign-key column on the owning table.
    pub foreign_key: String,
    /// Join column on the target table.
    pub target_column: String,
    pub target: EntityType,
}

/// Collected declaration of one entity type.
#[derive(Debug, Clone, Default)]
pub struct EntityDeclaration {
    table: Option<(String, String)>,
    join_root: bool,
    fields: Vec<FieldDeclaration>,
    references: Vec<ReferenceDeclaration>,
}

impl EntityDeclaration {
    /// Declare the table name and the alias used to qualify its columns.
    pub fn table(&mut self, name: impl Into<String>, alias: impl Into<String>) -> &mut Self {
        self.table = Some((name.into(), alias.into()));
        self
    }

    /// Mark this entity as the root of a join tree.
    pub fn join_root(&mut self) -> &mut Self {
        self.join_root = true;
        self
    }

    pub fn field(&mut self, name: impl Into<String>, kind: FieldKind) -> &mut Self {
        self.fields.push(FieldDeclaration {
            name: name.into(),
            kind,
        });
        self
    }

    /// Declare a reference joined on the target's `Id` column.
    pub fn reference<T: Entity>(
        &mut self,
        field: impl Into<String>,
        foreign_key: impl Into<String>,
    ) -> &mut Self {
        self.reference_on::<T>(field, foreign_key, DEFAULT_TARGET_COLUMN)
    }

    /// Declare a reference joined on an explicit target column.
    pub fn reference_on<T: Entity>(
        &mut self,
        field: impl Into<String>,
        foreign_key: impl Into<String>,
        target_column: impl Into<String>,
    ) -> &mut Self {
        let field = field.into();
        self.fields.push(FieldDeclaration {
            name: field.clone(),
            kind: FieldKind::Object,
        });
        self.references.push(ReferenceDeclaration {
            field,
            foreign_key: foreign_key.into(),
            target_column: target_column.into(),
            target: EntityType::of::<T>(),
        });
        self
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn alias(&self) -> Option<&str> {
        self.table.as_ref().map(|(_, alias)| alias.as_str())
    }

    pub fn is_join_root(&self) -> bool {
        self.join_root
    }

    pub fn fields(&self) -> &[FieldDeclaration] {
        &self.fields
    }

    /// References in declaration order.
    pub fn references(&self) -> &[ReferenceDeclaration] {
        &self.references
    }
}
