//! Turns a reference graph and a query into a [`SelectBuilder`].

use crate::entity::{EntityDescriptor, ReferenceDescriptor, ReferenceGraph, DEFAULT_TARGET_COLUMN};
use crate::query::QuerySpec;
use crate::sql::{CompareOp, SelectBuilder};

/// Where in the join tree an extension is being invoked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scope<'a> {
    /// The mapper's root table.
    Root,
    /// A table joined through this reference.
    Joined(&'a ReferenceDescriptor),
}

impl Scope<'_> {
    pub fn is_root(&self) -> bool {
        matches!(self, Scope::Root)
    }
}

/// Per-mapper customization of the generated SELECT.
///
/// Invoked once for the root table and once per joined table, in graph
/// order, with the query being executed.
pub trait SelectExtension<Q>: Send + Sync {
    fn extend(
        &self,
        builder: &mut SelectBuilder,
        entity: &EntityDescriptor,
        scope: Scope<'_>,
        query: &Q,
    );
}

/// Leaves the SELECT unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtension;

impl<Q> SelectExtension<Q> for NoExtension {
    fn extend(&self, _: &mut SelectBuilder, _: &EntityDescriptor, _: Scope<'_>, _: &Q) {}
}

/// Filters the root table on the query's ids: `alias.column IN @aliascolumn`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdFilter {
    column: String,
}

impl IdFilter {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
        }
    }

    pub fn column(&self) -> &str {
        &self.column
    }
}

impl Default for IdFilter {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_COLUMN)
    }
}

impl<Q: QuerySpec> SelectExtension<Q> for IdFilter {
    fn extend(
        &self,
        builder: &mut SelectBuilder,
        entity: &EntityDescriptor,
        scope: Scope<'_>,
        query: &Q,
    ) {
        if scope.is_root() && !query.ids().is_empty() {
            builder.filter(entity.table(), &self.column, CompareOp::In, query.ids());
        }
    }
}

impl<Q, A, B> SelectExtension<Q> for (A, B)
where
    A: SelectExtension<Q>,
    B: SelectExtension<Q>,
{
    fn extend(
        &self,
        builder: &mut SelectBuilder,
        entity: &EntityDescriptor,
        scope: Scope<'_>,
        query: &Q,
    ) {
        self.0.extend(builder, entity, scope, query);
        self.1.extend(builder, entity, scope, query);
    }
}

/// Build the SELECT for `query`: root table and columns, one LEFT JOIN plus
/// columns per reference, extensions at each table, then the logical filter.
pub fn build_select<Q, X>(graph: &ReferenceGraph, query: &Q, extension: &X) -> SelectBuilder
where
    Q: QuerySpec,
    X: SelectExtension<Q>,
{
    let root = graph.root();
    let mut builder = SelectBuilder::new();

    builder.from(root.table()).select_entity(root);
    extension.extend(&mut builder, root, Scope::Root, query);

    for reference in graph.references() {
        builder
            .left_join(reference.target.table(), reference.on_expr())
            .select_entity(&reference.target);
        extension.extend(&mut builder, &reference.target, Scope::Joined(reference), query);
    }

    if let Some(logical) = query.logical_filter() {
        builder.logical_connection(logical);
    }

    builder
}
