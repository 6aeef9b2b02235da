//! Query specifications.
//!
//! - [`clone`] - field-by-field cloning used to derive one query per chunk
//! - [`path`] - typed accessors for the id sequence a mapper chunks on
//!
//! A query type carries the ids to filter on, an optional rendered logical
//! filter and whatever criteria the caller's extensions read. Most query
//! types embed a [`QueryBase`] and forward to it.

pub mod clone;
pub mod path;

use std::fmt;
use std::sync::Arc;

use crate::sql::{LogicalFilter, SelectBuilder};

pub use clone::{clone_with, CloneOptions, DeepClone, FieldCloner};
pub use path::{PathGetter, PathSetter, PropertyPath};

/// Subscriber to the "builder initialized" notification.
pub type BuilderListener = Arc<dyn Fn(&mut SelectBuilder) + Send + Sync>;

/// What a mapper needs from a query.
pub trait QuerySpec: DeepClone + Send + Sync {
    /// Identifiers to filter the root entity on.
    fn ids(&self) -> &[i32];

    /// Rendered logical filter string, e.g. `(@oid AND @cname)`.
    fn logical_filter(&self) -> Option<&str>;

    /// Called once per executed statement, after the SELECT is fully built
    /// and before it is turned into SQL text.
    fn after_builder_initialized(&self, _builder: &mut SelectBuilder) {}
}

/// Common query state: ids, logical filter and builder listeners.
#[derive(Clone, Default)]
pub struct QueryBase {
    pub ids: Vec<i32>,
    pub where_logical: Option<String>,
    listeners: Vec<BuilderListener>,
}

impl QueryBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(mut self, ids: impl Into<Vec<i32>>) -> Self {
        self.ids = ids.into();
        self
    }

    pub fn with_logical_filter(mut self, filter: &LogicalFilter) -> Self {
        self.where_logical = Some(filter.render());
        self
    }

    /// Subscribe to the notification fired after each builder is initialized.
    /// Listeners run in subscription order.
    pub fn on_after_builder_initialized<F>(&mut self, listener: F) -> &mut Self
    where
        F: Fn(&mut SelectBuilder) + Send + Sync + 'static,
    {
        self.listeners.push(Arc::new(listener));
        self
    }

    pub fn raise_after_builder_initialized(&self, builder: &mut SelectBuilder) {
        for listener in &self.listeners {
            listener(builder);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for QueryBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBase")
            .field("ids", &self.ids)
            .field("where_logical", &self.where_logical)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl DeepClone for QueryBase {
    fn clone_fields(&self, copy: &mut Self, fields: &FieldCloner<'_>) {
        fields.value("ids", &self.ids, &mut copy.ids);
        fields.value("where_logical", &self.where_logical, &mut copy.where_logical);
        // Listeners are shared so every chunk notifies the same subscribers
        fields.value("listeners", &self.listeners, &mut copy.listeners);
    }
}

impl QuerySpec for QueryBase {
    fn ids(&self) -> &[i32] {
        &self.ids
    }

    fn logical_filter(&self) -> Option<&str> {
        self.where_logical.as_deref()
    }

    fn after_builder_initialized(&self, builder: &mut SelectBuilder) {
        self.raise_after_builder_initialized(builder);
    }
}

/// Chunk path over [`QueryBase::ids`].
pub fn base_ids() -> PropertyPath<QueryBase> {
    fn get(query: &QueryBase) -> Option<&[i32]> {
        Some(&query.ids)
    }

    fn set(query: &mut QueryBase, ids: Vec<i32>) -> bool {
        query.ids = ids;
        true
    }

    PropertyPath::new("ids", get, set)
}
