//! Field-by-field cloning with an exclusion list.
//!
//! A query type lists its fields once in [`DeepClone::clone_fields`]; the
//! [`FieldCloner`] decides per field whether it is copied, shared or left at
//! its default value.
//!
//! ```ignore
//! impl DeepClone for OrderQuery {
//!     fn clone_fields(&self, copy: &mut Self, fields: &FieldCloner<'_>) {
//!         fields.value("base", &self.base, &mut copy.base);
//!         fields.optional_nested("criteria", &self.criteria, &mut copy.criteria);
//!     }
//! }
//!
//! let per_chunk = clone_with(&query, &CloneOptions::deep());
//! ```

use std::collections::HashSet;
use std::sync::Arc;

/// What to copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneOptions {
    deep: bool,
    excluded: HashSet<String>,
}

impl CloneOptions {
    /// Nested objects are shared with the original.
    pub fn shallow() -> Self {
        Self::default()
    }

    /// Nested objects are cloned recursively.
    pub fn deep() -> Self {
        Self {
            deep: true,
            ..Self::default()
        }
    }

    /// Leave `field` at its default value. Applies at every nesting level.
    pub fn excluding(mut self, field: impl Into<String>) -> Self {
        self.excluded.insert(field.into());
        self
    }

    pub fn is_deep(&self) -> bool {
        self.deep
    }

    pub fn includes(&self, field: &str) -> bool {
        !self.excluded.contains(field)
    }
}

/// A type that can be rebuilt from its default value one field at a time.
pub trait DeepClone: Default {
    /// Copy each field of `self` into `copy` through `fields`.
    fn clone_fields(&self, copy: &mut Self, fields: &FieldCloner<'_>);
}

/// Clone `original` according to `options`.
///
/// Starts from `T::default()`, so excluded fields keep their default values.
pub fn clone_with<T: DeepClone>(original: &T, options: &CloneOptions) -> T {
    let mut copy = T::default();
    original.clone_fields(&mut copy, &FieldCloner { options });
    copy
}

/// Per-field copy policy handed to [`DeepClone::clone_fields`].
pub struct FieldCloner<'a> {
    options: &'a CloneOptions,
}

impl FieldCloner<'_> {
    pub fn options(&self) -> &CloneOptions {
        self.options
    }

    /// Copy a plain value, including sequences.
    pub fn value<V: Clone>(&self, name: &str, source: &V, target: &mut V) {
        if self.options.includes(name) {
            target.clone_from(source);
        }
    }

    /// Share a nested object, or clone it recursively when deep.
    pub fn nested<N: DeepClone>(&self, name: &str, source: &Arc<N>, target: &mut Arc<N>) {
        if !self.options.includes(name) {
            return;
        }
        *target = if self.options.deep {
            Arc::new(clone_with(source.as_ref(), self.options))
        } else {
            Arc::clone(source)
        };
    }

    pub fn optional_nested<N: DeepClone>(
        &self,
        name: &str,
        source: &Option<Arc<N>>,
        target: &mut Option<Arc<N>>,
    ) {
        if !self.options.includes(name) {
            return;
        }
        *target = source.as_ref().map(|nested| {
            if self.options.deep {
                Arc::new(clone_with(nested.as_ref(), self.options))
            } else {
                Arc::clone(nested)
            }
        });
    }
}
