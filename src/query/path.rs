//! Typed access to the integer-sequence field a mapper chunks on.

use std::fmt;

/// Reads the sequence, or `None` when an intermediate value is absent.
pub type PathGetter<Q> = fn(&Q) -> Option<&[i32]>;

/// Replaces the sequence. Returns `false` when the path cannot be written.
pub type PathSetter<Q> = fn(&mut Q, Vec<i32>) -> bool;

/// A named path to a nested `[i32]` field of a query type.
///
/// The dotted name is used for logging only; access goes through the
/// accessor functions.
///
/// ```ignore
/// fn customer_ids(query: &OrderQuery) -> Option<&[i32]> {
///     query.criteria.as_deref().map(|c| c.customer_ids.as_slice())
/// }
///
/// fn set_customer_ids(query: &mut OrderQuery, ids: Vec<i32>) -> bool {
///     match query.criteria.as_mut().and_then(Arc::get_mut) {
///         Some(criteria) => {
///             criteria.customer_ids = ids;
///             true
///         }
///         None => false,
///     }
/// }
///
/// let path = PropertyPath::new("criteria.customer_ids", customer_ids, set_customer_ids);
/// ```
pub struct PropertyPath<Q> {
    path: String,
    get: PathGetter<Q>,
    set: PathSetter<Q>,
}

impl<Q> PropertyPath<Q> {
    pub fn new(path: impl Into<String>, get: PathGetter<Q>, set: PathSetter<Q>) -> Self {
        Self {
            path: path.into(),
            get,
            set,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get<'q>(&self, query: &'q Q) -> Option<&'q [i32]> {
        (self.get)(query)
    }

    pub fn set(&self, query: &mut Q, values: Vec<i32>) -> bool {
        (self.set)(query, values)
    }
}

impl<Q> Clone for PropertyPath<Q> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            get: self.get,
            set: self.set,
        }
    }
}

impl<Q> fmt::Debug for PropertyPath<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PropertyPath").field(&self.path).finish()
    }
}
