//! Entity mapping metadata.
//!
//! - [`declaration`] - the registration surface implemented by entity types
//! - [`descriptor`] - resolved tables, descriptors and reference graphs
//! - [`resolver`] - declaration → descriptor/graph resolution with caching

pub mod declaration;
pub mod descriptor;
pub mod resolver;

pub use declaration::{
    Entity, EntityDeclaration, EntityType, FieldDeclaration, FieldKind, ReferenceDeclaration,
    DEFAULT_TARGET_COLUMN,
};
pub use descriptor::{EntityDescriptor, ReferenceDescriptor, ReferenceGraph, Table};
pub use resolver::{resolve, resolve_graph, resolve_graph_of, resolve_type};
