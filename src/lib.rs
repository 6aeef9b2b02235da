//! # tablemap
//!
//! Maps declared entity types to parameterized SELECT statements with
//! automatically resolved LEFT JOINs, and executes large id-filtered queries
//! in bounded chunks.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │           Entity declarations (Entity::declare)          │
//! │      (table + alias, fields, references, join root)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [resolver]
//! ┌─────────────────────────────────────────────────────────┐
//! │        EntityDescriptor + ReferenceGraph (cached)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [mapper + extensions + logical filter]
//! ┌─────────────────────────────────────────────────────────┐
//! │            SelectBuilder → Statement { sql, params }     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [chunked execution]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Connector / AsyncConnector (caller's driver)      │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod mapper;
pub mod query;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{MapperSettings, Settings};
    pub use crate::entity::{Entity, EntityDeclaration, FieldKind};
    pub use crate::error::{ExecuteError, MappingError, MappingResult};
    pub use crate::mapper::{
        AsyncConnection, AsyncConnector, Connection, Connector, IdFilter, Mapper, NoExtension,
        Scope, SelectExtension,
    };
    pub use crate::query::{
        clone_with, CloneOptions, DeepClone, FieldCloner, PropertyPath, QueryBase, QuerySpec,
    };
    pub use crate::sql::{
        CompareOp, FieldRef, LogicalFilter, Parameter, SelectBuilder, Statement, Value,
    };
}

// Also export at crate root for convenience
pub use error::{ExecuteError, MappingError, MappingResult};
pub use mapper::Mapper;
