//! Mapping errors.
//!
//! Raised while turning entity declarations into descriptors and reference
//! graphs. These surface when a mapper is constructed, never at query time.

use thiserror::Error;

/// Result type for mapping operations.
pub type MappingResult<T> = Result<T, MappingError>;

/// Errors raised while resolving entity declarations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The entity type declares no table name and alias.
    #[error("the entity type '{0}' does not declare a table")]
    MissingTable(String),

    /// The entity type is used as the root of a join tree but is not marked as one.
    #[error("the entity type '{0}' is not declared as a join-tree root")]
    MissingJoinRoot(String),

    /// Reference resolution came back to an entity already on the current path.
    #[error("cyclic entity reference: {}", .0.join(" -> "))]
    CyclicReference(Vec<String>),

    /// Two tables in one resolved query share an alias.
    #[error("table alias '{alias}' is declared by both '{first}' and '{second}'")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    /// A field reference names a field the entity does not declare.
    #[error("unknown field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },
}

impl MappingError {
    /// Check if this error came from a cyclic declaration.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Self::CyclicReference(_))
    }
}

/// Failure of a cancellable execution.
#[derive(Error, Debug)]
pub enum ExecuteError<E> {
    /// The connector failed; carries its error unchanged.
    #[error("query execution failed: {0}")]
    Execution(E),

    /// The cancellation signal fired before all chunks completed.
    #[error("query cancelled")]
    Cancelled,
}

impl<E> ExecuteError<E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The connector error, if this is not a cancellation.
    pub fn into_execution(self) -> Option<E> {
        match self {
            Self::Execution(error) => Some(error),
            Self::Cancelled => None,
        }
    }
}
