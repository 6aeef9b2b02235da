//! Logical filter builder.
//!
//! Composes `@aliasField` placeholders with AND/OR into the logical
//! connection string that shapes a query's WHERE clause:
//!
//! ```ignore
//! let filter = LogicalFilter::new()
//!     .and(FieldRef::of::<Order>("id")?)
//!     .or(LogicalFilter::new()
//!         .and(FieldRef::of::<Customer>("name")?)
//!         .and(FieldRef::of::<Customer>("city")?));
//!
//! assert_eq!(filter.render(), "(@oid OR (@cname AND @ccity))");
//! ```

use std::fmt;

use crate::entity::{resolve, Entity};
use crate::error::{MappingError, MappingResult};

use super::token::{Token, TokenStream};

/// How an item joins the items before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    fn token(self) -> Token {
        match self {
            Combinator::And => Token::And,
            Combinator::Or => Token::Or,
        }
    }
}

/// A field of a mapped entity, rendered as its parameter placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    placeholder: String,
}

impl FieldRef {
    /// Reference `field` on entity `T`, using the alias `T` declares.
    pub fn of<T: Entity>(field: &str) -> MappingResult<Self> {
        let descriptor = resolve::<T>()?;
        if !descriptor.has_field(field) {
            return Err(MappingError::UnknownField {
                entity: descriptor.entity().to_string(),
                field: field.to_string(),
            });
        }
        Ok(Self {
            placeholder: descriptor.table().parameter(field),
        })
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }
}

/// One side of a combinator: a placeholder or a nested filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(FieldRef),
    Group(LogicalFilter),
}

impl From<FieldRef> for Operand {
    fn from(field: FieldRef) -> Self {
        Operand::Field(field)
    }
}

impl From<LogicalFilter> for Operand {
    fn from(filter: LogicalFilter) -> Self {
        Operand::Group(filter)
    }
}

/// Fluent AND/OR composition of placeholders and nested filters.
///
/// The combinator of the first item is never rendered.
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "builders have no effect until rendered"]
pub struct LogicalFilter {
    items: Vec<(Combinator, Operand)>,
}

impl LogicalFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, operand: impl Into<Operand>) -> Self {
        self.items.push((Combinator::And, operand.into()));
        self
    }

    pub fn or(mut self, operand: impl Into<Operand>) -> Self {
        self.items.push((Combinator::Or, operand.into()));
        self
    }

    /// Shorthand for `and(FieldRef::of::<T>(field)?)`.
    pub fn and_field<T: Entity>(self, field: &str) -> MappingResult<Self> {
        Ok(self.and(FieldRef::of::<T>(field)?))
    }

    /// Shorthand for `or(FieldRef::of::<T>(field)?)`.
    pub fn or_field<T: Entity>(self, field: &str) -> MappingResult<Self> {
        Ok(self.or(FieldRef::of::<T>(field)?))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.lparen();
        for (i, (combinator, operand)) in self.items.iter().enumerate() {
            if i > 0 {
                ts.space().push(combinator.token()).space();
            }
            match operand {
                Operand::Field(field) => ts.push(Token::Param(field.placeholder.clone())),
                Operand::Group(group) => ts.push(Token::Raw(group.render())),
            };
        }
        ts.rparen();
        ts
    }

    /// Render to the logical connection string. An empty filter renders `()`.
    pub fn render(&self) -> String {
        self.to_tokens().serialize()
    }
}

impl fmt::Display for LogicalFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
