//! SQL generation module.
//!
//! - [`select`] - SELECT builder with LEFT JOINs and bound comparisons
//! - [`filter`] - logical AND/OR filter strings over `@aliasField` placeholders
//! - [`expr`] - Expression AST and builder DSL
//! - [`param`] - bound parameter values and finished statements
//! - [`token`] - Token types for SQL generation

pub mod expr;
pub mod filter;
pub mod param;
pub mod select;
pub mod token;

pub use expr::{param, raw, table_col, BinaryOperator, Expr, ExprExt};
pub use filter::{Combinator, FieldRef, LogicalFilter, Operand};
pub use param::{Parameter, Statement, Value};
pub use select::{CompareOp, SelectBuilder};
pub use token::{Token, TokenStream};
