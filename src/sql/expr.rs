//! Expression AST for ON clauses and bound comparisons.

use super::token::{Token, TokenStream};

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: alias.column
    Column { table: String, column: String },

    /// Bound parameter placeholder, e.g. `@cname`
    Param(String),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Parenthesized expression
    Paren(Box<Expr>),

    /// Trusted SQL fragment passed through unchanged.
    Raw(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Like,

    // Logical
    And,
}

impl BinaryOperator {
    fn token(self) -> Token {
        match self {
            BinaryOperator::Eq => Token::Eq,
            BinaryOperator::Ne => Token::Ne,
            BinaryOperator::Lt => Token::Lt,
            BinaryOperator::Lte => Token::Lte,
            BinaryOperator::Gt => Token::Gt,
            BinaryOperator::Gte => Token::Gte,
            BinaryOperator::In => Token::In,
            BinaryOperator::Like => Token::Like,
            BinaryOperator::And => Token::And,
        }
    }
}

impl Expr {
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        match self {
            Expr::Column { table, column } => {
                ts.push(Token::Column {
                    table: table.clone(),
                    name: column.clone(),
                });
            }
            Expr::Param(name) => {
                ts.push(Token::Param(name.clone()));
            }
            Expr::BinaryOp { left, op, right } => {
                ts.append(&left.to_tokens())
                    .space()
                    .push(op.token())
                    .space()
                    .append(&right.to_tokens());
            }
            Expr::Paren(inner) => {
                ts.lparen().append(&inner.to_tokens()).rparen();
            }
            Expr::Raw(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }
        }
        ts
    }

    pub fn to_sql(&self) -> String {
        self.to_tokens().serialize()
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql())
    }
}

// =============================================================================
// Constructors
// =============================================================================

/// Alias-qualified column reference.
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: table.into(),
        column: column.into(),
    }
}

/// Parameter placeholder. The name includes its `@` prefix.
pub fn param(name: &str) -> Expr {
    Expr::Param(name.into())
}

pub fn raw(sql: &str) -> Expr {
    Expr::Raw(sql.into())
}

// =============================================================================
// Builder DSL
// =============================================================================

pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn binary(self, op: BinaryOperator, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op,
            right: Box::new(other.into()),
        }
    }

    fn eq(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Eq, other)
    }

    fn and(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::And, other)
    }

    fn paren(self) -> Expr {
        Expr::Paren(Box::new(self.into_expr()))
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}
