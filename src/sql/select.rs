//! SELECT builder - one root table, LEFT JOINs and a parameterized WHERE.
//!
//! The WHERE clause is assembled from bound comparisons. When a logical
//! connection string is set, every `@name` placeholder in it that names a
//! bound comparison is replaced by the comparison text, so callers shape the
//! AND/OR structure while the builder owns the SQL.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::entity::{EntityDescriptor, Table};

use super::expr::{param, raw, BinaryOperator, Expr, ExprExt};
use super::param::{Parameter, Statement, Value};
use super::token::{Token, TokenStream};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@(\w+)").unwrap());

/// Comparison operators available to bound conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equals,
    NotEquals,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    In,
    Like,
}

impl From<CompareOp> for BinaryOperator {
    fn from(op: CompareOp) -> Self {
        match op {
            CompareOp::Equals => BinaryOperator::Eq,
            CompareOp::NotEquals => BinaryOperator::Ne,
            CompareOp::Less => BinaryOperator::Lt,
            CompareOp::LessOrEqual => BinaryOperator::Lte,
            CompareOp::Greater => BinaryOperator::Gt,
            CompareOp::GreaterOrEqual => BinaryOperator::Gte,
            CompareOp::In => BinaryOperator::In,
            CompareOp::Like => BinaryOperator::Like,
        }
    }
}

/// A comparison bound to a parameter.
#[derive(Debug, Clone, PartialEq)]
struct Condition {
    parameter: String,
    expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
struct Join {
    table: Table,
    on: Expr,
}

impl Join {
    fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Left).space().push(Token::Join).space();
        ts.append(&table_tokens(&self.table));
        ts.space().push(Token::On).space();
        ts.append(&self.on.to_tokens());
        ts
    }
}

fn table_tokens(table: &Table) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::Ident(table.name.clone()))
        .space()
        .push(Token::As)
        .space()
        .push(Token::Ident(table.alias.clone()));
    ts
}

fn is_empty_logical(logical: &str) -> bool {
    let logical = logical.trim();
    logical.is_empty() || logical == "()"
}

/// True when the opening paren at the start closes at the very end.
fn is_fully_parenthesized(sql: &str) -> bool {
    if !sql.starts_with('(') {
        return false;
    }
    let mut depth = 0usize;
    for (i, c) in sql.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == sql.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

/// Mutable SELECT statement under construction.
///
/// Methods take `&mut self` so extension hooks can keep chaining on the
/// builder they are handed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectBuilder {
    columns: Vec<Expr>,
    from: Option<Table>,
    joins: Vec<Join>,
    conditions: Vec<Condition>,
    raw_conditions: Vec<String>,
    params: Vec<Parameter>,
    logical: Option<String>,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(&mut self, table: &Table) -> &mut Self {
        self.from = Some(table.clone());
        self
    }

    /// Append `alias.field` columns for each field, in order.
    pub fn select_columns<I, S>(&mut self, table: &Table, fields: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns
            .extend(fields.into_iter().map(|f| table.column(f.as_ref())));
        self
    }

    /// Append every selectable field of an entity.
    pub fn select_entity(&mut self, entity: &EntityDescriptor) -> &mut Self {
        self.select_columns(entity.table(), entity.selectable_fields())
    }

    /// Append a trusted SELECT-list fragment.
    pub fn select_raw(&mut self, sql: &str) -> &mut Self {
        self.columns.push(raw(sql));
        self
    }

    pub fn left_join(&mut self, table: &Table, on: Expr) -> &mut Self {
        self.joins.push(Join {
            table: table.clone(),
            on,
        });
        self
    }

    /// Bind `alias.field <op> @aliasfield` and its value.
    ///
    /// Filtering the same field again replaces the earlier comparison.
    pub fn filter(
        &mut self,
        table: &Table,
        field: &str,
        op: CompareOp,
        value: impl Into<Value>,
    ) -> &mut Self {
        let parameter = table.parameter(field);
        let expr = table.column(field).binary(op.into(), param(&parameter));

        match self.conditions.iter_mut().find(|c| c.parameter == parameter) {
            Some(existing) => existing.expr = expr,
            None => self.conditions.push(Condition {
                parameter: parameter.clone(),
                expr,
            }),
        }
        self.bind(&parameter, value)
    }

    /// Append a trusted WHERE fragment, ANDed after everything else.
    pub fn where_raw(&mut self, sql: &str) -> &mut Self {
        self.raw_conditions.push(sql.to_string());
        self
    }

    /// Bind a parameter value, replacing any earlier value of the same name.
    pub fn bind(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        let value = value.into();
        match self.params.iter_mut().find(|p| p.name == name) {
            Some(existing) => existing.value = value,
            None => self.params.push(Parameter {
                name: name.to_string(),
                value,
            }),
        }
        self
    }

    /// Set the rendered logical filter that shapes the WHERE clause.
    pub fn logical_connection(&mut self, logical: impl Into<String>) -> &mut Self {
        self.logical = Some(logical.into());
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.params
    }

    /// The WHERE condition, or `None` when there is nothing to filter on.
    ///
    /// Parts are ANDed: the shaped logical filter, then comparisons it does
    /// not mention, then raw fragments. The shaped filter is parenthesized
    /// when other parts follow it, unless it is already one group.
    pub fn where_expr(&self) -> Option<Expr> {
        let mut shaped = None;
        let mut parts = Vec::new();

        match self.logical.as_deref().filter(|l| !is_empty_logical(l)) {
            Some(logical) => {
                let mut used = HashSet::new();
                let text = PLACEHOLDER.replace_all(logical.trim(), |caps: &Captures| {
                    let name = &caps[0];
                    match self.conditions.iter().find(|c| c.parameter == name) {
                        Some(condition) => {
                            used.insert(condition.parameter.clone());
                            condition.expr.to_sql()
                        }
                        None => name.to_string(),
                    }
                });
                shaped = Some(text.into_owned());
                parts.extend(
                    self.conditions
                        .iter()
                        .filter(|c| !used.contains(&c.parameter))
                        .map(|c| c.expr.clone()),
                );
            }
            None => parts.extend(self.conditions.iter().map(|c| c.expr.clone())),
        }

        parts.extend(self.raw_conditions.iter().map(|sql| raw(sql)));

        let mut parts = parts.into_iter();
        let first = match shaped {
            Some(text) if !parts.as_slice().is_empty() && !is_fully_parenthesized(&text) => {
                raw(&text).paren()
            }
            Some(text) => raw(&text),
            None => parts.next()?,
        };
        Some(parts.fold(first, |acc, part| acc.and(part)))
    }

    /// The WHERE condition text, or `None` when there is nothing to filter on.
    pub fn where_clause(&self) -> Option<String> {
        self.where_expr().map(|expr| expr.to_sql())
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Select).space();
        if self.columns.is_empty() {
            ts.push(Token::Star);
        }
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.append(&column.to_tokens());
        }

        if let Some(from) = &self.from {
            ts.space().push(Token::From).space();
            ts.append(&table_tokens(from));
        }

        for join in &self.joins {
            ts.space().append(&join.to_tokens());
        }

        if let Some(condition) = self.where_expr() {
            ts.space()
                .push(Token::Where)
                .space()
                .append(&condition.to_tokens());
        }

        ts
    }

    pub fn to_sql(&self) -> String {
        self.to_tokens().serialize()
    }

    /// Finish into SQL text plus parameters in binding order.
    pub fn build(&self) -> Statement {
        Statement {
            sql: self.to_sql(),
            params: self.params.clone(),
        }
    }
}

impl fmt::Display for SelectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
