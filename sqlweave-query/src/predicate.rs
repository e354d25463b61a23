//! Boolean predicates.
//!
//! [`and`] and [`or`] join any number of terms. A compound predicate
//! embedded in another fragment is wrapped in parentheses, so nesting never
//! changes precedence:
//!
//! ```rust
//! use sqlweave_query::{Dialect, render};
//! use sqlweave_query::predicate::{and, eq, gt, or};
//!
//! let filter = and([eq("active", true).into(), or([gt("age", 65).into(), eq("vip", true).into()]).into()]);
//! let query = render(Dialect::Postgres, "SELECT * FROM users WHERE {}", &[filter.into()]).unwrap();
//! assert_eq!(query.sql, "SELECT * FROM users WHERE (active = $1 AND (age > $2 OR vip = $3))");
//! ```

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::expr::{Column, Expr};
use crate::fragment::{RenderOutput, SqlFragment};
use crate::render::write_value;
use crate::value::Arg;

/// How the terms of a [`Predicate`] are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// All terms must hold.
    And,
    /// At least one term must hold.
    Or,
}

impl Combinator {
    fn separator(&self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }

    /// What an empty predicate renders as.
    fn identity(&self) -> &'static str {
        match self {
            Self::And => "1 = 1",
            Self::Or => "1 = 0",
        }
    }
}

/// Terms joined with `AND` or `OR`.
#[derive(Debug, Clone)]
pub struct Predicate {
    combinator: Combinator,
    terms: Vec<Arg>,
}

impl Predicate {
    /// Create a predicate.
    pub fn new(combinator: Combinator, terms: Vec<Arg>) -> Self {
        Self { combinator, terms }
    }

    /// Add a term.
    pub fn push(mut self, term: impl Into<Arg>) -> Self {
        self.terms.push(term.into());
        self
    }

    /// The combinator.
    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Check if there are no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl SqlFragment for Predicate {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        if self.terms.is_empty() {
            out.sql.push_str(self.combinator.identity());
            return Ok(());
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                out.sql.push_str(self.combinator.separator());
            }
            write_value(dialect, out, term)
                .map_err(|e| QueryError::nested(format_args!("predicate #{}", i + 1), e))?;
        }
        Ok(())
    }
}

/// A compound predicate wrapped in parentheses.
#[derive(Debug, Clone)]
struct Grouped(Predicate);

impl SqlFragment for Grouped {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        out.sql.push('(');
        self.0.write_sql(dialect, out)?;
        out.sql.push(')');
        Ok(())
    }
}

impl From<Predicate> for Arg {
    fn from(p: Predicate) -> Self {
        if p.len() > 1 {
            Arg::fragment(Grouped(p))
        } else {
            Arg::fragment(p)
        }
    }
}

/// Join terms with `AND`. No terms renders `1 = 1`.
pub fn and(terms: impl IntoIterator<Item = Arg>) -> Predicate {
    Predicate::new(Combinator::And, terms.into_iter().collect())
}

/// Join terms with `OR`. No terms renders `1 = 0`.
pub fn or(terms: impl IntoIterator<Item = Arg>) -> Predicate {
    Predicate::new(Combinator::Or, terms.into_iter().collect())
}

/// A negated term.
#[derive(Debug, Clone)]
pub struct Not(Arg);

impl SqlFragment for Not {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        out.sql.push_str("NOT (");
        write_value(dialect, out, &self.0).map_err(|e| QueryError::nested("predicate #1", e))?;
        out.sql.push(')');
        Ok(())
    }
}

crate::fragment_into_arg!(Not);

/// Negate a term: `NOT (term)`.
pub fn not(term: impl Into<Arg>) -> Not {
    Not(term.into())
}

fn compare(column: &str, op: &str, value: Arg) -> Expr {
    Expr::new(format!("{{}} {} {{}}", op), vec![Column::new(column).into(), value])
}

/// `column = value`
pub fn eq(column: &str, value: impl Into<Arg>) -> Expr {
    compare(column, "=", value.into())
}

/// `column <> value`
pub fn ne(column: &str, value: impl Into<Arg>) -> Expr {
    compare(column, "<>", value.into())
}

/// `column < value`
pub fn lt(column: &str, value: impl Into<Arg>) -> Expr {
    compare(column, "<", value.into())
}

/// `column <= value`
pub fn le(column: &str, value: impl Into<Arg>) -> Expr {
    compare(column, "<=", value.into())
}

/// `column > value`
pub fn gt(column: &str, value: impl Into<Arg>) -> Expr {
    compare(column, ">", value.into())
}

/// `column >= value`
pub fn ge(column: &str, value: impl Into<Arg>) -> Expr {
    compare(column, ">=", value.into())
}

/// `column IN (values...)`. An empty list renders `1 = 0`.
pub fn in_list(column: &str, values: impl Into<Arg>) -> Expr {
    match values.into() {
        Arg::List(items) if items.is_empty() => Expr::new("1 = 0", Vec::new()),
        values => Expr::new("{} IN ({})", vec![Column::new(column).into(), values]),
    }
}

/// `column IS NULL`
pub fn is_null(column: &str) -> Expr {
    Expr::new("{} IS NULL", vec![Column::new(column).into()])
}

/// `column IS NOT NULL`
pub fn is_not_null(column: &str) -> Expr {
    Expr::new("{} IS NOT NULL", vec![Column::new(column).into()])
}
