//! Row values, field lists and assignments.
//!
//! ```rust
//! use sqlweave_query::{Dialect, render};
//! use sqlweave_query::row::{Assignments, Fields, RowValues};
//!
//! let rows = RowValues::new().row([1.into(), "a".into()]).row([2.into(), "b".into()]);
//! let query = render(
//!     Dialect::Postgres,
//!     "INSERT INTO t ({}) VALUES {}",
//!     &[Fields::columns(["id", "name"]).into(), rows.into()],
//! )
//! .unwrap();
//! assert_eq!(query.sql, "INSERT INTO t (id, name) VALUES ($1, $2), ($3, $4)");
//!
//! let set = Assignments::new().set("name", "c").set("order", 3);
//! let query = render(Dialect::MySql, "UPDATE t SET {}", &[set.into()]).unwrap();
//! assert_eq!(query.sql, "UPDATE t SET name = ?, `order` = ?");
//! ```

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::expr::Column;
use crate::fragment::{RenderOutput, SqlFragment};
use crate::render::write_value;
use crate::value::Arg;

/// Write `items` comma separated, labelling errors with `label #N`.
fn write_joined<'a>(
    dialect: Dialect,
    out: &mut RenderOutput,
    label: &str,
    items: impl IntoIterator<Item = &'a Arg>,
) -> QueryResult<()> {
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            out.sql.push_str(", ");
        }
        write_value(dialect, out, item)
            .map_err(|e| QueryError::nested(format_args!("{} #{}", label, i + 1), e))?;
    }
    Ok(())
}

/// A parenthesized row: `(a, b, c)`.
#[derive(Debug, Clone, Default)]
pub struct RowValue(pub Vec<Arg>);

impl RowValue {
    /// Create a row from its values.
    pub fn new(values: impl IntoIterator<Item = Arg>) -> Self {
        Self(values.into_iter().collect())
    }
}

impl SqlFragment for RowValue {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        out.sql.push('(');
        write_joined(dialect, out, "element", &self.0)?;
        out.sql.push(')');
        Ok(())
    }
}

/// Several rows: `(a, b), (c, d)`.
#[derive(Debug, Clone, Default)]
pub struct RowValues(pub Vec<RowValue>);

impl RowValues {
    /// Create an empty row list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row.
    pub fn row(mut self, values: impl IntoIterator<Item = Arg>) -> Self {
        self.0.push(RowValue::new(values));
        self
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no rows.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl SqlFragment for RowValues {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        for (i, row) in self.0.iter().enumerate() {
            if i > 0 {
                out.sql.push_str(", ");
            }
            row.write_sql(dialect, out)
                .map_err(|e| QueryError::nested(format_args!("element #{}", i + 1), e))?;
        }
        Ok(())
    }
}

/// A select list: `a, b AS x`.
///
/// Fields with an alias (see [`SqlFragment::alias`]) are written with
/// `AS`, quoting the alias when needed.
#[derive(Debug, Clone, Default)]
pub struct Fields(pub Vec<Arg>);

impl Fields {
    /// Create a field list from fragments.
    pub fn new(fields: impl IntoIterator<Item = Arg>) -> Self {
        Self(fields.into_iter().collect())
    }

    /// Create a field list from column names.
    pub fn columns<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self(names.into_iter().map(|n| Column::new(n).into()).collect())
    }

    /// Append a field.
    pub fn push(mut self, field: impl Into<Arg>) -> Self {
        self.0.push(field.into());
        self
    }
}

impl SqlFragment for Fields {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                out.sql.push_str(", ");
            }
            write_value(dialect, out, field)
                .map_err(|e| QueryError::nested(format_args!("field #{}", i + 1), e))?;
            if let Some(alias) = field.alias() {
                out.sql.push_str(" AS ");
                out.sql.push_str(&dialect.quote_identifier_if_needed(alias));
            }
        }
        Ok(())
    }
}

/// A single `field = value`.
#[derive(Debug, Clone)]
pub struct Assignment {
    field: Column,
    value: Arg,
}

impl Assignment {
    /// Assign `value` to `field`.
    pub fn new(field: impl Into<String>, value: impl Into<Arg>) -> Self {
        Self {
            field: Column::new(field),
            value: value.into(),
        }
    }
}

impl SqlFragment for Assignment {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        self.field.write_sql(dialect, out)?;
        out.sql.push_str(" = ");
        write_value(dialect, out, &self.value)
    }
}

/// Comma separated assignments, as in `UPDATE ... SET`.
#[derive(Debug, Clone, Default)]
pub struct Assignments(pub Vec<Assignment>);

impl Assignments {
    /// Create an empty assignment list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `field = value`.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.0.push(Assignment::new(field, value));
        self
    }
}

impl SqlFragment for Assignments {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        for (i, assignment) in self.0.iter().enumerate() {
            if i > 0 {
                out.sql.push_str(", ");
            }
            assignment
                .write_sql(dialect, out)
                .map_err(|e| QueryError::nested(format_args!("assignment #{}", i + 1), e))?;
        }
        Ok(())
    }
}

crate::fragment_into_arg!(RowValue, RowValues, Fields, Assignment, Assignments);
