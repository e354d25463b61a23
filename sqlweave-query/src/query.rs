//! Hand-written queries with a spliced select list.
//!
//! A [`CustomQuery`] is a template that may contain the `{*}` marker. The
//! marker is replaced by the query's fields, comma separated, so the select
//! list can be built up separately from the rest of the statement:
//!
//! ```rust
//! use sqlweave_query::{Dialect, query::CustomQuery, render_fragment, sql_expr};
//! use sqlweave_query::expr::Column;
//!
//! let q = CustomQuery::new("SELECT {*} FROM users WHERE id = {}", vec![7.into()])
//!     .field(Column::new("id"))
//!     .field(sql_expr!("upper({})", Column::new("name")).as_("name"));
//! let query = render_fragment(Dialect::Postgres, &q).unwrap();
//! assert_eq!(query.sql, "SELECT id, upper(name) AS name FROM users WHERE id = $1");
//! ```
//!
//! Anonymous and ordinal numbering carries across the marker: a `{1}` after
//! the marker reuses the slot bound by a `{1}` before it.

use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::fragment::{RenderOutput, SqlFragment};
use crate::render::Substitution;
use crate::row::Fields;
use crate::value::Arg;

/// The select-list marker.
pub const FIELDS_MARKER: &str = "{*}";

/// A template query whose fields are spliced in at `{*}`.
#[derive(Debug, Clone)]
pub struct CustomQuery {
    format: String,
    values: Vec<Arg>,
    fields: Fields,
}

impl CustomQuery {
    /// Create a query from a template and its values.
    pub fn new(format: impl Into<String>, values: Vec<Arg>) -> Self {
        Self {
            format: format.into(),
            values,
            fields: Fields::default(),
        }
    }

    /// Append a field to the select list.
    pub fn field(mut self, field: impl Into<Arg>) -> Self {
        self.fields = self.fields.push(field);
        self
    }

    /// Append several fields.
    pub fn fields(mut self, fields: impl IntoIterator<Item = Arg>) -> Self {
        self.fields.0.extend(fields);
        self
    }

    /// The template.
    pub fn format(&self) -> &str {
        &self.format
    }
}

/// Byte offset of the first `{*}` that is not part of a `{{` escape.
fn find_marker(format: &str) -> Option<usize> {
    let bytes = format.as_bytes();
    format.match_indices(FIELDS_MARKER).map(|(i, _)| i).find(|&i| {
        let braces_before = bytes[..i].iter().rev().take_while(|&&b| b == b'{').count();
        braces_before % 2 == 0
    })
}

impl SqlFragment for CustomQuery {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        let mut subst = Substitution::new(dialect, &self.values)?;
        let Some(at) = find_marker(&self.format) else {
            return subst.write(out, &self.format);
        };
        subst.write(out, &self.format[..at])?;
        self.fields.write_sql(dialect, out)?;
        subst.write(out, &self.format[at + FIELDS_MARKER.len()..])
    }

    fn fetchable_fields(&self) -> Option<Vec<Arg>> {
        Some(self.fields.0.clone())
    }
}

crate::fragment_into_arg!(CustomQuery);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Column;
    use crate::render::{render, render_fragment};
    use crate::value::param;
    use pretty_assertions::assert_eq;

    fn columns(names: &[&str]) -> Vec<Arg> {
        names.iter().map(|n| Column::new(*n).into()).collect()
    }

    #[test]
    fn test_ordinals_shared_across_marker() {
        let q = CustomQuery::new("SELECT {1}, {*} FROM t WHERE a = {1} AND b = {}", vec![5.into()])
            .fields(columns(&["x", "y"]));
        let query = render_fragment(Dialect::Postgres, &q).unwrap();
        assert_eq!(query.sql, "SELECT $1, x, y FROM t WHERE a = $1 AND b = $2");
        assert_eq!(query.arg_count(), 2);
    }

    #[test]
    fn test_anonymous_cursor_shared_across_marker() {
        let q = CustomQuery::new("SELECT {}, {*} WHERE {}", vec![1.into(), 2.into()])
            .fields(columns(&["x"]));
        let query = render_fragment(Dialect::SqlServer, &q).unwrap();
        assert_eq!(query.sql, "SELECT @p1, x WHERE @p2");
    }

    #[test]
    fn test_without_marker() {
        let q = CustomQuery::new("SELECT 1 WHERE {x}", vec![param("x", 1)]).fields(columns(&["a"]));
        let query = render_fragment(Dialect::MySql, &q).unwrap();
        assert_eq!(query.sql, "SELECT 1 WHERE ?");
    }

    #[test]
    fn test_escaped_marker_is_literal() {
        assert_eq!(find_marker("{{*}"), None);
        assert_eq!(find_marker("{{{*}"), Some(2));
        let q = CustomQuery::new("SELECT '{{*}', {*}", Vec::new()).fields(columns(&["a"]));
        let query = render_fragment(Dialect::Postgres, &q).unwrap();
        assert_eq!(query.sql, "SELECT '{*}', a");
    }

    #[test]
    fn test_fetchable_fields() {
        let q = CustomQuery::new("SELECT {*}", Vec::new()).fields(columns(&["a", "b"]));
        assert_eq!(q.fetchable_fields().map(|f| f.len()), Some(2));
    }

    #[test]
    fn test_subquery() {
        let inner = CustomQuery::new("SELECT {*} FROM orders WHERE total > {}", vec![100.into()])
            .fields(columns(&["user_id"]));
        let query = render(
            Dialect::Postgres,
            "SELECT * FROM users WHERE active = {} AND id IN ({})",
            &[true.into(), inner.into()],
        )
        .unwrap();
        assert_eq!(
            query.sql,
            "SELECT * FROM users WHERE active = $1 AND id IN (SELECT user_id FROM orders WHERE total > $2)"
        );
    }
}
