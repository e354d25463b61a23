//! Composable expressions.
//!
//! An [`Expr`] is a template plus its values. It renders through the same
//! substitution engine as a top-level render, so expressions nest inside one
//! another and inside any other fragment:
//!
//! ```rust
//! use sqlweave_query::{Dialect, render, sql_expr};
//!
//! let adult = sql_expr!("age >= {}", 18);
//! let named = sql_expr!("name LIKE {} AND {}", "A%", adult);
//! let query = render(Dialect::Postgres, "SELECT * FROM users WHERE {}", &[named.into()]).unwrap();
//! assert_eq!(query.sql, "SELECT * FROM users WHERE name LIKE $1 AND age >= $2");
//! ```

use crate::dialect::Dialect;
use crate::error::QueryResult;
use crate::fragment::{RenderOutput, SqlFragment};
use crate::interpolate::write_literal;
use crate::render::write_template;
use crate::value::{Arg, Value};

/// A template with its own value pool.
#[derive(Debug, Clone)]
pub struct Expr {
    format: String,
    values: Vec<Arg>,
    alias: Option<String>,
}

impl Expr {
    /// Create an expression.
    pub fn new(format: impl Into<String>, values: Vec<Arg>) -> Self {
        Self {
            format: format.into(),
            values,
            alias: None,
        }
    }

    /// Select this expression under `alias`.
    pub fn as_(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The template.
    pub fn format(&self) -> &str {
        &self.format
    }

    /// The value pool.
    pub fn values(&self) -> &[Arg] {
        &self.values
    }
}

impl SqlFragment for Expr {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        write_template(dialect, out, &self.format, &self.values)
    }

    fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

/// Create an expression from a template and values.
///
/// See [`sql_expr!`](crate::sql_expr) for mixing value types.
pub fn expr<T: Into<Arg>>(format: impl Into<String>, values: impl IntoIterator<Item = T>) -> Expr {
    Expr::new(format, values.into_iter().map(Into::into).collect())
}

/// Build an [`Expr`] from a template and any number of values.
///
/// ```rust
/// use sqlweave_query::{Dialect, param, render_fragment, sql_expr};
///
/// let e = sql_expr!("{id} = {} OR {id} IS NULL", 5, param("id", 1));
/// let query = render_fragment(Dialect::SqlServer, &e).unwrap();
/// assert_eq!(query.sql, "@id = @p2 OR @id IS NULL");
/// ```
#[macro_export]
macro_rules! sql_expr {
    ($format:expr) => {
        $crate::expr::Expr::new($format, Vec::new())
    };

    ($format:expr, $($value:expr),+ $(,)?) => {
        $crate::expr::Expr::new($format, vec![$($crate::value::Arg::from($value)),+])
    };
}

/// SQL text written verbatim, with no placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raw(pub String);

impl Raw {
    /// Wrap SQL text.
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }
}

impl SqlFragment for Raw {
    fn write_sql(&self, _dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        out.sql.push_str(&self.0);
        Ok(())
    }
}

/// An identifier quoted for the target dialect.
///
/// Dotted names are quoted part by part: `users.id` becomes `"users"."id"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(pub String);

impl Ident {
    /// Wrap an identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl SqlFragment for Ident {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        for (i, part) in self.0.split('.').enumerate() {
            if i > 0 {
                out.sql.push('.');
            }
            out.sql.push_str(&dialect.quote_identifier(part));
        }
        Ok(())
    }
}

/// A column reference, quoted only when the name requires it.
///
/// ```rust
/// use sqlweave_query::{Dialect, expr::Column, render_fragment};
///
/// let q = render_fragment(Dialect::Postgres, &Column::new("users.order")).unwrap();
/// assert_eq!(q.sql, "users.\"order\"");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column(pub String);

impl Column {
    /// Wrap a column name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl SqlFragment for Column {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        for (i, part) in self.0.split('.').enumerate() {
            if i > 0 {
                out.sql.push('.');
            }
            if part == "*" {
                out.sql.push('*');
            } else {
                out.sql.push_str(&dialect.quote_identifier_if_needed(part));
            }
        }
        Ok(())
    }
}

/// A value inlined as a SQL literal instead of bound as an argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal(pub Value);

impl Literal {
    /// Wrap a value.
    pub fn new(value: impl Into<Value>) -> Self {
        Self(value.into())
    }
}

impl SqlFragment for Literal {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        write_literal(dialect, &mut out.sql, &self.0)
    }
}

/// Implement `From<T> for Arg` for fragment types.
#[macro_export]
#[doc(hidden)]
macro_rules! fragment_into_arg {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for $crate::value::Arg {
                fn from(v: $t) -> Self {
                    $crate::value::Arg::fragment(v)
                }
            }
        )*
    };
}

fragment_into_arg!(Expr, Raw, Ident, Column, Literal);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::render::{render, render_fragment};
    use crate::value::param;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_nested_expressions_share_numbering() {
        let inner = sql_expr!("b = {}", 2);
        let outer = sql_expr!("a = {} AND ({}) AND c = {}", 1, inner, 3);
        let query = render_fragment(Dialect::Postgres, &outer).unwrap();
        assert_eq!(query.sql, "a = $1 AND (b = $2) AND c = $3");
        assert_eq!(query.arg_count(), 3);
    }

    #[test]
    fn test_expr_function() {
        let e = expr("x IN ({})", [vec![1, 2]]);
        let query = render_fragment(Dialect::MySql, &e).unwrap();
        assert_eq!(query.sql, "x IN (?, ?)");
    }

    #[test]
    fn test_alias() {
        let e = sql_expr!("count(*)").as_("total");
        assert_eq!(e.alias(), Some("total"));
        assert_eq!(Arg::from(e).alias(), Some("total"));
    }

    #[test]
    fn test_ident_quoting() {
        let q = render(Dialect::MySql, "SELECT {}", &[Ident::new("users.order").into()]).unwrap();
        assert_eq!(q.sql, "SELECT `users`.`order`");
        let q = render_fragment(Dialect::SqlServer, &Ident::new("a]b")).unwrap();
        assert_eq!(q.sql, "[a]]b]");
    }

    #[test]
    fn test_column_quotes_only_when_needed() {
        let values: Vec<Arg> = vec![
            Column::new("t.name").into(),
            Column::new("t.*").into(),
            Column::new("user").into(),
        ];
        let q = render(Dialect::SqlServer, "{}, {}, {}", &values).unwrap();
        assert_eq!(q.sql, "t.name, t.*, [user]");
    }

    #[test]
    fn test_raw_and_literal() {
        let values: Vec<Arg> = vec![Raw::new("now()").into(), Literal::new("it's").into()];
        let q = render(Dialect::Postgres, "{} {}", &values).unwrap();
        assert_eq!(q.sql, "now() 'it''s'");
        assert!(q.args.is_empty());
    }

    #[test]
    fn test_named_values_in_nested_exprs_share_slots() {
        let left = sql_expr!("a = {id}", param("id", 7));
        let right = sql_expr!("b = {id}", param("id", 7));
        let q = render(Dialect::Sqlite, "{} OR {}", &[left.into(), right.into()]).unwrap();
        assert_eq!(q.sql, "a = $id OR b = $id");
        assert_eq!(q.arg_count(), 1);
    }

    #[test]
    fn test_nested_error_is_labelled() {
        let broken = sql_expr!("{missing}");
        let err = render(Dialect::Postgres, "SELECT {}", &[broken.into()]).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownName);
        assert!(err.message.starts_with("value #1: "));
        assert_eq!(err.root().code, ErrorCode::UnknownName);
    }
}
