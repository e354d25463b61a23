//! Common Table Expressions (WITH clauses).
//!
//! A [`Cte`] used as a value renders as its name, so it can be referenced in
//! a `FROM` clause; [`With`] renders the definitions themselves.
//!
//! | Feature       | PostgreSQL | MySQL | SQLite | SQL Server |
//! |---------------|------------|-------|--------|------------|
//! | Non-recursive | yes        | yes   | yes    | yes        |
//! | Recursive     | yes        | yes   | yes    | yes (*)    |
//! | Materialized  | yes        | -     | -      | -          |
//!
//! (*) SQL Server takes no `RECURSIVE` keyword.
//!
//! ```rust
//! use sqlweave_query::{Dialect, render, sql_expr};
//! use sqlweave_query::cte::{Cte, With};
//!
//! let active = Cte::new("active_users", sql_expr!("SELECT id FROM users WHERE active = {}", true));
//! let query = render(
//!     Dialect::Postgres,
//!     "{} SELECT * FROM {} WHERE id > {}",
//!     &[With::new().cte(active.clone()).into(), active.into(), 10.into()],
//! )
//! .unwrap();
//! assert_eq!(
//!     query.sql,
//!     "WITH active_users AS (SELECT id FROM users WHERE active = $1) SELECT * FROM active_users WHERE id > $2"
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::fragment::{RenderOutput, SqlFragment};
use crate::render::write_value;
use crate::value::Arg;

/// Materialization hint (PostgreSQL only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Materialized {
    /// Force materialization.
    Yes,
    /// Prevent materialization (inline the CTE).
    No,
}

/// A named subquery.
#[derive(Debug, Clone)]
pub struct Cte {
    /// Name of the CTE (used in FROM clause).
    pub name: String,
    /// Optional column aliases.
    pub columns: Vec<String>,
    /// The query that defines the CTE.
    pub query: Arg,
    /// Whether this is a recursive CTE.
    pub recursive: bool,
    /// PostgreSQL: MATERIALIZED / NOT MATERIALIZED hint.
    pub materialized: Option<Materialized>,
}

impl Cte {
    /// Create a CTE named `name` defined by `query`.
    pub fn new(name: impl Into<String>, query: impl Into<Arg>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            query: query.into(),
            recursive: false,
            materialized: None,
        }
    }

    /// Set the column aliases.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Mark this as a recursive CTE.
    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// Set materialization hint (PostgreSQL only).
    pub fn materialized(mut self, mat: Materialized) -> Self {
        self.materialized = Some(mat);
        self
    }

    /// Write `name (cols) AS [hint] (query)`.
    fn write_definition(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        out.sql.push_str(&dialect.quote_identifier_if_needed(&self.name));

        if !self.columns.is_empty() {
            out.sql.push_str(" (");
            for (i, column) in self.columns.iter().enumerate() {
                if i > 0 {
                    out.sql.push_str(", ");
                }
                out.sql.push_str(&dialect.quote_identifier_if_needed(column));
            }
            out.sql.push(')');
        }

        out.sql.push_str(" AS ");

        if dialect == Dialect::Postgres {
            match self.materialized {
                Some(Materialized::Yes) => out.sql.push_str("MATERIALIZED "),
                Some(Materialized::No) => out.sql.push_str("NOT MATERIALIZED "),
                None => {}
            }
        }

        out.sql.push('(');
        write_value(dialect, out, &self.query)?;
        out.sql.push(')');
        Ok(())
    }
}

impl SqlFragment for Cte {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        out.sql.push_str(&dialect.quote_identifier_if_needed(&self.name));
        Ok(())
    }

    fn alias(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// A `WITH` clause, optionally followed by the main query.
#[derive(Debug, Clone, Default)]
pub struct With {
    ctes: Vec<Cte>,
    main: Option<Arg>,
}

impl With {
    /// Create an empty WITH clause.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a CTE.
    pub fn cte(mut self, cte: Cte) -> Self {
        self.ctes.push(cte);
        self
    }

    /// Add several CTEs.
    pub fn ctes(mut self, ctes: impl IntoIterator<Item = Cte>) -> Self {
        self.ctes.extend(ctes);
        self
    }

    /// Set the query that follows the clause.
    pub fn query(mut self, main: impl Into<Arg>) -> Self {
        self.main = Some(main.into());
        self
    }
}

impl SqlFragment for With {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        if !self.ctes.is_empty() {
            out.sql.push_str("WITH ");
            if dialect != Dialect::SqlServer && self.ctes.iter().any(|c| c.recursive) {
                out.sql.push_str("RECURSIVE ");
            }
            for (i, cte) in self.ctes.iter().enumerate() {
                if i > 0 {
                    out.sql.push_str(", ");
                }
                cte.write_definition(dialect, out)
                    .map_err(|e| QueryError::nested(format_args!("cte #{}", i + 1), e))?;
            }
        }

        if let Some(main) = &self.main {
            if !self.ctes.is_empty() {
                out.sql.push(' ');
            }
            write_value(dialect, out, main)?;
        }
        Ok(())
    }
}

crate::fragment_into_arg!(Cte, With);
