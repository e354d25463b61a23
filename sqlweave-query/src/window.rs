//! Window functions.
//!
//! | Feature         | PostgreSQL | MySQL | SQLite | SQL Server |
//! |-----------------|------------|-------|--------|------------|
//! | Ranking, LAG    | yes        | yes   | yes    | yes        |
//! | Frame clauses   | yes        | yes   | yes    | yes        |
//! | GROUPS frames   | yes        | -     | yes    | -          |
//! | NULLS FIRST     | yes        | yes   | yes    | -          |
//! | Named windows   | yes        | yes   | yes    | -          |
//!
//! ```rust
//! use sqlweave_query::{Dialect, render};
//! use sqlweave_query::window::{SortOrder, Window, row_number, sum};
//!
//! let by_dept = Window::new().partition_by(["dept"]).order_by("salary", SortOrder::Desc);
//! let running = sum("amount").over(Window::new().order_by("day", SortOrder::Asc).rows_unbounded_preceding());
//! let query = render(
//!     Dialect::Postgres,
//!     "SELECT {}, {} FROM t",
//!     &[row_number().over(by_dept).into(), running.as_("total").into()],
//! )
//! .unwrap();
//! assert_eq!(
//!     query.sql,
//!     "SELECT ROW_NUMBER() OVER (PARTITION BY dept ORDER BY salary DESC), \
//!      SUM(amount) OVER (ORDER BY day ASC ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW) FROM t"
//! );
//! ```

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::expr::{Column, Expr};
use crate::fragment::{RenderOutput, SqlFragment};
use crate::render::write_value;
use crate::value::Arg;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

/// Position of NULL values in ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NullsPosition {
    /// NULL values first.
    First,
    /// NULL values last.
    Last,
}

/// One `ORDER BY` term.
#[derive(Debug, Clone)]
pub struct OrderSpec {
    /// Column or expression to order by.
    pub expr: Arg,
    /// Sort direction.
    pub direction: SortOrder,
    /// NULLS FIRST/LAST.
    pub nulls: Option<NullsPosition>,
}

/// Frame type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameType {
    /// Row-based frame.
    Rows,
    /// Value-based frame.
    Range,
    /// Group-based frame (PostgreSQL, SQLite).
    Groups,
}

/// Frame boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameBound {
    /// UNBOUNDED PRECEDING.
    UnboundedPreceding,
    /// n PRECEDING.
    Preceding(u32),
    /// CURRENT ROW.
    CurrentRow,
    /// n FOLLOWING.
    Following(u32),
    /// UNBOUNDED FOLLOWING.
    UnboundedFollowing,
}

impl FrameBound {
    fn write(&self, buf: &mut String) {
        match self {
            Self::UnboundedPreceding => buf.push_str("UNBOUNDED PRECEDING"),
            Self::Preceding(n) => buf.push_str(&format!("{} PRECEDING", n)),
            Self::CurrentRow => buf.push_str("CURRENT ROW"),
            Self::Following(n) => buf.push_str(&format!("{} FOLLOWING", n)),
            Self::UnboundedFollowing => buf.push_str("UNBOUNDED FOLLOWING"),
        }
    }
}

/// Frame exclusion (PostgreSQL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameExclude {
    /// EXCLUDE CURRENT ROW.
    CurrentRow,
    /// EXCLUDE GROUP.
    Group,
    /// EXCLUDE TIES.
    Ties,
    /// EXCLUDE NO OTHERS.
    NoOthers,
}

/// Frame clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameClause {
    /// Frame type (ROWS, RANGE, GROUPS).
    pub frame_type: FrameType,
    /// Frame start bound.
    pub start: FrameBound,
    /// Frame end bound (if BETWEEN).
    pub end: Option<FrameBound>,
    /// Exclude clause (PostgreSQL).
    pub exclude: Option<FrameExclude>,
}

impl FrameClause {
    fn write(&self, dialect: Dialect, buf: &mut String) {
        buf.push_str(match self.frame_type {
            FrameType::Rows => "ROWS ",
            FrameType::Range => "RANGE ",
            FrameType::Groups => match dialect {
                Dialect::Postgres | Dialect::Sqlite => "GROUPS ",
                _ => "ROWS ",
            },
        });

        match self.end {
            Some(end) => {
                buf.push_str("BETWEEN ");
                self.start.write(buf);
                buf.push_str(" AND ");
                end.write(buf);
            }
            None => self.start.write(buf),
        }

        if dialect == Dialect::Postgres {
            if let Some(exclude) = self.exclude {
                buf.push_str(match exclude {
                    FrameExclude::CurrentRow => " EXCLUDE CURRENT ROW",
                    FrameExclude::Group => " EXCLUDE GROUP",
                    FrameExclude::Ties => " EXCLUDE TIES",
                    FrameExclude::NoOthers => " EXCLUDE NO OTHERS",
                });
            }
        }
    }
}

/// A window definition: the body of an `OVER (...)` clause.
///
/// Rendered on its own it writes the body without parentheses.
#[derive(Debug, Clone, Default)]
pub struct Window {
    /// Existing window this one extends.
    pub name: Option<String>,
    /// PARTITION BY terms.
    pub partition_by: Vec<Arg>,
    /// ORDER BY terms.
    pub order_by: Vec<OrderSpec>,
    /// Frame clause.
    pub frame: Option<FrameClause>,
}

impl Window {
    /// Create an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend a named window.
    pub fn based_on(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Set PARTITION BY columns.
    pub fn partition_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partition_by = columns
            .into_iter()
            .map(|c| Column::new(c).into())
            .collect();
        self
    }

    /// Add a PARTITION BY expression.
    pub fn partition_by_expr(mut self, expr: impl Into<Arg>) -> Self {
        self.partition_by.push(expr.into());
        self
    }

    /// Add an ORDER BY column.
    pub fn order_by(self, column: impl Into<String>, direction: SortOrder) -> Self {
        self.order_by_expr(Column::new(column), direction, None)
    }

    /// Add an ORDER BY column with NULLS position.
    pub fn order_by_nulls(
        self,
        column: impl Into<String>,
        direction: SortOrder,
        nulls: NullsPosition,
    ) -> Self {
        self.order_by_expr(Column::new(column), direction, Some(nulls))
    }

    /// Add an ORDER BY expression.
    pub fn order_by_expr(
        mut self,
        expr: impl Into<Arg>,
        direction: SortOrder,
        nulls: Option<NullsPosition>,
    ) -> Self {
        self.order_by.push(OrderSpec {
            expr: expr.into(),
            direction,
            nulls,
        });
        self
    }

    /// Set a ROWS frame.
    pub fn rows(self, start: FrameBound, end: Option<FrameBound>) -> Self {
        self.frame(FrameType::Rows, start, end)
    }

    /// Set a RANGE frame.
    pub fn range(self, start: FrameBound, end: Option<FrameBound>) -> Self {
        self.frame(FrameType::Range, start, end)
    }

    /// Set a GROUPS frame (PostgreSQL, SQLite).
    pub fn groups(self, start: FrameBound, end: Option<FrameBound>) -> Self {
        self.frame(FrameType::Groups, start, end)
    }

    fn frame(mut self, frame_type: FrameType, start: FrameBound, end: Option<FrameBound>) -> Self {
        self.frame = Some(FrameClause {
            frame_type,
            start,
            end,
            exclude: None,
        });
        self
    }

    /// Set the frame exclusion (PostgreSQL). Has no effect without a frame.
    pub fn exclude(mut self, exclude: FrameExclude) -> Self {
        if let Some(frame) = &mut self.frame {
            frame.exclude = Some(exclude);
        }
        self
    }

    /// ROWS BETWEEN UNBOUNDED PRECEDING AND CURRENT ROW.
    pub fn rows_unbounded_preceding(self) -> Self {
        self.rows(FrameBound::UnboundedPreceding, Some(FrameBound::CurrentRow))
    }

    /// ROWS BETWEEN n PRECEDING AND n FOLLOWING.
    pub fn rows_around(self, n: u32) -> Self {
        self.rows(FrameBound::Preceding(n), Some(FrameBound::Following(n)))
    }
}

impl SqlFragment for Window {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        let mut sep = "";

        if let Some(name) = &self.name {
            out.sql.push_str(&dialect.quote_identifier_if_needed(name));
            sep = " ";
        }

        if !self.partition_by.is_empty() {
            out.sql.push_str(sep);
            out.sql.push_str("PARTITION BY ");
            for (i, term) in self.partition_by.iter().enumerate() {
                if i > 0 {
                    out.sql.push_str(", ");
                }
                write_value(dialect, out, term)
                    .map_err(|e| QueryError::nested(format_args!("element #{}", i + 1), e))?;
            }
            sep = " ";
        }

        if !self.order_by.is_empty() {
            out.sql.push_str(sep);
            out.sql.push_str("ORDER BY ");
            for (i, order) in self.order_by.iter().enumerate() {
                if i > 0 {
                    out.sql.push_str(", ");
                }
                write_value(dialect, out, &order.expr)
                    .map_err(|e| QueryError::nested(format_args!("element #{}", i + 1), e))?;
                out.sql.push_str(match order.direction {
                    SortOrder::Asc => " ASC",
                    SortOrder::Desc => " DESC",
                });
                if let Some(nulls) = order.nulls {
                    // SQL Server has no NULLS FIRST/LAST
                    if dialect != Dialect::SqlServer {
                        out.sql.push_str(match nulls {
                            NullsPosition::First => " NULLS FIRST",
                            NullsPosition::Last => " NULLS LAST",
                        });
                    }
                }
            }
            sep = " ";
        }

        if let Some(frame) = &self.frame {
            out.sql.push_str(sep);
            frame.write(dialect, &mut out.sql);
        }
        Ok(())
    }
}

/// What a window function is computed over.
#[derive(Debug, Clone)]
pub enum Over {
    /// `OVER (...)`.
    Inline(Window),
    /// `OVER name`.
    Named(String),
}

/// A function call waiting for its `OVER` clause.
#[derive(Debug, Clone)]
pub struct WindowCall(pub Expr);

impl WindowCall {
    /// Compute over an inline window.
    pub fn over(self, window: Window) -> WindowFunction {
        WindowFunction::new(self.0, Over::Inline(window))
    }

    /// Compute over a window defined in a `WINDOW` clause.
    pub fn over_named(self, name: impl Into<String>) -> WindowFunction {
        WindowFunction::new(self.0, Over::Named(name.into()))
    }
}

/// A window function with its OVER clause.
#[derive(Debug, Clone)]
pub struct WindowFunction {
    /// The function being called.
    pub function: Expr,
    /// The window.
    pub window: Over,
    /// Optional alias for the result.
    pub alias: Option<String>,
}

impl WindowFunction {
    /// Create a window function.
    pub fn new(function: Expr, window: Over) -> Self {
        Self {
            function,
            window,
            alias: None,
        }
    }

    /// Select the result under `alias`.
    pub fn as_(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

impl SqlFragment for WindowFunction {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        self.function.write_sql(dialect, out)?;
        match &self.window {
            Over::Inline(window) => {
                out.sql.push_str(" OVER (");
                window.write_sql(dialect, out)?;
                out.sql.push(')');
            }
            Over::Named(name) => {
                out.sql.push_str(" OVER ");
                out.sql.push_str(&dialect.quote_identifier_if_needed(name));
            }
        }
        Ok(())
    }

    fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

/// The `WINDOW w AS (...), ...` clause.
#[derive(Debug, Clone, Default)]
pub struct NamedWindows(pub Vec<(String, Window)>);

impl NamedWindows {
    /// Create an empty clause.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a window.
    pub fn window(mut self, name: impl Into<String>, window: Window) -> Self {
        self.0.push((name.into(), window));
        self
    }
}

impl SqlFragment for NamedWindows {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        if self.0.is_empty() {
            return Ok(());
        }
        out.sql.push_str("WINDOW ");
        for (i, (name, window)) in self.0.iter().enumerate() {
            if i > 0 {
                out.sql.push_str(", ");
            }
            out.sql.push_str(&dialect.quote_identifier_if_needed(name));
            out.sql.push_str(" AS (");
            window
                .write_sql(dialect, out)
                .map_err(|e| QueryError::nested(format_args!("element #{}", i + 1), e))?;
            out.sql.push(')');
        }
        Ok(())
    }
}

crate::fragment_into_arg!(Window, WindowFunction, NamedWindows);

fn call(format: impl Into<String>, values: Vec<Arg>) -> WindowCall {
    WindowCall(Expr::new(format, values))
}

/// ROW_NUMBER()
pub fn row_number() -> WindowCall {
    call("ROW_NUMBER()", Vec::new())
}

/// RANK()
pub fn rank() -> WindowCall {
    call("RANK()", Vec::new())
}

/// DENSE_RANK()
pub fn dense_rank() -> WindowCall {
    call("DENSE_RANK()", Vec::new())
}

/// COUNT(*)
pub fn count_star() -> WindowCall {
    call("COUNT(*)", Vec::new())
}

/// SUM(column)
pub fn sum(column: impl Into<String>) -> WindowCall {
    call("SUM({})", vec![Column::new(column).into()])
}

/// AVG(column)
pub fn avg(column: impl Into<String>) -> WindowCall {
    call("AVG({})", vec![Column::new(column).into()])
}

/// LAG(column, offset)
pub fn lag(column: impl Into<String>, offset: u32) -> WindowCall {
    call(format!("LAG({{}}, {})", offset), vec![Column::new(column).into()])
}

/// LEAD(column, offset)
pub fn lead(column: impl Into<String>, offset: u32) -> WindowCall {
    call(format!("LEAD({{}}, {})", offset), vec![Column::new(column).into()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render, render_fragment};
    use crate::row::Fields;
    use crate::sql_expr;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_window() {
        let q = render_fragment(Dialect::MySql, &rank().over(Window::new())).unwrap();
        assert_eq!(q.sql, "RANK() OVER ()");
    }

    #[test]
    fn test_named_window() {
        let windows = NamedWindows::new().window("w", Window::new().partition_by(["dept"]));
        let q = render(
            Dialect::Postgres,
            "SELECT {} FROM t {}",
            &[dense_rank().over_named("w").into(), windows.into()],
        )
        .unwrap();
        assert_eq!(q.sql, "SELECT DENSE_RANK() OVER w FROM t WINDOW w AS (PARTITION BY dept)");
    }

    #[test]
    fn test_window_extends_base() {
        let w = Window::based_on("w").order_by("id", SortOrder::Asc);
        let q = render_fragment(Dialect::Postgres, &count_star().over(w)).unwrap();
        assert_eq!(q.sql, "COUNT(*) OVER (w ORDER BY id ASC)");
    }

    #[test]
    fn test_nulls_position_skipped_on_sqlserver() {
        let w = Window::new().order_by_nulls("score", SortOrder::Desc, NullsPosition::Last);
        let q = render_fragment(Dialect::Postgres, &w).unwrap();
        assert_eq!(q.sql, "ORDER BY score DESC NULLS LAST");
        let q = render_fragment(Dialect::SqlServer, &w).unwrap();
        assert_eq!(q.sql, "ORDER BY score DESC");
    }

    #[test]
    fn test_frames() {
        let w = Window::new()
            .groups(FrameBound::Preceding(2), None)
            .exclude(FrameExclude::Ties);
        let q = render_fragment(Dialect::Postgres, &w).unwrap();
        assert_eq!(q.sql, "GROUPS 2 PRECEDING EXCLUDE TIES");
        let q = render_fragment(Dialect::MySql, &w).unwrap();
        assert_eq!(q.sql, "ROWS 2 PRECEDING");

        let w = Window::new().rows_around(1);
        let q = render_fragment(Dialect::Sqlite, &w).unwrap();
        assert_eq!(q.sql, "ROWS BETWEEN 1 PRECEDING AND 1 FOLLOWING");
    }

    #[test]
    fn test_lag_lead_and_avg() {
        let w = Window::new().order_by("day", SortOrder::Asc);
        let fields = Fields::new([
            lag("price", 1).over(w.clone()).as_("prev").into(),
            lead("price", 2).over(w.clone()).into(),
            avg("price").over(w).into(),
        ]);
        let q = render_fragment(Dialect::Sqlite, &fields).unwrap();
        assert_eq!(
            q.sql,
            "LAG(price, 1) OVER (ORDER BY day ASC) AS prev, \
             LEAD(price, 2) OVER (ORDER BY day ASC), \
             AVG(price) OVER (ORDER BY day ASC)"
        );
    }

    #[test]
    fn test_partition_by_expression_binds_arguments() {
        let w = Window::new().partition_by_expr(sql_expr!("bucket(id, {})", 10));
        let q = render_fragment(Dialect::SqlServer, &row_number().over(w)).unwrap();
        assert_eq!(q.sql, "ROW_NUMBER() OVER (PARTITION BY bucket(id, @p1))");
        assert_eq!(q.arg_count(), 1);
    }
}
