//! # sqlweave-query
//!
//! Dialect-aware SQL templates and argument binding.
//!
//! This crate provides the core rendering functionality, including:
//! - `{}`, `{N}` and `{name}` placeholders with `{{` as the escape
//! - Nested fragments that share one argument list
//! - Sequence expansion for `IN (...)` lists
//! - Named arguments with slot reuse where the dialect allows it
//! - Values that render differently per dialect
//! - Interpolation of bound arguments for logging
//!
//! ## Templates
//!
//! ```rust
//! use sqlweave_query::{Dialect, render, param};
//!
//! let query = render(
//!     Dialect::Postgres,
//!     "SELECT * FROM users WHERE age > {} AND name = {name} OR nick = {name}",
//!     &[18.into(), param("name", "alice")],
//! )
//! .unwrap();
//! assert_eq!(
//!     query.sql,
//!     "SELECT * FROM users WHERE age > $1 AND name = $2 OR nick = $2"
//! );
//! assert_eq!(query.arg_count(), 2);
//! ```
//!
//! ## Dialects
//!
//! | Dialect    | Placeholder | Named      | Reuses slots |
//! |------------|-------------|------------|--------------|
//! | SQLite     | `$N`        | `$name`    | yes          |
//! | PostgreSQL | `$N`        | -          | yes          |
//! | MySQL      | `?`         | -          | no           |
//! | SQL Server | `@pN`       | `@name`    | yes          |
//! | Generic    | `?`         | -          | no           |
//!
//! ```rust
//! use sqlweave_query::{Dialect, render};
//!
//! let query = render(Dialect::MySql, "SELECT {1}, {1}", &[7.into()]).unwrap();
//! assert_eq!(query.sql, "SELECT ?, ?");
//! assert_eq!(query.arg_count(), 2);
//! ```
//!
//! ## Fragments
//!
//! ```rust
//! use sqlweave_query::{Dialect, render, sql_expr};
//! use sqlweave_query::predicate::{and, eq, in_list};
//!
//! let filter = and([eq("active", true).into(), in_list("id", vec![1, 2, 3]).into()]);
//! let query = render(
//!     Dialect::SqlServer,
//!     "SELECT {} FROM users WHERE {}",
//!     &[sql_expr!("count(*)").into(), filter.into()],
//! )
//! .unwrap();
//! assert_eq!(
//!     query.sql,
//!     "SELECT count(*) FROM users WHERE (active = @p1 AND id IN (@p2, @p3, @p4))"
//! );
//! ```
//!
//! ## Interpolation
//!
//! ```rust
//! use sqlweave_query::{Dialect, render};
//!
//! let query = render(Dialect::Postgres, "SELECT {} || {}", &["it's".into(), 1.into()]).unwrap();
//! assert_eq!(query.interpolate().unwrap(), "SELECT 'it''s' || 1");
//! ```

pub mod config;
pub mod cte;
pub mod dialect;
pub mod error;
pub mod expr;
pub mod fragment;
pub mod interpolate;
pub mod logging;
pub mod memory;
pub mod predicate;
pub mod query;
pub mod render;
pub mod row;
pub mod value;
pub mod window;

pub use config::{EnvSource, MapEnvSource, RenderConfig, StdEnvSource};
pub use dialect::Dialect;
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult};
pub use expr::{Column, Expr, Ident, Literal, Raw, expr};
pub use fragment::{RenderOutput, RenderedQuery, SqlFragment};
pub use interpolate::{interpolate, literal};
pub use memory::{GLOBAL_OUTPUT_POOL, OutputPool, OutputPoolStats, PooledOutput, get_output};
pub use render::{
    Renderer, Substitution, bind_named, bind_positional, render, render_fragment, write_template,
    write_value,
};
pub use value::{
    Arg, BindArg, DialectValuer, JsonValue, NamedArg, NamedValue, ParamIndex, UuidValue, Value,
    param,
};

// Re-export logging utilities
pub use logging::{
    LogFormat, init as init_logging, init_with as init_logging_with, is_debug_enabled,
};

// Re-export smallvec for ParamIndex users
pub use smallvec;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::cte::{Cte, With};
    pub use crate::dialect::Dialect;
    pub use crate::error::{ErrorCode, QueryError, QueryResult};
    pub use crate::expr::{Column, Expr, Ident, Literal, Raw};
    pub use crate::fragment::{RenderOutput, RenderedQuery, SqlFragment};
    pub use crate::predicate::{and, not, or};
    pub use crate::query::CustomQuery;
    pub use crate::render::{Renderer, render, render_fragment};
    pub use crate::row::{Assignments, Fields, RowValue, RowValues};
    pub use crate::value::{Arg, BindArg, DialectValuer, Value, param};
    pub use crate::window::{NamedWindows, Window};
    pub use crate::sql_expr;
}
