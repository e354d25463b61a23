//! # sqlweave
//!
//! Dialect-aware SQL templates with argument binding.
//!
//! sqlweave provides:
//! - Templates with `{}`, `{N}` and `{name}` placeholders
//! - Composable fragments: expressions, predicates, rows, CTEs, window functions
//! - Positional placeholders for SQLite, PostgreSQL, MySQL and SQL Server
//! - Interpolation of bound arguments into display SQL
//!
//! ## Quick Start
//!
//! ```rust
//! use sqlweave::prelude::*;
//! use sqlweave::predicate::{eq, in_list};
//!
//! let filter = and([eq("team", "core").into(), in_list("id", vec![1, 2]).into()]);
//! let query = render(
//!     Dialect::Sqlite,
//!     "SELECT * FROM users WHERE {} AND created > {since}",
//!     &[filter.into(), param("since", "2024-01-01")],
//! )?;
//!
//! assert_eq!(
//!     query.sql,
//!     "SELECT * FROM users WHERE (team = $1 AND id IN ($2, $3)) AND created > $since"
//! );
//! assert_eq!(query.arg_count(), 4);
//! # Ok::<(), sqlweave::QueryError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use sqlweave_query::{config, cte, dialect, error, expr, fragment, interpolate, logging};
pub use sqlweave_query::{memory, predicate, query, render, row, value, window};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use sqlweave_query::prelude::*;
}

// Re-export key types at the crate root
pub use sqlweave_query::{
    Arg, BindArg, Dialect, ErrorCode, QueryError, QueryResult, RenderConfig, RenderedQuery,
    Renderer, SqlFragment, Value, param, render_fragment, sql_expr,
};
