//! The composable fragment protocol and render outputs.
//!
//! Anything implementing [`SqlFragment`] can be embedded in a template as
//! `{}` and renders itself into the shared [`RenderOutput`]. Expressions,
//! predicates, row values, field lists and whole queries all compose this way.
//!
//! ```rust
//! use sqlweave_query::{Dialect, QueryResult, RenderOutput, SqlFragment, render_fragment};
//!
//! #[derive(Debug)]
//! struct Now;
//!
//! impl SqlFragment for Now {
//!     fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
//!         out.sql.push_str(match dialect {
//!             Dialect::SqlServer => "SYSDATETIME()",
//!             _ => "CURRENT_TIMESTAMP",
//!         });
//!         Ok(())
//!     }
//! }
//!
//! let query = render_fragment(Dialect::SqlServer, &Now).unwrap();
//! assert_eq!(query.sql, "SYSDATETIME()");
//! ```

use std::fmt;

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::interpolate;
use crate::value::{Arg, BindArg, ParamIndex, Value};

/// A value that renders itself into SQL text and bound arguments.
pub trait SqlFragment: fmt::Debug + Send + Sync {
    /// Append this fragment's SQL to `out.sql`, its arguments to `out.args`
    /// and any named slots to `out.params`.
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()>;

    /// The alias this fragment should be selected as.
    fn alias(&self) -> Option<&str> {
        None
    }

    /// The fields this fragment fetches, when it is a query.
    fn fetchable_fields(&self) -> Option<Vec<Arg>> {
        None
    }
}

impl<T: SqlFragment + ?Sized> SqlFragment for &T {
    fn write_sql(&self, dialect: Dialect, out: &mut RenderOutput) -> QueryResult<()> {
        (**self).write_sql(dialect, out)
    }

    fn alias(&self) -> Option<&str> {
        (**self).alias()
    }

    fn fetchable_fields(&self) -> Option<Vec<Arg>> {
        (**self).fetchable_fields()
    }
}

/// The accumulator shared by every fragment during one render.
#[derive(Debug, Default)]
pub struct RenderOutput {
    /// SQL text written so far.
    pub sql: String,
    /// Arguments bound so far.
    pub args: Vec<BindArg>,
    /// Parameter name to argument slots.
    pub params: ParamIndex,
}

impl RenderOutput {
    /// Create an empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an output with a pre-allocated SQL buffer.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sql: String::with_capacity(capacity),
            args: Vec::new(),
            params: ParamIndex::default(),
        }
    }

    /// Reset for reuse, keeping allocations.
    pub fn clear(&mut self) {
        self.sql.clear();
        self.args.clear();
        self.params.clear();
    }

    /// Check if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty() && self.args.is_empty()
    }

    /// Append a bound argument, returning its 1-based slot number.
    #[inline]
    pub fn push_arg(&mut self, arg: BindArg) -> usize {
        self.args.push(arg);
        self.args.len()
    }

    /// Copy the accumulated state into an owned query.
    pub fn to_query(&self, dialect: Dialect) -> RenderedQuery {
        RenderedQuery {
            dialect,
            sql: self.sql.clone(),
            args: self.args.clone(),
            params: self.params.clone(),
        }
    }
}

/// A fully rendered query: SQL text, arguments and named slots.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    /// The dialect the query was rendered for.
    pub dialect: Dialect,
    /// The SQL text with placeholders.
    pub sql: String,
    /// The bound arguments, in slot order.
    pub args: Vec<BindArg>,
    /// Parameter name to argument slots.
    pub params: ParamIndex,
}

impl RenderedQuery {
    /// Iterate over the bound values.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.args.iter().map(|a| &a.value)
    }

    /// Number of bound arguments.
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// Rebind every slot recorded for `name`.
    ///
    /// Named slots keep their name tag, so SQLite and SQL Server drivers
    /// still see a named parameter.
    ///
    /// ```rust
    /// use sqlweave_query::{Dialect, Value, param, render};
    ///
    /// let mut query = render(Dialect::MySql, "{age} OR {age}", &[param("age", 5)]).unwrap();
    /// query.set_param("age", 7).unwrap();
    /// assert!(query.values().all(|v| *v == Value::Int(7)));
    /// ```
    pub fn set_param(&mut self, name: &str, value: impl Into<Value>) -> QueryResult<()> {
        let slots = self
            .params
            .get(name)
            .ok_or_else(|| QueryError::unknown_param(name))?;
        let value = value.into();
        for &slot in slots {
            let arg = self
                .args
                .get_mut(slot)
                .ok_or_else(|| QueryError::internal(format!("slot {} out of range", slot)))?;
            arg.value = value.clone();
        }
        Ok(())
    }

    /// Render a human-readable version with arguments inlined.
    ///
    /// For logging only; never execute the result.
    pub fn interpolate(&self) -> QueryResult<String> {
        interpolate::interpolate(self.dialect, &self.sql, &self.args)
    }
}

impl fmt::Display for RenderedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
