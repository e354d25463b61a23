//! Template substitution and argument binding.
//!
//! A template is literal SQL with placeholders:
//!
//! - `{}` takes the next value from the pool (anonymous),
//! - `{3}` takes the third value (ordinal, 1-based),
//! - `{name}` takes the value passed as `param("name", ..)`,
//! - `{{` writes a literal `{`.
//!
//! Scalars become bound arguments with the dialect's placeholder syntax,
//! lists expand into comma separated elements and fragments render
//! themselves into the same output.
//!
//! ```rust
//! use sqlweave_query::{Arg, Dialect, render};
//!
//! let values: Vec<Arg> = vec![5.into(), "x".into()];
//! let query = render(Dialect::Postgres, "a = {} AND b = {}", &values).unwrap();
//! assert_eq!(query.sql, "a = $1 AND b = $2");
//!
//! let query = render(Dialect::SqlServer, "a = {} AND b = {}", &values).unwrap();
//! assert_eq!(query.sql, "a = @p1 AND b = @p2");
//! ```
//!
//! # Repeated references
//!
//! Dialects with reusable placeholders bind a repeated ordinal or name once:
//!
//! ```rust
//! use sqlweave_query::{Dialect, param, render};
//!
//! let query = render(Dialect::Sqlite, "{age} {age}", &[param("age", 5)]).unwrap();
//! assert_eq!(query.sql, "$age $age");
//! assert_eq!(query.arg_count(), 1);
//!
//! let query = render(Dialect::MySql, "{age} {age}", &[param("age", 5)]).unwrap();
//! assert_eq!(query.sql, "? ?");
//! assert_eq!(query.arg_count(), 2);
//! ```

use indexmap::IndexMap;
use smallvec::smallvec;
use std::collections::HashMap;
use tracing::{debug, trace};

use crate::config::RenderConfig;
use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::fragment::{RenderOutput, RenderedQuery, SqlFragment};
use crate::memory::{GLOBAL_OUTPUT_POOL, OutputPool, OutputPoolStats};
use crate::value::{Arg, BindArg, NamedArg, Value};

/// Render a template against a value pool into `out`.
///
/// Each call scopes its own anonymous cursor and ordinal tracker; named
/// slots are tracked in `out.params` and so are shared with any other
/// template rendered into the same output.
pub fn write_template(
    dialect: Dialect,
    out: &mut RenderOutput,
    template: &str,
    values: &[Arg],
) -> QueryResult<()> {
    if !template.contains('{') {
        out.sql.push_str(template);
        return Ok(());
    }
    Substitution::new(dialect, values)?.write(out, template)
}

/// Per-render substitution state.
///
/// One `Substitution` may drive several [`write`](Self::write) passes over
/// pieces of the same template; the anonymous cursor and the ordinal
/// tracker carry over between passes, so numbering stays consistent when a
/// caller splices extra SQL between two halves of a template.
#[derive(Debug)]
pub struct Substitution<'v> {
    dialect: Dialect,
    values: &'v [Arg],
    names: IndexMap<&'v str, usize>,
    cursor: usize,
    ordinals: HashMap<usize, usize>,
}

impl<'v> Substitution<'v> {
    /// Prepare substitution over `values`.
    ///
    /// Fails if two named values share a name.
    pub fn new(dialect: Dialect, values: &'v [Arg]) -> QueryResult<Self> {
        let mut names = IndexMap::new();
        for (i, value) in values.iter().enumerate() {
            if let Some(name) = value.name() {
                if names.insert(name, i).is_some() {
                    return Err(QueryError::duplicate_name(name));
                }
            }
        }
        Ok(Self {
            dialect,
            values,
            names,
            cursor: 0,
            ordinals: HashMap::new(),
        })
    }

    /// The dialect being rendered.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Number of pool values consumed by anonymous placeholders so far.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Scan `template` and write it into `out`, substituting placeholders.
    pub fn write(&mut self, out: &mut RenderOutput, template: &str) -> QueryResult<()> {
        let mut rest = template;
        loop {
            let Some(open) = rest.find('{') else {
                out.sql.push_str(rest);
                return Ok(());
            };
            out.sql.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            if let Some(escaped) = after.strip_prefix('{') {
                out.sql.push('{');
                rest = escaped;
                continue;
            }

            let Some(close) = after.find('}') else {
                let offset = template.len() - rest.len() + open;
                return Err(QueryError::unterminated_placeholder(offset));
            };
            let body = &after[..close];
            if let Some(bad) = body.chars().find(|c| !(c.is_alphanumeric() || *c == '_')) {
                return Err(QueryError::invalid_placeholder_name(body, bad));
            }

            trace!(placeholder = body, "substituting placeholder");
            self.write_placeholder(out, body)?;
            rest = &after[close + 1..];
        }
    }

    fn write_placeholder(&mut self, out: &mut RenderOutput, body: &str) -> QueryResult<()> {
        if body.is_empty() {
            let index = self.cursor;
            let value = self
                .values
                .get(index)
                .ok_or_else(|| QueryError::too_few_values(self.values.len()))?;
            self.cursor += 1;
            return write_value(self.dialect, out, value)
                .map_err(|e| QueryError::nested(format_args!("value #{}", index + 1), e));
        }

        if body.bytes().all(|b| b.is_ascii_digit()) {
            let ordinal = body
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=self.values.len()).contains(n))
                .ok_or_else(|| QueryError::ordinal_out_of_bounds(body, self.values.len()))?;
            return self
                .write_ordinal(out, ordinal)
                .map_err(|e| QueryError::nested(format_args!("value #{}", ordinal), e));
        }

        let Some(&index) = self.names.get(body) else {
            let available: Vec<String> = self.names.keys().map(|n| n.to_string()).collect();
            return Err(QueryError::unknown_name(body, &available));
        };
        write_value(self.dialect, out, &self.values[index])
            .map_err(|e| QueryError::nested(format_args!("{{{}}}", body), e))
    }

    fn write_ordinal(&mut self, out: &mut RenderOutput, ordinal: usize) -> QueryResult<()> {
        let value = &self.values[ordinal - 1];
        if !(self.dialect.reuses_placeholders() && value.is_scalar()) {
            return write_value(self.dialect, out, value);
        }
        if let Some(&slot) = self.ordinals.get(&ordinal) {
            self.dialect.write_placeholder(&mut out.sql, slot + 1);
            return Ok(());
        }
        write_value(self.dialect, out, value)?;
        self.ordinals.insert(ordinal, out.args.len() - 1);
        Ok(())
    }
}

/// Render a single value into `out`.
///
/// Named values go through [`bind_named`], fragments render themselves,
/// lists expand element by element and scalars are appended as arguments.
pub fn write_value(dialect: Dialect, out: &mut RenderOutput, value: &Arg) -> QueryResult<()> {
    match value {
        Arg::Named(named) => bind_named(dialect, out, named),
        Arg::Fragment(fragment) => fragment.write_sql(dialect, out),
        Arg::List(items) => write_list(dialect, out, items),
        Arg::Valuer(valuer) => {
            let value = valuer.dialect_value(dialect)?;
            bind_positional(dialect, out, value);
            Ok(())
        }
        Arg::Value(value) => {
            bind_positional(dialect, out, value.clone());
            Ok(())
        }
    }
}

fn write_list(dialect: Dialect, out: &mut RenderOutput, items: &[Arg]) -> QueryResult<()> {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.sql.push_str(", ");
        }
        write_value(dialect, out, item)
            .map_err(|e| QueryError::nested(format_args!("element #{}", i + 1), e))?;
    }
    Ok(())
}

/// Append `value` as a fresh argument and write its placeholder.
#[inline]
pub fn bind_positional(dialect: Dialect, out: &mut RenderOutput, value: Value) {
    let slot = out.push_arg(BindArg { name: None, value });
    dialect.write_placeholder(&mut out.sql, slot);
}

/// Bind a named argument and write its placeholder.
///
/// | Dialect          | First reference              | Repeat reference          |
/// |------------------|------------------------------|---------------------------|
/// | SQLite           | named slot, `$name`          | same slot, `$name`        |
/// | PostgreSQL       | bare slot, `$N`              | same slot, `$N`           |
/// | SQL Server       | named slot, `@name`          | same slot, `@name`        |
/// | MySQL / generic  | bare slot, `?`               | new slot, `?`             |
///
/// A repeat reference on a reusing dialect points at the first slot and does
/// not resolve the value again. SQLite names that are all digits and SQL
/// Server names shaped like `p2` are rejected, since they would read back as
/// positional placeholders.
pub fn bind_named(dialect: Dialect, out: &mut RenderOutput, named: &NamedArg) -> QueryResult<()> {
    let name = &named.name;

    match dialect {
        Dialect::Sqlite | Dialect::SqlServer | Dialect::Postgres => {
            let placeholder = dialect.named_placeholder(name);
            let shadowing = placeholder
                .as_deref()
                .filter(|_| dialect.is_positional_name(name));
            if let Some(shadowing) = shadowing {
                return Err(QueryError::positional_name(name, shadowing));
            }
            let existing = out.params.get(name.as_str()).and_then(|s| s.first().copied());
            let slot = match existing {
                Some(slot) => slot,
                None => {
                    let keep_name = dialect != Dialect::Postgres;
                    let arg = BindArg {
                        name: keep_name.then(|| name.clone()),
                        value: named.value.resolve(dialect)?,
                    };
                    let slot = out.push_arg(arg) - 1;
                    out.params.insert(name.clone(), smallvec![slot]);
                    slot
                }
            };
            match placeholder {
                Some(placeholder) => out.sql.push_str(&placeholder),
                None => dialect.write_placeholder(&mut out.sql, slot + 1),
            }
        }
        Dialect::MySql | Dialect::Generic => {
            let value = named.value.resolve(dialect)?;
            let slot = out.push_arg(BindArg { name: None, value }) - 1;
            out.params.entry(name.clone()).or_default().push(slot);
            out.sql.push('?');
        }
    }
    Ok(())
}

/// Render a template with the global output pool.
pub fn render(dialect: Dialect, template: &str, values: &[Arg]) -> QueryResult<RenderedQuery> {
    render_in(&GLOBAL_OUTPUT_POOL, dialect, |out| {
        write_template(dialect, out, template, values)
    })
    .map_err(|e| e.with_sql(template))
}

/// Render a fragment with the global output pool.
pub fn render_fragment(dialect: Dialect, fragment: &dyn SqlFragment) -> QueryResult<RenderedQuery> {
    render_in(&GLOBAL_OUTPUT_POOL, dialect, |out| fragment.write_sql(dialect, out))
}

fn render_in(
    pool: &OutputPool,
    dialect: Dialect,
    write: impl FnOnce(&mut RenderOutput) -> QueryResult<()>,
) -> QueryResult<RenderedQuery> {
    let mut out = pool.get();
    write(&mut out)?;
    debug!(
        dialect = %dialect,
        sql_len = out.sql.len(),
        arg_count = out.args.len(),
        "rendered query"
    );
    Ok(RenderedQuery {
        dialect,
        sql: out.sql.clone(),
        args: std::mem::take(&mut out.args),
        params: std::mem::take(&mut out.params),
    })
}

/// A render handle bound to one dialect and its own output pool.
///
/// ```rust
/// use sqlweave_query::{Dialect, Renderer};
///
/// let renderer = Renderer::new(Dialect::Postgres);
/// let query = renderer.render("SELECT {}", &[1.into()]).unwrap();
/// assert_eq!(query.sql, "SELECT $1");
/// ```
#[derive(Debug)]
pub struct Renderer {
    dialect: Dialect,
    pool: OutputPool,
    log_queries: bool,
}

impl Renderer {
    /// Create a renderer with default pool settings.
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            pool: OutputPool::new(),
            log_queries: false,
        }
    }

    /// Create a renderer from configuration.
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            dialect: config.dialect,
            pool: OutputPool::with_capacity(config.buffer_capacity, config.max_pooled_capacity),
            log_queries: config.log_queries,
        }
    }

    /// The dialect this renderer targets.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Render a template.
    pub fn render(&self, template: &str, values: &[Arg]) -> QueryResult<RenderedQuery> {
        let query = render_in(&self.pool, self.dialect, |out| {
            write_template(self.dialect, out, template, values)
        })
        .map_err(|e| e.with_sql(template))?;
        self.log(&query);
        Ok(query)
    }

    /// Render a fragment.
    pub fn render_fragment(&self, fragment: &dyn SqlFragment) -> QueryResult<RenderedQuery> {
        let query = render_in(&self.pool, self.dialect, |out| {
            fragment.write_sql(self.dialect, out)
        })?;
        self.log(&query);
        Ok(query)
    }

    /// Statistics for this renderer's output pool.
    pub fn pool_stats(&self) -> OutputPoolStats {
        self.pool.stats()
    }

    fn log(&self, query: &RenderedQuery) {
        if !self.log_queries {
            return;
        }
        match query.interpolate() {
            Ok(sql) => debug!(dialect = %self.dialect, sql = %sql, "query"),
            Err(e) => debug!(dialect = %self.dialect, sql = %query.sql, error = %e, "query"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::value::{DialectValuer, JsonValue, NamedValue, UuidValue, param};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how often it is asked for a value.
    #[derive(Debug)]
    struct Counting(Arc<AtomicUsize>);

    impl DialectValuer for Counting {
        fn dialect_value(&self, _dialect: Dialect) -> QueryResult<Value> {
            Ok(Value::Int(self.0.fetch_add(1, Ordering::SeqCst) as i64))
        }
    }

    #[derive(Debug)]
    struct Unavailable;

    impl DialectValuer for Unavailable {
        fn dialect_value(&self, _dialect: Dialect) -> QueryResult<Value> {
            Err(QueryError::dialect_value("clock unavailable"))
        }
    }

    fn ints(values: &[i64]) -> Vec<Arg> {
        values.iter().map(|&v| Arg::from(v)).collect()
    }

    fn sql(dialect: Dialect, template: &str, values: &[Arg]) -> String {
        render(dialect, template, values).unwrap().sql
    }

    #[test]
    fn test_no_placeholders_fast_path() {
        let query = render(Dialect::Postgres, "SELECT 1", &[]).unwrap();
        assert_eq!(query.sql, "SELECT 1");
        assert!(query.args.is_empty());
    }

    #[test]
    fn test_escaped_brace() {
        for dialect in Dialect::ALL {
            let query = render(dialect, "{{", &[]).unwrap();
            assert_eq!(query.sql, "{");
            assert!(query.args.is_empty());
        }
        assert_eq!(sql(Dialect::Postgres, "'{{}' || {}", &ints(&[1])), "'{}' || $1");
    }

    #[test]
    fn test_anonymous_cursor() {
        for dialect in Dialect::ALL {
            let query = render(dialect, "{} {} {}", &ints(&[1, 2, 3])).unwrap();
            let values: Vec<_> = query.values().cloned().collect();
            assert_eq!(values, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        }
        let err = render(Dialect::Postgres, "{} {} {}", &ints(&[1, 2])).unwrap_err();
        assert_eq!(err.code, ErrorCode::TooFewValues);
    }

    #[test]
    fn test_anonymous_cursor_ignores_ordinals_and_names() {
        let values = vec![Arg::from(1), param("n", 9), Arg::from(2)];
        let query = render(Dialect::Postgres, "{} {3} {n} {} {}", &values).unwrap();
        // the second `{}` lands on the named value and reuses its slot
        assert_eq!(query.sql, "$1 $2 $3 $3 $4");
    }

    #[test]
    fn test_ordinal_out_of_bounds() {
        let err = render(Dialect::Sqlite, "{1} {2} {99}", &ints(&[1, 2, 3])).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrdinalOutOfBounds);
        assert!(err.message.contains("99"));

        let err = render(Dialect::Sqlite, "{0}", &ints(&[1])).unwrap_err();
        assert_eq!(err.code, ErrorCode::OrdinalOutOfBounds);
    }

    #[test]
    fn test_dialect_placeholder_shape() {
        let values = vec![Arg::from(5), Arg::from("x")];
        assert_eq!(sql(Dialect::MySql, "{} {}", &values), "? ?");
        assert_eq!(sql(Dialect::Generic, "{} {}", &values), "? ?");
        assert_eq!(sql(Dialect::Sqlite, "{} {}", &values), "$1 $2");
        assert_eq!(sql(Dialect::Postgres, "{} {}", &values), "$1 $2");
        assert_eq!(sql(Dialect::SqlServer, "{} {}", &values), "@p1 @p2");
        for dialect in Dialect::ALL {
            let query = render(dialect, "{} {}", &values).unwrap();
            let bound: Vec<_> = query.values().cloned().collect();
            assert_eq!(bound, vec![Value::Int(5), Value::String("x".into())]);
        }
    }

    #[test]
    fn test_named_reuse_sqlite() {
        let query = render(Dialect::Sqlite, "{age} {age}", &[param("age", 5)]).unwrap();
        assert_eq!(query.sql, "$age $age");
        assert_eq!(query.args, vec![BindArg::named("age", 5)]);
        assert_eq!(query.params["age"].as_slice(), &[0]);
    }

    #[test]
    fn test_named_reuse_sqlserver() {
        let query = render(Dialect::SqlServer, "{age} = {age}", &[param("age", 5)]).unwrap();
        assert_eq!(query.sql, "@age = @age");
        assert_eq!(query.args, vec![BindArg::named("age", 5)]);
    }

    #[test]
    fn test_named_mysql_binds_each_reference() {
        let query = render(Dialect::MySql, "{age} {age}", &[param("age", 5)]).unwrap();
        assert_eq!(query.sql, "? ?");
        assert_eq!(query.args, vec![BindArg::positional(5), BindArg::positional(5)]);
        assert_eq!(query.params["age"].as_slice(), &[0, 1]);
    }

    #[test]
    fn test_named_postgres_reuses_index() {
        let values = vec![Arg::from(1), param("a", 7)];
        let query = render(Dialect::Postgres, "{} {a} {a}", &values).unwrap();
        assert_eq!(query.sql, "$1 $2 $2");
        assert_eq!(query.args, vec![BindArg::positional(1), BindArg::positional(7)]);
        assert_eq!(query.params["a"].as_slice(), &[1]);
    }

    #[test]
    fn test_unknown_name_lists_available() {
        let values = vec![param("id", 1), param("name", "x")];
        let err = render(Dialect::Postgres, "{age}", &values).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnknownName);
        assert!(err.message.contains("id, name"));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let values = vec![param("id", 1), param("id", 2)];
        let err = render(Dialect::Postgres, "{id}", &values).unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateName);
    }

    #[test]
    fn test_ordinal_dedup() {
        let values = ints(&[10, 20]);
        let query = render(Dialect::Postgres, "{2} {1} {2}", &values).unwrap();
        assert_eq!(query.sql, "$1 $2 $1");
        assert_eq!(query.arg_count(), 2);

        let query = render(Dialect::SqlServer, "{1} {1}", &values).unwrap();
        assert_eq!(query.sql, "@p1 @p1");
        assert_eq!(query.arg_count(), 1);
    }

    #[test]
    fn test_ordinal_no_dedup_on_mysql() {
        let query = render(Dialect::MySql, "{1} {1} {1}", &ints(&[10])).unwrap();
        assert_eq!(query.sql, "? ? ?");
        assert_eq!(query.arg_count(), 3);
    }

    #[test]
    fn test_list_expansion() {
        let values = vec![Arg::from(vec![1, 2, 3])];
        let query = render(Dialect::MySql, "{}", &values).unwrap();
        assert_eq!(query.sql, "?, ?, ?");
        assert_eq!(query.arg_count(), 3);
        assert_eq!(sql(Dialect::Postgres, "IN ({})", &values), "IN ($1, $2, $3)");
    }

    #[test]
    fn test_bytes_are_not_expanded() {
        let values = vec![Arg::from(vec![1u8, 2, 3])];
        let query = render(Dialect::MySql, "{}", &values).unwrap();
        assert_eq!(query.sql, "?");
        assert_eq!(query.args, vec![BindArg::positional(vec![1u8, 2, 3])]);
    }

    #[test]
    fn test_ordinal_list_is_not_deduplicated() {
        let values = vec![Arg::from(vec![1, 2])];
        let query = render(Dialect::Postgres, "{1} {1}", &values).unwrap();
        assert_eq!(query.sql, "$1, $2 $3, $4");
    }

    #[test]
    fn test_valuer_resolved_per_dialect() {
        let values = vec![Arg::from(UuidValue(uuid::Uuid::nil()))];
        let pg = render(Dialect::Postgres, "{}", &values).unwrap();
        assert!(matches!(pg.args[0].value, Value::String(_)));
        let my = render(Dialect::MySql, "{}", &values).unwrap();
        assert!(matches!(my.args[0].value, Value::Bytes(_)));
    }

    #[test]
    fn test_invalid_placeholder_name() {
        let err = render(Dialect::Postgres, "{a-b}", &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPlaceholderName);
        let err = render(Dialect::Postgres, "{ }", &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidPlaceholderName);
    }

    #[test]
    fn test_unterminated_placeholder() {
        let err = render(Dialect::Postgres, "SELECT {abc", &[]).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnterminatedPlaceholder);
        assert_eq!(err.context.sql.as_deref(), Some("SELECT {abc"));
    }

    #[test]
    fn test_substitution_shares_state_across_passes() {
        let values = ints(&[1, 2, 3]);
        let mut out = RenderOutput::new();
        let mut subst = Substitution::new(Dialect::Postgres, &values).unwrap();
        subst.write(&mut out, "SELECT {}, {1}").unwrap();
        out.sql.push_str(" /* spliced */ ");
        subst.write(&mut out, "{}, {1}").unwrap();
        assert_eq!(out.sql, "SELECT $1, $2 /* spliced */ $3, $2");
        assert_eq!(subst.cursor(), 2);
    }

    #[test]
    fn test_renderer_uses_own_pool() {
        let renderer = Renderer::new(Dialect::SqlServer);
        renderer.render("SELECT {}", &ints(&[1])).unwrap();
        renderer.render("SELECT {}", &ints(&[1])).unwrap();
        let stats = renderer.pool_stats();
        assert_eq!(stats.created, 1);
        assert_eq!(stats.available, 1);
    }

    #[test]
    fn test_named_valuer_resolved_per_dialect() {
        let id = uuid::Uuid::nil();
        let values = vec![param("id", UuidValue(id))];

        let query = render(Dialect::Postgres, "id = {id}", &values).unwrap();
        assert_eq!(query.sql, "id = $1");
        assert_eq!(query.args, vec![BindArg::positional(id.to_string())]);

        let query = render(Dialect::Sqlite, "id = {id}", &values).unwrap();
        assert_eq!(query.sql, "id = $id");
        assert_eq!(query.args, vec![BindArg::named("id", vec![0u8; 16])]);

        let query = render(Dialect::SqlServer, "id = {id}", &values).unwrap();
        assert_eq!(query.sql, "id = @id");
        assert_eq!(query.args, vec![BindArg::named("id", vec![0u8; 16])]);

        let query = render(Dialect::MySql, "id = {id}", &values).unwrap();
        assert_eq!(query.args, vec![BindArg::positional(vec![0u8; 16])]);
    }

    #[test]
    fn test_json_value_through_template() {
        let doc = serde_json::json!({"a": 1});
        let values = vec![Arg::from(JsonValue(doc.clone())), param("meta", JsonValue(vec![1, 2]))];

        let query = render(Dialect::Postgres, "{} {meta}", &values).unwrap();
        assert_eq!(
            query.args,
            vec![
                BindArg::positional(Value::Json(doc)),
                BindArg::positional(Value::Json(serde_json::json!([1, 2]))),
            ]
        );

        let query = render(Dialect::MySql, "{} {meta}", &values).unwrap();
        assert_eq!(
            query.args,
            vec![BindArg::positional(r#"{"a":1}"#), BindArg::positional("[1,2]")]
        );
    }

    #[test]
    fn test_failing_valuer_is_wrapped() {
        let err = render(Dialect::MySql, "SELECT {}", &[Arg::valuer(Unavailable)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::DialectValue);
        assert!(err.message.starts_with("value #1: "), "{}", err.message);
        assert!(err.message.ends_with("clock unavailable"), "{}", err.message);

        let values = vec![param("at", NamedValue::Valuer(Arc::new(Unavailable)))];
        let err = render(Dialect::Sqlite, "SELECT {at}", &values).unwrap_err();
        assert_eq!(err.code, ErrorCode::DialectValue);
        assert!(err.message.starts_with("{at}: "), "{}", err.message);
    }

    #[test]
    fn test_repeated_name_resolves_valuer_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let values = vec![param("n", NamedValue::Valuer(Arc::new(Counting(calls.clone()))))];

        for dialect in [Dialect::Sqlite, Dialect::Postgres, Dialect::SqlServer] {
            calls.store(0, Ordering::SeqCst);
            let query = render(dialect, "{n} {n} {n}", &values).unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 1, "{:?}", dialect);
            assert_eq!(query.arg_count(), 1);
        }

        calls.store(0, Ordering::SeqCst);
        let query = render(Dialect::MySql, "{n} {n}", &values).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let bound: Vec<_> = query.values().cloned().collect();
        assert_eq!(bound, vec![Value::Int(0), Value::Int(1)]);
    }

    #[test]
    fn test_names_shaped_like_positions_are_rejected() {
        let err = render(Dialect::SqlServer, "a = {p2}", &[param("p2", 9)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::PositionalName);
        assert!(err.message.contains("@p2"), "{}", err.message);

        let values = vec![Arg::from(5), param("P1", 9)];
        let err = render(Dialect::SqlServer, "a = {} AND b = {P1}", &values).unwrap_err();
        assert_eq!(err.code, ErrorCode::PositionalName);

        let err = render(Dialect::Sqlite, "a = {}", &[param("7", 9)]).unwrap_err();
        assert_eq!(err.code, ErrorCode::PositionalName);
        assert!(err.message.starts_with("value #1: "), "{}", err.message);

        // only the dialect that spells the name positionally objects
        assert_eq!(sql(Dialect::Sqlite, "{p2}", &[param("p2", 9)]), "$p2");
        assert_eq!(sql(Dialect::SqlServer, "{p}", &[param("p", 9)]), "@p");
        assert_eq!(sql(Dialect::SqlServer, "{p2x}", &[param("p2x", 9)]), "@p2x");
        assert_eq!(sql(Dialect::Postgres, "{p2}", &[param("p2", 9)]), "$1");
        assert_eq!(sql(Dialect::MySql, "{p2}", &[param("p2", 9)]), "?");
    }
}
