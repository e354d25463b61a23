//! Inline bound arguments into SQL text for display.
//!
//! The output is meant for logs and error reports. It is an approximation of
//! what the database executes and must never be sent to a database.
//!
//! The scanner tracks quoted literals (`'...'`, `"..."`, MySQL backticks and
//! SQL Server brackets) so placeholder-looking text inside them is left alone:
//!
//! ```rust
//! use sqlweave_query::{BindArg, Dialect, interpolate::interpolate};
//!
//! let sql = interpolate(
//!     Dialect::Postgres,
//!     "SELECT '$1', $1 WHERE name = $2",
//!     &[BindArg::positional(7), BindArg::positional("O'Brien")],
//! )
//! .unwrap();
//! assert_eq!(sql, "SELECT '$1', 7 WHERE name = 'O''Brien'");
//! ```

use std::fmt::Write;
use std::iter::Peekable;
use std::str::CharIndices;
use tracing::debug;

use crate::dialect::Dialect;
use crate::error::{QueryError, QueryResult};
use crate::value::{BindArg, Value};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Replace every parameter in `query` with the literal form of its argument.
pub fn interpolate(dialect: Dialect, query: &str, args: &[BindArg]) -> QueryResult<String> {
    let mut scanner = Scanner {
        dialect,
        args,
        chars: query.char_indices().peekable(),
        query,
        out: String::with_capacity(query.len() + args.len() * 8),
        next_sequential: 0,
    };
    scanner.run()?;
    debug!(
        dialect = %dialect,
        sql_len = scanner.out.len(),
        arg_count = args.len(),
        "interpolated query"
    );
    Ok(scanner.out)
}

/// A parsed parameter reference.
enum ParamRef<'q> {
    /// 1-based position.
    Ordinal(usize),
    /// Named slot.
    Name(&'q str),
    /// Bare `?`: the next argument not yet claimed by another bare `?`.
    Sequential,
}

struct Scanner<'q, 'a> {
    dialect: Dialect,
    args: &'a [BindArg],
    chars: Peekable<CharIndices<'q>>,
    query: &'q str,
    out: String,
    next_sequential: usize,
}

impl<'q, 'a> Scanner<'q, 'a> {
    fn run(&mut self) -> QueryResult<()> {
        while let Some((start, c)) = self.chars.next() {
            if let Some(close) = self.literal_close(c) {
                self.out.push(c);
                self.copy_literal(c, close)?;
                continue;
            }
            if let Some((token, param)) = self.param_ref(start, c) {
                let value = self.resolve(token, param)?;
                write_literal(self.dialect, &mut self.out, value)?;
            }
        }
        Ok(())
    }

    fn literal_close(&self, c: char) -> Option<char> {
        match c {
            '\'' | '"' => Some(c),
            '`' if self.dialect == Dialect::MySql => Some('`'),
            '[' if self.dialect == Dialect::SqlServer => Some(']'),
            _ => None,
        }
    }

    fn copy_literal(&mut self, open: char, close: char) -> QueryResult<()> {
        while let Some((_, c)) = self.chars.next() {
            self.out.push(c);
            if c != close {
                continue;
            }
            match self.chars.peek() {
                Some(&(_, next)) if next == close => {
                    self.out.push(next);
                    self.chars.next();
                }
                _ => return Ok(()),
            }
        }
        Err(QueryError::unclosed_literal(open))
    }

    /// Consume characters matching `keep`, returning the end byte offset.
    fn take_while(&mut self, from: usize, keep: impl Fn(char) -> bool) -> usize {
        let mut end = from;
        while let Some(&(i, c)) = self.chars.peek() {
            if !keep(c) {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        end
    }

    /// Recognize a parameter starting at `c`, consuming its token.
    ///
    /// Anything that is not a parameter is copied to the output as is.
    fn param_ref(&mut self, start: usize, c: char) -> Option<(&'q str, ParamRef<'q>)> {
        let query = self.query;
        let dialect = self.dialect;
        let word_start = start + c.len_utf8();
        let next = self.chars.peek().map(|&(_, ch)| ch);
        let starts_digit = next.is_some_and(|ch| ch.is_ascii_digit());
        let starts_word = next.is_some_and(is_word_char);
        let after_word = query[..start].chars().next_back().is_some_and(is_word_char);

        match (dialect, c) {
            (Dialect::Postgres, '?') => {
                self.out.push(c);
                None
            }
            // `foo$1` and `a@b` are part of an identifier
            (_, '$' | ':' | '@') if after_word => {
                self.out.push(c);
                None
            }
            (Dialect::Sqlite, '?') | (Dialect::Postgres, '$') if starts_digit => {
                let end = self.take_while(word_start, |ch| ch.is_ascii_digit());
                Some((&query[start..end], parse_ordinal(&query[word_start..end])?))
            }
            (_, '?') => Some((&query[start..word_start], ParamRef::Sequential)),
            (Dialect::SqlServer, '@') if next == Some('@') => {
                // `@@ROWCOUNT` and friends are system functions
                let end = self.take_while(word_start, |ch| ch == '@' || is_word_char(ch));
                self.out.push_str(&query[start..end]);
                None
            }
            (Dialect::Sqlite, '$' | ':' | '@') | (Dialect::SqlServer, '@') if starts_word => {
                let end = self.take_while(word_start, is_word_char);
                let word = &query[word_start..end];
                let ordinal = match dialect {
                    _ if self.args.iter().any(|a| a.name.as_deref() == Some(word)) => None,
                    Dialect::SqlServer => word.strip_prefix('p').and_then(parse_ordinal),
                    _ => parse_ordinal(word),
                };
                Some((&query[start..end], ordinal.unwrap_or(ParamRef::Name(word))))
            }
            _ => {
                self.out.push(c);
                None
            }
        }
    }

    fn resolve(&mut self, token: &str, param: ParamRef<'_>) -> QueryResult<&'a Value> {
        let found = match param {
            ParamRef::Ordinal(n) => n.checked_sub(1).and_then(|i| self.args.get(i)),
            ParamRef::Name(name) => self.args.iter().find(|a| a.name.as_deref() == Some(name)),
            ParamRef::Sequential => {
                let arg = self.args.get(self.next_sequential);
                self.next_sequential += 1;
                arg
            }
        };
        found
            .map(|a| &a.value)
            .ok_or_else(|| QueryError::missing_argument(token, self.args.len()))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn parse_ordinal(word: &str) -> Option<ParamRef<'_>> {
    if word.is_empty() || !word.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // an ordinal too large to parse never matches an argument
    Some(ParamRef::Ordinal(word.parse().unwrap_or(0)))
}

/// Render a value as a SQL literal.
///
/// ```rust
/// use sqlweave_query::{Dialect, Value, interpolate::literal};
///
/// assert_eq!(literal(Dialect::SqlServer, &Value::Bool(true)).unwrap(), "1");
/// assert_eq!(literal(Dialect::Postgres, &Value::Bytes(vec![0xde, 0xad])).unwrap(), "'\\xdead'");
/// assert_eq!(
///     literal(Dialect::MySql, &Value::String("a\nb".into())).unwrap(),
///     "CONCAT('a', CHAR(10), 'b')"
/// );
/// ```
pub fn literal(dialect: Dialect, value: &Value) -> QueryResult<String> {
    let mut buf = String::new();
    write_literal(dialect, &mut buf, value)?;
    Ok(buf)
}

/// Append the literal form of `value` to `buf`.
pub fn write_literal(dialect: Dialect, buf: &mut String, value: &Value) -> QueryResult<()> {
    match value {
        Value::Null => buf.push_str("NULL"),
        Value::Bool(b) => buf.push_str(match (dialect, b) {
            (Dialect::SqlServer, true) => "1",
            (Dialect::SqlServer, false) => "0",
            (_, true) => "TRUE",
            (_, false) => "FALSE",
        }),
        Value::Int(i) => {
            let _ = write!(buf, "{}", i);
        }
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(QueryError::no_literal(f));
            }
            let _ = write!(buf, "{}", f);
        }
        Value::String(s) => write_string(dialect, buf, s),
        Value::Bytes(bytes) => write_bytes(dialect, buf, bytes),
        Value::Timestamp(ts) => {
            let _ = write!(buf, "'{}'", ts.format(TIMESTAMP_FORMAT));
        }
        Value::TimestampTz(ts) => {
            let _ = write!(buf, "'{}+00:00'", ts.naive_utc().format(TIMESTAMP_FORMAT));
        }
        Value::Json(json) => write_string(dialect, buf, &json.to_string()),
    }
    Ok(())
}

fn write_bytes(dialect: Dialect, buf: &mut String, bytes: &[u8]) {
    let (open, close) = match dialect {
        Dialect::Postgres => ("'\\x", "'"),
        Dialect::SqlServer => ("0x", ""),
        _ => ("x'", "'"),
    };
    buf.push_str(open);
    for b in bytes {
        let _ = write!(buf, "{:02x}", b);
    }
    buf.push_str(close);
}

/// Quote a string, splitting line breaks into concatenated char codes.
fn write_string(dialect: Dialect, buf: &mut String, s: &str) {
    if !s.contains(['\n', '\r']) {
        push_quoted(buf, s);
        return;
    }

    let mut parts: Vec<String> = Vec::new();
    for piece in s.split_inclusive(['\n', '\r']) {
        let (text, brk) = match piece.chars().last() {
            Some(c @ ('\n' | '\r')) => (&piece[..piece.len() - 1], Some(c as u32)),
            _ => (piece, None),
        };
        if !text.is_empty() {
            let mut quoted = String::with_capacity(text.len() + 2);
            push_quoted(&mut quoted, text);
            parts.push(quoted);
        }
        if let Some(code) = brk {
            parts.push(match dialect {
                Dialect::Postgres => format!("chr({})", code),
                Dialect::MySql | Dialect::SqlServer => format!("CHAR({})", code),
                Dialect::Sqlite | Dialect::Generic => format!("char({})", code),
            });
        }
    }

    match dialect {
        Dialect::MySql => {
            buf.push_str("CONCAT(");
            buf.push_str(&parts.join(", "));
            buf.push(')');
        }
        Dialect::SqlServer => buf.push_str(&parts.join(" + ")),
        _ => buf.push_str(&parts.join(" || ")),
    }
}

fn push_quoted(buf: &mut String, s: &str) {
    buf.push('\'');
    for c in s.chars() {
        if c == '\'' {
            buf.push('\'');
        }
        buf.push(c);
    }
    buf.push('\'');
}
