//! SQL dialects, placeholder syntax and identifier quoting.
//!
//! | Dialect    | Anonymous | Reusable numbered | Reusable named | Identifier |
//! |------------|-----------|-------------------|----------------|------------|
//! | Generic    | `?`       | -                 | -              | `"id"`     |
//! | SQLite     | `$1`      | `$1`              | `$name`        | `"id"`     |
//! | PostgreSQL | `$1`      | `$1`              | -              | `"id"`     |
//! | MySQL      | `?`       | -                 | -              | `` `id` `` |
//! | SQL Server | `@p1`     | `@p1`             | `@name`        | `[id]`     |
//!
//! ```rust
//! use sqlweave_query::Dialect;
//!
//! assert_eq!(Dialect::Postgres.placeholder(3), "$3");
//! assert_eq!(Dialect::SqlServer.placeholder(1), "@p1");
//! assert_eq!(Dialect::MySql.placeholder(7), "?");
//! assert_eq!("postgresql".parse::<Dialect>().unwrap(), Dialect::Postgres);
//! ```

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

/// A SQL dialect.
///
/// `Generic` is the unspecified dialect: it uses MySQL-style `?`
/// placeholders and ANSI double-quoted identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// No particular database.
    #[default]
    Generic,
    /// SQLite.
    Sqlite,
    /// PostgreSQL.
    Postgres,
    /// MySQL and MariaDB.
    #[serde(rename = "mysql")]
    MySql,
    /// Microsoft SQL Server.
    #[serde(rename = "sqlserver")]
    SqlServer,
}

impl Dialect {
    /// Every dialect, generic first.
    pub const ALL: [Dialect; 5] = [
        Self::Generic,
        Self::Sqlite,
        Self::Postgres,
        Self::MySql,
        Self::SqlServer,
    ];

    /// The canonical name of the dialect (empty for `Generic`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "",
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::SqlServer => "sqlserver",
        }
    }

    /// Get the positional placeholder for a 1-based argument slot.
    #[inline]
    pub fn placeholder(&self, index: usize) -> Cow<'static, str> {
        match self {
            Self::Sqlite | Self::Postgres => Cow::Owned(format!("${}", index)),
            Self::SqlServer => Cow::Owned(format!("@p{}", index)),
            Self::MySql | Self::Generic => Cow::Borrowed("?"),
        }
    }

    /// Write the positional placeholder for a 1-based slot into `buf`.
    #[inline]
    pub fn write_placeholder(&self, buf: &mut String, index: usize) {
        use std::fmt::Write;
        let _ = match self {
            Self::Sqlite | Self::Postgres => write!(buf, "${}", index),
            Self::SqlServer => write!(buf, "@p{}", index),
            Self::MySql | Self::Generic => {
                buf.push('?');
                Ok(())
            }
        };
    }

    /// Whether a numbered placeholder can be referenced more than once.
    ///
    /// MySQL and the generic dialect only have `?`, so every reference
    /// needs its own argument.
    #[inline]
    pub fn reuses_placeholders(&self) -> bool {
        matches!(self, Self::Sqlite | Self::Postgres | Self::SqlServer)
    }

    /// Named placeholder syntax, for dialects whose drivers bind by name.
    pub fn named_placeholder(&self, name: &str) -> Option<String> {
        match self {
            Self::Sqlite => Some(format!("${}", name)),
            Self::SqlServer => Some(format!("@{}", name)),
            _ => None,
        }
    }

    /// Whether `name` spelled as a named placeholder reads back as a
    /// positional one (`@p2` on SQL Server, `$2` on SQLite).
    pub fn is_positional_name(&self, name: &str) -> bool {
        let digits = match self {
            Self::SqlServer => match name.strip_prefix(['p', 'P']) {
                Some(rest) => rest,
                None => return false,
            },
            Self::Sqlite => name,
            _ => return false,
        };
        !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
    }

    /// Opening and closing identifier quote characters.
    #[inline]
    pub fn identifier_quotes(&self) -> (char, char) {
        match self {
            Self::MySql => ('`', '`'),
            Self::SqlServer => ('[', ']'),
            _ => ('"', '"'),
        }
    }

    /// Quote an identifier, doubling any embedded closing quote.
    pub fn quote_identifier(&self, name: &str) -> String {
        let (open, close) = self.identifier_quotes();
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(open);
        for c in name.chars() {
            if c == close {
                quoted.push(close);
            }
            quoted.push(c);
        }
        quoted.push(close);
        quoted
    }

    /// Quote an identifier only when it is reserved or contains special characters.
    pub fn quote_identifier_if_needed<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if needs_quoting(name) {
            Cow::Owned(self.quote_identifier(name))
        } else {
            Cow::Borrowed(name)
        }
    }

    /// Strip one layer of identifier quoting.
    ///
    /// Returns the input unchanged when it is not wrapped in this
    /// dialect's quotes.
    pub fn unquote_identifier<'a>(&self, quoted: &'a str) -> Cow<'a, str> {
        let (open, close) = self.identifier_quotes();
        let inner = quoted
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close));
        let Some(inner) = inner else {
            return Cow::Borrowed(quoted);
        };

        let doubled_close: String = [close, close].iter().collect();
        if inner.contains(doubled_close.as_str()) {
            Cow::Owned(inner.replace(doubled_close.as_str(), close.encode_utf8(&mut [0u8; 4])))
        } else {
            Cow::Borrowed(inner)
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Generic => f.write_str("generic"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for Dialect {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "generic" => Ok(Self::Generic),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            _ => Err(QueryError::invalid_dialect(s)),
        }
    }
}

const RESERVED: &[&str] = &[
    "all", "alter", "and", "as", "between", "by", "case", "check", "create", "cross",
    "default", "delete", "distinct", "drop", "else", "end", "except", "exists", "foreign",
    "from", "full", "group", "having", "in", "index", "inner", "insert", "intersect", "into",
    "is", "join", "key", "left", "like", "limit", "natural", "not", "null", "offset", "on",
    "or", "order", "outer", "over", "primary", "references", "returning", "right", "select",
    "set", "table", "then", "union", "unique", "update", "user", "using", "values", "when",
    "where", "window", "with",
];

/// Check if an identifier needs quoting.
///
/// Reserved keywords, names with characters outside `[A-Za-z0-9_]`, names
/// starting with a digit and the empty name all need quoting.
pub fn needs_quoting(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return true;
    };
    if first.is_ascii_digit() {
        return true;
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return true;
    }
    RESERVED.contains(&name.to_ascii_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(Dialect::Postgres.placeholder(1), "$1");
        assert_eq!(Dialect::Sqlite.placeholder(5), "$5");
        assert_eq!(Dialect::SqlServer.placeholder(2), "@p2");
        assert_eq!(Dialect::MySql.placeholder(1), "?");
        assert_eq!(Dialect::Generic.placeholder(9), "?");
    }

    #[test]
    fn test_write_placeholder_matches_placeholder() {
        for dialect in Dialect::ALL {
            let mut buf = String::new();
            dialect.write_placeholder(&mut buf, 12);
            assert_eq!(buf, dialect.placeholder(12));
        }
    }

    #[test]
    fn test_named_placeholder() {
        assert_eq!(Dialect::Sqlite.named_placeholder("age").as_deref(), Some("$age"));
        assert_eq!(Dialect::SqlServer.named_placeholder("age").as_deref(), Some("@age"));
        assert_eq!(Dialect::Postgres.named_placeholder("age"), None);
        assert_eq!(Dialect::MySql.named_placeholder("age"), None);
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(Dialect::Postgres.quote_identifier("user"), "\"user\"");
        assert_eq!(Dialect::Postgres.quote_identifier("has\"quote"), "\"has\"\"quote\"");
        assert_eq!(Dialect::MySql.quote_identifier("a`b"), "`a``b`");
        assert_eq!(Dialect::SqlServer.quote_identifier("a]b"), "[a]]b]");
    }

    #[test]
    fn test_quote_identifier_if_needed() {
        assert_eq!(Dialect::Postgres.quote_identifier_if_needed("users"), "users");
        assert_eq!(Dialect::Postgres.quote_identifier_if_needed("order"), "\"order\"");
        assert_eq!(Dialect::MySql.quote_identifier_if_needed("has space"), "`has space`");
        assert_eq!(Dialect::SqlServer.quote_identifier_if_needed("1st"), "[1st]");
    }

    #[test]
    fn test_unquote_identifier() {
        assert_eq!(Dialect::Postgres.unquote_identifier("\"a\"\"b\""), "a\"b");
        assert_eq!(Dialect::SqlServer.unquote_identifier("[a]]b]"), "a]b");
        assert_eq!(Dialect::MySql.unquote_identifier("plain"), "plain");
    }

    #[test]
    fn test_quote_twice_unquote_once() {
        for dialect in Dialect::ALL {
            for name in ["user", "a\"b", "x`y", "p]q", "plain"] {
                let once = dialect.quote_identifier(name);
                let twice = dialect.quote_identifier(&once);
                assert_eq!(dialect.unquote_identifier(&twice), once, "{dialect} {name}");
                assert_eq!(dialect.unquote_identifier(&once), name, "{dialect} {name}");
            }
        }
    }

    #[test]
    fn test_needs_quoting() {
        assert!(needs_quoting("user"));
        assert!(needs_quoting("ORDER"));
        assert!(needs_quoting("has space"));
        assert!(needs_quoting(""));
        assert!(!needs_quoting("my_table"));
        assert!(!needs_quoting("users"));
    }

    #[test]
    fn test_parse_dialect() {
        assert_eq!("sqlite3".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert_eq!("PG".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("mariadb".parse::<Dialect>().unwrap(), Dialect::MySql);
        assert_eq!("mssql".parse::<Dialect>().unwrap(), Dialect::SqlServer);
        assert_eq!("".parse::<Dialect>().unwrap(), Dialect::Generic);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_reuses_placeholders() {
        assert!(Dialect::Postgres.reuses_placeholders());
        assert!(Dialect::SqlServer.reuses_placeholders());
        assert!(!Dialect::MySql.reuses_placeholders());
        assert!(!Dialect::Generic.reuses_placeholders());
    }

    #[test]
    fn test_is_positional_name() {
        assert!(Dialect::SqlServer.is_positional_name("p2"));
        assert!(Dialect::SqlServer.is_positional_name("P10"));
        assert!(!Dialect::SqlServer.is_positional_name("p"));
        assert!(!Dialect::SqlServer.is_positional_name("p2x"));
        assert!(!Dialect::SqlServer.is_positional_name("2"));
        assert!(Dialect::Sqlite.is_positional_name("7"));
        assert!(!Dialect::Sqlite.is_positional_name("p2"));
        assert!(!Dialect::Postgres.is_positional_name("1"));
        assert!(!Dialect::MySql.is_positional_name("p1"));
    }
}
