//! Fuzz target for template substitution.
//!
//! Renders arbitrary templates against an arbitrary value pool. Rendering
//! may fail but must never panic, and a successful render must interpolate.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_render_template
//! ```

#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use sqlweave_query::{Arg, Dialect, Value, param, render};

/// A dialect for fuzzing.
#[derive(Debug, Arbitrary)]
enum FuzzDialect {
    Generic,
    Sqlite,
    Postgres,
    MySql,
    SqlServer,
}

impl From<FuzzDialect> for Dialect {
    fn from(val: FuzzDialect) -> Self {
        match val {
            FuzzDialect::Generic => Dialect::Generic,
            FuzzDialect::Sqlite => Dialect::Sqlite,
            FuzzDialect::Postgres => Dialect::Postgres,
            FuzzDialect::MySql => Dialect::MySql,
            FuzzDialect::SqlServer => Dialect::SqlServer,
        }
    }
}

/// A fuzzable pool value.
#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    List(Vec<i64>),
    Named(String, i64),
    Template(String, Vec<i64>),
}

impl From<FuzzValue> for Arg {
    fn from(val: FuzzValue) -> Self {
        match val {
            FuzzValue::Null => Value::Null.into(),
            FuzzValue::Bool(b) => b.into(),
            FuzzValue::Int(i) => i.into(),
            FuzzValue::Float(f) => f.into(),
            FuzzValue::String(s) => s.into(),
            FuzzValue::Bytes(b) => b.into(),
            FuzzValue::List(items) => items.into(),
            FuzzValue::Named(name, v) => param(name, v),
            FuzzValue::Template(format, values) => sqlweave_query::expr(format, values).into(),
        }
    }
}

/// A fuzzing session for the renderer.
#[derive(Debug, Arbitrary)]
struct FuzzRender {
    dialect: FuzzDialect,
    template: String,
    values: Vec<FuzzValue>,
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);

    if let Ok(input) = FuzzRender::arbitrary(&mut unstructured) {
        let dialect: Dialect = input.dialect.into();
        let values: Vec<Arg> = input.values.into_iter().map(Into::into).collect();

        // Render should never panic
        if let Ok(query) = render(dialect, &input.template, &values) {
            // Every placeholder index must point at a bound argument
            for slots in query.params.values() {
                for &slot in slots {
                    assert!(slot < query.args.len());
                }
            }
            let _ = query.interpolate();
        }
    }
});
