//! Fuzz target for query interpolation.
//!
//! Feeds arbitrary query text and arguments to the interpolator, which
//! must return an error rather than panic on unbalanced quotes, stray
//! parameter markers or huge ordinals.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_interpolate
//! ```

#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use sqlweave_query::{BindArg, Dialect, Value, interpolate};

/// A fuzzable argument.
#[derive(Debug, Arbitrary)]
struct FuzzArg {
    name: Option<String>,
    value: FuzzValue,
}

#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl From<FuzzArg> for BindArg {
    fn from(arg: FuzzArg) -> Self {
        let value = match arg.value {
            FuzzValue::Null => Value::Null,
            FuzzValue::Bool(b) => Value::Bool(b),
            FuzzValue::Int(i) => Value::Int(i),
            FuzzValue::Float(f) => Value::Float(f),
            FuzzValue::String(s) => Value::String(s),
            FuzzValue::Bytes(b) => Value::Bytes(b),
        };
        match arg.name {
            Some(name) => BindArg::named(name, value),
            None => BindArg::positional(value),
        }
    }
}

#[derive(Debug, Arbitrary)]
struct FuzzInterpolate {
    dialect: u8,
    query: String,
    args: Vec<FuzzArg>,
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);

    if let Ok(input) = FuzzInterpolate::arbitrary(&mut unstructured) {
        let dialect = Dialect::ALL[input.dialect as usize % Dialect::ALL.len()];
        let args: Vec<BindArg> = input.args.into_iter().map(Into::into).collect();

        // Interpolation should never panic, only return errors
        let _ = interpolate(dialect, &input.query, &args);
    }
});
