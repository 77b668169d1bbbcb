//! Type conversion handler trait and the built-in scalar handlers.

use super::value::{Value, type_names};
use crate::common::{Error, Result};
use std::fmt::Debug;

/// Bidirectional converter between a column's wire text and a typed [`Value`].
///
/// Handlers are stateless and shared between registries.
pub trait TypeConversionHandler: Send + Sync + Debug {
    /// Every type name this handler answers to.
    fn type_names(&self) -> &[&'static str];

    /// Parse wire text into a value.
    fn parse(&self, text: &str) -> Result<Value>;

    /// Render a value as wire text.
    fn format(&self, value: &Value) -> String {
        value.to_string()
    }
}

/// Booleans: `true/false`, `yes/no`, `on/off`, `1/0`, case-insensitive.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoolHandler;

impl TypeConversionHandler for BoolHandler {
    fn type_names(&self) -> &[&'static str] {
        &[type_names::BOOL, "boolean"]
    }

    fn parse(&self, text: &str) -> Result<Value> {
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            _ => Err(Error::conversion(type_names::BOOL, text, "not a boolean")),
        }
    }
}

/// Single characters. Surrounding whitespace is not trimmed.
#[derive(Debug, Default, Clone, Copy)]
pub struct CharHandler;

impl TypeConversionHandler for CharHandler {
    fn type_names(&self) -> &[&'static str] {
        &[type_names::CHAR, "character"]
    }

    fn parse(&self, text: &str) -> Result<Value> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Value::Char(c)),
            _ => Err(Error::conversion(
                type_names::CHAR,
                text,
                "expected exactly one character",
            )),
        }
    }
}

macro_rules! numeric_handler {
    ($(#[$meta:meta])* $name:ident, $ty:ty, $variant:ident, [$($alias:expr),+]) => {
        $(#[$meta])*
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl TypeConversionHandler for $name {
            fn type_names(&self) -> &[&'static str] {
                &[$($alias),+]
            }

            fn parse(&self, text: &str) -> Result<Value> {
                text.trim()
                    .parse::<$ty>()
                    .map(Value::$variant)
                    .map_err(|e| Error::conversion(self.type_names()[0], text, e))
            }
        }
    };
}

numeric_handler!(
    /// 8-bit signed integers.
    ByteHandler, i8, Byte, [type_names::BYTE, "byte"]
);
numeric_handler!(
    /// 16-bit signed integers.
    ShortHandler, i16, Short, [type_names::SHORT, "short"]
);
numeric_handler!(
    /// 32-bit signed integers.
    IntHandler, i32, Int, [type_names::INT, "int", "integer"]
);
numeric_handler!(
    /// 64-bit signed integers.
    LongHandler, i64, Long, [type_names::LONG, "long"]
);
numeric_handler!(
    /// Single precision floats.
    FloatHandler, f32, Float, [type_names::FLOAT, "float"]
);
numeric_handler!(
    /// Double precision floats.
    DoubleHandler, f64, Double, [type_names::DOUBLE, "double"]
);
