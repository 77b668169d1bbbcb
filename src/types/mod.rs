//! Column values and their string conversion.
//!
//! A [`Value`] is what every reader produces and every writer consumes. The
//! [`ConversionRegistry`] turns wire text into values and back, keyed by the
//! type name assigned to a column.

pub mod date;
pub mod handlers;
pub mod registry;
pub mod value;

pub use date::{DEFAULT_PARSE_PATTERNS, DateHandler};
pub use handlers::{
    BoolHandler, ByteHandler, CharHandler, DoubleHandler, FloatHandler, IntHandler, LongHandler,
    ShortHandler, TypeConversionHandler,
};
pub use registry::{ConversionRegistry, HandlerRef};
pub use value::{Row, Value, row_to_strings, text_row, type_names};
