//! Readers over data that is already in memory: query results and table models.

pub mod cursor;
pub mod model;

pub use cursor::{MemoryResultSet, ResultCursor, ResultSetReader};
pub use model::{TableModel, TableModelReader, VecTableModel};
