//! SQL-backed resolution: the data-source boundary and the single-table adapter

pub mod source;
pub mod table;

pub use source::{CellValue, DataSource, RowSet};
pub use table::{Column, ParentLink, TableAdapter};
