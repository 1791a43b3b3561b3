//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellAddress`] - A cell's location (e.g., "B12")
//! - Column letter <-> index conversions

mod address;

pub use address::{
    column_index, column_letters, format_address, parse_address, CellAddress,
};
