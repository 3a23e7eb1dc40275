//! Data layer for query results
//!
//! This module defines the value model shared by the executor and the
//! formatters: a closed set of cell value kinds, the result schema, and
//! the materialized result set.

pub mod resultset;
pub mod schema;
pub mod value;

pub use resultset::{ResultSet, Row};
pub use schema::{Field, Schema, ValueKind};
pub use value::Value;
