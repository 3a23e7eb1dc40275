//! Result formatters
//!
//! Three fixed output encodings over a materialized result set. Data
//! oddities (nulls, odd value kinds, ragged rows) never fail a render;
//! only structural problems do.

pub mod csv;
pub mod json;
pub mod table;

use std::str::FromStr;

use thiserror::Error;

use crate::data::ResultSet;

pub use self::csv::CsvFormatter;
pub use self::json::JsonFormatter;
pub use self::table::TableFormatter;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("result set has rows but no schema")]
    MissingSchema,
    #[error("writing delimited output: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("writing structured output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Render a result set into one output encoding.
pub trait Formatter {
    fn format(&self, results: &ResultSet) -> Result<String, FormatError>;
}

/// The fixed set of output encodings, named as they appear in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Table,
    Csv,
    Json,
}

impl FormatKind {
    pub const ALL: [FormatKind; 3] = [FormatKind::Table, FormatKind::Csv, FormatKind::Json];

    pub fn name(&self) -> &'static str {
        match self {
            FormatKind::Table => "table",
            FormatKind::Csv => "csv",
            FormatKind::Json => "json",
        }
    }

    /// The next format in the display cycle.
    pub fn next(&self) -> FormatKind {
        match self {
            FormatKind::Table => FormatKind::Csv,
            FormatKind::Csv => FormatKind::Json,
            FormatKind::Json => FormatKind::Table,
        }
    }

    pub fn formatter(&self, csv_delimiter: u8) -> Box<dyn Formatter> {
        match self {
            FormatKind::Table => Box::new(TableFormatter),
            FormatKind::Csv => Box::new(CsvFormatter::new(csv_delimiter)),
            FormatKind::Json => Box::new(JsonFormatter),
        }
    }
}

impl FromStr for FormatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "table" => Ok(FormatKind::Table),
            "csv" => Ok(FormatKind::Csv),
            "json" => Ok(FormatKind::Json),
            other => Err(format!(
                "unsupported format {other:?} (expected table, csv, or json)"
            )),
        }
    }
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A non-empty row set needs a schema to key or align anything by.
fn check_structure(results: &ResultSet) -> Result<(), FormatError> {
    if results.schema.is_empty() && !results.rows.is_empty() {
        return Err(FormatError::MissingSchema);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Row, Schema, Value};

    #[test]
    fn format_names_round_trip() {
        for kind in FormatKind::ALL {
            assert_eq!(kind.name().parse::<FormatKind>(), Ok(kind));
        }
        assert!("xml".parse::<FormatKind>().is_err());
    }

    #[test]
    fn cycle_covers_every_format() {
        assert_eq!(FormatKind::Table.next(), FormatKind::Csv);
        assert_eq!(FormatKind::Csv.next(), FormatKind::Json);
        assert_eq!(FormatKind::Json.next(), FormatKind::Table);
    }

    #[test]
    fn rows_without_schema_are_structural_errors() {
        let results = ResultSet {
            schema: Schema::default(),
            rows: vec![Row::new(vec![Value::Integer(1)])],
            truncated: false,
        };
        for kind in FormatKind::ALL {
            let err = kind.formatter(b',').format(&results);
            assert!(matches!(err, Err(FormatError::MissingSchema)));
        }
    }
}
