use crate::data::{ResultSet, Value};
use crate::format::{check_structure, FormatError, Formatter};

/// Delimited text, RFC 4180 quoting. Output round-trips through any
/// conformant parser; null cells stay empty fields.
pub struct CsvFormatter {
    delimiter: u8,
}

impl CsvFormatter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvFormatter {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl Formatter for CsvFormatter {
    fn format(&self, results: &ResultSet) -> Result<String, FormatError> {
        check_structure(results)?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());

        writer.write_record(results.schema.field_names())?;
        for row in &results.rows {
            // Ragged rows are padded out; the record always matches the
            // header width.
            let record: Vec<String> = (0..results.schema.len())
                .map(|i| row.get(i).map(Value::canonical).unwrap_or_default())
                .collect();
            writer.write_record(&record)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| FormatError::Csv(e.into_error().into()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
