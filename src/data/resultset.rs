use crate::data::schema::Schema;
use crate::data::value::Value;

/// One result row, positionally aligned with the schema.
///
/// Rows are immutable once produced; the executor builds them while
/// draining pages and nothing mutates them afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A materialized query result: schema plus ordered rows.
///
/// `truncated` is set when collection stopped at the configured row cap
/// while the backend still had pages left. That is a display note, not
/// an error.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub schema: Schema,
    pub rows: Vec<Row>,
    pub truncated: bool,
}

impl ResultSet {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            truncated: false,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.schema.field_names()
    }
}
