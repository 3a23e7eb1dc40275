use std::fmt;

/// The kind of value a field holds.
///
/// This is a closed set: every cell the backend can produce maps onto one
/// of these, so the formatters can match exhaustively instead of sniffing
/// types at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    Null,
    Integer,
    Float,
    Text,
    Boolean,
    Timestamp,
    /// A nested row with its own ordered fields.
    Record(Vec<Field>),
    /// Zero or more values of the inner kind.
    Repeated(Box<ValueKind>),
}

impl ValueKind {
    /// Parse a backend type name. Unknown names degrade to `Text` so an
    /// unrecognized column never sinks the whole result set.
    pub fn from_wire(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "null" => ValueKind::Null,
            "integer" | "int64" => ValueKind::Integer,
            "float" | "float64" => ValueKind::Float,
            // decimal digits can exceed f64 precision; keep the wire string
            "numeric" | "bignumeric" => ValueKind::Text,
            "string" | "text" => ValueKind::Text,
            "boolean" | "bool" => ValueKind::Boolean,
            "timestamp" | "datetime" => ValueKind::Timestamp,
            "record" | "struct" => ValueKind::Record(Vec::new()),
            _ => ValueKind::Text,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Null => write!(f, "null"),
            ValueKind::Integer => write!(f, "integer"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::Text => write!(f, "string"),
            ValueKind::Boolean => write!(f, "boolean"),
            ValueKind::Timestamp => write!(f, "timestamp"),
            ValueKind::Record(_) => write!(f, "record"),
            ValueKind::Repeated(inner) => write!(f, "repeated {}", inner),
        }
    }
}

/// One named, typed column of a result set.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub kind: ValueKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// The ordered list of fields a result set's rows conform to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
