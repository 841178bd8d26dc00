use std::fmt;

/// The declared type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Bool,
    Int,
    Float,
    Text,
    IntList,
    FloatList,
    TextList,
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PropertyKind::Bool => "bool",
            PropertyKind::Int => "int",
            PropertyKind::Float => "float",
            PropertyKind::Text => "text",
            PropertyKind::IntList => "int list",
            PropertyKind::FloatList => "float list",
            PropertyKind::TextList => "text list",
        };
        f.write_str(name)
    }
}

/// A property value as a tagged variant.
///
/// Every variant converts to and from a string form, which is what GUIs and
/// scripting front ends drive algorithms with; list variants use
/// comma-separated elements.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    TextList(Vec<String>),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyValue::Bool(_) => PropertyKind::Bool,
            PropertyValue::Int(_) => PropertyKind::Int,
            PropertyValue::Float(_) => PropertyKind::Float,
            PropertyValue::Text(_) => PropertyKind::Text,
            PropertyValue::IntList(_) => PropertyKind::IntList,
            PropertyValue::FloatList(_) => PropertyKind::FloatList,
            PropertyValue::TextList(_) => PropertyKind::TextList,
        }
    }

    /// The zero value a freshly declared property of the given kind holds.
    pub fn default_for(kind: PropertyKind) -> Self {
        match kind {
            PropertyKind::Bool => PropertyValue::Bool(false),
            PropertyKind::Int => PropertyValue::Int(0),
            PropertyKind::Float => PropertyValue::Float(0.0),
            PropertyKind::Text => PropertyValue::Text(String::new()),
            PropertyKind::IntList => PropertyValue::IntList(Vec::new()),
            PropertyKind::FloatList => PropertyValue::FloatList(Vec::new()),
            PropertyKind::TextList => PropertyValue::TextList(Vec::new()),
        }
    }

    /// Parses the string form of a value of the given kind.
    ///
    /// An empty string parses to an empty list for list kinds and is an error
    /// for numeric scalars.
    pub fn parse(kind: PropertyKind, input: &str) -> Result<Self, String> {
        let trimmed = input.trim();
        match kind {
            PropertyKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "1" | "true" => Ok(PropertyValue::Bool(true)),
                "0" | "false" => Ok(PropertyValue::Bool(false)),
                _ => Err(format!("'{input}' is not a boolean (expected 0/1/true/false)")),
            },
            PropertyKind::Int => trimmed
                .parse::<i64>()
                .map(PropertyValue::Int)
                .map_err(|_| format!("'{input}' is not an integer")),
            PropertyKind::Float => trimmed
                .parse::<f64>()
                .map(PropertyValue::Float)
                .map_err(|_| format!("'{input}' is not a number")),
            PropertyKind::Text => Ok(PropertyValue::Text(input.to_string())),
            PropertyKind::IntList => parse_list(trimmed, |item| {
                item.parse::<i64>()
                    .map_err(|_| format!("'{item}' is not an integer"))
            })
            .map(PropertyValue::IntList),
            PropertyKind::FloatList => parse_list(trimmed, |item| {
                item.parse::<f64>()
                    .map_err(|_| format!("'{item}' is not a number"))
            })
            .map(PropertyValue::FloatList),
            PropertyKind::TextList => parse_list(trimmed, |item| Ok(item.to_string()))
                .map(PropertyValue::TextList),
        }
    }

    /// Numeric view used by bounds validation.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(v) => Some(*v as f64),
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }
}

fn parse_list<T>(input: &str, parse_item: impl Fn(&str) -> Result<T, String>) -> Result<Vec<T>, String> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    input.split(',').map(|item| parse_item(item.trim())).collect()
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(v) => f.write_str(if *v { "1" } else { "0" }),
            PropertyValue::Int(v) => write!(f, "{v}"),
            PropertyValue::Float(v) => write!(f, "{v}"),
            PropertyValue::Text(v) => f.write_str(v),
            PropertyValue::IntList(values) => write_joined(f, values),
            PropertyValue::FloatList(values) => write_joined(f, values),
            PropertyValue::TextList(values) => write_joined(f, values),
        }
    }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<Vec<i64>> for PropertyValue {
    fn from(v: Vec<i64>) -> Self {
        PropertyValue::IntList(v)
    }
}

impl From<Vec<f64>> for PropertyValue {
    fn from(v: Vec<f64>) -> Self {
        PropertyValue::FloatList(v)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(v: Vec<String>) -> Self {
        PropertyValue::TextList(v)
    }
}
