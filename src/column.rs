/// Data Sweeper Column Implementation
///
/// A Column is an array-like random-access data container indexed by integer.
/// Each Column has a type specifying the type of every value stored. Columns
/// built from uploaded files are always nullable: a missing cell is stored as
/// `ColumnValue::Null`.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

/// Column data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int64,
    Float64,
    Bool,
    String,
}

impl ColumnType {
    /// Numeric columns take part in mean-fill and charting.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Int64 | ColumnType::Float64)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::Bool => "bool",
            ColumnType::String => "string",
        }
    }
}

/// Column value enum to support multiple types
///
/// Equality and hashing treat floats by value with `-0.0 == 0.0` and all NaNs
/// equal, so whole rows can be used as hash keys for duplicate detection.
#[derive(Debug, Clone)]
pub enum ColumnValue {
    Int64(i64),
    Float64(f64),
    Bool(bool),
    String(String),
    Null,
}

fn float_key(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

impl PartialEq for ColumnValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ColumnValue::Int64(a), ColumnValue::Int64(b)) => a == b,
            (ColumnValue::Float64(a), ColumnValue::Float64(b)) => float_key(*a) == float_key(*b),
            (ColumnValue::Bool(a), ColumnValue::Bool(b)) => a == b,
            (ColumnValue::String(a), ColumnValue::String(b)) => a == b,
            (ColumnValue::Null, ColumnValue::Null) => true,
            _ => false,
        }
    }
}

impl Eq for ColumnValue {}

impl Hash for ColumnValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            ColumnValue::Int64(v) => v.hash(state),
            ColumnValue::Float64(v) => float_key(*v).hash(state),
            ColumnValue::Bool(v) => v.hash(state),
            ColumnValue::String(v) => v.hash(state),
            ColumnValue::Null => {}
        }
    }
}

impl ColumnValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ColumnValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric value widened to f64, for either numeric variant.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            ColumnValue::Int64(v) => Some(*v as f64),
            ColumnValue::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            ColumnValue::String(v) => Some(v),
            _ => None,
        }
    }

    /// Convert to a JSON value for previews. Non-finite floats become null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            ColumnValue::Int64(v) => JsonValue::Number((*v).into()),
            ColumnValue::Float64(v) => serde_json::Number::from_f64(*v)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            ColumnValue::String(v) => JsonValue::String(v.clone()),
            ColumnValue::Bool(v) => JsonValue::Bool(*v),
            ColumnValue::Null => JsonValue::Null,
        }
    }
}

/// A named, typed sequence of values.
#[derive(Clone)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    values: Vec<ColumnValue>,
}

impl Column {
    pub fn new(name: String, column_type: ColumnType) -> Self {
        Column {
            name,
            column_type,
            values: Vec::new(),
        }
    }

    /// Build a column from already-typed values.
    pub fn from_values(
        name: String,
        column_type: ColumnType,
        values: Vec<ColumnValue>,
    ) -> Result<Self, String> {
        let mut column = Column::new(name, column_type);
        column.values.reserve(values.len());
        for value in values {
            column.append(value)?;
        }
        Ok(column)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Validate value against the column type
    fn validate_value(&self, value: ColumnValue) -> Result<ColumnValue, String> {
        match (&value, self.column_type) {
            (ColumnValue::Null, _) => Ok(value),
            (ColumnValue::Float64(f), ColumnType::Float64) if f.is_nan() => Ok(ColumnValue::Null),
            (ColumnValue::Int64(_), ColumnType::Int64) => Ok(value),
            (ColumnValue::Float64(_), ColumnType::Float64) => Ok(value),
            (ColumnValue::Bool(_), ColumnType::Bool) => Ok(value),
            (ColumnValue::String(_), ColumnType::String) => Ok(value),
            _ => Err(format!(
                "Type mismatch in column '{}': expected {}, got {:?}",
                self.name,
                self.column_type.label(),
                value
            )),
        }
    }

    pub fn get(&self, index: usize) -> Result<ColumnValue, String> {
        self.get_ref(index)
            .cloned()
            .ok_or_else(|| format!("Index {} out of range [0, {})", index, self.values.len()))
    }

    #[inline]
    pub fn get_ref(&self, index: usize) -> Option<&ColumnValue> {
        self.values.get(index)
    }

    /// Fast numeric access - returns the value as f64 without cloning ColumnValue.
    /// Returns None if the value is null, not numeric, or index out of bounds.
    #[inline]
    pub fn get_f64(&self, index: usize) -> Option<f64> {
        self.values.get(index).and_then(ColumnValue::to_f64)
    }

    #[inline]
    pub fn is_null_at(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(ColumnValue::Null))
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_null()).count()
    }

    pub fn set(&mut self, index: usize, value: ColumnValue) -> Result<(), String> {
        let value = self.validate_value(value)?;
        let len = self.values.len();
        let slot = self
            .values
            .get_mut(index)
            .ok_or_else(|| format!("Index {} out of range [0, {})", index, len))?;
        *slot = value;
        Ok(())
    }

    pub fn append(&mut self, value: ColumnValue) -> Result<(), String> {
        let value = self.validate_value(value)?;
        self.values.push(value);
        Ok(())
    }

    /// Keep only the rows whose flag in `keep` is true.
    pub fn retain_rows(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.values.retain(|_| flags.next().copied().unwrap_or(false));
    }

    /// Widen an INT64 column to FLOAT64 in place. No-op for other types.
    pub fn promote_to_float(&mut self) {
        if self.column_type != ColumnType::Int64 {
            return;
        }
        for value in self.values.iter_mut() {
            if let ColumnValue::Int64(n) = value {
                *value = ColumnValue::Float64(*n as f64);
            }
        }
        self.column_type = ColumnType::Float64;
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ColumnValue> {
        self.values.iter()
    }
}

impl Debug for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Column {{ name: '{}', type: {}, len: {} }}",
            self.name,
            self.column_type.label(),
            self.len()
        )
    }
}
