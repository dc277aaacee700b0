use crate::document::Document;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::{Debug, Display, Formatter};

/// Compare two floats for equality with NaN treated as equal to itself.
#[inline]
fn num_eq_float(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        true
    } else {
        a == b
    }
}

/// A value held by a [Document] or an update payload.
///
/// The set of variants is closed: it covers the primitive and structured
/// kinds a document store accepts, so update payloads stay type safe all the
/// way to the store client.
///
/// - `Null` - absence of a value; never written by the partial update builder
/// - `Bool`, `I32`, `I64`, `U32`, `U64`, `F32`, `F64`, `Char`, `String` - scalars
/// - `DateTime` - a store date, UTC with millisecond precision
/// - `Document` - an embedded document
/// - `Array` - an ordered list of values
/// - `Bytes` - binary data
///
/// Create values with `From`, [Value::from] or the [`val!`](crate::val) macro:
/// ```text
/// let v1: Value = 42.into();
/// let v2 = Value::from("hello");
/// let v3 = val!(true);
/// ```
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// Represents a null value.
    #[default]
    Null,
    /// Represents a boolean value.
    Bool(bool),
    /// Represents a signed 32-bit integer value.
    I32(i32),
    /// Represents a signed 64-bit integer value.
    I64(i64),
    /// Represents an unsigned 32-bit integer value.
    U32(u32),
    /// Represents an unsigned 64-bit integer value.
    U64(u64),
    /// Represents a 32-bit floating point value.
    F32(f32),
    /// Represents a 64-bit floating point value.
    F64(f64),
    /// Represents a character value.
    Char(char),
    /// Represents a string value.
    String(String),
    /// Represents a store date.
    DateTime(DateTime<Utc>),
    /// Represents an embedded document.
    Document(Document),
    /// Represents an array value.
    Array(Vec<Value>),
    /// Represents binary data.
    Bytes(Vec<u8>),
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string(0))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_pretty_json(0))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.as_integer(), other.as_integer()) {
            return a == b;
        }

        if self.is_decimal() && other.is_decimal() {
            if let (Some(a), Some(b)) = (self.as_decimal(), other.as_decimal()) {
                return num_eq_float(a, b);
            }
        }

        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Document(a), Value::Document(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Creates a new [Value] from anything implementing [`Into<Value>`].
    pub fn from<T: Into<Value>>(value: T) -> Value {
        value.into()
    }

    /// Creates a new [Value] from an [Option]; `None` becomes [Value::Null].
    pub fn from_option<T: Into<Value>>(value: Option<T>) -> Value {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }

    /// Creates a [Value::Array] from a vector of convertible items.
    pub fn from_vec<T: Into<Value>>(values: Vec<T>) -> Value {
        Value::Array(values.into_iter().map(|v| v.into()).collect())
    }

    pub fn as_bool(&self) -> Option<&bool> {
        match self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<&i32> {
        match self {
            Value::I32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<&i64> {
        match self {
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<&u32> {
        match self {
            Value::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<&u64> {
        match self {
            Value::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<&f32> {
        match self {
            Value::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&f64> {
        match self {
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Returns any integer variant widened to `i128`.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::I32(v) => Some(*v as i128),
            Value::I64(v) => Some(*v as i128),
            Value::U32(v) => Some(*v as i128),
            Value::U64(v) => Some(*v as i128),
            _ => None,
        }
    }

    /// Returns any floating point variant widened to `f64`.
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<&char> {
        match self {
            Value::Char(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&String> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::DateTime(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Vec<u8>> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_date_time(&self) -> bool {
        matches!(self, Value::DateTime(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Value::I32(_) | Value::I64(_) | Value::U32(_) | Value::U64(_)
        )
    }

    pub fn is_decimal(&self) -> bool {
        matches!(self, Value::F32(_) | Value::F64(_))
    }

    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_decimal()
    }

    /// Moves the value out, leaving [Value::Null] behind.
    pub fn take(&mut self) -> Value {
        std::mem::replace(self, Value::Null)
    }

    pub(crate) fn to_pretty_json(&self, indent: usize) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::U32(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::F32(v) => v.to_string(),
            Value::F64(v) => v.to_string(),
            Value::Char(v) => format!("\"{}\"", v),
            Value::String(v) => format!("\"{}\"", v),
            Value::DateTime(v) => {
                format!("\"{}\"", v.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Value::Document(v) => v.to_pretty_json(indent),
            Value::Array(v) => {
                if v.is_empty() {
                    return "[]".to_string();
                }

                let indent_str = " ".repeat(indent + 2);
                let items: Vec<String> = v
                    .iter()
                    .map(|value| format!("{}{}", indent_str, value.to_pretty_json(indent + 2)))
                    .collect();
                format!("[\n{}\n{}]", items.join(",\n"), " ".repeat(indent))
            }
            Value::Bytes(v) => format!("{:?}", v),
        }
    }

    pub(crate) fn to_debug_string(&self, indent: usize) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(v) => format!("bool({})", v),
            Value::I32(v) => format!("i32({})", v),
            Value::I64(v) => format!("i64({})", v),
            Value::U32(v) => format!("u32({})", v),
            Value::U64(v) => format!("u64({})", v),
            Value::F32(v) => format!("f32({})", v),
            Value::F64(v) => format!("f64({})", v),
            Value::Char(v) => format!("char(\"{}\")", v),
            Value::String(v) => format!("string(\"{}\")", v),
            Value::DateTime(v) => format!(
                "date(\"{}\")",
                v.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            Value::Document(v) => format!("object({})", v.to_debug_string(indent)),
            Value::Array(v) => {
                if v.is_empty() {
                    return "array([])".to_string();
                }

                let indent_str = " ".repeat(indent + 2);
                let items: Vec<String> = v
                    .iter()
                    .map(|value| format!("{}{}", indent_str, value.to_debug_string(indent + 2)))
                    .collect();
                format!("array([\n{}\n{}])", items.join(",\n"), " ".repeat(indent))
            }
            Value::Bytes(v) => format!("bytes({:?})", v),
        }
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i8> for Value {
    #[inline]
    fn from(value: i8) -> Self {
        Value::I32(value as i32)
    }
}

impl From<i16> for Value {
    #[inline]
    fn from(value: i16) -> Self {
        Value::I32(value as i32)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(value: i32) -> Self {
        Value::I32(value)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(value: i64) -> Self {
        Value::I64(value)
    }
}

impl From<u8> for Value {
    #[inline]
    fn from(value: u8) -> Self {
        Value::U32(value as u32)
    }
}

impl From<u16> for Value {
    #[inline]
    fn from(value: u16) -> Self {
        Value::U32(value as u32)
    }
}

impl From<u32> for Value {
    #[inline]
    fn from(value: u32) -> Self {
        Value::U32(value)
    }
}

impl From<u64> for Value {
    #[inline]
    fn from(value: u64) -> Self {
        Value::U64(value)
    }
}

impl From<f32> for Value {
    #[inline]
    fn from(value: f32) -> Self {
        Value::F32(value)
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Option<T>) -> Self {
        Value::from_option(value)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(value: Vec<T>) -> Self {
        Value::from_vec(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

/// Creates a [Value] from an expression using its `From` conversion.
///
/// ```rust
/// use patchdoc::common::Value;
/// use patchdoc::val;
///
/// assert_eq!(val!(42), Value::I32(42));
/// assert_eq!(val!("hello"), Value::String("hello".to_string()));
/// assert_eq!(val!(true), Value::Bool(true));
/// ```
#[macro_export]
macro_rules! val {
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use chrono::TimeZone;

    #[test]
    fn test_integer_equality_across_widths() {
        assert_eq!(Value::I32(30), Value::I64(30));
        assert_eq!(Value::U32(7), Value::I64(7));
        assert_eq!(Value::U64(u64::MAX), Value::U64(u64::MAX));
        assert_ne!(Value::I32(-1), Value::U64(u64::MAX));
    }

    #[test]
    fn test_float_equality_handles_nan() {
        assert_eq!(Value::F64(f64::NAN), Value::F64(f64::NAN));
        assert_eq!(Value::F32(1.5), Value::F64(1.5));
        assert_ne!(Value::F64(0.1), Value::F64(0.2));
    }

    #[test]
    fn test_integer_and_float_are_not_equal() {
        assert_ne!(Value::I32(1), Value::F64(1.0));
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(Value::from(5u8), Value::U32(5));
        assert_eq!(Value::from(-5i16), Value::I32(-5));
        assert_eq!(Value::from('x'), Value::Char('x'));
        assert_eq!(Value::from(Some("a")), Value::String("a".to_string()));
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(()), Value::Null);
        assert_eq!(
            Value::from(vec![1, 2]),
            Value::Array(vec![Value::I32(1), Value::I32(2)])
        );
    }

    #[test]
    fn test_accessors() {
        let value = Value::from("Ana");
        assert_eq!(value.as_string(), Some(&"Ana".to_string()));
        assert!(value.as_i32().is_none());
        assert!(value.is_string());
        assert!(!value.is_null());

        let value = Value::I64(10);
        assert_eq!(value.as_integer(), Some(10));
        assert!(value.is_number());
        assert!(!value.is_decimal());
    }

    #[test]
    fn test_take_leaves_null() {
        let mut value = Value::from("moved");
        let taken = value.take();
        assert!(value.is_null());
        assert_eq!(taken, Value::from("moved"));
    }

    #[test]
    fn test_display_date_time() {
        let date = Utc.with_ymd_and_hms(2020, 11, 12, 15, 55, 0).unwrap();
        assert_eq!(Value::from(date).to_string(), "\"2020-11-12T15:55:00.000Z\"");
    }

    #[test]
    fn test_display_nested() {
        let value = Value::Document(doc! { "tags": ["a", "b"] });
        let text = value.to_string();
        assert!(text.contains("\"tags\""));
        assert!(text.contains("\"a\""));
    }

    #[test]
    fn test_debug_is_typed() {
        assert_eq!(format!("{:?}", Value::I32(3)), "i32(3)");
        assert_eq!(format!("{:?}", Value::from("s")), "string(\"s\")");
        assert_eq!(format!("{:?}", Value::Null), "null");
    }
}
