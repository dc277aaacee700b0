use crate::common::Value;
use crate::document::Document;
use crate::errors::{ErrorKind, PatchError, PatchResult};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Conversion between a Rust type and a [Value].
///
/// Record types implement it (usually through `#[derive(Convertible)]`) so the
/// repository layer can decode documents returned by the store. `Output` is
/// normally `Self`; wrapper impls such as `Option<T>` map it through.
pub trait Convertible {
    type Output;

    fn to_value(&self) -> PatchResult<Value>;
    fn from_value(value: &Value) -> PatchResult<Self::Output>;
}

fn mapping_error(value: &Value, expected: &str) -> PatchError {
    log::error!("Value {} is not {}", value, expected);
    PatchError::new(
        &format!("Value is not {}", expected),
        ErrorKind::ObjectMappingError,
    )
}

// Integers are read back from any integer variant that fits, since a store may
// widen a 32-bit number on the way back.
macro_rules! impl_convertible_for_integers {
    ($($t:ty => $name:literal),+ $(,)?) => {
        $(
            impl Convertible for $t {
                type Output = $t;

                fn to_value(&self) -> PatchResult<Value> {
                    Ok(Value::from(*self))
                }

                fn from_value(value: &Value) -> PatchResult<Self> {
                    value
                        .as_integer()
                        .and_then(|i| <$t>::try_from(i).ok())
                        .ok_or_else(|| mapping_error(value, $name))
                }
            }
        )+
    };
}

impl_convertible_for_integers! {
    i8 => "an i8",
    i16 => "an i16",
    i32 => "an i32",
    i64 => "an i64",
    u8 => "a u8",
    u16 => "a u16",
    u32 => "a u32",
    u64 => "a u64",
}

impl Convertible for f32 {
    type Output = f32;

    fn to_value(&self) -> PatchResult<Value> {
        Ok(Value::F32(*self))
    }

    fn from_value(value: &Value) -> PatchResult<Self> {
        match value.as_decimal() {
            Some(v) => Ok(v as f32),
            None => Err(mapping_error(value, "an f32")),
        }
    }
}

impl Convertible for f64 {
    type Output = f64;

    fn to_value(&self) -> PatchResult<Value> {
        Ok(Value::F64(*self))
    }

    fn from_value(value: &Value) -> PatchResult<Self> {
        match value.as_decimal() {
            Some(v) => Ok(v),
            None => Err(mapping_error(value, "an f64")),
        }
    }
}

impl Convertible for bool {
    type Output = bool;

    fn to_value(&self) -> PatchResult<Value> {
        Ok(Value::Bool(*self))
    }

    fn from_value(value: &Value) -> PatchResult<Self> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => Err(mapping_error(value, "a bool")),
        }
    }
}

impl Convertible for char {
    type Output = char;

    fn to_value(&self) -> PatchResult<Value> {
        Ok(Value::Char(*self))
    }

    fn from_value(value: &Value) -> PatchResult<Self> {
        match value {
            Value::Char(c) => Ok(*c),
            Value::String(s) if s.chars().count() == 1 => {
                s.chars().next().ok_or_else(|| mapping_error(value, "a char"))
            }
            _ => Err(mapping_error(value, "a char")),
        }
    }
}

impl Convertible for String {
    type Output = String;

    fn to_value(&self) -> PatchResult<Value> {
        Ok(Value::String(self.clone()))
    }

    fn from_value(value: &Value) -> PatchResult<Self> {
        match value {
            Value::String(s) => Ok(s.clone()),
            _ => Err(mapping_error(value, "a string")),
        }
    }
}

impl Convertible for Document {
    type Output = Document;

    fn to_value(&self) -> PatchResult<Value> {
        Ok(Value::Document(self.clone()))
    }

    fn from_value(value: &Value) -> PatchResult<Self> {
        match value {
            Value::Document(doc) => Ok(doc.clone()),
            _ => Err(mapping_error(value, "a document")),
        }
    }
}

impl Convertible for Value {
    type Output = Value;

    fn to_value(&self) -> PatchResult<Value> {
        Ok(self.clone())
    }

    fn from_value(value: &Value) -> PatchResult<Self> {
        Ok(value.clone())
    }
}

impl<T> Convertible for Option<T>
where
    T: Convertible,
{
    type Output = Option<T::Output>;

    fn to_value(&self) -> PatchResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }

    fn from_value(value: &Value) -> PatchResult<Self::Output> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(value)?)),
        }
    }
}

impl<T> Convertible for Box<T>
where
    T: Convertible,
{
    type Output = Box<T::Output>;

    fn to_value(&self) -> PatchResult<Value> {
        self.as_ref().to_value()
    }

    fn from_value(value: &Value) -> PatchResult<Self::Output> {
        Ok(Box::new(T::from_value(value)?))
    }
}

impl<T> Convertible for Vec<T>
where
    T: Convertible,
{
    type Output = Vec<T::Output>;

    fn to_value(&self) -> PatchResult<Value> {
        let mut arr = Vec::with_capacity(self.len());
        for item in self {
            arr.push(item.to_value()?);
        }
        Ok(Value::Array(arr))
    }

    fn from_value(value: &Value) -> PatchResult<Self::Output> {
        match value {
            Value::Array(arr) => arr.iter().map(T::from_value).collect(),
            Value::Null => Ok(Vec::new()),
            Value::Bytes(bytes) => bytes
                .iter()
                .map(|b| T::from_value(&Value::U32(*b as u32)))
                .collect(),
            _ => Err(mapping_error(value, "an array")),
        }
    }
}

impl<K, V> Convertible for BTreeMap<K, V>
where
    K: ToString + FromStr + Ord,
    V: Convertible,
{
    type Output = BTreeMap<K, V::Output>;

    fn to_value(&self) -> PatchResult<Value> {
        let mut doc = Document::with_capacity(self.len());
        for (k, v) in self {
            doc.put(k.to_string(), v.to_value()?)?;
        }
        Ok(Value::Document(doc))
    }

    fn from_value(value: &Value) -> PatchResult<Self::Output> {
        match value {
            Value::Document(doc) => {
                let mut map = BTreeMap::new();
                for (k, v) in doc.iter() {
                    let key = K::from_str(k).map_err(|_| {
                        log::error!("Key {} could not be parsed", k);
                        PatchError::new(
                            &format!("Key {} could not be parsed", k),
                            ErrorKind::ObjectMappingError,
                        )
                    })?;
                    map.insert(key, V::from_value(v)?);
                }
                Ok(map)
            }
            _ => Err(mapping_error(value, "a document")),
        }
    }
}

/// Decodes a value into `T::Output`.
pub fn from_value<T>(value: &Value) -> PatchResult<T::Output>
where
    T: Convertible,
{
    T::from_value(value)
}

/// Encodes `data` as a [Value].
pub fn to_value<T>(data: &T) -> PatchResult<Value>
where
    T: Convertible,
{
    data.to_value()
}
