//! The nested input value walked by the serializer.

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::attachment::Attachment;

/// A nested value to flatten into form fields.
///
/// `Undefined` and `Null` are distinct: an undefined field is omitted, a
/// null one is rejected.
#[derive(Debug)]
pub enum FormValue {
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<FormValue>),
    Object(IndexMap<String, FormValue>),
    Attachment(Attachment),
    /// A host value with no form representation, tagged with its kind name.
    Opaque(&'static str),
}

impl FormValue {
    /// Build an object preserving the iteration order of `entries`.
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<FormValue>,
    {
        FormValue::Object(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn array<V: Into<FormValue>>(items: impl IntoIterator<Item = V>) -> Self {
        FormValue::Array(items.into_iter().map(Into::into).collect())
    }

    /// Run-time kind name reported in errors.
    pub fn kind(&self) -> &'static str {
        match self {
            FormValue::Undefined => "undefined",
            FormValue::Null => "null",
            FormValue::Bool(_) => "boolean",
            FormValue::Number(_) => "number",
            FormValue::String(_) => "string",
            FormValue::Array(_) => "array",
            FormValue::Object(_) => "object",
            FormValue::Attachment(_) => "attachment",
            FormValue::Opaque(kind) => *kind,
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, FormValue::Undefined)
    }

    /// Whether an attachment appears anywhere in the structure.
    pub fn contains_attachment(&self) -> bool {
        match self {
            FormValue::Attachment(_) => true,
            FormValue::Array(items) => items.iter().any(FormValue::contains_attachment),
            FormValue::Object(map) => map.values().any(FormValue::contains_attachment),
            _ => false,
        }
    }
}

/// Stringify a number the way `String(number)` does.
pub(crate) fn number_to_string(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) => ryu_js::Buffer::new().format(f).to_string(),
        None => n.to_string(),
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FormValue::Null,
            Value::Bool(b) => FormValue::Bool(b),
            Value::Number(n) => FormValue::Number(n),
            Value::String(s) => FormValue::String(s),
            Value::Array(items) => FormValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                FormValue::Object(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::String(s.to_string())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::String(s)
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Bool(b)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for FormValue {
                fn from(n: $t) -> Self {
                    FormValue::Number(Number::from(n))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for FormValue {
    fn from(f: f64) -> Self {
        match Number::from_f64(f) {
            Some(n) => FormValue::Number(n),
            None => FormValue::Opaque("number"),
        }
    }
}

impl From<f32> for FormValue {
    fn from(f: f32) -> Self {
        FormValue::from(f64::from(f))
    }
}

impl From<Attachment> for FormValue {
    fn from(attachment: Attachment) -> Self {
        FormValue::Attachment(attachment)
    }
}

impl<T: Into<FormValue>> From<Vec<T>> for FormValue {
    fn from(items: Vec<T>) -> Self {
        FormValue::array(items)
    }
}

impl<T: Into<FormValue>> From<Option<T>> for FormValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FormValue::Undefined, Into::into)
    }
}
