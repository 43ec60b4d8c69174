//! Classification of a [`FormValue`] into the cases the traversal handles.

use indexmap::IndexMap;

use crate::attachment::Attachment;
use crate::value::{number_to_string, FormValue};

/// The closed set of cases the serializer switches on.
///
/// Classification never touches an attachment's bytes; draining happens
/// only after the caller matches on [`Classified::Attachment`].
#[derive(Debug)]
pub enum Classified {
    Undefined,
    Null,
    /// A string, number or boolean, already stringified.
    Scalar(String),
    Attachment(Attachment),
    Array(Vec<FormValue>),
    Object(IndexMap<String, FormValue>),
    Unsupported(&'static str),
}

pub fn classify(value: FormValue) -> Classified {
    match value {
        FormValue::Undefined => Classified::Undefined,
        FormValue::Null => Classified::Null,
        FormValue::Bool(b) => Classified::Scalar(b.to_string()),
        FormValue::Number(n) => Classified::Scalar(number_to_string(&n)),
        FormValue::String(s) => Classified::Scalar(s),
        FormValue::Attachment(attachment) => Classified::Attachment(attachment),
        FormValue::Array(items) => Classified::Array(items),
        FormValue::Object(map) => Classified::Object(map),
        FormValue::Opaque(kind) => Classified::Unsupported(kind),
    }
}

/// Whether `value` would classify as a scalar.
pub fn is_scalar(value: &FormValue) -> bool {
    matches!(
        value,
        FormValue::Bool(_) | FormValue::Number(_) | FormValue::String(_)
    )
}

/// Stringify a scalar without consuming it. `None` for every other case.
pub fn scalar_text(value: &FormValue) -> Option<String> {
    match value {
        FormValue::Bool(b) => Some(b.to_string()),
        FormValue::Number(n) => Some(number_to_string(n)),
        FormValue::String(s) => Some(s.clone()),
        _ => None,
    }
}
