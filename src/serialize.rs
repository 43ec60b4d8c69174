//! Recursive traversal from a nested [`FormValue`] to ordered form fields.
//!
//! Children are awaited one at a time in source order, so the order of
//! fields in the sink always matches array index order and object
//! insertion order. A failed run never hands back a partial sink.

use futures::future::{BoxFuture, FutureExt};
use indexmap::IndexMap;

use crate::classify::{classify, scalar_text, Classified};
use crate::config::{ArrayFormat, FormConfig, FormOptions};
use crate::depth::check_depth;
use crate::error::{FormError, Result};
use crate::key::{array_key, encode_segment, object_key};
use crate::sink::{FieldValue, FormData};
use crate::value::FormValue;

// ============================================================================
// FormSerializer
// ============================================================================

/// A serialization engine bound to one resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct FormSerializer {
    config: FormConfig,
}

impl FormSerializer {
    pub fn new(config: FormConfig) -> Self {
        Self { config }
    }

    pub fn from_options(options: FormOptions) -> Result<Self> {
        Ok(Self::new(FormConfig::resolve(options)?))
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Serialize the top-level properties of `body` into a fresh form.
    ///
    /// `body` must be an object; `Undefined` yields an empty form.
    pub async fn create_form(&self, body: FormValue) -> Result<FormData> {
        let mut form = FormData::new();
        match body {
            FormValue::Undefined => {}
            FormValue::Object(map) => self.serialize_properties(&mut form, map).await?,
            other => {
                return Err(FormError::UnsupportedValueType {
                    key: String::new(),
                    kind: other.kind(),
                })
            }
        }

        tracing::debug!(
            fields = form.len(),
            array_strategy = ?self.config.array_strategy(),
            object_strategy = ?self.config.object_strategy(),
            "created form"
        );
        Ok(form)
    }

    /// Serialize one field at depth 0 and append its entries to `sink`.
    pub async fn add_field_value(
        &self,
        sink: &mut FormData,
        key: &str,
        value: FormValue,
    ) -> Result<()> {
        self.add_field_value_at(sink, key, value, 0).await
    }

    /// Like [`add_field_value`](Self::add_field_value), starting at `depth`.
    ///
    /// `key` is a raw field name and is percent-encoded like every nested
    /// segment when `encode_keys` is set. Entries are appended only if the
    /// whole value serializes; on error `sink` is left as it was.
    pub async fn add_field_value_at(
        &self,
        sink: &mut FormData,
        key: &str,
        value: FormValue,
        depth: usize,
    ) -> Result<()> {
        let mut scratch = FormData::new();
        self.serialize(&mut scratch, self.root_key(key), value, depth).await?;
        sink.extend_from(scratch);
        Ok(())
    }

    async fn serialize_properties(
        &self,
        form: &mut FormData,
        map: IndexMap<String, FormValue>,
    ) -> Result<()> {
        for (name, value) in map {
            self.serialize(form, self.root_key(&name), value, 0).await?;
        }
        Ok(())
    }

    fn root_key(&self, name: &str) -> String {
        encode_segment(name, self.config.encode_keys()).into_owned()
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    fn serialize<'a>(
        &'a self,
        sink: &'a mut FormData,
        key: String,
        value: FormValue,
        depth: usize,
    ) -> BoxFuture<'a, Result<()>> {
        self.serialize_value(sink, key, value, depth).boxed()
    }

    async fn serialize_value(
        &self,
        sink: &mut FormData,
        key: String,
        value: FormValue,
        depth: usize,
    ) -> Result<()> {
        let classified = classify(value);
        if !matches!(classified, Classified::Undefined | Classified::Null) {
            check_depth(depth, self.config.max_depth(), &key)?;
        }

        match classified {
            Classified::Undefined => Ok(()),
            Classified::Null => Err(FormError::NullValueRejected { key }),
            Classified::Scalar(text) => {
                tracing::trace!(field = %key, "append text field");
                sink.append(key, FieldValue::Text(text));
                Ok(())
            }
            Classified::Attachment(attachment) => {
                let payload = attachment.materialize().await?;
                tracing::trace!(field = %key, file = %payload.suggested_name, "append attachment");
                sink.append(key, FieldValue::Attachment(payload));
                Ok(())
            }
            Classified::Array(items) => self.serialize_array(sink, key, items, depth).await,
            Classified::Object(map) => {
                for (property, child) in map {
                    let child_key = object_key(
                        &key,
                        &property,
                        self.config.object(),
                        self.config.encode_keys(),
                    );
                    self.serialize(sink, child_key, child, depth + 1).await?;
                }
                Ok(())
            }
            Classified::Unsupported(kind) => {
                Err(FormError::UnsupportedValueType { key, kind })
            }
        }
    }

    async fn serialize_array(
        &self,
        sink: &mut FormData,
        key: String,
        items: Vec<FormValue>,
        depth: usize,
    ) -> Result<()> {
        if let ArrayFormat::CommaJoined {
            delimiter,
            round_trip,
        } = self.config.array()
        {
            let joined = join_scalars(&items, delimiter);
            if let Some((value, count)) = joined {
                match count {
                    0 => {}
                    1 if *round_trip => sink.append(format!("{key}[]"), FieldValue::Text(value)),
                    _ => sink.append(key, FieldValue::Text(value)),
                }
                return Ok(());
            }
            tracing::trace!(field = %key, "array has non-scalar elements, not joining");
        }

        for (index, item) in items.into_iter().enumerate() {
            let child_key = array_key(&key, index, self.config.array());
            self.serialize(sink, child_key, item, depth + 1).await?;
        }
        Ok(())
    }
}

/// Join the defined elements of an all-scalar array.
///
/// Returns the joined text and the number of joined elements, or `None`
/// when any element is not a scalar.
fn join_scalars(items: &[FormValue], delimiter: &str) -> Option<(String, usize)> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        if item.is_undefined() {
            continue;
        }
        parts.push(scalar_text(item)?);
    }
    Some((parts.join(delimiter), parts.len()))
}

// ============================================================================
// Free functions
// ============================================================================

/// Resolve `options` and serialize `body` into a fresh form.
pub async fn create_form(body: FormValue, options: FormOptions) -> Result<FormData> {
    FormSerializer::from_options(options)?.create_form(body).await
}

/// Resolve `options` and serialize one field into `sink` starting at `depth`.
pub async fn add_field_value(
    sink: &mut FormData,
    key: &str,
    value: FormValue,
    options: FormOptions,
    depth: usize,
) -> Result<()> {
    FormSerializer::from_options(options)?
        .add_field_value_at(sink, key, value, depth)
        .await
}
