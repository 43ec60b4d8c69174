//! Flatten nested values into multipart form fields.
//!
//! A [`FormValue`] (scalars, arrays, objects and binary attachments) is
//! walked depth-first and emitted as an ordered list of `(name, value)`
//! pairs in a [`FormData`]. Nesting is encoded into field names according
//! to the array and object strategies of a [`FormConfig`].
//!
//! Transport is handled by the caller; this crate only produces field
//! names and attachment payloads.

pub mod attachment;
pub mod classify;
pub mod config;
pub mod depth;
pub mod error;
pub mod key;
pub mod request;
pub mod serialize;
pub mod sink;
pub mod value;

pub use attachment::{
    Attachment, AttachmentPayload, AttachmentSource, BufferedResponse, NameHints, ResponseBody,
    DEFAULT_ATTACHMENT_NAME,
};
pub use classify::{classify, Classified};
pub use config::{
    ArrayFormat, ArrayStrategy, FormConfig, FormOptions, KeyFormatter, KeySegment, ObjectFormat,
    ObjectStrategy, Preset, DEFAULT_ARRAY_DELIMITER, DEFAULT_MAX_DEPTH,
};
pub use error::{FormError, FormErrorKind, Result};
pub use request::{force_wrap_as_multipart, maybe_wrap_as_multipart, RequestBody, RequestOptions};
pub use serialize::{add_field_value, create_form, FormSerializer};
pub use sink::{FieldValue, FormData};
pub use value::FormValue;
