//! Field name composition for nested keys.
//!
//! Only the child segment is encoded at each step; the parent key was
//! already encoded when it was built.

use std::borrow::Cow;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::{ArrayFormat, KeySegment, ObjectFormat};

/// Characters left alone by `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single key segment when `encode` is set.
pub fn encode_segment(segment: &str, encode: bool) -> Cow<'_, str> {
    if encode {
        utf8_percent_encode(segment, COMPONENT).into()
    } else {
        Cow::Borrowed(segment)
    }
}

/// Field name for the element at `index` of the array at `parent`.
///
/// `CommaJoined` only reaches here for arrays that cannot be joined, which
/// are named like `BracketEmpty`.
pub fn array_key(parent: &str, index: usize, format: &ArrayFormat) -> String {
    match format {
        ArrayFormat::BracketEmpty | ArrayFormat::CommaJoined { .. } => format!("{parent}[]"),
        ArrayFormat::BracketIndexed => format!("{parent}[{index}]"),
        ArrayFormat::Repeat => parent.to_string(),
        ArrayFormat::Custom(formatter) => formatter(parent, KeySegment::Index(index)),
    }
}

/// Field name for `property` of the object at `parent`.
pub fn object_key(parent: &str, property: &str, format: &ObjectFormat, encode: bool) -> String {
    let property = encode_segment(property, encode);
    match format {
        ObjectFormat::Bracket => format!("{parent}[{property}]"),
        ObjectFormat::Dot => format!("{parent}.{property}"),
        ObjectFormat::Underscore => format!("{parent}_{property}"),
        ObjectFormat::Custom(formatter) => formatter(parent, KeySegment::Property(&property)),
    }
}
