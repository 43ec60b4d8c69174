//! Integration tests for form serialization and request wrapping.

mod attachments;
mod properties;
