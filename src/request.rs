//! Turning a structured request body into a multipart form.

use crate::error::Result;
use crate::serialize::FormSerializer;
use crate::sink::FormData;
use crate::value::FormValue;

/// Body of an outgoing request.
#[derive(Debug)]
pub enum RequestBody {
    /// A nested value not yet encoded.
    Structured(FormValue),
    Multipart(FormData),
    Text(String),
}

/// The parts of an outgoing request the form layer looks at.
#[derive(Debug, Default)]
pub struct RequestOptions {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl RequestOptions {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<FormValue>) -> Self {
        self.body = Some(RequestBody::Structured(body.into()));
        self
    }

    /// Whether the structured body holds an attachment anywhere.
    pub fn has_attachment(&self) -> bool {
        matches!(&self.body, Some(RequestBody::Structured(value)) if value.contains_attachment())
    }

    /// First header value for `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl FormSerializer {
    /// Serialize the body into a multipart form only if it contains an
    /// attachment; otherwise `options` is returned untouched.
    pub async fn maybe_wrap_as_multipart(&self, options: RequestOptions) -> Result<RequestOptions> {
        if !options.has_attachment() {
            return Ok(options);
        }
        self.force_wrap_as_multipart(options).await
    }

    /// Serialize a structured body into a multipart form unconditionally.
    ///
    /// Bodies that are absent, plain text or already multipart are left
    /// alone. A wrapped request loses its `Content-Type` header so the
    /// transport can write the multipart boundary.
    pub async fn force_wrap_as_multipart(&self, options: RequestOptions) -> Result<RequestOptions> {
        let RequestOptions {
            method,
            url,
            mut headers,
            body,
        } = options;

        let body = match body {
            Some(RequestBody::Structured(value)) => {
                let form = self.create_form(value).await?;
                headers.retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
                tracing::debug!(
                    %method,
                    %url,
                    fields = form.len(),
                    "wrapped request body as multipart"
                );
                Some(RequestBody::Multipart(form))
            }
            other => other,
        };

        Ok(RequestOptions {
            method,
            url,
            headers,
            body,
        })
    }
}

/// [`FormSerializer::maybe_wrap_as_multipart`] with the default configuration.
pub async fn maybe_wrap_as_multipart(options: RequestOptions) -> Result<RequestOptions> {
    FormSerializer::default().maybe_wrap_as_multipart(options).await
}

/// [`FormSerializer::force_wrap_as_multipart`] with the default configuration.
pub async fn force_wrap_as_multipart(options: RequestOptions) -> Result<RequestOptions> {
    FormSerializer::default().force_wrap_as_multipart(options).await
}
