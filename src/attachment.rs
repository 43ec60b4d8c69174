//! Binary attachments: named blobs, buffered responses, chunk streams and readers.
//!
//! An [`Attachment`] is only drained into an [`AttachmentPayload`] once the
//! traversal has classified the value and is about to append it.

use std::fmt;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, TryStreamExt};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Name used when no hint yields a usable file name.
pub const DEFAULT_ATTACHMENT_NAME: &str = "blob";

// ============================================================================
// ResponseBody — resolved in-memory response
// ============================================================================

/// A response whose body can be read into memory.
///
/// Implemented by HTTP client adapters; [`BufferedResponse`] covers bodies
/// that are already fully buffered.
#[async_trait]
pub trait ResponseBody: Send {
    /// Final URL of the response, used as a file name hint.
    fn url(&self) -> Option<&str>;

    /// `Content-Type` of the response, used as the MIME hint.
    fn content_type(&self) -> Option<&str>;

    /// Read the whole body.
    async fn read_body(&mut self) -> io::Result<Bytes>;
}

/// Response with a body that is already in memory.
#[derive(Debug, Clone, Default)]
pub struct BufferedResponse {
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl BufferedResponse {
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

#[async_trait]
impl ResponseBody for BufferedResponse {
    fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    async fn read_body(&mut self) -> io::Result<Bytes> {
        Ok(std::mem::take(&mut self.body))
    }
}

// ============================================================================
// Attachment
// ============================================================================

/// Where an attachment's bytes come from.
pub enum AttachmentSource {
    Bytes(Bytes),
    Response(Box<dyn ResponseBody>),
    Stream(BoxStream<'static, io::Result<Bytes>>),
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl AttachmentSource {
    fn kind(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::Response(_) => "response",
            Self::Stream(_) => "stream",
            Self::Reader(_) => "reader",
        }
    }
}

impl fmt::Debug for AttachmentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            other => f.write_str(other.kind()),
        }
    }
}

/// Properties a file name can be derived from, in precedence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameHints {
    pub name: Option<String>,
    pub url: Option<String>,
    pub filename: Option<String>,
    pub path: Option<String>,
}

/// Binary content destined for a form field.
#[derive(Debug)]
pub struct Attachment {
    pub source: AttachmentSource,
    pub hints: NameHints,
    /// Explicit MIME type; wins over anything derived.
    pub mime: Option<String>,
}

impl Attachment {
    pub fn new(source: AttachmentSource) -> Self {
        Self {
            source,
            hints: NameHints::default(),
            mime: None,
        }
    }

    pub fn bytes(bytes: impl Into<Bytes>) -> Self {
        Self::new(AttachmentSource::Bytes(bytes.into()))
    }

    pub fn response(response: impl ResponseBody + 'static) -> Self {
        Self::new(AttachmentSource::Response(Box::new(response)))
    }

    pub fn stream(stream: BoxStream<'static, io::Result<Bytes>>) -> Self {
        Self::new(AttachmentSource::Stream(stream))
    }

    pub fn reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self::new(AttachmentSource::Reader(Box::new(reader)))
    }

    /// Open a file for lazy reading. The file is read when the form is built.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::reader(file).with_path(path.to_string_lossy()))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.hints.name = Some(name.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.hints.url = Some(url.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.hints.filename = Some(filename.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.hints.path = Some(path.into());
        self
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Drain the source and resolve the file name and MIME hint.
    ///
    /// Read errors from the underlying source are returned unchanged.
    pub async fn materialize(self) -> io::Result<AttachmentPayload> {
        let Attachment {
            source,
            hints,
            mime,
        } = self;

        let (bytes, response_url, response_type) = match source {
            AttachmentSource::Bytes(bytes) => (bytes, None, None),
            AttachmentSource::Response(mut response) => {
                let url = response.url().map(str::to_owned);
                let content_type = response.content_type().map(str::to_owned);
                (response.read_body().await?, url, content_type)
            }
            AttachmentSource::Stream(mut stream) => (drain_stream(&mut stream).await?, None, None),
            AttachmentSource::Reader(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf).await?;
                (Bytes::from(buf), None, None)
            }
        };

        let suggested_name = suggest_name(&hints, response_url.as_deref());
        let mime_hint = mime.or(response_type).or_else(|| {
            mime_guess::from_path(&suggested_name)
                .first_raw()
                .map(str::to_owned)
        });

        tracing::debug!(name = %suggested_name, len = bytes.len(), "drained attachment");

        Ok(AttachmentPayload {
            bytes,
            suggested_name,
            mime_hint,
        })
    }
}

/// Fully resolved attachment content as stored in the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPayload {
    pub bytes: Bytes,
    pub suggested_name: String,
    pub mime_hint: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

async fn drain_stream(stream: &mut BoxStream<'static, io::Result<Bytes>>) -> io::Result<Bytes> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = stream.try_next().await? {
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

/// Pick the file name from `name` > `url` > `filename` > `path`.
fn suggest_name(hints: &NameHints, response_url: Option<&str>) -> String {
    let url = hints.url.as_deref().or(response_url);
    [
        hints.name.as_deref().map(last_segment),
        url.map(url_segment),
        hints.filename.as_deref().map(last_segment),
        hints.path.as_deref().map(last_segment),
    ]
    .into_iter()
    .flatten()
    .find(|segment| !segment.is_empty())
    .unwrap_or(DEFAULT_ATTACHMENT_NAME)
    .to_string()
}

fn last_segment(s: &str) -> &str {
    s.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(s)
}

fn url_segment(url: &str) -> &str {
    let without_query = url.split(|c: char| c == '?' || c == '#').next().unwrap_or(url);
    last_segment(without_query)
}
