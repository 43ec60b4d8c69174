use std::io;

use bytes::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use less_form::{
    create_form, maybe_wrap_as_multipart, Attachment, BufferedResponse, FieldValue, FormErrorKind,
    FormOptions, FormValue, Preset, RequestBody, RequestOptions, DEFAULT_ATTACHMENT_NAME,
};

// ============================================================================
// Helpers
// ============================================================================

fn chunks(parts: &[&'static str]) -> BoxStream<'static, io::Result<Bytes>> {
    let items: Vec<io::Result<Bytes>> = parts
        .iter()
        .map(|p| Ok(Bytes::from_static(p.as_bytes())))
        .collect();
    stream::iter(items).boxed()
}

fn failing_stream() -> BoxStream<'static, io::Result<Bytes>> {
    let items: Vec<io::Result<Bytes>> = vec![
        Ok(Bytes::from_static(b"half")),
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "upload aborted")),
    ];
    stream::iter(items).boxed()
}

// ============================================================================
// Attachments inside nested structures
// ============================================================================

#[tokio::test]
async fn attachments_keep_their_position() {
    let body = FormValue::object([
        ("title", FormValue::from("Album")),
        (
            "photos",
            FormValue::array([
                FormValue::object([
                    ("caption", FormValue::from("first")),
                    (
                        "file",
                        FormValue::from(Attachment::bytes(&b"\x89PNG"[..]).with_name("one.png")),
                    ),
                ]),
                FormValue::object([
                    ("caption", FormValue::from("second")),
                    (
                        "file",
                        FormValue::from(
                            Attachment::stream(chunks(&["GIF", "89a"])).with_filename("two.gif"),
                        ),
                    ),
                ]),
            ]),
        ),
    ]);

    let form = create_form(body, FormOptions::preset(Preset::Indexed)).await.unwrap();
    let names: Vec<&str> = form.names().collect();
    assert_eq!(
        names,
        [
            "title",
            "photos[0][caption]",
            "photos[0][file]",
            "photos[1][caption]",
            "photos[1][file]",
        ]
    );

    let second = form
        .get("photos[1][file]")
        .and_then(FieldValue::as_attachment)
        .unwrap();
    assert_eq!(second.bytes.as_ref(), b"GIF89a");
    assert_eq!(second.suggested_name, "two.gif");
    assert_eq!(second.mime_hint.as_deref(), Some("image/gif"));
}

#[tokio::test]
async fn comma_strategy_does_not_join_attachments() {
    let body = FormValue::object([(
        "docs",
        FormValue::array([
            FormValue::from(Attachment::bytes(&b"a"[..]).with_name("a.txt")),
            FormValue::from(Attachment::bytes(&b"b"[..]).with_name("b.txt")),
        ]),
    )]);
    let form = create_form(body, FormOptions::preset(Preset::Comma)).await.unwrap();
    let names: Vec<&str> = form
        .get_all("docs[]")
        .filter_map(FieldValue::as_attachment)
        .map(|a| a.suggested_name.as_str())
        .collect();
    assert_eq!(names, ["a.txt", "b.txt"]);
}

#[tokio::test]
async fn response_attachment_uses_response_metadata() {
    let response = BufferedResponse::new(&b"name,qty\n"[..])
        .with_url("https://files.example.com/exports/stock.csv?token=1")
        .with_content_type("text/csv");
    let body = FormValue::object([("export", FormValue::from(Attachment::response(response)))]);
    let form = create_form(body, FormOptions::default()).await.unwrap();
    let export = form.get("export").and_then(FieldValue::as_attachment).unwrap();
    assert_eq!(export.suggested_name, "stock.csv");
    assert_eq!(export.mime_hint.as_deref(), Some("text/csv"));
}

#[tokio::test]
async fn unnamed_blob_gets_placeholder() {
    let body = FormValue::object([("data", FormValue::from(Attachment::bytes(vec![0u8; 4])))]);
    let form = create_form(body, FormOptions::default()).await.unwrap();
    let data = form.get("data").and_then(FieldValue::as_attachment).unwrap();
    assert_eq!(data.suggested_name, DEFAULT_ATTACHMENT_NAME);
    assert_eq!(data.bytes.len(), 4);
}

#[tokio::test]
async fn file_attachment_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "# notes\n").unwrap();

    let attachment = Attachment::open(&path).await.unwrap();
    let body = FormValue::object([("doc", FormValue::from(attachment))]);
    let form = create_form(body, FormOptions::default()).await.unwrap();
    let doc = form.get("doc").and_then(FieldValue::as_attachment).unwrap();
    assert_eq!(doc.bytes.as_ref(), b"# notes\n");
    assert_eq!(doc.suggested_name, "notes.md");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn stream_failure_aborts_whole_form() {
    let body = FormValue::object([
        ("before", FormValue::from("ok")),
        ("upload", FormValue::from(Attachment::stream(failing_stream()))),
        ("after", FormValue::from("never")),
    ]);
    let err = create_form(body, FormOptions::default()).await.unwrap_err();
    assert_eq!(err.kind(), FormErrorKind::Io);
    assert_eq!(err.to_string(), "upload aborted");
}

#[tokio::test]
async fn attachment_past_depth_limit_is_not_drained() {
    let body = FormValue::object([(
        "wrap",
        FormValue::object([(
            "a",
            FormValue::object([("b", FormValue::from(Attachment::stream(failing_stream())))]),
        )]),
    )]);
    let options = FormOptions {
        max_depth: Some(1),
        ..Default::default()
    };
    let err = create_form(body, options).await.unwrap_err();
    assert_eq!(err.kind(), FormErrorKind::MaxDepthExceeded);
    assert_eq!(err.key(), Some("wrap[a][b]"));
}

// ============================================================================
// Request wrapping
// ============================================================================

#[tokio::test]
async fn wrap_only_when_attachment_present() {
    let plain =
        RequestOptions::new("POST", "/notes").with_body(serde_json::json!({ "text": "hi" }));
    let plain = maybe_wrap_as_multipart(plain).await.unwrap();
    assert!(matches!(plain.body, Some(RequestBody::Structured(_))));

    let upload = RequestOptions::new("POST", "/notes").with_body(FormValue::object([
        ("text", FormValue::from("hi")),
        (
            "meta",
            FormValue::object([(
                "thumb",
                FormValue::from(Attachment::bytes(&b"jpg"[..]).with_name("t.jpg")),
            )]),
        ),
    ]));
    let upload = maybe_wrap_as_multipart(upload).await.unwrap();
    let Some(RequestBody::Multipart(form)) = upload.body else {
        panic!("expected multipart body");
    };
    assert_eq!(form.len(), 2);
    assert!(form.get("meta[thumb]").and_then(FieldValue::as_attachment).is_some());
}
