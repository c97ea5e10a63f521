//! Browser views of the JSON responses.
//!
//! Handlers answer with HTML when the client's `Accept` header names
//! `text/html`; API clients keep getting JSON.

use actix_web::http::header::{self, ContentType};
use actix_web::{HttpRequest, HttpResponse};
use common::{AdminSnapshotResponse, FileInfo, FileListResponse, UploadResponse};
use std::fmt::Write;

const BOOTSTRAP_CSS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/twitter-bootstrap/5.0.2/css/bootstrap.min.css";

/// True when the client prefers a page over JSON
pub fn wants_html(req: &HttpRequest) -> bool {
    req.headers()
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(|accept| accept.contains("text/html"))
        .unwrap_or(false)
}

pub fn html(status: actix_web::http::StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type(ContentType::html())
        .body(body)
}

/// Escape text placed in element content or a quoted attribute
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <link rel="stylesheet" href="{css}">
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
{content}
    </div>
</body>
</html>
"#,
        title = escape(title),
        css = BOOTSTRAP_CSS,
    )
}

pub fn render_list(listing: &FileListResponse) -> String {
    let mut rows = String::new();
    for file in &listing.files {
        let name = urlencoding::encode(&file.name);
        let _ = write!(
            rows,
            r#"
                <tr>
                    <td><a href="{url}">{label}</a></td>
                    <td>{size}</td>
                    <td>
                        <a href="/file/{name}/direct-link" class="btn btn-primary btn-sm">Copy link</a>
                        <a href="/file/{name}" class="btn btn-secondary btn-sm">Details</a>
                    </td>
                </tr>"#,
            url = escape(&file.url),
            label = escape(&file.name),
            size = file.size_bytes,
        );
    }
    layout(
        "Files",
        &format!(
            r#"        <table class="table">
            <thead><tr><th>Name</th><th>Size (bytes)</th><th></th></tr></thead>
            <tbody>{rows}
            </tbody>
        </table>
        <a href="/" class="btn btn-primary">Upload</a>"#
        ),
    )
}

pub fn render_file(file: &FileInfo) -> String {
    layout(
        "File details",
        &format!(
            r#"        <p>Name: {name}</p>
        <p>Size: {size} bytes</p>
        <p>Uploaded: {created}</p>
        <p>URL: <a href="{url}">{url}</a></p>
        <a href="/list" class="btn btn-secondary">File list</a>"#,
            name = escape(&file.name),
            size = file.size_bytes,
            created = file.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            url = escape(&file.url),
        ),
    )
}

pub fn render_uploaded(upload: &UploadResponse) -> String {
    layout(
        "Upload complete",
        &format!(
            r#"        <p>File: {name}</p>
        <p>URL: <a href="{link}">{link}</a></p>
        <a href="/" class="btn btn-primary">Back to home</a>"#,
            name = escape(&upload.file.name),
            link = escape(&upload.direct_link),
        ),
    )
}

pub fn render_admin(snapshot: &AdminSnapshotResponse) -> String {
    let mut rows = String::new();
    for file in &snapshot.files {
        let _ = write!(
            rows,
            r#"
                <tr>
                    <td>{label}</td>
                    <td>{size}</td>
                    <td><a href="/admin/file/{name}/delete" class="btn btn-danger btn-sm">Delete</a></td>
                </tr>"#,
            label = escape(&file.name),
            size = file.size_bytes,
            name = urlencoding::encode(&file.name),
        );
    }

    let mut warnings = String::new();
    if !snapshot.degraded.is_empty() {
        let _ = write!(
            warnings,
            r#"        <div class="alert alert-warning">Unavailable: {}</div>
"#,
            escape(&snapshot.degraded.join(", "))
        );
    }

    let log = escape(&snapshot.log_tail.join("\n"));
    layout(
        "Admin",
        &format!(
            r#"{warnings}        <p>Day: {day}</p>
        <p>Uploads today: {uploads}</p>
        <p>Downloads today: {downloads}</p>
        <h2>Recent log</h2>
        <pre>{log}</pre>
        <h2>Files</h2>
        <table class="table">
            <thead><tr><th>Name</th><th>Size (bytes)</th><th></th></tr></thead>
            <tbody>{rows}
            </tbody>
        </table>
        <a href="/admin/logout" class="btn btn-secondary">Log out</a>"#,
            day = snapshot.day,
            uploads = snapshot.uploads_today,
            downloads = snapshot.downloads_today,
        ),
    )
}
