//! Static file serving.
//!
//! Resolves request paths under the serving root, negotiates byte ranges
//! against the file's actual size, and hands the open file to the chunked
//! streamer. Directories fall back to an index file when one exists, or an
//! HTML listing otherwise; range logic never applies to those.

use std::path::{Component, Path, PathBuf};

use hyper::Response;
use tokio::fs;

use crate::handler::router::RequestContext;
use crate::http::{self, body, mime, response, RangeOutcome, ResponseBody};
use crate::logger;

/// Index files tried, in order, when a directory is requested.
const INDEX_FILES: &[&str] = &["index.html", "index.htm"];

/// Serve the resource named by the request path.
pub async fn serve_path(ctx: &RequestContext<'_>, root: &Path) -> Response<ResponseBody> {
    let Some(resolved) = resolve_path(root, ctx.path) else {
        return http::build_404_response();
    };

    if resolved.is_dir() {
        return serve_directory(ctx, &resolved).await;
    }

    serve_file(ctx, &resolved).await
}

/// Resolve a request path to a filesystem location under `root`.
///
/// The path is percent-decoded, joined beneath the root, and
/// canonicalized; the result must stay within the (already canonical)
/// root. Any failure - nonexistent file, traversal attempt, NUL byte -
/// resolves to `None` and becomes a 404.
fn resolve_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = percent_decode(request_path);
    if decoded.contains('\0') {
        return None;
    }

    let relative = decoded.trim_start_matches('/');
    if Path::new(relative)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }

    let canonical = root.join(relative).canonicalize().ok()?;
    if canonical.starts_with(root) {
        Some(canonical)
    } else {
        logger::log_warning(&format!(
            "Path traversal attempt blocked: {} -> {}",
            request_path,
            canonical.display()
        ));
        None
    }
}

/// Decode `%XX` escapes, leniently: invalid escapes pass through literally.
fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Serve a regular file, honoring a recognized `Range` header.
async fn serve_file(ctx: &RequestContext<'_>, path: &Path) -> Response<ResponseBody> {
    // Open failure of any kind means 404, with nothing held open
    let Ok(file) = fs::File::open(path).await else {
        return http::build_404_response();
    };

    let meta = match file.metadata().await {
        Ok(m) => m,
        Err(e) => {
            logger::log_error(&format!("Failed to stat '{}': {e}", path.display()));
            return http::build_404_response();
        }
    };

    if !meta.is_file() {
        return http::build_404_response();
    }

    let file_size = meta.len();
    let last_modified = meta.modified().ok();
    let content_type = mime::content_type(path.extension().and_then(|e| e.to_str()));

    match http::evaluate_range(ctx.range_header.as_deref(), file_size) {
        RangeOutcome::Partial(range) => {
            let range_body = if ctx.is_head {
                body::empty()
            } else {
                body::file_stream(file, range.start, range.len())
            };
            response::build_partial_response(
                range_body,
                range,
                file_size,
                content_type,
                last_modified,
            )
        }
        RangeOutcome::Unsatisfiable => {
            // File handle released before the 416 goes out
            drop(file);
            http::build_416_response(file_size)
        }
        RangeOutcome::Full => {
            let file_body = if ctx.is_head {
                body::empty()
            } else {
                body::file_stream(file, 0, file_size)
            };
            response::build_file_response(file_body, file_size, content_type, last_modified)
        }
    }
}

/// Serve a directory: index file if present, listing otherwise.
async fn serve_directory(ctx: &RequestContext<'_>, dir: &Path) -> Response<ResponseBody> {
    for index in INDEX_FILES {
        let candidate = dir.join(index);
        if candidate.is_file() {
            return serve_file(ctx, &candidate).await;
        }
    }

    build_listing(ctx, dir).await
}

/// Render a sorted HTML listing of a directory.
async fn build_listing(ctx: &RequestContext<'_>, dir: &Path) -> Response<ResponseBody> {
    let mut reader = match fs::read_dir(dir).await {
        Ok(r) => r,
        Err(e) => {
            logger::log_error(&format!("Failed to list '{}': {e}", dir.display()));
            return http::build_404_response();
        }
    };

    let mut names = Vec::new();
    loop {
        match reader.next_entry().await {
            Ok(Some(entry)) => {
                let mut name = entry.file_name().to_string_lossy().into_owned();
                if entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                    name.push('/');
                }
                names.push(name);
            }
            Ok(None) => break,
            Err(e) => {
                logger::log_warning(&format!("Error while listing '{}': {e}", dir.display()));
                break;
            }
        }
    }
    names.sort();

    response::build_html_response(render_listing(ctx.path, &names), ctx.is_head)
}

fn render_listing(request_path: &str, names: &[String]) -> String {
    let title = format!("Directory listing for {}", html_escape(request_path));

    let mut html = String::with_capacity(512 + names.len() * 64);
    html.push_str("<!DOCTYPE HTML>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{title}</title>\n</head>\n<body>\n"));
    html.push_str(&format!("<h1>{title}</h1>\n<hr>\n<ul>\n"));
    for name in names {
        html.push_str(&format!(
            "<li><a href=\"{}\">{}</a></li>\n",
            percent_encode_href(name),
            html_escape(name)
        ));
    }
    html.push_str("</ul>\n<hr>\n</body>\n</html>\n");
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Percent-encode a file name for use in a listing href.
fn percent_encode_href(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
