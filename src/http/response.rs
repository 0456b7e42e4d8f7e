//! HTTP response building.
//!
//! One builder per status code, decoupled from path resolution and file
//! I/O. File responses carry the headers browsers need for media seeking:
//! `Accept-Ranges`, `Content-Range` on partial replies, and a permissive
//! CORS origin.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use hyper::Response;

use super::body::{self, ResponseBody};
use super::range::ActiveRange;
use crate::logger;

/// Format a timestamp as an IMF-fixdate for `Last-Modified`.
#[must_use]
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Build 200 OK response for a complete file.
///
/// `body` is expected to cover the entire file (or be empty for HEAD); the
/// advertised `Content-Length` is always the true file size.
pub fn build_file_response(
    file_body: ResponseBody,
    file_size: u64,
    content_type: &str,
    last_modified: Option<SystemTime>,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(200)
        .header("Content-Type", content_type)
        .header("Content-Length", file_size)
        .header("Accept-Ranges", "bytes")
        .header("Access-Control-Allow-Origin", "*");

    if let Some(time) = last_modified {
        builder = builder.header("Last-Modified", http_date(time));
    }

    builder.body(file_body).unwrap_or_else(|e| {
        log_build_error("200", &e);
        Response::new(body::empty())
    })
}

/// Build 206 Partial Content response covering `range` within the file.
pub fn build_partial_response(
    range_body: ResponseBody,
    range: ActiveRange,
    file_size: u64,
    content_type: &str,
    last_modified: Option<SystemTime>,
) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(206)
        .header("Content-Type", content_type)
        .header("Content-Length", range.len())
        .header("Content-Range", range.content_range(file_size))
        .header("Accept-Ranges", "bytes")
        .header("Access-Control-Allow-Origin", "*");

    if let Some(time) = last_modified {
        builder = builder.header("Last-Modified", http_date(time));
    }

    builder.body(range_body).unwrap_or_else(|e| {
        log_build_error("206", &e);
        Response::new(body::empty())
    })
}

/// Build 416 Range Not Satisfiable response. Empty body; the current
/// resource extent is advertised so clients can retry with a valid span.
pub fn build_416_response(file_size: u64) -> Response<ResponseBody> {
    Response::builder()
        .status(416)
        .header("Content-Range", format!("bytes */{file_size}"))
        .header("Access-Control-Allow-Origin", "*")
        .body(body::empty())
        .unwrap_or_else(|e| {
            log_build_error("416", &e);
            Response::new(body::empty())
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(body::full("404 File not found"))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(body::full("404 File not found"))
        })
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    Response::builder()
        .status(405)
        .header("Content-Type", "text/plain")
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(body::full("405 Method Not Allowed"))
        .unwrap_or_else(|e| {
            log_build_error("405", &e);
            Response::new(body::full("405 Method Not Allowed"))
        })
}

/// Build the CORS preflight reply: permissive origin, the read-only method
/// set, and the `Range` request header. No path resolution happens for
/// OPTIONS requests.
pub fn build_options_response() -> Response<ResponseBody> {
    Response::builder()
        .status(200)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, HEAD, OPTIONS")
        .header("Access-Control-Allow-Headers", "Range")
        .body(body::empty())
        .unwrap_or_else(|e| {
            log_build_error("OPTIONS", &e);
            Response::new(body::empty())
        })
}

/// Build generic HTML response (directory listings)
pub fn build_html_response(content: String, is_head: bool) -> Response<ResponseBody> {
    let content_length = content.len();
    let html_body = if is_head {
        body::empty()
    } else {
        body::full(content)
    };

    Response::builder()
        .status(200)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .body(html_body)
        .unwrap_or_else(|e| {
            log_build_error("HTML", &e);
            Response::new(body::empty())
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn http_date_is_imf_fixdate() {
        // 2021-01-01 00:00:00 UTC
        let time = UNIX_EPOCH + Duration::from_secs(1_609_459_200);
        assert_eq!(http_date(time), "Fri, 01 Jan 2021 00:00:00 GMT");
    }

    #[test]
    fn full_response_headers() {
        let resp = build_file_response(body::empty(), 1234, "video/mp4", None);
        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["Content-Type"], "video/mp4");
        assert_eq!(resp.headers()["Content-Length"], "1234");
        assert_eq!(resp.headers()["Accept-Ranges"], "bytes");
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
        assert!(resp.headers().get("Content-Range").is_none());
    }

    #[test]
    fn partial_response_headers() {
        let range = ActiveRange {
            start: 500_000,
            end: 500_999,
        };
        let resp = build_partial_response(body::empty(), range, 1_000_000, "video/mp4", None);
        assert_eq!(resp.status(), 206);
        assert_eq!(resp.headers()["Content-Length"], "1000");
        assert_eq!(
            resp.headers()["Content-Range"],
            "bytes 500000-500999/1000000"
        );
        assert_eq!(resp.headers()["Accept-Ranges"], "bytes");
    }

    #[test]
    fn unsatisfiable_response_headers() {
        let resp = build_416_response(1_000_000);
        assert_eq!(resp.status(), 416);
        assert_eq!(resp.headers()["Content-Range"], "bytes */1000000");
    }

    #[test]
    fn preflight_headers() {
        let resp = build_options_response();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()["Access-Control-Allow-Methods"],
            "GET, HEAD, OPTIONS"
        );
        assert_eq!(resp.headers()["Access-Control-Allow-Headers"], "Range");
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
    }
}
