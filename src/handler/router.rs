//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, CORS
//! preflight, dispatch to the file handler, and access logging.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body::Body as _;
use hyper::{Method, Request, Response};

use crate::config::AppState;
use crate::handler::files;
use crate::http::{self, ResponseBody};
use crate::logger::{self, AccessLogEntry, LogFormat};

/// Request context encapsulating what the file handler needs
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub range_header: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<ResponseBody>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = match check_http_method(&method) {
        Some(resp) => resp,
        None => {
            let ctx = RequestContext {
                path: uri.path(),
                is_head: method == Method::HEAD,
                range_header: header_value(&req, "range"),
            };
            files::serve_path(&ctx, &state.root).await
        }
    };

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            method.to_string(),
            uri.path().to_string(),
        );
        entry.query = uri.query().map(ToString::to_string);
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.referer = header_value(&req, "referer");
        entry.user_agent = header_value(&req, "user-agent");
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(
            &entry,
            LogFormat::parse(&state.config.logging.access_log_format),
        );
    }

    Ok(response)
}

/// Short-circuit responses decided by method alone: CORS preflight for
/// OPTIONS, 405 for anything that is not a read.
fn check_http_method(method: &Method) -> Option<Response<ResponseBody>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response()),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

fn header_value(req: &Request<hyper::body::Incoming>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_pass_through() {
        assert!(check_http_method(&Method::GET).is_none());
        assert!(check_http_method(&Method::HEAD).is_none());
    }

    #[test]
    fn options_gets_preflight_reply() {
        let resp = check_http_method(&Method::OPTIONS).expect("preflight response");
        assert_eq!(resp.status(), 200);
        assert_eq!(
            resp.headers()["Access-Control-Allow-Methods"],
            "GET, HEAD, OPTIONS"
        );
        assert_eq!(resp.headers()["Access-Control-Allow-Headers"], "Range");
    }

    #[test]
    fn writes_are_rejected() {
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let resp = check_http_method(&method).expect("405 response");
            assert_eq!(resp.status(), 405);
            assert_eq!(resp.headers()["Allow"], "GET, HEAD, OPTIONS");
        }
    }
}
