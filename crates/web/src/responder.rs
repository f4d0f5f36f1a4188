//! Response builders handed to every handler.
//!
//! [`Responder`] is a zero sized value with helpers that build response
//! descriptors: a status code, a `Content-Type` header and a body. They have no
//! side effects; the dispatcher adds CORS headers and `Content-Length` when the
//! descriptor is emitted.

use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderValue, Response, StatusCode};
use mime::Mime;
use serde::Serialize;
use tracing::warn;

use crate::body::ResponseBody;

/// How [`Responder::status_as`] renders a status body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RenderAs {
    /// `404 Not Found`
    #[default]
    Text,
    /// `<h1>404 Not Found</h1>`
    Html,
    /// `{"status":404,"message":"Not Found"}`
    Json,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Responder;

#[derive(Serialize)]
struct StatusBody<'a> {
    status: u16,
    message: &'a str,
}

impl Responder {
    /// `200 OK` with a `text/plain` body.
    pub fn text(self, body: impl Into<String>) -> Response<ResponseBody> {
        self.text_with(StatusCode::OK, body)
    }

    pub fn text_with(self, status: StatusCode, body: impl Into<String>) -> Response<ResponseBody> {
        build(status, &mime::TEXT_PLAIN, body.into())
    }

    /// `200 OK` with a `text/html` body.
    pub fn html(self, body: impl Into<String>) -> Response<ResponseBody> {
        self.html_with(StatusCode::OK, body)
    }

    pub fn html_with(self, status: StatusCode, body: impl Into<String>) -> Response<ResponseBody> {
        build(status, &mime::TEXT_HTML, body.into())
    }

    /// `200 OK` with `value` serialized as `application/json`.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Response<ResponseBody> {
        self.json_with(StatusCode::OK, value)
    }

    /// Serializes `value`; a value that fails to serialize answers `500`.
    pub fn json_with<T: Serialize + ?Sized>(self, status: StatusCode, value: &T) -> Response<ResponseBody> {
        match serde_json::to_vec(value) {
            Ok(bytes) => build(status, &mime::APPLICATION_JSON, Bytes::from(bytes)),
            Err(e) => {
                warn!(cause = %e, "serialize json response error");
                self.status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// `302 Found` pointing at `location`; an unrepresentable location answers `500`.
    pub fn redirect(self, location: &str) -> Response<ResponseBody> {
        match HeaderValue::from_str(location) {
            Ok(location) => {
                let mut response = Response::new(ResponseBody::empty());
                *response.status_mut() = StatusCode::FOUND;
                response.headers_mut().insert(LOCATION, location);
                response
            }
            Err(e) => {
                warn!(cause = %e, location, "invalid redirect location");
                self.status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// A plain text status page, e.g. `404 Not Found`.
    pub fn status(self, status: StatusCode) -> Response<ResponseBody> {
        self.status_as(status, None, RenderAs::Text)
    }

    /// A status page rendered as text, html or json. `message` replaces the
    /// canonical reason phrase; a status without one reads `Unknown Status`.
    pub fn status_as(self, status: StatusCode, message: Option<&str>, render_as: RenderAs) -> Response<ResponseBody> {
        let reason = message.or_else(|| status.canonical_reason()).unwrap_or("Unknown Status");
        let code = status.as_u16();

        match render_as {
            RenderAs::Text => build(status, &mime::TEXT_PLAIN, format!("{code} {reason}")),
            RenderAs::Html => build(status, &mime::TEXT_HTML, format!("<h1>{code} {reason}</h1>")),
            RenderAs::Json => self.json_with(status, &StatusBody { status: code, message: reason }),
        }
    }
}

fn build(status: StatusCode, content_type: &Mime, body: impl Into<ResponseBody>) -> Response<ResponseBody> {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
        response.headers_mut().insert(CONTENT_TYPE, value);
    }
    response
}
