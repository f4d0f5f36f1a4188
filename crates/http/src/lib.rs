//! The transport adapter of the appy request router.
//!
//! This crate turns an accepted byte stream into a sequence of
//! `http::Request<ReqBody>` values and writes back whatever `http::Response`
//! the [`handler::Handler`] produces. The HTTP/1.1 wire protocol itself is
//! driven by hyper; this crate owns the request/response primitive pair that
//! the router consumes.
//!
//! # Example
//!
//! ```no_run
//! use bytes::Bytes;
//! use http::{Request, Response, StatusCode};
//! use http_body_util::{BodyExt, Full};
//! use std::error::Error;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//! use tracing::{error, info, warn};
//! use appy_http::connection::HttpConnection;
//! use appy_http::handler::make_handler;
//! use appy_http::protocol::body::ReqBody;
//!
//! #[tokio::main]
//! async fn main() {
//!     info!(port = 8080, "start listening");
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = Arc::clone(&handler);
//!
//!         tokio::spawn(async move {
//!             let connection = HttpConnection::new(tcp_stream);
//!             if let Err(e) = connection.process(handler).await {
//!                 error!("service has error, cause {}, connection shutdown", e);
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: Request<ReqBody>) -> Result<Response<Full<Bytes>>, Box<dyn Error + Send + Sync>> {
//!     let body_bytes = request.into_body().collect().await?.to_bytes();
//!     info!(len = body_bytes.len(), "receiving request body");
//!
//!     let response = Response::builder()
//!         .status(StatusCode::OK)
//!         .body(Full::new(Bytes::from_static(b"Hello World!\r\n")))?;
//!
//!     Ok(response)
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: Connection lifecycle, one [`connection::HttpConnection`] per accepted stream
//! - [`protocol`]: Request head, streaming request body and error types
//! - [`handler`]: The [`handler::Handler`] trait and [`handler::make_handler`]
//!
//! # Error Handling
//!
//! - [`protocol::HttpError`]: Top-level error type
//! - [`protocol::ParseError`]: Request reading errors
//! - [`protocol::SendError`]: Response sending errors
//!
//! # Limitations
//!
//! - HTTP/1.1 only
//! - No TLS support (use a reverse proxy for HTTPS)

pub mod connection;
pub mod handler;
pub mod protocol;
