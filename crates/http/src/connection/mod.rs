//! HTTP connection handling module
//!
//! This module drives one accepted byte stream through the HTTP/1.1 protocol and
//! hands every decoded request to a [`Handler`](crate::handler::Handler).
//!
//! # Components
//!
//! - [`HttpConnection`]: Main connection handler that:
//!   - Manages the lifecycle of HTTP connections
//!   - Processes incoming requests
//!   - Handles response streaming
//!   - Supports keep-alive connections

mod http_connection;

pub use http_connection::HttpConnection;
