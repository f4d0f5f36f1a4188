//! Core HTTP protocol abstractions.
//!
//! This module provides the types exchanged between the connection driver and
//! request handlers:
//!
//! - **Request Processing** ([`request`]): Request header handling
//!   - [`RequestHeader`]: Wraps HTTP request headers with additional functionality
//!
//! - **Body Streaming** ([`body`]): Request body implementation
//!   - [`ReqBody`](body::ReqBody): Consumer side implementing `http_body::Body`
//!
//! - **Error Handling** ([`error`]): Error types
//!   - [`HttpError`]: Top-level error type
//!   - [`ParseError`]: Request reading errors
//!   - [`SendError`]: Response sending errors

mod request;
pub use request::RequestHeader;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod body;
