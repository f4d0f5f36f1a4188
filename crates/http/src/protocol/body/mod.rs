//! HTTP request body handling implementation.
//!
//! [`ReqBody`] is the consumer side of a request body. It implements
//! `http_body::Body`, so handlers can stream frames or collect the whole
//! payload with `http_body_util::BodyExt`.
//!
//! Frames are pulled from the connection only when the consumer polls for them.
//! A body the handler never reads is drained by the connection driver before the
//! next request on a keep-alive connection is parsed.

mod req_body;

pub use req_body::ReqBody;
