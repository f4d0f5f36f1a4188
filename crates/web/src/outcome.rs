//! What a handler hands back to the dispatcher.
//!
//! A handler produces an [`Outcome`] or a [`HandlerFailure`]. The dispatcher
//! normalizes the outcome into a response:
//!
//! | outcome             | response                                          |
//! |---------------------|---------------------------------------------------|
//! | `Empty`             | the handler answers through its `RawResponse`     |
//! | `Bool(true)`        | `200 OK`                                          |
//! | `Bool(false)`       | `500 Internal Server Error`                       |
//! | `Response(..)`      | emitted as given                                  |
//! | `Pending(..)`       | awaited, then normalized again                    |
//!
//! A failure answers with its status code, or `500` when it has none.

use std::any::Any;
use std::error::Error;
use std::future::Future;

use futures::future::BoxFuture;
use http::{Response, StatusCode};

use crate::body::ResponseBody;

pub enum Outcome {
    Empty,
    Bool(bool),
    Response(Response<ResponseBody>),
    Pending(BoxFuture<'static, Result<Outcome, HandlerFailure>>),
}

impl Outcome {
    /// Wraps a future whose output normalizes like a handler return value.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future + Send + 'static,
        F::Output: IntoOutcome,
    {
        Self::Pending(Box::pin(async move { future.await.into_outcome() }))
    }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bool(value) => f.debug_tuple("Bool").field(value).finish(),
            Self::Response(response) => f.debug_tuple("Response").field(response).finish(),
            Self::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Conversion of handler return values into an [`Outcome`].
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<Outcome, HandlerFailure>;
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Result<Outcome, HandlerFailure> {
        Ok(self)
    }
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<Outcome, HandlerFailure> {
        Ok(Outcome::Empty)
    }
}

impl IntoOutcome for bool {
    fn into_outcome(self) -> Result<Outcome, HandlerFailure> {
        Ok(Outcome::Bool(self))
    }
}

impl<B: Into<ResponseBody>> IntoOutcome for Response<B> {
    fn into_outcome(self) -> Result<Outcome, HandlerFailure> {
        Ok(Outcome::Response(self.map(Into::into)))
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<HandlerFailure>,
{
    fn into_outcome(self) -> Result<Outcome, HandlerFailure> {
        self.map_err(Into::into).and_then(IntoOutcome::into_outcome)
    }
}

/// A handler failure, optionally carrying the status code to answer with.
///
/// A bare number converts into a failure with that status; a number that is not
/// a valid status code yields a failure without one, answered with `500`.
#[derive(Debug, Default, thiserror::Error)]
#[error("handler failure (status: {status_code:?}, message: {message:?})")]
pub struct HandlerFailure {
    status_code: Option<StatusCode>,
    message: Option<String>,
}

impl HandlerFailure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(status_code: StatusCode) -> Self {
        Self { status_code: Some(status_code), message: None }
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.status_code
    }

    pub fn message_str(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The status the dispatcher answers with.
    pub fn response_status(&self) -> StatusCode {
        self.status_code.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "handler panicked".to_string());
        Self { status_code: None, message: Some(message) }
    }
}

impl From<u16> for HandlerFailure {
    fn from(code: u16) -> Self {
        Self { status_code: StatusCode::from_u16(code).ok(), message: None }
    }
}

impl From<StatusCode> for HandlerFailure {
    fn from(status_code: StatusCode) -> Self {
        Self::with_status(status_code)
    }
}

impl From<Box<dyn Error + Send + Sync>> for HandlerFailure {
    fn from(e: Box<dyn Error + Send + Sync>) -> Self {
        Self::new().message(e.to_string())
    }
}

impl From<std::io::Error> for HandlerFailure {
    fn from(e: std::io::Error) -> Self {
        Self::new().message(e.to_string())
    }
}

impl From<serde_json::Error> for HandlerFailure {
    fn from(e: serde_json::Error) -> Self {
        Self::new().message(e.to_string())
    }
}

impl From<http::Error> for HandlerFailure {
    fn from(e: http::Error) -> Self {
        Self::new().message(e.to_string())
    }
}
