use std::future::Future;

use http::Response;
use tokio::sync::oneshot;

use crate::body::ResponseBody;
use crate::outcome::{HandlerFailure, IntoOutcome, Outcome};
use crate::request::{PathParams, RequestContext};
use crate::responder::Responder;

/// A route handler.
///
/// Invoked synchronously with the request context, the route's captures, the
/// response helpers and a handle for writing the response directly. Async work
/// is returned as [`Outcome::Pending`].
pub trait RequestHandler: Send + Sync {
    fn invoke(
        &self,
        req: RequestContext,
        params: PathParams,
        responder: Responder,
        raw: RawResponse,
    ) -> Result<Outcome, HandlerFailure>;
}

/// A handler made from a plain closure, see [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

/// Wraps a closure returning anything that converts with [`IntoOutcome`].
pub fn handler_fn<F, R>(f: F) -> FnHandler<F>
where
    F: Fn(RequestContext, PathParams, Responder, RawResponse) -> R + Send + Sync,
    R: IntoOutcome,
{
    FnHandler { f }
}

impl<F, R> RequestHandler for FnHandler<F>
where
    F: Fn(RequestContext, PathParams, Responder, RawResponse) -> R + Send + Sync,
    R: IntoOutcome,
{
    fn invoke(
        &self,
        req: RequestContext,
        params: PathParams,
        responder: Responder,
        raw: RawResponse,
    ) -> Result<Outcome, HandlerFailure> {
        (self.f)(req, params, responder, raw).into_outcome()
    }
}

/// A handler made from an async closure, see [`async_handler_fn`].
pub struct AsyncFnHandler<F> {
    f: F,
}

/// Wraps a closure returning a future; the future becomes an
/// [`Outcome::Pending`] awaited by the dispatcher.
pub fn async_handler_fn<F, Fut>(f: F) -> AsyncFnHandler<F>
where
    F: Fn(RequestContext, PathParams, Responder, RawResponse) -> Fut + Send + Sync,
    Fut: Future + Send + 'static,
    Fut::Output: IntoOutcome,
{
    AsyncFnHandler { f }
}

impl<F, Fut> RequestHandler for AsyncFnHandler<F>
where
    F: Fn(RequestContext, PathParams, Responder, RawResponse) -> Fut + Send + Sync,
    Fut: Future + Send + 'static,
    Fut::Output: IntoOutcome,
{
    fn invoke(
        &self,
        req: RequestContext,
        params: PathParams,
        responder: Responder,
        raw: RawResponse,
    ) -> Result<Outcome, HandlerFailure> {
        Ok(Outcome::pending((self.f)(req, params, responder, raw)))
    }
}

impl<F> std::fmt::Debug for FnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

impl<F> std::fmt::Debug for AsyncFnHandler<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnHandler").finish_non_exhaustive()
    }
}

/// Direct access to the response of the current request.
///
/// A handler that returns [`Outcome::Empty`] answers through this handle,
/// possibly later from another task. The response is written exactly as sent:
/// no CORS headers and no computed `Content-Length`. Dropping the handle without
/// sending answers `500`.
#[derive(Debug)]
pub struct RawResponse {
    sender: oneshot::Sender<Response<ResponseBody>>,
}

impl RawResponse {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<Response<ResponseBody>>) {
        let (sender, receiver) = oneshot::channel();
        (Self { sender }, receiver)
    }

    /// A handle whose response goes nowhere, for calling handlers outside a dispatcher.
    pub fn detached() -> Self {
        Self::channel().0
    }

    /// Sends the response. Gives it back if the request is no longer awaited.
    pub fn send(self, response: Response<ResponseBody>) -> Result<(), Response<ResponseBody>> {
        self.sender.send(response)
    }
}
