//! Per-request lifecycle.
//!
//! ```text
//! ROUTING ─┬─ no route ──────────────────────────────────────────── 404 ─┐
//!          ├─ OPTIONS ───────────────────────────────────────────── 200 ─┤
//!          └─ BODY_DECODE ─┬─ decode failure ────────────────────── 400 ─┤
//!                          └─ HANDLER_DISPATCH                           │
//!                               ├─ file / directory ─ served ─────── EMIT (as is)
//!                               │                   └ failed ── 404/500 ─┤
//!                               └─ handler ─ NORMALIZE ──────────────────┤
//!                                               ├─ Empty ─── raw ─── EMIT (as is)
//!                                               └─ failure ─ ERROR ──────┤
//!                                                                        │
//!                                                  CORS_MERGE ─ EMIT ◄───┘
//! ```
//!
//! Everything that can go wrong while serving a request is recovered here;
//! [`Dispatcher::dispatch`] always yields a response.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use appy_http::protocol::RequestHeader;
use appy_http::protocol::body::ReqBody;
use futures::FutureExt;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderValue, Method, Request, Response, StatusCode};
use http_body::Body;
use tracing::{debug, error, warn};

use crate::body::ResponseBody;
use crate::cors::{CorsConfig, CorsError, CorsHeaders};
use crate::decoder::BodyDecoders;
use crate::handler::{RawResponse, RequestHandler};
use crate::outcome::{HandlerFailure, Outcome};
use crate::request::{PathParams, QueryParams, RequestContext};
use crate::responder::Responder;
use crate::router::{Route, RouteTarget, Router};
use crate::static_files::{FileServer, FileServerError, LocalFileServer, StaticFiles};

/// Parses a raw query string (without the leading `?`).
pub type QueryParser = Arc<dyn Fn(&str) -> QueryParams + Send + Sync>;

/// The default query parser: `application/x-www-form-urlencoded` pairs.
///
/// A query that fails to decode is treated as empty.
pub fn parse_urlencoded(query: &str) -> QueryParams {
    match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
        Ok(pairs) => QueryParams::from(pairs),
        Err(e) => {
            debug!(cause = %e, query, "parse query string error");
            QueryParams::empty()
        }
    }
}

pub struct Dispatcher {
    router: Router,
    decoders: BodyDecoders,
    cors: CorsHeaders,
    query_parser: QueryParser,
    static_files: StaticFiles,
}

pub struct DispatcherBuilder {
    router: Router,
    decoders: BodyDecoders,
    cors: CorsConfig,
    query_parser: QueryParser,
    file_server: Arc<dyn FileServer>,
}

impl DispatcherBuilder {
    fn new(router: Router) -> Self {
        Self {
            router,
            decoders: BodyDecoders::new(),
            cors: CorsConfig::default(),
            query_parser: Arc::new(parse_urlencoded),
            file_server: Arc::new(LocalFileServer),
        }
    }

    #[must_use]
    pub fn cors(mut self, cors: CorsConfig) -> Self {
        self.cors = cors;
        self
    }

    #[must_use]
    pub fn body_decoders(mut self, decoders: BodyDecoders) -> Self {
        self.decoders = decoders;
        self
    }

    #[must_use]
    pub fn query_parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str) -> QueryParams + Send + Sync + 'static,
    {
        self.query_parser = Arc::new(parser);
        self
    }

    #[must_use]
    pub fn file_server<S: FileServer + 'static>(mut self, file_server: S) -> Self {
        self.file_server = Arc::new(file_server);
        self
    }

    pub fn build(self) -> Result<Dispatcher, CorsError> {
        Ok(Dispatcher {
            router: self.router,
            decoders: self.decoders,
            cors: self.cors.compile()?,
            query_parser: self.query_parser,
            static_files: StaticFiles::new(self.file_server),
        })
    }
}

enum Normalized {
    Response(Response<ResponseBody>),
    TakenOver,
}

impl Dispatcher {
    pub fn builder(router: Router) -> DispatcherBuilder {
        DispatcherBuilder::new(router)
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Serves one request. Never fails: every error becomes a status response.
    pub async fn dispatch(&self, request: Request<ReqBody>) -> Response<ResponseBody> {
        let (parts, body) = request.into_parts();
        let header = RequestHeader::from(parts);
        let query = header.uri().query().map_or_else(QueryParams::empty, |query| (self.query_parser)(query));

        let Some(route_match) = self.router.resolve(header.method(), header.uri().path()) else {
            debug!(method = %header.method(), path = header.uri().path(), "no route matched");
            return self.finish(Responder.status(StatusCode::NOT_FOUND));
        };

        if header.method() == Method::OPTIONS {
            return self.finish(preflight_response());
        }

        let route = route_match.route();
        debug!(path = %route.path(), index = route_match.index(), "route matched");
        let params = route_match.into_params();

        let context = match header.content_type().and_then(|mime| self.decoders.lookup(mime.essence_str())) {
            Some(decoder) => match decoder.decode(body).await {
                Ok(parsed) => RequestContext::with_parsed_body(header, query, parsed),
                Err(e) => {
                    warn!(cause = %e, "decode request body error");
                    return self.finish(Responder.status(StatusCode::BAD_REQUEST));
                }
            },
            None => RequestContext::new(header, query, body),
        };

        self.handle(route, context, params).await
    }

    async fn handle(&self, route: &Route, context: RequestContext, params: PathParams) -> Response<ResponseBody> {
        match route.target() {
            RouteTarget::Handler(handler) => self.invoke(handler.as_ref(), context, params).await,
            RouteTarget::File(path) => {
                self.delegate(self.static_files.serve_file(path, context.request_header()).await)
            }
            RouteTarget::Directory(root) => {
                let relative = route.matcher().remainder(context.path()).unwrap_or_default();
                self.delegate(self.static_files.serve_directory(root, relative, context.request_header()).await)
            }
        }
    }

    async fn invoke(
        &self,
        handler: &dyn RequestHandler,
        context: RequestContext,
        params: PathParams,
    ) -> Response<ResponseBody> {
        let (raw, raw_receiver) = RawResponse::channel();

        let result = panic::catch_unwind(AssertUnwindSafe(|| handler.invoke(context, params, Responder, raw)))
            .unwrap_or_else(recover_panic);

        match normalize(result).await {
            Normalized::Response(response) => self.finish(response),
            Normalized::TakenOver => match raw_receiver.await {
                Ok(response) => response,
                Err(e) => {
                    error!(cause = %e, "handler returned no response and dropped its raw response");
                    let mut response = Response::new(ResponseBody::empty());
                    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    response
                }
            },
        }
    }

    fn delegate(&self, served: Result<Response<ResponseBody>, FileServerError>) -> Response<ResponseBody> {
        match served {
            Ok(response) => response,
            Err(e) if e.status() == StatusCode::NOT_FOUND => {
                debug!(cause = %e, "static file not found");
                self.finish(Responder.status(StatusCode::NOT_FOUND))
            }
            Err(e) => {
                warn!(cause = %e, "serve static file error");
                self.finish(Responder.status(StatusCode::INTERNAL_SERVER_ERROR))
            }
        }
    }

    /// CORS merge followed by `Content-Length` computation.
    fn finish(&self, mut response: Response<ResponseBody>) -> Response<ResponseBody> {
        self.cors.apply(response.headers_mut());

        if !response.headers().contains_key(CONTENT_LENGTH)
            && let Some(length) = response.body().size_hint().exact()
        {
            response.headers_mut().insert(CONTENT_LENGTH, HeaderValue::from(length));
        }
        response
    }
}

async fn normalize(mut result: Result<Outcome, HandlerFailure>) -> Normalized {
    loop {
        match result {
            Ok(Outcome::Empty) => return Normalized::TakenOver,
            Ok(Outcome::Bool(true)) => return Normalized::Response(Responder.status(StatusCode::OK)),
            Ok(Outcome::Bool(false)) => {
                return Normalized::Response(Responder.status(StatusCode::INTERNAL_SERVER_ERROR));
            }
            Ok(Outcome::Response(response)) => return Normalized::Response(response),
            Ok(Outcome::Pending(future)) => {
                result = AssertUnwindSafe(future).catch_unwind().await.unwrap_or_else(recover_panic);
            }
            Err(failure) => {
                let status = failure.response_status();
                if status.is_server_error() {
                    warn!(cause = %failure, %status, "handler failed");
                } else {
                    debug!(cause = %failure, %status, "handler failed");
                }
                return Normalized::Response(Responder.status(status));
            }
        }
    }
}

fn recover_panic(payload: Box<dyn Any + Send>) -> Result<Outcome, HandlerFailure> {
    let failure = HandlerFailure::from_panic(payload.as_ref());
    error!(cause = %failure, "handler panicked");
    Err(failure)
}

fn preflight_response() -> Response<ResponseBody> {
    let mut response = Response::new(ResponseBody::empty());
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    headers.insert(CONTENT_LENGTH, HeaderValue::from_static("0"));
    response
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("decoders", &self.decoders)
            .field("cors", &self.cors)
            .field("static_files", &self.static_files)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("router", &self.router)
            .field("cors", &self.cors)
            .finish_non_exhaustive()
    }
}
