//! A minimal request router and response dispatcher.
//!
//! Routes are declared once and compiled into matchers. Each request is then
//! resolved against them in order, its body decoded by content type, and the
//! handler's result (a value, a boolean, a failure, a panic or a future) turned
//! into exactly one response, with the configured CORS headers merged in.
//!
//! # Example
//!
//! ```no_run
//! use appy::router::{Router, directory, get, post};
//! use appy::{CorsConfig, Dispatcher, PathParams, RawResponse, RequestContext, Responder, Server};
//! use appy::{async_handler_fn, handler_fn};
//!
//! #[tokio::main]
//! async fn main() {
//!     let hello = handler_fn(|_req: RequestContext, _params: PathParams, res: Responder, _raw: RawResponse| {
//!         res.text("hello world")
//!     });
//!     let user = handler_fn(|_req: RequestContext, params: PathParams, res: Responder, _raw: RawResponse| {
//!         res.json(&serde_json::json!({ "id": params.get("id") }))
//!     });
//!     let echo = async_handler_fn(|req: RequestContext, _params: PathParams, res: Responder, _raw: RawResponse| {
//!         async move { res.json(&req.json().cloned().unwrap_or_default()) }
//!     });
//!
//!     let router = Router::builder()
//!         .route("/", get(hello))
//!         .route("/users/:id", get(user))
//!         .route("/echo", post(echo))
//!         .route("/static", directory("./public"))
//!         .build()
//!         .unwrap();
//!
//!     let dispatcher = Dispatcher::builder(router).cors(CorsConfig::new().origin("*")).build().unwrap();
//!
//!     Server::builder().dispatcher(dispatcher).address("127.0.0.1:3000").build().unwrap().start().await.unwrap();
//! }
//! ```
//!
//! # Modules
//!
//! - [`router`]: route declaration, path compilation and resolution
//! - [`Dispatcher`]: the per-request lifecycle
//! - [`BodyDecoders`]: content type keyed body parsing
//! - [`Responder`]: response builders
//! - [`FileServer`]: file and directory routes

mod body;
mod cors;
mod decoder;
mod dispatcher;
mod handler;
mod outcome;
mod request;
mod responder;
mod server;
mod static_files;

pub mod router;

pub use body::ResponseBody;
pub use cors::{CorsConfig, CorsError, CorsHeaders};
pub use decoder::{BodyDecoder, BodyDecoders, DecodeError, ParsedBody, RawBody, ReadMode};
pub use dispatcher::{Dispatcher, DispatcherBuilder, QueryParser, parse_urlencoded};
pub use handler::{AsyncFnHandler, FnHandler, RawResponse, RequestHandler, async_handler_fn, handler_fn};
pub use outcome::{HandlerFailure, IntoOutcome, Outcome};
pub use request::{PathParams, QueryParams, RequestContext};
pub use responder::{RenderAs, Responder};
pub use router::{RouteError, Router};
pub use server::{Server, ServerBuildError, ServerBuilder, ServerError};
pub use static_files::{FileServer, FileServerError, LocalFileServer, StaticDirectory};
