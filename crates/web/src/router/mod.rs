//! Ordered route table.
//!
//! Routes are tested in declaration order and the first one whose path and
//! method both match wins. A declared method is compared case-insensitively,
//! and an `OPTIONS` request passes the method check of every route so a
//! preflight reaches the dispatcher's short-circuit.
//!
//! ```
//! use appy::router::{Router, directory, get};
//! use appy::{PathParams, RawResponse, RequestContext, Responder, handler_fn};
//!
//! let user = handler_fn(|_req: RequestContext, params: PathParams, res: Responder, _raw: RawResponse| {
//!     res.text(format!("user {}", params.get("id").unwrap_or_default()))
//! });
//!
//! let router = Router::builder()
//!     .route("/users/:id", get(user))
//!     .route("/static", directory("./public"))
//!     .build()
//!     .unwrap();
//!
//! assert!(router.resolve(&http::Method::GET, "/users/7").is_some());
//! ```

pub mod matcher;

use std::path::PathBuf;

use http::Method;
use http::method::InvalidMethod;
use thiserror::Error;

use crate::handler::RequestHandler;
use crate::request::PathParams;
pub use matcher::{PathMatcher, RoutePath};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("path parameter ':{name}' is declared twice in '{path}'")]
    DuplicateParam { path: String, name: String },
    #[error("directory route '{path}' must be a literal path or a regular expression")]
    DirectoryPath { path: String },
    #[error("invalid route method '{method}'")]
    InvalidMethod {
        method: String,
        #[source]
        source: InvalidMethod,
    },
}

/// Main router structure, an ordered list of compiled routes.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
}

/// A compiled route: path matcher, optional method and target.
#[derive(Debug)]
pub struct Route {
    path: RoutePath,
    matcher: PathMatcher,
    method: Option<Method>,
    target: RouteTarget,
}

/// What a matched route delegates to.
pub enum RouteTarget {
    Handler(Box<dyn RequestHandler>),
    /// A single file on disk.
    File(PathBuf),
    /// A directory on disk; the unmatched rest of the pathname picks the file.
    Directory(PathBuf),
}

/// Result of a successful [`Router::resolve`].
#[derive(Debug)]
pub struct RouteMatch<'router> {
    route: &'router Route,
    index: usize,
    params: PathParams,
}

impl Router {
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Finds the first route matching both `method` and `pathname`.
    pub fn resolve(&self, method: &Method, pathname: &str) -> Option<RouteMatch<'_>> {
        self.routes
            .iter()
            .enumerate()
            .filter(|(_, route)| route.accepts(method))
            .find_map(|(index, route)| {
                route.matcher.matches(pathname).map(|params| RouteMatch { route, index, params })
            })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Route {
    pub fn path(&self) -> &RoutePath {
        &self.path
    }

    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    /// The declared method; `None` accepts any method.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    pub fn target(&self) -> &RouteTarget {
        &self.target
    }

    /// Method check: `OPTIONS` always passes, otherwise an undeclared method
    /// accepts anything and a declared one must equal the request method
    /// ignoring case.
    pub fn accepts(&self, method: &Method) -> bool {
        method == Method::OPTIONS
            || self.method.as_ref().is_none_or(|declared| declared.as_str().eq_ignore_ascii_case(method.as_str()))
    }
}

impl<'router> RouteMatch<'router> {
    pub fn route(&self) -> &'router Route {
        self.route
    }

    /// Position of the matched route in declaration order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn params(&self) -> &PathParams {
        &self.params
    }

    pub fn into_params(self) -> PathParams {
        self.params
    }
}

impl std::fmt::Debug for RouteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Handler"),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Directory(path) => f.debug_tuple("Directory").field(path).finish(),
        }
    }
}

#[derive(Debug, Default)]
pub struct RouterBuilder {
    items: Vec<(RoutePath, RouterItemBuilder)>,
}

impl RouterBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Appends a route; earlier routes take precedence.
    #[must_use]
    pub fn route(mut self, path: impl Into<RoutePath>, item_builder: RouterItemBuilder) -> Self {
        self.items.push((path.into(), item_builder));
        self
    }

    /// Compiles every declared route.
    pub fn build(self) -> Result<Router, RouteError> {
        let routes = self.items.into_iter().map(|(path, item)| item.build(path)).collect::<Result<Vec<_>, _>>()?;
        Ok(Router { routes })
    }
}

macro_rules! method_router {
    ($method:ident, $method_name:ident) => {
        pub fn $method<H: RequestHandler + 'static>(handler: H) -> RouterItemBuilder {
            any(handler).on(Method::$method_name)
        }
    };
}

method_router!(get, GET);
method_router!(post, POST);
method_router!(put, PUT);
method_router!(delete, DELETE);
method_router!(head, HEAD);
method_router!(options, OPTIONS);
method_router!(connect, CONNECT);
method_router!(patch, PATCH);
method_router!(trace, TRACE);

/// A handler route accepting every method.
pub fn any<H: RequestHandler + 'static>(handler: H) -> RouterItemBuilder {
    RouterItemBuilder { method: None, target: RouteTarget::Handler(Box::new(handler)) }
}

/// A route serving one file, whatever the matched pathname.
pub fn file(path: impl Into<PathBuf>) -> RouterItemBuilder {
    RouterItemBuilder { method: None, target: RouteTarget::File(path.into()) }
}

/// A route serving files below `root`.
pub fn directory(root: impl Into<PathBuf>) -> RouterItemBuilder {
    RouterItemBuilder { method: None, target: RouteTarget::Directory(root.into()) }
}

#[derive(Debug)]
pub struct RouterItemBuilder {
    method: Option<String>,
    target: RouteTarget,
}

impl RouterItemBuilder {
    /// Restricts the route to one method, given in any letter case.
    #[must_use]
    pub fn on(mut self, method: impl AsRef<str>) -> Self {
        self.method = Some(method.as_ref().to_ascii_uppercase());
        self
    }

    fn build(self, path: RoutePath) -> Result<Route, RouteError> {
        let method = self
            .method
            .map(|method| {
                Method::from_bytes(method.as_bytes()).map_err(|source| RouteError::InvalidMethod { method, source })
            })
            .transpose()?;

        let matcher = match &self.target {
            RouteTarget::Directory(_) => PathMatcher::compile_prefix(&path)?,
            RouteTarget::Handler(_) | RouteTarget::File(_) => PathMatcher::compile(&path)?,
        };

        Ok(Route { path, matcher, method, target: self.target })
    }
}
