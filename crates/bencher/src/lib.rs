use appy::router::{Router, get};
use appy::{PathParams, RawResponse, RequestContext, Responder, handler_fn};

/// A route table plus the request paths resolved against it.
#[derive(Debug, Copy, Clone)]
pub struct RouteCase {
    name: &'static str,
    group: RouteGroup,
    routes: &'static [&'static str],
    paths: &'static [&'static str],
}

impl RouteCase {
    pub const fn new(
        name: &'static str,
        group: RouteGroup,
        routes: &'static [&'static str],
        paths: &'static [&'static str],
    ) -> Self {
        Self { name, group, routes, paths }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> RouteGroup {
        self.group
    }

    pub fn routes(&self) -> &'static [&'static str] {
        self.routes
    }

    pub fn paths(&self) -> &'static [&'static str] {
        self.paths
    }

    /// Every route answers `GET` with its own index, so a wrong match shows up
    /// in the body.
    pub fn router(&self) -> Router {
        self.routes
            .iter()
            .enumerate()
            .fold(Router::builder(), |builder, (index, path)| {
                let handler = move |_req: RequestContext, _params: PathParams, res: Responder, _raw: RawResponse| {
                    res.text(index.to_string())
                };
                builder.route(*path, get(handler_fn(handler)))
            })
            .build()
            .expect("benchmark routes should compile")
    }
}

#[derive(Clone, Copy, Debug)]
pub enum RouteGroup {
    Literal,
    Named,
    Mixed,
}

pub static LITERAL: RouteCase = RouteCase::new(
    "literal",
    RouteGroup::Literal,
    &["/", "/about", "/users", "/users/list", "/articles", "/articles/recent", "/health", "/metrics"],
    &["/", "/articles/recent", "/metrics", "/missing"],
);

pub static NAMED: RouteCase = RouteCase::new(
    "named",
    RouteGroup::Named,
    &["/users/:id", "/users/:id/posts", "/users/:id/posts/:post", "/orgs/:org/repos/:repo/issues/:issue"],
    &["/users/42", "/users/42/posts/7", "/orgs/rust-lang/repos/rust/issues/1", "/users/42/friends"],
);

pub static MIXED: RouteCase = RouteCase::new(
    "mixed",
    RouteGroup::Mixed,
    &["/", "/health", "/users/:id", "/users/:id/posts/:post", "/static/:file", "/api/v1/:resource/:id", "/login"],
    &["/login", "/api/v1/orders/99", "/static/site.css", "/nowhere/at/all"],
);
