//! Route path compilation.
//!
//! A route is declared with a [`RoutePath`] and compiled once into a
//! [`PathMatcher`]:
//!
//! | declared                | compiled                                          |
//! |-------------------------|---------------------------------------------------|
//! | `RoutePath::Any`        | matches every pathname                            |
//! | `"/users"`              | exact string comparison                           |
//! | `"/users/:id"`          | anchored expression, one group per `:name` marker |
//! | a [`Regex`]             | used as given, unanchored                         |
//!
//! Directory routes compile with [`PathMatcher::compile_prefix`] instead, so
//! the rest of the pathname after the match can be served as a file path.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::request::PathParams;
use crate::router::RouteError;

static PARAM_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r":([A-Za-z0-9_]+)").expect("param marker pattern is valid"));

/// The path a route is declared with.
#[derive(Debug, Clone)]
pub enum RoutePath {
    /// Matches any pathname.
    Any,
    /// A literal path, or one carrying `:name` markers.
    Text(String),
    /// A user supplied regular expression.
    Pattern(Regex),
}

impl RoutePath {
    pub fn any() -> Self {
        Self::Any
    }

    /// Compiles `pattern` as a regular expression path.
    pub fn regex(pattern: &str) -> Result<Self, RouteError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|source| RouteError::InvalidPattern { pattern: pattern.to_string(), source })
    }
}

impl From<&str> for RoutePath {
    fn from(path: &str) -> Self {
        Self::Text(path.to_string())
    }
}

impl From<String> for RoutePath {
    fn from(path: String) -> Self {
        Self::Text(path)
    }
}

impl From<Regex> for RoutePath {
    fn from(regex: Regex) -> Self {
        Self::Pattern(regex)
    }
}

impl std::fmt::Display for RoutePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Text(path) => f.write_str(path),
            Self::Pattern(regex) => write!(f, "{}", regex.as_str()),
        }
    }
}

/// A compiled route path.
#[derive(Debug, Clone)]
pub enum PathMatcher {
    Any,
    Exact(String),
    Named { regex: Regex, names: Arc<[String]> },
    Pattern { regex: Regex, names: Arc<[Option<String>]> },
    Prefix(String),
    PrefixPattern(Regex),
}

impl PathMatcher {
    /// Compiles the path of a handler or file route.
    ///
    /// Fails when a `:name` marker repeats or an expression is invalid.
    pub fn compile(path: &RoutePath) -> Result<Self, RouteError> {
        match path {
            RoutePath::Any => Ok(Self::Any),
            RoutePath::Text(text) => compile_text(text),
            RoutePath::Pattern(regex) => {
                let names = regex.capture_names().map(|name| name.map(str::to_string)).collect();
                Ok(Self::Pattern { regex: regex.clone(), names })
            }
        }
    }

    /// Compiles the path of a directory route.
    ///
    /// A literal path matches as a prefix. An expression must match at the start
    /// of the pathname. Paths with `:name` markers are rejected.
    pub fn compile_prefix(path: &RoutePath) -> Result<Self, RouteError> {
        match path {
            RoutePath::Any => Ok(Self::Prefix(String::new())),
            RoutePath::Text(text) if PARAM_MARKER.is_match(text) => {
                Err(RouteError::DirectoryPath { path: text.clone() })
            }
            RoutePath::Text(text) => Ok(Self::Prefix(text.clone())),
            RoutePath::Pattern(regex) => Ok(Self::PrefixPattern(regex.clone())),
        }
    }

    /// Tests `pathname`, returning the captures on success.
    pub fn matches(&self, pathname: &str) -> Option<PathParams> {
        match self {
            Self::Any => Some(PathParams::empty()),
            Self::Exact(path) => (path == pathname).then(PathParams::empty),
            Self::Named { regex, names } => {
                let captures = regex.captures(pathname)?;
                let values = captures.iter().skip(1).map(|m| m.map_or_else(String::new, |m| m.as_str().to_string()));
                Some(PathParams::named(Arc::clone(names), values.collect()))
            }
            Self::Pattern { regex, names } => {
                let captures = regex.captures(pathname)?;
                let values = captures.iter().map(|m| m.map(|m| m.as_str().to_string())).collect();
                Some(PathParams::positional(Arc::clone(names), values))
            }
            Self::Prefix(_) | Self::PrefixPattern(_) => self.remainder(pathname).map(|_| PathParams::empty()),
        }
    }

    /// For a directory matcher, the part of `pathname` after the matched prefix.
    ///
    /// The prefix has to end on a segment boundary: `/static` covers `/static`
    /// and `/static/a.css` but not `/staticfoo`. Always `None` for the other
    /// kinds.
    pub fn remainder<'p>(&self, pathname: &'p str) -> Option<&'p str> {
        match self {
            Self::Prefix(prefix) => {
                let rest = pathname.strip_prefix(prefix.as_str())?;
                on_boundary(prefix, rest).then_some(rest)
            }
            Self::PrefixPattern(regex) => {
                let found = regex.find(pathname).filter(|m| m.start() == 0)?;
                let rest = &pathname[found.end()..];
                on_boundary(found.as_str(), rest).then_some(rest)
            }
            Self::Any | Self::Exact(_) | Self::Named { .. } | Self::Pattern { .. } => None,
        }
    }
}

fn on_boundary(matched: &str, rest: &str) -> bool {
    matched.is_empty() || matched.ends_with('/') || rest.is_empty() || rest.starts_with('/')
}

fn compile_text(path: &str) -> Result<PathMatcher, RouteError> {
    let mut pattern = String::with_capacity(path.len() + 16);
    let mut names: Vec<String> = Vec::new();
    let mut last = 0;

    pattern.push('^');
    for marker in PARAM_MARKER.captures_iter(path) {
        let (Some(whole), Some(name)) = (marker.get(0), marker.get(1)) else {
            continue;
        };

        if names.iter().any(|n| n == name.as_str()) {
            return Err(RouteError::DuplicateParam { path: path.to_string(), name: name.as_str().to_string() });
        }

        pattern.push_str(&regex::escape(&path[last..whole.start()]));
        pattern.push_str("([^/]+?)");
        names.push(name.as_str().to_string());
        last = whole.end();
    }

    if names.is_empty() {
        return Ok(PathMatcher::Exact(path.to_string()));
    }

    pattern.push_str(&regex::escape(&path[last..]));
    pattern.push('$');

    let regex = Regex::new(&pattern).map_err(|source| RouteError::InvalidPattern { pattern, source })?;
    Ok(PathMatcher::Named { regex, names: names.into() })
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::{PathMatcher, RoutePath};
    use crate::router::RouteError;

    fn compile(path: impl Into<RoutePath>) -> PathMatcher {
        PathMatcher::compile(&path.into()).unwrap()
    }

    #[test]
    fn literal_path_matches_exactly() {
        let matcher = compile("/foo");

        assert!(matcher.matches("/foo").unwrap().is_empty());
        assert!(matcher.matches("/foo/").is_none());
        assert!(matcher.matches("/fo").is_none());
        assert!(matcher.matches("/foobar").is_none());
    }

    #[test]
    fn literal_path_with_regex_metacharacters() {
        let matcher = compile("/a.b");

        assert!(matcher.matches("/a.b").is_some());
        assert!(matcher.matches("/axb").is_none());
    }

    #[test]
    fn parameterized_path() {
        let matcher = compile("/foo/:id");

        let params = matcher.matches("/foo/10").unwrap();
        assert_eq!(params.get("id"), Some("10"));
        assert_eq!(params.len(), 1);

        assert!(matcher.matches("/foo/").is_none());
        assert!(matcher.matches("/foo/10/11").is_none());
        assert!(matcher.matches("/bar/10").is_none());
    }

    #[test]
    fn parameterized_path_with_several_markers() {
        let matcher = compile("/users/:user_id/posts/:post.json");

        let params = matcher.matches("/users/7/posts/42.json").unwrap();
        assert_eq!(params.get("user_id"), Some("7"));
        assert_eq!(params.get("post"), Some("42"));
        assert!(matcher.matches("/users/7/posts/42xjson").is_none());
    }

    #[test]
    fn parameter_captures_up_to_the_next_separator() {
        let matcher = compile("/range/:from-:to");

        let params = matcher.matches("/range/1-2-3").unwrap();
        assert_eq!(params.get("from"), Some("1"));
        assert_eq!(params.get("to"), Some("2-3"));
    }

    #[test]
    fn duplicate_parameter_is_rejected() {
        let result = PathMatcher::compile(&RoutePath::from("/a/:id/b/:id"));
        assert!(matches!(result, Err(RouteError::DuplicateParam { name, .. }) if name == "id"));
    }

    #[test]
    fn regex_path_returns_positional_captures() {
        let matcher = compile(Regex::new(r"^/baz/(\d+)$").unwrap());

        let params = matcher.matches("/baz/10").unwrap();
        assert!(params.is_positional());
        assert_eq!(params.get_index(0), Some("/baz/10"));
        assert_eq!(params.get_index(1), Some("10"));

        assert!(matcher.matches("/baz/abc").is_none());
    }

    #[test]
    fn regex_path_is_unanchored_unless_written_so() {
        let matcher = compile(Regex::new(r"/v(?<version>\d)/").unwrap());

        let params = matcher.matches("/api/v2/items").unwrap();
        assert_eq!(params.get("version"), Some("2"));
    }

    #[test]
    fn any_path_matches_everything() {
        let matcher = compile(RoutePath::any());
        assert!(matcher.matches("/").is_some());
        assert!(matcher.matches("/a/b/c").is_some());
    }

    #[test]
    fn invalid_regex_is_an_error() {
        assert!(matches!(RoutePath::regex("/a/("), Err(RouteError::InvalidPattern { .. })));
    }

    #[test]
    fn directory_literal_matches_as_prefix() {
        let matcher = PathMatcher::compile_prefix(&RoutePath::from("/static")).unwrap();

        assert_eq!(matcher.remainder("/static/css/site.css"), Some("/css/site.css"));
        assert_eq!(matcher.remainder("/static"), Some(""));
        assert!(matcher.matches("/static/a").is_some());
        assert!(matcher.matches("/other").is_none());
    }

    #[test]
    fn directory_pattern_must_match_at_start() {
        let matcher = PathMatcher::compile_prefix(&RoutePath::regex(r"/assets/v\d+").unwrap()).unwrap();

        assert_eq!(matcher.remainder("/assets/v3/app.js"), Some("/app.js"));
        assert!(matcher.remainder("/x/assets/v3/app.js").is_none());
        assert!(matcher.remainder("/assets/v3x/app.js").is_none());
    }

    #[test]
    fn directory_prefix_ends_on_a_segment_boundary() {
        let matcher = PathMatcher::compile_prefix(&RoutePath::from("/static")).unwrap();
        assert!(matcher.remainder("/staticfoo").is_none());
        assert!(matcher.remainder("/static-index.html").is_none());
        assert!(matcher.matches("/staticfoo").is_none());

        let matcher = PathMatcher::compile_prefix(&RoutePath::from("/static/")).unwrap();
        assert_eq!(matcher.remainder("/static/site.css"), Some("site.css"));

        let matcher = PathMatcher::compile_prefix(&RoutePath::any()).unwrap();
        assert_eq!(matcher.remainder("/index.html"), Some("/index.html"));
    }

    #[test]
    fn directory_rejects_parameterized_path() {
        let result = PathMatcher::compile_prefix(&RoutePath::from("/files/:name"));
        assert!(matches!(result, Err(RouteError::DirectoryPath { .. })));
    }

    #[test]
    fn remainder_is_none_for_non_directory_matchers() {
        assert!(compile("/foo").remainder("/foo").is_none());
    }
}
