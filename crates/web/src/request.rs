//! Request-side values handed to a handler.
//!
//! - [`RequestContext`]: the request head, its parsed query and its body
//! - [`PathParams`]: captures produced by the route that matched
//! - [`QueryParams`]: the decoded query string

use std::sync::Arc;

use appy_http::protocol::RequestHeader;
use appy_http::protocol::body::ReqBody;
use http::{HeaderMap, Method, Uri, Version};

use crate::decoder::ParsedBody;

/// Everything the dispatcher knows about a request by the time a handler runs.
///
/// The body is in one of three states: decoded by a registered body decoder,
/// still raw because no decoder matched the `Content-Type`, or already taken by
/// the handler.
#[derive(Debug)]
pub struct RequestContext {
    request_header: RequestHeader,
    query: QueryParams,
    body: RequestBody,
}

#[derive(Debug)]
enum RequestBody {
    Parsed(ParsedBody),
    Raw(ReqBody),
    Taken,
}

impl RequestContext {
    pub fn new(request_header: RequestHeader, query: QueryParams, body: ReqBody) -> Self {
        Self { request_header, query, body: RequestBody::Raw(body) }
    }

    pub(crate) fn with_parsed_body(request_header: RequestHeader, query: QueryParams, body: ParsedBody) -> Self {
        Self { request_header, query, body: RequestBody::Parsed(body) }
    }

    pub fn request_header(&self) -> &RequestHeader {
        &self.request_header
    }

    pub fn method(&self) -> &Method {
        self.request_header.method()
    }

    pub fn uri(&self) -> &Uri {
        self.request_header.uri()
    }

    /// The pathname as sent, still percent-encoded, without the query string.
    pub fn path(&self) -> &str {
        self.request_header.uri().path()
    }

    pub fn version(&self) -> Version {
        self.request_header.version()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request_header.headers()
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Returns the decoded body if a decoder produced a value of type `T`.
    pub fn body<T: 'static>(&self) -> Option<&T> {
        match &self.body {
            RequestBody::Parsed(parsed) => parsed.downcast_ref::<T>(),
            RequestBody::Raw(_) | RequestBody::Taken => None,
        }
    }

    /// Shorthand for the body produced by the built-in `application/json` decoder.
    pub fn json(&self) -> Option<&serde_json::Value> {
        self.body::<serde_json::Value>()
    }

    pub fn has_parsed_body(&self) -> bool {
        matches!(self.body, RequestBody::Parsed(_))
    }

    /// Takes the undecoded request stream.
    ///
    /// Returns `None` when the body was decoded or was already taken.
    pub fn take_raw_body(&mut self) -> Option<ReqBody> {
        match std::mem::replace(&mut self.body, RequestBody::Taken) {
            RequestBody::Raw(body) => Some(body),
            other => {
                self.body = other;
                None
            }
        }
    }
}

/// Captures produced by a matched route.
///
/// A parameterized path such as `/users/:id` yields named values. A regular
/// expression path yields the raw capture list, index `0` being the whole
/// match; named groups inside the expression can also be read by name.
#[derive(Debug, Clone, Default)]
pub struct PathParams {
    kind: PathParamsKind,
}

#[derive(Debug, Clone, Default)]
enum PathParamsKind {
    #[default]
    None,
    Named {
        names: Arc<[String]>,
        values: Vec<String>,
    },
    Positional {
        names: Arc<[Option<String>]>,
        values: Vec<Option<String>>,
    },
}

impl PathParams {
    #[inline]
    pub const fn empty() -> Self {
        Self { kind: PathParamsKind::None }
    }

    pub(crate) fn named(names: Arc<[String]>, values: Vec<String>) -> Self {
        Self { kind: PathParamsKind::Named { names, values } }
    }

    pub(crate) fn positional(names: Arc<[Option<String>]>, values: Vec<Option<String>>) -> Self {
        Self { kind: PathParamsKind::Positional { names, values } }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of captures, including the whole-match entry for expression routes.
    #[inline]
    pub fn len(&self) -> usize {
        match &self.kind {
            PathParamsKind::None => 0,
            PathParamsKind::Named { values, .. } => values.len(),
            PathParamsKind::Positional { values, .. } => values.len(),
        }
    }

    pub fn is_positional(&self) -> bool {
        matches!(self.kind, PathParamsKind::Positional { .. })
    }

    /// Gets a capture by name.
    pub fn get(&self, name: impl AsRef<str>) -> Option<&str> {
        let name = name.as_ref();
        match &self.kind {
            PathParamsKind::None => None,
            PathParamsKind::Named { names, values } => {
                names.iter().position(|n| n == name).and_then(|i| values.get(i)).map(String::as_str)
            }
            PathParamsKind::Positional { names, values } => names
                .iter()
                .position(|n| n.as_deref() == Some(name))
                .and_then(|i| values.get(i))
                .and_then(Option::as_deref),
        }
    }

    /// Gets a capture by position.
    ///
    /// For parameterized paths the index follows declaration order. For
    /// expression paths index `0` is the whole match and unmatched optional
    /// groups read as `None`.
    pub fn get_index(&self, index: usize) -> Option<&str> {
        match &self.kind {
            PathParamsKind::None => None,
            PathParamsKind::Named { values, .. } => values.get(index).map(String::as_str),
            PathParamsKind::Positional { values, .. } => values.get(index).and_then(Option::as_deref),
        }
    }

    /// Iterates `(name, value)` pairs of a parameterized path in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let pairs: Box<dyn Iterator<Item = (&str, &str)> + '_> = match &self.kind {
            PathParamsKind::Named { names, values } => {
                Box::new(names.iter().map(String::as_str).zip(values.iter().map(String::as_str)))
            }
            PathParamsKind::None | PathParamsKind::Positional { .. } => Box::new(std::iter::empty()),
        };
        pairs
    }
}

/// Decoded query string pairs in their original order. Repeated keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The first value recorded for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pairs.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl From<Vec<(String, String)>> for QueryParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self { pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use appy_http::protocol::RequestHeader;
    use appy_http::protocol::body::ReqBody;
    use http::{Method, Request};

    use super::{PathParams, QueryParams, RequestContext};

    fn header(method: Method, uri: &str) -> RequestHeader {
        Request::builder().method(method).uri(uri).body(()).unwrap().into()
    }

    #[test]
    fn named_params() {
        let names: Arc<[String]> = vec!["id".to_string(), "part".to_string()].into();
        let params = PathParams::named(names, vec!["10".to_string(), "x".to_string()]);

        assert_eq!(params.len(), 2);
        assert_eq!(params.get("id"), Some("10"));
        assert_eq!(params.get("part"), Some("x"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.get_index(1), Some("x"));
        assert!(!params.is_positional());
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("id", "10"), ("part", "x")]);
    }

    #[test]
    fn positional_params() {
        let names: Arc<[Option<String>]> = vec![None, Some("year".to_string()), None].into();
        let params = PathParams::positional(names, vec![Some("/y/2024".to_string()), Some("2024".to_string()), None]);

        assert!(params.is_positional());
        assert_eq!(params.len(), 3);
        assert_eq!(params.get_index(0), Some("/y/2024"));
        assert_eq!(params.get("year"), Some("2024"));
        assert_eq!(params.get_index(2), None);
        assert_eq!(params.iter().count(), 0);
    }

    #[test]
    fn empty_params() {
        let params = PathParams::empty();
        assert!(params.is_empty());
        assert_eq!(params.get("id"), None);
        assert_eq!(params.get_index(0), None);
    }

    #[test]
    fn query_params_keep_repeated_keys() {
        let query: QueryParams = vec![("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();

        assert_eq!(query.get("a"), Some("1"));
        assert_eq!(query.get_all("a").collect::<Vec<_>>(), vec!["1", "3"]);
        assert_eq!(query.get("c"), None);
        assert_eq!(query.len(), 3);
    }

    #[test]
    fn raw_body_can_be_taken_once() {
        let mut context =
            RequestContext::new(header(Method::POST, "/upload?x=1"), QueryParams::empty(), ReqBody::from("data"));

        assert_eq!(context.path(), "/upload");
        assert!(!context.has_parsed_body());
        assert!(context.take_raw_body().is_some());
        assert!(context.take_raw_body().is_none());
        assert!(context.json().is_none());
    }
}
