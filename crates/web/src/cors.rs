//! Cross-origin headers added to every dispatched response.
//!
//! Each configured option maps to one header:
//!
//! | option          | header                             |
//! |-----------------|------------------------------------|
//! | `origin`        | `Access-Control-Allow-Origin`      |
//! | `exposeHeaders` | `Access-Control-Expose-Headers`    |
//! | `maxAge`        | `Access-Control-Max-Age`           |
//! | `credentials`   | `Access-Control-Allow-Credentials` |
//! | `methods`       | `Access-Control-Allow-Methods`     |
//! | `headers`       | `Access-Control-Allow-Headers`     |
//!
//! Values are validated once, when the dispatcher is built, and then set on
//! every response the dispatcher produces, replacing same-named headers the
//! handler may have set.

use http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, InvalidHeaderValue,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid value for {header}: {source}")]
pub struct CorsError {
    header: HeaderName,
    #[source]
    source: InvalidHeaderValue,
}

/// CORS options, built in code or deserialized from camelCase keys.
///
/// ```
/// use appy::CorsConfig;
///
/// let config: CorsConfig = serde_json::from_str(r#"{"origin": "*", "maxAge": 600, "unknown": 1}"#).unwrap();
/// assert_eq!(config, CorsConfig::new().origin("*").max_age(600));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorsConfig {
    origin: Option<String>,
    expose_headers: Option<String>,
    max_age: Option<u64>,
    credentials: Option<bool>,
    methods: Option<String>,
    headers: Option<String>,
}

impl CorsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    #[must_use]
    pub fn expose_headers(mut self, expose_headers: impl Into<String>) -> Self {
        self.expose_headers = Some(expose_headers.into());
        self
    }

    #[must_use]
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: bool) -> Self {
        self.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn methods(mut self, methods: impl Into<String>) -> Self {
        self.methods = Some(methods.into());
        self
    }

    #[must_use]
    pub fn headers(mut self, headers: impl Into<String>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    /// Validates every configured value into a header.
    pub fn compile(&self) -> Result<CorsHeaders, CorsError> {
        let options = [
            (ACCESS_CONTROL_ALLOW_ORIGIN, self.origin.clone()),
            (ACCESS_CONTROL_EXPOSE_HEADERS, self.expose_headers.clone()),
            (ACCESS_CONTROL_MAX_AGE, self.max_age.map(|seconds| seconds.to_string())),
            (ACCESS_CONTROL_ALLOW_CREDENTIALS, self.credentials.map(|credentials| credentials.to_string())),
            (ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone()),
            (ACCESS_CONTROL_ALLOW_HEADERS, self.headers.clone()),
        ];

        let headers = options
            .into_iter()
            .filter_map(|(header, value)| value.map(|value| (header, value)))
            .map(|(header, value)| match HeaderValue::try_from(value) {
                Ok(value) => Ok((header, value)),
                Err(source) => Err(CorsError { header, source }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CorsHeaders { headers })
    }
}

/// Validated CORS headers.
#[derive(Debug, Clone, Default)]
pub struct CorsHeaders {
    headers: Vec<(HeaderName, HeaderValue)>,
}

impl CorsHeaders {
    /// Sets every header, overwriting existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}
