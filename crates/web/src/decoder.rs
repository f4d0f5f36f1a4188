//! Request body decoders, keyed by content type.
//!
//! Before a handler runs, the dispatcher looks up the request's
//! `Content-Type` essence (`application/json; charset=utf-8` looks up
//! `application/json`). On a hit the whole body is read, as text or as bytes,
//! and handed to the registered parse function; the handler then sees the
//! parsed value through [`RequestContext::body`](crate::RequestContext::body).
//! A read or parse failure answers `400 Bad Request`.
//!
//! `application/json` is registered by default and parses into a
//! [`serde_json::Value`].

use std::any::Any;
use std::collections::HashMap;
use std::error::Error;

use bytes::Bytes;
use http_body::Body;
use http_body_util::BodyExt;
use mime::Mime;
use thiserror::Error;

type BoxError = Box<dyn Error + Send + Sync>;
type ParseFn = Box<dyn Fn(RawBody) -> Result<ParsedBody, BoxError> + Send + Sync>;

/// How a decoder wants the body handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    /// UTF-8 text; a body that is not valid UTF-8 fails the decode.
    Text,
    Bytes,
}

/// The fully read body passed to a parse function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawBody {
    Text(String),
    Bytes(Bytes),
}

impl RawBody {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }
}

/// A decoded body, typed by whatever the parse function returned.
pub struct ParsedBody(Box<dyn Any + Send + Sync>);

impl ParsedBody {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.is::<T>()
    }
}

impl std::fmt::Debug for ParsedBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedBody").finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("no body decoder registered for '{content_type}'")]
    Unregistered { content_type: String },
    #[error("read request body error: {source}")]
    Read { source: BoxError },
    #[error("request body is not valid utf-8: {source}")]
    Utf8 {
        #[from]
        source: std::string::FromUtf8Error,
    },
    #[error("parse request body error: {source}")]
    Parse { source: BoxError },
}

/// One registered decoder.
pub struct BodyDecoder {
    read_mode: ReadMode,
    parse: ParseFn,
}

impl BodyDecoder {
    pub fn read_mode(&self) -> ReadMode {
        self.read_mode
    }

    /// Reads `body` to the end and parses it.
    pub async fn decode<B>(&self, body: B) -> Result<ParsedBody, DecodeError>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let bytes = body.collect().await.map_err(|e| DecodeError::Read { source: e.into() })?.to_bytes();

        let raw = match self.read_mode {
            ReadMode::Text => RawBody::Text(String::from_utf8(bytes.to_vec())?),
            ReadMode::Bytes => RawBody::Bytes(bytes),
        };

        (self.parse)(raw).map_err(|source| DecodeError::Parse { source })
    }
}

impl std::fmt::Debug for BodyDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyDecoder").field("read_mode", &self.read_mode).finish_non_exhaustive()
    }
}

/// The content type to decoder registry.
#[derive(Debug)]
pub struct BodyDecoders {
    decoders: HashMap<String, BodyDecoder>,
}

impl Default for BodyDecoders {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyDecoders {
    /// A registry holding the built-in `application/json` decoder.
    pub fn new() -> Self {
        let mut decoders = Self::empty();
        decoders.register(mime::APPLICATION_JSON.essence_str(), ReadMode::Text, |raw| {
            serde_json::from_slice::<serde_json::Value>(raw.as_bytes())
        });
        decoders
    }

    /// A registry without any decoder.
    pub fn empty() -> Self {
        Self { decoders: HashMap::new() }
    }

    /// Registers `parse` for `content_type`, replacing any earlier entry.
    ///
    /// Parameters after `;` and letter case are ignored in `content_type`.
    pub fn register<T, E, F>(&mut self, content_type: &str, read_mode: ReadMode, parse: F) -> &mut Self
    where
        T: Any + Send + Sync,
        E: Into<BoxError>,
        F: Fn(RawBody) -> Result<T, E> + Send + Sync + 'static,
    {
        let parse: ParseFn = Box::new(move |raw| parse(raw).map(ParsedBody::new).map_err(Into::into));
        self.decoders.insert(essence(content_type), BodyDecoder { read_mode, parse });
        self
    }

    pub fn lookup(&self, content_type: &str) -> Option<&BodyDecoder> {
        self.decoders.get(&essence(content_type))
    }

    pub fn contains(&self, content_type: &str) -> bool {
        self.lookup(content_type).is_some()
    }

    /// Decodes `body` with the decoder registered for `content_type`.
    pub async fn decode<B>(&self, content_type: &str, body: B) -> Result<ParsedBody, DecodeError>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        let decoder = self
            .lookup(content_type)
            .ok_or_else(|| DecodeError::Unregistered { content_type: content_type.to_string() })?;
        decoder.decode(body).await
    }
}

fn essence(content_type: &str) -> String {
    match content_type.trim().parse::<Mime>() {
        Ok(mime) => mime.essence_str().to_ascii_lowercase(),
        Err(_) => content_type.trim().to_ascii_lowercase(),
    }
}
