use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },

    #[error("connection error: {source}")]
    ConnectionError {
        #[from]
        source: hyper::Error,
    },
}

/// Reading the request body failed.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("body stream error: {source}")]
    BodyStream {
        #[from]
        source: hyper::Error,
    },
}

/// Writing the response body failed.
#[derive(Error, Debug)]
pub enum SendError {
    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
