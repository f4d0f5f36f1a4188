use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use hyper::body::Incoming;
use pin_project_lite::pin_project;

use crate::protocol::ParseError;

pin_project! {
    /// ReqBody is the streaming request body handed to request handlers.
    ///
    /// Bodies read from a connection stream their frames straight from the
    /// transport, nothing is buffered until a consumer asks for it. Bodies built
    /// from a buffer (mostly in tests and in-process dispatch) yield that buffer
    /// as a single frame.
    pub struct ReqBody {
        #[pin]
        kind: Kind,
    }
}

pin_project! {
    #[project = KindProj]
    enum Kind {
        Incoming { #[pin] body: Incoming },
        Once { bytes: Option<Bytes> },
    }
}

impl ReqBody {
    /// An empty body that ends immediately.
    pub fn empty() -> Self {
        Self { kind: Kind::Once { bytes: None } }
    }

    /// A body consisting of exactly one buffer.
    pub fn once(bytes: Bytes) -> Self {
        if bytes.is_empty() { Self::empty() } else { Self { kind: Kind::Once { bytes: Some(bytes) } } }
    }
}

impl std::fmt::Debug for ReqBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            Kind::Incoming { .. } => f.write_str("ReqBody::Incoming"),
            Kind::Once { bytes } => f.debug_tuple("ReqBody::Once").field(bytes).finish(),
        }
    }
}

impl From<Incoming> for ReqBody {
    fn from(body: Incoming) -> Self {
        Self { kind: Kind::Incoming { body } }
    }
}

impl From<Bytes> for ReqBody {
    fn from(bytes: Bytes) -> Self {
        Self::once(bytes)
    }
}

impl From<&'static str> for ReqBody {
    fn from(value: &'static str) -> Self {
        Self::once(Bytes::from_static(value.as_bytes()))
    }
}

impl From<String> for ReqBody {
    fn from(value: String) -> Self {
        Self::once(Bytes::from(value))
    }
}

impl From<()> for ReqBody {
    fn from((): ()) -> Self {
        Self::empty()
    }
}

impl Body for ReqBody {
    type Data = Bytes;
    type Error = ParseError;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project().kind.project() {
            KindProj::Incoming { body } => body.poll_frame(cx).map_err(ParseError::from),
            KindProj::Once { bytes } => Poll::Ready(bytes.take().map(|bytes| Ok(Frame::data(bytes)))),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.kind {
            Kind::Incoming { body } => body.is_end_stream(),
            Kind::Once { bytes } => bytes.is_none(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.kind {
            Kind::Incoming { body } => body.size_hint(),
            Kind::Once { bytes: None } => SizeHint::with_exact(0),
            Kind::Once { bytes: Some(bytes) } => SizeHint::with_exact(bytes.len() as u64),
        }
    }
}
