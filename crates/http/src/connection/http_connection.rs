use std::convert::Infallible;
use std::error::Error;
use std::sync::Arc;

use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body::Body;
use http_body_util::{Either, Empty};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{error, info};

use crate::handler::Handler;
use crate::protocol::HttpError;
use crate::protocol::body::ReqBody;

/// An HTTP connection that feeds decoded requests to a [`Handler`].
///
/// `HttpConnection` owns one accepted byte stream and serves every request sent
/// on it until the peer closes the connection:
/// - Reading and decoding request heads (hyper's HTTP/1.1 driver)
/// - Streaming request bodies into [`ReqBody`]
/// - Answering `Expect: 100-continue` when the body is first polled
/// - Writing responses with `Content-Length` or chunked framing
///
/// # Type Parameters
///
/// * `IO`: The async readable and writable stream type
pub struct HttpConnection<IO> {
    io: IO,
    builder: http1::Builder,
}

impl<IO> std::fmt::Debug for HttpConnection<IO> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConnection").finish_non_exhaustive()
    }
}

impl<IO> HttpConnection<IO>
where
    IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(io: IO) -> Self {
        let mut builder = http1::Builder::new();
        builder.keep_alive(true);
        Self { io, builder }
    }

    pub async fn process<H>(self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler + 'static,
        H::RespBody: Body<Data = Bytes> + Send + 'static,
        <H::RespBody as Body>::Error: Into<Box<dyn Error + Send + Sync>>,
    {
        let service = service_fn(move |request: Request<Incoming>| {
            let handler = Arc::clone(&handler);
            async move {
                let request = request.map(ReqBody::from);
                let response = match handler.call(request).await {
                    Ok(response) => response.map(Either::Left),
                    Err(e) => {
                        let cause: Box<dyn Error + Send + Sync> = e.into();
                        error!(%cause, "handle response error");
                        build_error_response(StatusCode::INTERNAL_SERVER_ERROR).map(Either::Right)
                    }
                };
                Ok::<_, Infallible>(response)
            }
        });

        self.builder.serve_connection(TokioIo::new(self.io), service).await?;
        info!("finished process, connection shutdown");
        Ok(())
    }
}

fn build_error_response(status_code: StatusCode) -> Response<Empty<Bytes>> {
    let mut response = Response::new(Empty::<Bytes>::new());
    *response.status_mut() = status_code;
    response
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::io;
    use std::sync::Arc;

    use bytes::Bytes;
    use http::{Request, Response};
    use http_body_util::{BodyExt, Full};
    use indoc::indoc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::HttpConnection;
    use crate::handler::{Handler, make_handler};
    use crate::protocol::body::ReqBody;

    async fn serve_once<H>(handler: H, raw_request: &str) -> String
    where
        H: Handler + 'static,
        H::RespBody: http_body::Body<Data = Bytes> + Send + 'static,
        <H::RespBody as http_body::Body>::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let handler = Arc::new(handler);

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            HttpConnection::new(stream).process(handler).await
        });

        let mut client = TcpStream::connect(address).await.unwrap();
        client.write_all(raw_request.replace('\n', "\r\n").as_bytes()).await.unwrap();

        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();
        server.await.unwrap().unwrap();
        response
    }

    async fn echo(request: Request<ReqBody>) -> Result<Response<Full<Bytes>>, Infallible> {
        let path = request.uri().path().to_string();
        let body = request.into_body().collect().await.map(|c| c.to_bytes()).unwrap_or_default();
        let text = format!("{path}:{}", String::from_utf8_lossy(&body));
        Ok(Response::new(Full::new(Bytes::from(text))))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn serves_request_and_body() {
        let raw = indoc! {"
            POST /echo HTTP/1.1
            Host: 127.0.0.1
            Content-Length: 5
            Connection: close

            hello"};

        let response = serve_once(make_handler(echo), raw).await;

        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("content-length: 11\r\n"));
        assert!(response.ends_with("/echo:hello"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 1)]
    async fn handler_error_becomes_500() {
        let handler = make_handler(|_request: Request<ReqBody>| async {
            Err::<Response<Full<Bytes>>, _>(io::Error::other("boom"))
        });

        let raw = indoc! {"
            GET / HTTP/1.1
            Host: 127.0.0.1
            Connection: close

            "};

        let response = serve_once(handler, raw).await;
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }
}
