use std::convert::Infallible;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use appy_http::connection::HttpConnection;
use appy_http::handler::Handler;
use appy_http::protocol::body::ReqBody;
use async_trait::async_trait;
use http::{Request, Response};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::body::ResponseBody;
use crate::dispatcher::Dispatcher;

#[derive(Debug, Default)]
pub struct ServerBuilder {
    dispatcher: Option<Dispatcher>,
    address: Option<io::Result<Vec<SocketAddr>>>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self::default()
    }

    /// Resolved at once; a resolution failure is reported by [`ServerBuilder::build`].
    #[must_use]
    pub fn address<A: ToSocketAddrs>(mut self, address: A) -> Self {
        self.address = Some(address.to_socket_addrs().map(Iterator::collect));
        self
    }

    #[must_use]
    pub fn dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let dispatcher = self.dispatcher.ok_or(ServerBuildError::MissingDispatcher)?;
        let address = self.address.ok_or(ServerBuildError::MissingAddress)?.map_err(ServerBuildError::InvalidAddress)?;
        if address.is_empty() {
            return Err(ServerBuildError::MissingAddress);
        }
        Ok(Server { dispatcher, address })
    }
}

#[derive(Debug)]
pub struct Server {
    dispatcher: Dispatcher,
    address: Vec<SocketAddr>,
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("dispatcher must be set")]
    MissingDispatcher,
    #[error("address must be set")]
    MissingAddress,
    #[error("address can't be resolved: {0}")]
    InvalidAddress(#[source] io::Error),
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("bind server error: {0}")]
    Bind(#[source] io::Error),
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Installs an INFO level fmt subscriber, binds the configured address and
    /// serves until the process stops.
    pub async fn start(self) -> Result<(), ServerError> {
        let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            debug!(cause = %e, "keep the installed tracing subscriber");
        }

        info!(address = ?self.address, "start listening");
        let tcp_listener = TcpListener::bind(self.address.as_slice()).await.map_err(|e| {
            error!(cause = %e, "bind server error");
            ServerError::Bind(e)
        })?;

        self.serve(tcp_listener).await;
        Ok(())
    }

    /// Accept loop on an already bound listener, one task per connection.
    pub async fn serve(self, tcp_listener: TcpListener) {
        let handler = Arc::new(self);
        loop {
            let (tcp_stream, remote_addr) = match tcp_listener.accept().await {
                Ok(stream_and_addr) => stream_and_addr,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                let connection = HttpConnection::new(tcp_stream);
                if let Err(e) = connection.process(handler).await {
                    error!(cause = %e, %remote_addr, "service has error, connection shutdown");
                }
            });
        }
    }
}

#[async_trait]
impl Handler for Server {
    type RespBody = ResponseBody;
    type Error = Infallible;

    async fn call(&self, req: Request<ReqBody>) -> Result<Response<Self::RespBody>, Self::Error> {
        Ok(self.dispatcher.dispatch(req).await)
    }
}
