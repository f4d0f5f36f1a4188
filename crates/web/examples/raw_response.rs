use std::time::Duration;

use appy::router::{Router, get};
use appy::{Dispatcher, PathParams, RawResponse, RequestContext, Responder, Server, handler_fn};

// curl -v http://127.0.0.1:8080/later
//
// the handler returns nothing and answers from a spawned task instead; the
// response is written exactly as sent, without CORS headers
fn later(_req: RequestContext, _params: PathParams, res: Responder, raw: RawResponse) {
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if raw.send(res.text("answered later\r\n")).is_err() {
            tracing::warn!("request gone before the response was sent");
        }
    });
}

#[tokio::main]
async fn main() {
    let router = Router::builder().route("/later", get(handler_fn(later))).build().unwrap();
    let dispatcher = Dispatcher::builder(router).build().unwrap();

    Server::builder().dispatcher(dispatcher).address("127.0.0.1:8080").build().unwrap().start().await.unwrap();
}
