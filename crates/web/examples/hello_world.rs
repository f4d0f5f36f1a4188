use appy::router::{Router, get};
use appy::{Dispatcher, PathParams, RawResponse, RequestContext, Responder, ResponseBody, Server, handler_fn};
use http::Response;

fn hello_world(_req: RequestContext, _params: PathParams, res: Responder, _raw: RawResponse) -> Response<ResponseBody> {
    res.text("hello world")
}

#[tokio::main]
async fn main() {
    let router = Router::builder().route("/", get(handler_fn(hello_world))).build().unwrap();
    let dispatcher = Dispatcher::builder(router).build().unwrap();

    Server::builder().dispatcher(dispatcher).address("127.0.0.1:3000").build().unwrap().start().await.unwrap();
}
