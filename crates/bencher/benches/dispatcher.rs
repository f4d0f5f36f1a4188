use std::hint::black_box;

use appy::router::{Router, post};
use appy::{Dispatcher, PathParams, RawResponse, RequestContext, Responder, handler_fn};
use appy_http::protocol::body::ReqBody;
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use http::{Method, Request};

fn echo_dispatcher() -> Dispatcher {
    let echo = handler_fn(|req: RequestContext, params: PathParams, res: Responder, _raw: RawResponse| {
        res.json(&serde_json::json!({ "id": params.get("id"), "body": req.json() }))
    });
    let router = Router::builder().route("/items/:id", post(echo)).build().expect("route should compile");
    Dispatcher::builder(router).build().expect("default cors should compile")
}

fn json_request() -> Request<ReqBody> {
    Request::builder()
        .method(Method::POST)
        .uri("/items/7?verbose=true")
        .header("content-type", "application/json")
        .body(ReqBody::from(r#"{"name":"widget","tags":["a","b","c"],"count":3}"#))
        .expect("request should build")
}

fn benchmark_dispatch_json(criterion: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().expect("runtime should build");
    let dispatcher = echo_dispatcher();

    criterion.bench_function("dispatch_json", |b| {
        b.iter_batched(
            json_request,
            |request| black_box(runtime.block_on(dispatcher.dispatch(request))),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(dispatcher, benchmark_dispatch_json);
criterion_main!(dispatcher);
