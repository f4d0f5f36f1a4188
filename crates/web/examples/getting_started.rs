use std::time::Duration;

use appy::router::{RoutePath, Router, any, directory, get, post};
use appy::{
    BodyDecoders, CorsConfig, Dispatcher, HandlerFailure, PathParams, RawBody, RawResponse, ReadMode, RenderAs,
    RequestContext, Responder, ResponseBody, Server, async_handler_fn, handler_fn,
};
use http::{Response, StatusCode};
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug)]
pub struct User {
    name: String,
    zip: String,
}

// curl -v http://127.0.0.1:8080/users/42
fn get_user(_req: RequestContext, params: PathParams, res: Responder, _raw: RawResponse) -> Response<ResponseBody> {
    res.json(&serde_json::json!({ "id": params.get("id") }))
}

// curl -v -H 'Content-Type: application/json' -d '{"name":"hello","zip":"world"}' http://127.0.0.1:8080/users
fn create_user(
    req: RequestContext,
    _params: PathParams,
    res: Responder,
    _raw: RawResponse,
) -> Result<Response<ResponseBody>, HandlerFailure> {
    let body = req.json().cloned().ok_or_else(|| HandlerFailure::with_status(StatusCode::BAD_REQUEST))?;
    let user: User = serde_json::from_value(body)?;
    Ok(res.json_with(StatusCode::CREATED, &user))
}

// curl -v -d "name=hello&zip=world" http://127.0.0.1:8080/form
fn form_user(
    req: RequestContext,
    _params: PathParams,
    res: Responder,
    _raw: RawResponse,
) -> Result<Response<ResponseBody>, u16> {
    let user = req.body::<User>().ok_or(400_u16)?;
    Ok(res.text(format!("receive user: {user:#?}\r\n")))
}

// curl -v http://127.0.0.1:8080/archive/2024
fn archive(_req: RequestContext, params: PathParams, res: Responder, _raw: RawResponse) -> Response<ResponseBody> {
    res.html(format!("<h1>archive of {}</h1>", params.get_index(1).unwrap_or_default()))
}

// curl -v http://127.0.0.1:8080/old
fn moved(_req: RequestContext, _params: PathParams, res: Responder, _raw: RawResponse) -> Response<ResponseBody> {
    res.redirect("/users/1")
}

fn not_found(_req: RequestContext, _params: PathParams, res: Responder, _raw: RawResponse) -> Response<ResponseBody> {
    res.status_as(StatusCode::NOT_FOUND, Some("nothing here"), RenderAs::Html)
}

#[tokio::main]
async fn main() {
    // curl -v http://127.0.0.1:8080/slow
    let slow = async_handler_fn(|_req: RequestContext, _params: PathParams, res: Responder, _raw: RawResponse| {
        async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            res.text("worth waiting for")
        }
    });

    let router = Router::builder()
        .route("/users/:id", get(handler_fn(get_user)))
        .route("/users", post(handler_fn(create_user)))
        .route("/form", post(handler_fn(form_user)))
        .route(Regex::new(r"^/archive/(\d{4})$").unwrap(), get(handler_fn(archive)))
        .route("/slow", get(slow))
        .route("/old", get(handler_fn(moved)))
        .route("/static", directory("./public"))
        .route(RoutePath::any(), any(handler_fn(not_found)))
        .build()
        .unwrap();

    let mut decoders = BodyDecoders::new();
    decoders.register(mime::APPLICATION_WWW_FORM_URLENCODED.essence_str(), ReadMode::Text, |raw: RawBody| {
        serde_urlencoded::from_bytes::<User>(raw.as_bytes())
    });

    let dispatcher = Dispatcher::builder(router)
        .body_decoders(decoders)
        .cors(CorsConfig::new().origin("*").methods("GET, POST").max_age(600))
        .build()
        .unwrap();

    Server::builder().dispatcher(dispatcher).address("127.0.0.1:8080").build().unwrap().start().await.unwrap();
}
