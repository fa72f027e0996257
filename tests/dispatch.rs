use ctrlrouter::{
    Arg, Args, BodyKind, ControllerRecord, ErrorEnvelope, Extractor, HandlerRecord, Registry,
    Router,
};
use std::future::{ready, Ready};
use hyper::{Body, Request, Response, StatusCode};
use serde_json::{json, Value};

fn text(reply: &'static str) -> impl Fn(Args) -> Ready<&'static str> + Send + Sync + 'static {
    move |_: Args| ready(reply)
}

fn text_route(name: &str, path: &str, reply: &'static str) -> HandlerRecord {
    HandlerRecord::new(name, text(reply)).route(path)
}

fn api() -> ControllerRecord {
    ControllerRecord::new("/api")
        .handler(
            HandlerRecord::new("get_user_info", |args: Args| async move {
                args.text(0).map(str::to_owned)
            })
            .get("/info/{user}")
            .param(Extractor::path("user"))
            .param(Extractor::body(BodyKind::Buffer)),
        )
        .handler(
            HandlerRecord::new("get_user_info_post", |mut args: Args| async move {
                match args.take(1) {
                    Arg::Bytes(bytes) => Some(bytes),
                    _ => None,
                }
            })
            .post("/info/{user}")
            .param(Extractor::path("user"))
            .param(Extractor::body(BodyKind::Buffer)),
        )
        .handler(
            HandlerRecord::new("query", |args: Args| async move { args.text(0).map(str::to_owned) })
                .get("/query")
                .param(Extractor::query("param1")),
        )
        .handler(
            HandlerRecord::new("required_query", |args: Args| async move {
                args.text(1).map(str::to_owned)
            })
            .get("/required")
            .param(Extractor::query("optional"))
            .required(Extractor::query("token")),
        )
        .handler(
            HandlerRecord::new("other_params", |args: Args| async move {
                json!({
                    "ctx": args.context(0).is_some(),
                    "cookie": args.text(1),
                    "header": args.text(2),
                })
            })
            .get("/other")
            .param(Extractor::Context)
            .param(Extractor::cookie("cookie"))
            .param(Extractor::header("header")),
        )
        .handler(HandlerRecord::new("match_test", text("success")).get("/match/test"))
        .handler(HandlerRecord::new("match_test1", text("success1")).get("/match/test1"))
        .handler(
            HandlerRecord::new("define_body", |args: Args| async move {
                if let Some(ctx) = args.context(0) {
                    ctx.set_body("user define");
                }
            })
            .get("/define-body")
            .param(Extractor::Context),
        )
        .handler(
            HandlerRecord::new("requests", text("requests"))
                .get("/requests/test")
                .get("/requests/test1")
                .response_header([("x-multi", "yes")]),
        )
        .handler(
            HandlerRecord::new("json_body", |args: Args| async move {
                let msg = args.json(0).and_then(|body| body.get("msg"));
                msg.and_then(Value::as_str).map(str::to_owned)
            })
            .post("/body")
            .param(Extractor::body(BodyKind::Json)),
        )
        .handler(
            HandlerRecord::new("string_body", |args: Args| async move {
                args.text(0).map(str::to_owned)
            })
            .post("/body1")
            .param(Extractor::body(BodyKind::String)),
        )
        .handler(
            HandlerRecord::new("header", text(""))
                .route("/header")
                .response_header([("Content-Type", "application/xml;charset=utf-8")]),
        )
}

fn registry() -> Registry {
    Registry::new()
        .controller(ControllerRecord::catch_all().handler(text_route("test", "/test", "test")))
        .controller(api())
        .controller(
            ControllerRecord::new("/path")
                .handler(text_route("do_req", "", "hello"))
                .handler(text_route("test", "/test", "test")),
        )
        .controller(
            ControllerRecord::new("/header").handler(
                HandlerRecord::new("handler", text("1"))
                    .route("")
                    .response_header([("content-type", "text/html")])
                    .response_header([("test", "header-test")]),
            ),
        )
        .controller(
            ControllerRecord::new("/post").handler(
                HandlerRecord::new("do_post", |args: Args| async move {
                    let raw = args.bytes(0).map(|b| &b[..]).unwrap_or(b"null");
                    let body: Value = serde_json::from_slice(raw)?;
                    let callback = body.get("callback").and_then(Value::as_str);
                    Ok::<_, serde_json::Error>(callback.map(str::to_owned))
                })
                .post("/msg")
                .param(Extractor::body(BodyKind::Buffer)),
            ),
        )
        .controller(ControllerRecord::new("/test1").handler(text_route("test1", "", "test1")))
}

async fn send(req: Request<Body>) -> Response<Body> {
    Router::new(registry()).serve(req).await.unwrap()
}

async fn get(uri: &str) -> Response<Body> {
    send(Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(uri: &str, body: Value) -> Response<Body> {
    send(Request::post(uri).body(Body::from(body.to_string())).unwrap()).await
}

async fn body_text(res: Response<Body>) -> String {
    let bytes = hyper::body::to_bytes(res.into_body()).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn envelope(res: Response<Body>) -> ErrorEnvelope {
    serde_json::from_str(&body_text(res).await).unwrap()
}

#[tokio::test]
async fn path_param_is_resolved() {
    assert_eq!(body_text(get("/api/info/user").await).await, "user");
    assert_eq!(body_text(get("/api/info/alice").await).await, "alice");
}

#[tokio::test]
async fn unknown_controller_is_not_found() {
    let res = get("/xxx/xxx").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        envelope(res).await,
        ErrorEnvelope {
            code: 404,
            path: "/xxx/xxx".into(),
            error: "No matching listener".into(),
        }
    );
}

#[tokio::test]
async fn unknown_listener_path() {
    assert_eq!(envelope(get("/api/xxx").await).await.error, "No matching listener");
}

#[tokio::test]
async fn unmatched_method_and_length() {
    let res = send(Request::delete("/api/info/xxx").body(Body::empty()).unwrap()).await;
    assert_eq!(envelope(res).await.error, "No matching listener");
    assert_eq!(envelope(get("/api/123/123/123").await).await.code, 404);
    assert_eq!(envelope(get("/api/info/123/123/123").await).await.code, 404);
}

#[tokio::test]
async fn query_param() {
    let res = get("/api/query?param1=1").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/plain; charset=utf-8");
    assert_eq!(body_text(res).await, "1");
}

#[tokio::test]
async fn missing_required_query_is_unauthorized() {
    let res = get("/api/required?optional=x").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        envelope(res).await,
        ErrorEnvelope {
            code: 401,
            path: "/api/required".into(),
            error: "Parameter index 1 cannot be null!".into(),
        }
    );

    let res = get("/api/required?token=").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = get("/api/required?token=abc").await;
    assert_eq!(body_text(res).await, "abc");
}

#[tokio::test]
async fn context_cookie_and_header() {
    let req = Request::get("/api/other?param1=1")
        .header("cookie", "cookie=test")
        .header("header", "header")
        .body(Body::empty())
        .unwrap();
    let res = send(req).await;
    assert_eq!(res.headers()["content-type"], "application/json; charset=utf-8");
    let body: Value = serde_json::from_str(&body_text(res).await).unwrap();
    assert_eq!(body, json!({"cookie": "test", "header": "header", "ctx": true}));
}

#[tokio::test]
async fn handler_defined_body() {
    assert_eq!(body_text(get("/api/define-body").await).await, "user define");
}

#[tokio::test]
async fn sibling_literal_patterns() {
    assert_eq!(body_text(get("/api/match/test").await).await, "success");
    assert_eq!(body_text(get("/api/match/test1").await).await, "success1");
}

#[tokio::test]
async fn one_handler_many_paths() {
    let first = get("/api/requests/test").await;
    let second = get("/api/requests/test1").await;
    assert_eq!(first.headers()["x-multi"], "yes");
    assert_eq!(second.headers()["x-multi"], "yes");
    assert_eq!(body_text(first).await, body_text(second).await);
}

#[tokio::test]
async fn empty_pattern_is_fallback() {
    assert_eq!(body_text(get("/path/xxx").await).await, "hello");
    assert_eq!(body_text(get("/path/test").await).await, "test");
}

#[tokio::test]
async fn post_buffer_body() {
    let res = post("/post/msg", json!({"callback": "posted through the body"})).await;
    assert_eq!(body_text(res).await, "posted through the body");

    let res = post("/api/info/user", json!({"a": 1})).await;
    assert_eq!(res.headers()["content-type"], "application/octet-stream");
    assert_eq!(body_text(res).await, r#"{"a":1}"#);
}

#[tokio::test]
async fn typed_request_bodies() {
    let res = post("/api/body", json!({"msg": "test msg"})).await;
    assert_eq!(body_text(res).await, "test msg");
    let res = post("/api/body1", json!({"msg": "test msg"})).await;
    assert_eq!(body_text(res).await, r#"{"msg":"test msg"}"#);
}

#[tokio::test]
async fn malformed_json_body_is_enveloped() {
    let res = send(Request::post("/api/body").body(Body::from("{nope")).unwrap()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let envelope = envelope(res).await;
    assert_eq!(envelope.code, 400);
    assert!(envelope.error.starts_with("malformed JSON body"));
}

#[tokio::test]
async fn response_headers() {
    let res = get("/api/header").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "application/xml;charset=utf-8");

    let res = get("/header/test").await;
    assert_eq!(res.headers()["test"], "header-test");
    assert_eq!(res.headers()["content-type"], "text/html");
    assert_eq!(body_text(res).await, "1");
}

#[tokio::test]
async fn prefixed_controller_beats_catch_all() {
    assert_eq!(body_text(get("/test1").await).await, "test1");
    assert_eq!(body_text(get("/test").await).await, "test");
}

#[tokio::test]
async fn middleware_mode() {
    let registry = Registry::new().controller(
        ControllerRecord::new("/test").handler(text_route("on_req", "", "hello")),
    );
    let res = Router::new(registry)
        .serve(Request::get("/test").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_text(res).await, "hello");
}
