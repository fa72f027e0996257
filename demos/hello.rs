use ctrlrouter::{
    Args, BodyKind, Config, Context, ControllerRecord, Extractor, HandlerRecord, Next, Registry,
    Router,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

async fn user_info(args: Args) -> Option<String> {
    args.text(0).map(|user| format!("hello, {}", user))
}

async fn echo(args: Args) -> Value {
    json!({ "msg": args.json(0).and_then(|body| body.get("msg")).cloned() })
}

async fn search(args: Args) -> Value {
    json!({ "q": args.text(0), "token": args.text(1) })
}

#[tokio::main]
async fn main() -> Result<(), ctrlrouter::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let api = ControllerRecord::new("/api")
        .handler(
            HandlerRecord::new("user_info", user_info)
                .get("/info/{user}")
                .param(Extractor::path("user")),
        )
        .handler(
            HandlerRecord::new("echo", echo)
                .post("/echo")
                .required(Extractor::body(BodyKind::Json)),
        )
        .handler(
            HandlerRecord::new("search", search)
                .get("/search")
                .param(Extractor::query("q"))
                .required(Extractor::header("x-token"))
                .response_header([("cache-control", "no-store")]),
        );

    let root = ControllerRecord::catch_all()
        .handler(HandlerRecord::new("index", |_: Args| async { "ctrlrouter" }).get("/"));

    Router::new(Registry::new().controller(api).controller(root))
        .config(config)
        .after(|ctx: Context, next: Next| async move {
            ctx.set_header("x-powered-by", "ctrlrouter");
            next.run(ctx).await
        })
        .listen()
        .await
}
