//! [`Router`](crate::Router) hosts a [`Dispatcher`](crate::Dispatcher) between
//! optional middlewares and serves it with hyper.
//!
//! ```rust,no_run
//! use ctrlrouter::{Args, ControllerRecord, Extractor, HandlerRecord, Registry, Router};
//!
//! async fn user_info(args: Args) -> Option<String> {
//!     args.text(0).map(str::to_owned)
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ctrlrouter::Error> {
//!     let registry = Registry::new().controller(
//!         ControllerRecord::new("/api").handler(
//!             HandlerRecord::new("user_info", user_info)
//!                 .get("/info/{user}")
//!                 .param(Extractor::path("user")),
//!         ),
//!     );
//!
//!     Router::new(registry).listen().await
//! }
//! ```
//!
//! Requests flow through the `before` middlewares, then the dispatcher, then
//! the `after` middlewares. The dispatcher recovers routing failures itself and
//! always continues down the chain.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};

use futures_util::future;
use hyper::service::Service;
use hyper::{Body, Request, Response, StatusCode};
use tracing::{error, info, Span};

use crate::config::Config;
use crate::context::Context;
use crate::dispatcher::Dispatcher;
use crate::error::{Error, Result};
use crate::middleware::{Middleware, Next};
use crate::registry::Registry;

/// Router runs the dispatcher inside a middleware pipeline.
pub struct Router {
    dispatcher: Dispatcher,
    before: Vec<Arc<dyn Middleware>>,
    after: Vec<Arc<dyn Middleware>>,
    chain: Arc<[Arc<dyn Middleware>]>,
    config: Config,
}

impl Router {
    /// Creates a router over a fully populated registry.
    pub fn new(registry: Registry) -> Self {
        Self::from_dispatcher(Dispatcher::new(registry))
    }

    pub fn from_dispatcher(dispatcher: Dispatcher) -> Self {
        let mut router = Self {
            dispatcher,
            before: Vec::new(),
            after: Vec::new(),
            chain: Arc::from(Vec::new()),
            config: Config::default(),
        };
        router.rebuild();
        router
    }

    /// Replaces the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.dispatcher = self.dispatcher.envelope_faults(config.envelope_faults);
        self.config = config;
        self.rebuild();
        self
    }

    /// Records request processing inside `span`.
    pub fn span(mut self, span: Span) -> Self {
        self.dispatcher = self.dispatcher.with_span(span);
        self.rebuild();
        self
    }

    /// Appends a middleware that runs before the dispatcher.
    pub fn before(mut self, middleware: impl Middleware) -> Self {
        self.before.push(Arc::new(middleware));
        self.rebuild();
        self
    }

    /// Appends a middleware that runs after the dispatcher.
    pub fn after(mut self, middleware: impl Middleware) -> Self {
        self.after.push(Arc::new(middleware));
        self.rebuild();
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    fn rebuild(&mut self) {
        let dispatcher: Arc<dyn Middleware> = Arc::new(self.dispatcher.clone());
        self.chain = self
            .before
            .iter()
            .cloned()
            .chain(std::iter::once(dispatcher))
            .chain(self.after.iter().cloned())
            .collect();
    }
}

#[doc(hidden)]
pub struct MakeRouterService(RouterService);

impl<T> Service<T> for MakeRouterService {
    type Response = RouterService;
    type Error = Infallible;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, _: T) -> Self::Future {
        future::ok(self.0.clone())
    }
}

#[doc(hidden)]
#[derive(Clone)]
pub struct RouterService(Arc<Router>);

impl Service<Request<Body>> for RouterService {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = ResponseFut;

    fn poll_ready(&mut self, _: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        self.0.serve(req)
    }
}

/// The response future returned by [`Router::serve`].
pub type ResponseFut = Pin<Box<dyn Future<Output = Result<Response<Body>, Infallible>> + Send>>;

impl Router {
    /// Converts the `Router` into a `Service` which you can serve directly with `Hyper`.
    /// ```rust,no_run
    /// # use ctrlrouter::{Registry, Router};
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let service = Router::new(Registry::new()).into_service();
    ///
    /// hyper::Server::bind(&([127, 0, 0, 1], 3030).into())
    ///     .serve(service)
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_service(self) -> MakeRouterService {
        MakeRouterService(RouterService(Arc::new(self)))
    }

    /// Runs one request through the pipeline and renders the response.
    ///
    /// A fault escaping the pipeline, which only happens with
    /// `envelope_faults` disabled, becomes an empty `500`.
    pub fn serve(&self, req: Request<Body>) -> ResponseFut {
        let chain = Arc::clone(&self.chain);
        Box::pin(async move {
            let ctx = Context::from_request(req);
            match Next::new(chain).run(ctx.clone()).await {
                Ok(()) => Ok(ctx.into_response()),
                Err(err) => {
                    error!(path = ctx.path(), error = %err, "unhandled request fault");
                    let mut res = Response::new(Body::empty());
                    *res.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
                    Ok(res)
                }
            }
        })
    }

    /// Binds the configured address and serves until the server fails.
    ///
    /// The registry is complete by the time this is called, so no request
    /// can observe a partially registered set of controllers.
    pub async fn listen(self) -> Result<()> {
        let addr = self.config.socket_addr();
        let controllers = self.dispatcher.registry().len();
        let server = hyper::Server::try_bind(&addr).map_err(Error::Serve)?;
        info!(%addr, controllers, "listening on http://{}", addr);
        server.serve(self.into_service()).await.map_err(Error::Serve)
    }
}
