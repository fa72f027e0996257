//! The hosting pipeline the dispatcher runs in.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::context::Context;
use crate::error::Result;

/// One stage of the request pipeline.
///
/// A middleware decides whether and when the rest of the chain runs by
/// calling [`Next::run`]. It is implemented for async closures:
/// ```rust
/// use ctrlrouter::{Context, Middleware, Next};
/// use hyper::StatusCode;
///
/// let teapot = |ctx: Context, next: Next| async move {
///     ctx.set_status(StatusCode::IM_A_TEAPOT);
///     next.run(ctx).await
/// };
/// let middleware: Box<dyn Middleware> = Box::new(teapot);
/// ```
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture<'static, Result<()>>;
}

impl<F, Fut> Middleware for F
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture<'static, Result<()>> {
        self(ctx, next).boxed()
    }
}

/// The remainder of the pipeline after the current middleware.
#[derive(Clone)]
pub struct Next {
    chain: Arc<[Arc<dyn Middleware>]>,
    position: usize,
}

impl Next {
    pub(crate) fn new(chain: Arc<[Arc<dyn Middleware>]>) -> Self {
        Self { chain, position: 0 }
    }

    /// An empty remainder; running it completes immediately.
    pub fn end() -> Self {
        Self::new(Arc::from(Vec::new()))
    }

    /// Runs the remaining middlewares in order.
    pub fn run(self, ctx: Context) -> BoxFuture<'static, Result<()>> {
        match self.chain.get(self.position).cloned() {
            Some(middleware) => {
                let next = Next {
                    chain: self.chain,
                    position: self.position + 1,
                };
                middleware.handle(ctx, next)
            }
            None => future::ok(()).boxed(),
        }
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.chain.len().saturating_sub(self.position))
            .finish()
    }
}
