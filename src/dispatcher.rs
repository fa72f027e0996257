//! Handler selection and invocation for one request.
//!
//! Selection walks the registry in registration order:
//!
//! 1. A controller with a non-empty base path is consulted when the base
//!    path matches a leading run of the request path; its handlers see the
//!    path with that prefix removed. An exact handler match ends the scan,
//!    a degraded one is kept only if nothing was kept before.
//! 2. The catch-all controller (empty base path) is consulted with the full
//!    request path, and only while nothing has been kept yet. What it finds
//!    counts as degraded, so a later prefixed controller can still win with
//!    an exact match.
//!
//! Within a controller, handlers are tried in declaration order. A handler
//! takes part when any of its method patterns accepts the request method;
//! each of its path patterns is then tried with exact segment counts, an
//! empty path pattern being accepted as a fallback. Exact path plus exact
//! method is an exact match and stops the search. Otherwise a matched path
//! pattern under a wildcard method beats a fallback, and among equals the
//! first accepted combination is kept.

use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt};
use tracing::{debug, error, info, info_span, warn, Instrument, Span};

use crate::context::{Context, MatchContext};
use crate::error::{Error, Result};
use crate::extract;
use crate::handler::HandlerRecord;
use crate::method::match_method;
use crate::middleware::{Middleware, Next};
use crate::path;
use crate::registry::{ControllerRecord, Registry};
use crate::response;
use crate::validate;

/// The outcome of handler selection.
#[derive(Debug)]
pub struct Selection<'r> {
    pub controller: &'r ControllerRecord,
    pub handler: &'r HandlerRecord,
    pub matched: MatchContext,
    pub is_exact: bool,
}

/// How strongly a handler pattern accepted the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Strength {
    /// An empty path pattern.
    Fallback,
    /// A path pattern matched, but only a wildcard method accepted.
    Pattern,
    /// Path and method both matched exactly.
    Exact,
}

struct HandlerMatch<'r> {
    handler: &'r HandlerRecord,
    matched: MatchContext,
    strength: Strength,
}

/// Selects and runs handlers from an immutable [`Registry`].
///
/// Cloning is cheap; clones share the registry.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
    span: Span,
    envelope_faults: bool,
}

impl Dispatcher {
    /// Takes ownership of a fully populated registry.
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            span: info_span!("ctrlrouter"),
            envelope_faults: true,
        }
    }

    /// Records all request processing inside `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Whether extractor and handler faults are rendered as error envelopes.
    ///
    /// When disabled they propagate out of the middleware chain instead.
    pub fn envelope_faults(mut self, enabled: bool) -> Self {
        self.envelope_faults = enabled;
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Finds the handler for `method` and `path`.
    pub fn select(&self, method: &str, path: &str) -> Result<Selection<'_>> {
        let mut retained: Option<Selection<'_>> = None;

        for controller in self.registry.iter() {
            if controller.is_catch_all() {
                if retained.is_some() {
                    continue;
                }
                if let Some(found) = select_handler(controller, method, path) {
                    retained = Some(Selection {
                        controller,
                        handler: found.handler,
                        matched: found.matched,
                        is_exact: false,
                    });
                }
            } else if path::matches(path, controller.base_path(), false) {
                let suffix = path::strip_prefix(path, controller.base_path());
                let Some(found) = select_handler(controller, method, suffix) else {
                    continue;
                };
                let selection = Selection {
                    controller,
                    handler: found.handler,
                    matched: found.matched,
                    is_exact: found.strength == Strength::Exact,
                };
                if selection.is_exact {
                    return Ok(selection);
                }
                if retained.is_none() {
                    retained = Some(selection);
                }
            }
        }

        retained.ok_or(Error::NoMatch)
    }

    /// Runs the selected handler for `ctx` and writes its reply.
    ///
    /// Failures are returned unrecovered; [`on_request`](Dispatcher::on_request)
    /// turns them into error envelopes.
    pub async fn dispatch(&self, ctx: &Context) -> Result<()> {
        let selection = self
            .select(ctx.method().as_str(), ctx.path())
            .map_err(|err| {
                warn!(method = %ctx.method(), path = ctx.path(), "no matching listener");
                err
            })?;
        let Selection {
            controller,
            handler,
            matched,
            is_exact,
        } = selection;
        debug!(
            controller = controller.base_path(),
            handler = handler.name(),
            pattern = %matched.pattern,
            method = %matched.method,
            is_exact,
            "selected handler"
        );

        for mutator in handler.mutators() {
            mutator(ctx);
        }

        let args = extract::resolve(handler.extractors(), ctx, controller, &matched).await?;
        if let Some(index) = validate::first_empty(&args, handler.required_indices()) {
            warn!(
                method = %ctx.method(),
                path = ctx.path(),
                handler = handler.name(),
                index,
                "required parameter is empty"
            );
            return Err(Error::Validation { index });
        }

        let reply = handler.handler().call(args).await.map_err(Error::Handler)?;
        if let Some(reply) = reply {
            ctx.set_body(reply);
        }
        Ok(())
    }

    /// Dispatches `ctx`, recovering failures into the error envelope.
    ///
    /// Returns an error only for faults while envelope rendering of faults
    /// is disabled.
    pub async fn on_request(&self, ctx: &Context) -> Result<()> {
        let span = self.span.clone();
        async {
            info!(method = %ctx.method(), uri = %ctx.uri(), "request received");
            let err = match self.dispatch(ctx).await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };

            if err.is_routing() {
                debug!(path = ctx.path(), error = %err, "request not dispatched");
            } else if self.envelope_faults {
                error!(path = ctx.path(), error = %err, "request failed");
            } else {
                return Err(err);
            }
            response::write_error(ctx, &err);
            Ok(())
        }
        .instrument(span)
        .await
    }
}

fn select_handler<'r>(
    controller: &'r ControllerRecord,
    method: &str,
    path: &str,
) -> Option<HandlerMatch<'r>> {
    let mut best: Option<HandlerMatch<'r>> = None;

    for handler in controller.handlers() {
        let Some(method_match) = match_method(method, handler.methods()) else {
            continue;
        };

        for pattern in handler.paths() {
            let strength = if pattern.is_empty() {
                Strength::Fallback
            } else if !path::matches(path, pattern, true) {
                continue;
            } else if method_match.is_exact {
                Strength::Exact
            } else {
                Strength::Pattern
            };

            if best.as_ref().map_or(true, |b| strength > b.strength) {
                best = Some(HandlerMatch {
                    handler,
                    matched: MatchContext {
                        pattern: pattern.clone(),
                        method: method_match.value.to_owned(),
                    },
                    strength,
                });
            }
            if strength == Strength::Exact {
                return best;
            }
        }
    }

    best
}

impl Middleware for Dispatcher {
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture<'static, Result<()>> {
        let dispatcher = self.clone();
        async move {
            dispatcher.on_request(&ctx).await?;
            next.run(ctx).await
        }
        .boxed()
    }
}
