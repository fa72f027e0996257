//! # ctrlrouter
//!
//! ctrlrouter dispatches HTTP requests to handlers grouped into controllers.
//!
//! A controller has a base path and a list of handlers. Every handler carries
//! path patterns, method patterns, one extractor per formal parameter, the
//! indices of parameters that must not be empty, and response mutators. The
//! controllers are collected into a [`Registry`] once, before serving, and a
//! [`Dispatcher`] selects the single best handler for each request.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ctrlrouter::{Args, BodyKind, ControllerRecord, Extractor, HandlerRecord, Registry, Router};
//! use serde_json::Value;
//!
//! async fn user_info(args: Args) -> Option<String> {
//!     args.text(0).map(str::to_owned)
//! }
//!
//! async fn echo_msg(args: Args) -> Option<Value> {
//!     args.json(0).and_then(|body| body.get("msg")).cloned()
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ctrlrouter::Error> {
//!     let api = ControllerRecord::new("/api")
//!         .handler(
//!             HandlerRecord::new("user_info", user_info)
//!                 .get("/info/{user}")
//!                 .param(Extractor::path("user")),
//!         )
//!         .handler(
//!             HandlerRecord::new("echo_msg", echo_msg)
//!                 .post("/body")
//!                 .required(Extractor::body(BodyKind::Json)),
//!         );
//!
//!     Router::new(Registry::new().controller(api)).listen().await
//! }
//! ```
//!
//! ### Patterns
//!
//! Path patterns are `/`-delimited; a `{name}` segment matches any single
//! segment and can be read back with [`Extractor::path`]:
//!
//! ```ignore
//! Pattern: /info/{user}
//!
//!  /info/alice              match: user="alice"
//!  /info/alice/profile      no match
//! ```
//!
//! An empty path pattern or method pattern is a fallback. It only produces a
//! *degraded* match, which is used when nothing matches exactly.
//!
//! ### Controllers
//!
//! A controller with a base path is consulted when its base path matches the
//! start of the request path, and its patterns are matched against the rest.
//! A controller with an empty base path sees full request paths, and only
//! when no other controller has matched so far.
//!
//! ### Failures
//!
//! When nothing matches, the response is a JSON body
//! `{"code":404,"path":"/requested/path","error":"No matching listener"}`.
//! A required parameter that resolves empty yields status `401` and the
//! error `Parameter index <n> cannot be null!`. Extractor and handler faults
//! use the same envelope unless [`Config::envelope_faults`] is disabled.

#![forbid(unsafe_code)]

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod extract;
pub mod handler;
pub mod method;
pub mod middleware;
pub mod path;
pub mod registry;
pub mod response;
pub mod validate;

#[doc(hidden)]
pub mod router;

#[doc(inline)]
pub use config::Config;
#[doc(inline)]
pub use context::{Context, MatchContext};
#[doc(inline)]
pub use dispatcher::{Dispatcher, Selection};
#[doc(inline)]
pub use error::{BoxError, Error};
#[doc(inline)]
pub use extract::{Arg, Args, BodyKind, Extract, Extractor};
#[doc(inline)]
pub use handler::{Handler, HandlerRecord, IntoReply, Reply};
#[doc(inline)]
pub use middleware::{Middleware, Next};
#[doc(inline)]
pub use registry::{ControllerLoader, ControllerRecord, Registry};
#[doc(inline)]
pub use response::ErrorEnvelope;
#[doc(inline)]
pub use router::Router;
