//! Parameter extractors and the resolved argument values they produce.
//!
//! Every handler parameter is described by one [`Extractor`]. For a selected
//! handler all extractors run concurrently and the results are assembled in
//! parameter order into [`Args`].

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::{self, BoxFuture, FutureExt};

use crate::context::{Context, MatchContext};
use crate::error::{BoxError, Error, Result};
use crate::path;
use crate::registry::ControllerRecord;

/// One resolved handler argument.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Nothing was found for the parameter.
    Absent,
    Text(String),
    Bytes(Bytes),
    Json(serde_json::Value),
    /// The request context itself.
    Context(Context),
}

impl Arg {
    /// Whether the value counts as empty for required parameters: absent,
    /// an empty string, or JSON `null`.
    pub fn is_empty(&self) -> bool {
        match self {
            Arg::Absent => true,
            Arg::Text(text) => text.is_empty(),
            Arg::Json(serde_json::Value::Null) => true,
            Arg::Json(serde_json::Value::String(text)) => text.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Arg::Text(text) => Some(text),
            Arg::Json(serde_json::Value::String(text)) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Arg::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Arg::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<&Context> {
        match self {
            Arg::Context(ctx) => Some(ctx),
            _ => None,
        }
    }
}

impl From<Option<&str>> for Arg {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Arg::Absent, |text| Arg::Text(text.to_owned()))
    }
}

/// The positional arguments passed to a handler.
#[derive(Debug, Clone, Default)]
pub struct Args(Vec<Arg>);

impl Args {
    pub fn new(args: Vec<Arg>) -> Self {
        Args(args)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Arg> {
        self.0.get(index)
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Arg::as_str)
    }

    pub fn bytes(&self, index: usize) -> Option<&Bytes> {
        self.get(index).and_then(Arg::as_bytes)
    }

    pub fn json(&self, index: usize) -> Option<&serde_json::Value> {
        self.get(index).and_then(Arg::as_json)
    }

    pub fn context(&self, index: usize) -> Option<&Context> {
        self.get(index).and_then(Arg::as_context)
    }

    /// Moves the argument out, leaving [`Arg::Absent`] behind.
    pub fn take(&mut self, index: usize) -> Arg {
        self.0
            .get_mut(index)
            .map_or(Arg::Absent, |arg| std::mem::replace(arg, Arg::Absent))
    }

    pub fn into_inner(self) -> Vec<Arg> {
        self.0
    }
}

/// How a `RequestBody` parameter is decoded once buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyKind {
    /// UTF-8 text, lossily decoded.
    String,
    /// Parsed JSON; a parse failure fails the request.
    Json,
    /// The raw bytes.
    #[default]
    Buffer,
}

/// A custom extractor.
///
/// ```rust
/// use ctrlrouter::{Arg, Context, ControllerRecord, Extract, MatchContext};
/// use ctrlrouter::error::Result;
/// use futures_util::future::{self, BoxFuture, FutureExt};
///
/// struct Method;
///
/// impl Extract for Method {
///     fn extract<'a>(
///         &'a self,
///         ctx: &'a Context,
///         _: &'a ControllerRecord,
///         _: &'a MatchContext,
///     ) -> BoxFuture<'a, Result<Arg>> {
///         future::ok(Arg::Text(ctx.method().to_string())).boxed()
///     }
/// }
/// ```
pub trait Extract: Send + Sync + 'static {
    fn extract<'a>(
        &'a self,
        ctx: &'a Context,
        controller: &'a ControllerRecord,
        matched: &'a MatchContext,
    ) -> BoxFuture<'a, Result<Arg>>;
}

/// A transform applied to a query value before it reaches the handler.
pub type QueryTransform =
    Arc<dyn Fn(Option<&str>) -> std::result::Result<Arg, BoxError> + Send + Sync>;

/// Produces one handler argument from the request.
#[derive(Clone)]
pub enum Extractor {
    /// A query-string value, optionally transformed.
    Query {
        key: String,
        transform: Option<QueryTransform>,
    },
    /// The request segment aligned with placeholder `{key}` of the matched
    /// pattern, controller base path included.
    Path(String),
    /// The fully buffered request body.
    Body(BodyKind),
    /// The request context, for full access to request and response.
    Context,
    Header(String),
    Cookie(String),
    Custom(Arc<dyn Extract>),
}

impl Extractor {
    pub fn query(key: impl Into<String>) -> Self {
        Extractor::Query {
            key: key.into(),
            transform: None,
        }
    }

    /// A query value passed through `transform`, which also sees missing keys.
    pub fn query_with<F>(key: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Option<&str>) -> std::result::Result<Arg, BoxError> + Send + Sync + 'static,
    {
        Extractor::Query {
            key: key.into(),
            transform: Some(Arc::new(transform)),
        }
    }

    pub fn path(key: impl Into<String>) -> Self {
        Extractor::Path(key.into())
    }

    pub fn body(kind: BodyKind) -> Self {
        Extractor::Body(kind)
    }

    pub fn header(key: impl Into<String>) -> Self {
        Extractor::Header(key.into())
    }

    pub fn cookie(key: impl Into<String>) -> Self {
        Extractor::Cookie(key.into())
    }

    pub fn custom(extract: impl Extract) -> Self {
        Extractor::Custom(Arc::new(extract))
    }

    /// Resolves this parameter for one request.
    pub fn extract<'a>(
        &'a self,
        ctx: &'a Context,
        controller: &'a ControllerRecord,
        matched: &'a MatchContext,
    ) -> BoxFuture<'a, Result<Arg>> {
        match self {
            Extractor::Query { key, transform } => {
                let value = ctx.query(key);
                let arg = match transform {
                    Some(transform) => transform(value).map_err(Error::Extract),
                    None => Ok(Arg::from(value)),
                };
                future::ready(arg).boxed()
            }
            Extractor::Path(key) => {
                let pattern = format!("{}{}", controller.base_path(), matched.pattern);
                future::ok(Arg::from(path::param(&pattern, ctx.path(), key))).boxed()
            }
            Extractor::Body(kind) => read_body(ctx, *kind).boxed(),
            Extractor::Context => future::ok(Arg::Context(ctx.clone())).boxed(),
            Extractor::Header(key) => future::ok(Arg::from(ctx.header(key))).boxed(),
            Extractor::Cookie(key) => future::ok(Arg::from(ctx.cookie(key))).boxed(),
            Extractor::Custom(extract) => extract.extract(ctx, controller, matched),
        }
    }
}

async fn read_body(ctx: &Context, kind: BodyKind) -> Result<Arg> {
    let bytes = ctx.body_bytes().await?;
    Ok(match kind {
        BodyKind::Buffer => Arg::Bytes(bytes),
        BodyKind::String => Arg::Text(String::from_utf8_lossy(&bytes).into_owned()),
        BodyKind::Json => Arg::Json(serde_json::from_slice(&bytes)?),
    })
}

/// Runs every extractor concurrently and joins the results in order.
pub async fn resolve(
    extractors: &[Extractor],
    ctx: &Context,
    controller: &ControllerRecord,
    matched: &MatchContext,
) -> Result<Args> {
    let pending = extractors
        .iter()
        .map(|extractor| extractor.extract(ctx, controller, matched));
    future::try_join_all(pending).await.map(Args::new)
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Extractor::Query { key, transform } => f
                .debug_struct("Query")
                .field("key", key)
                .field("transform", &transform.is_some())
                .finish(),
            Extractor::Path(key) => f.debug_tuple("Path").field(key).finish(),
            Extractor::Body(kind) => f.debug_tuple("Body").field(kind).finish(),
            Extractor::Context => f.write_str("Context"),
            Extractor::Header(key) => f.debug_tuple("Header").field(key).finish(),
            Extractor::Cookie(key) => f.debug_tuple("Cookie").field(key).finish(),
            Extractor::Custom(_) => f.write_str("Custom"),
        }
    }
}
