//! Handlers and the records describing how requests reach them.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::future::{BoxFuture, FutureExt};
use hyper::Body;

use crate::context::Context;
use crate::error::BoxError;
use crate::extract::{Args, Extractor};
use crate::response::{self, Mutator};

/// A response body produced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Bytes(Bytes),
    Json(serde_json::Value),
}

impl Reply {
    /// The `content-type` used when nothing else set one.
    pub fn content_type(&self) -> &'static str {
        match self {
            Reply::Text(_) => "text/plain; charset=utf-8",
            Reply::Bytes(_) => "application/octet-stream",
            Reply::Json(_) => "application/json; charset=utf-8",
        }
    }

    pub(crate) fn into_body(self) -> Body {
        match self {
            Reply::Text(text) => Body::from(text),
            Reply::Bytes(bytes) => Body::from(bytes),
            Reply::Json(value) => Body::from(value.to_string()),
        }
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::Text(text.to_owned())
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::Text(text)
    }
}

impl From<Bytes> for Reply {
    fn from(bytes: Bytes) -> Self {
        Reply::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Reply {
    fn from(bytes: Vec<u8>) -> Self {
        Reply::Bytes(bytes.into())
    }
}

impl From<serde_json::Value> for Reply {
    fn from(value: serde_json::Value) -> Self {
        Reply::Json(value)
    }
}

/// Conversion of a handler's return value into an optional body.
///
/// `None` means the handler returned nothing, and whatever body it set
/// through its [`Context`] stays in place.
pub trait IntoReply {
    fn into_reply(self) -> Result<Option<Reply>, BoxError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Option<Reply>, BoxError> {
        Ok(Some(self))
    }
}

macro_rules! into_reply_via_from {
    ($($ty:ty),*) => {
        $(
            impl IntoReply for $ty {
                fn into_reply(self) -> Result<Option<Reply>, BoxError> {
                    Ok(Some(Reply::from(self)))
                }
            }
        )*
    };
}

into_reply_via_from!(&str, String, Bytes, Vec<u8>, serde_json::Value);

impl IntoReply for () {
    fn into_reply(self) -> Result<Option<Reply>, BoxError> {
        Ok(None)
    }
}

impl<T: IntoReply> IntoReply for Option<T> {
    fn into_reply(self) -> Result<Option<Reply>, BoxError> {
        match self {
            Some(value) => value.into_reply(),
            None => Ok(None),
        }
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<BoxError>,
{
    fn into_reply(self) -> Result<Option<Reply>, BoxError> {
        self.map_err(Into::into)?.into_reply()
    }
}

/// A request handler invoked with its resolved positional arguments.
///
/// This trait is implemented for asynchronous functions taking [`Args`] and
/// returning anything that implements [`IntoReply`]:
/// ```rust
/// use ctrlrouter::{Args, Handler};
///
/// async fn hello(args: Args) -> String {
///     format!("hello {}", args.text(0).unwrap_or("world"))
/// }
///
/// let handler: Box<dyn Handler> = Box::new(hello);
/// ```
pub trait Handler: Send + Sync + 'static {
    fn call(&self, args: Args) -> BoxFuture<'static, Result<Option<Reply>, BoxError>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoReply,
{
    fn call(&self, args: Args) -> BoxFuture<'static, Result<Option<Reply>, BoxError>> {
        self(args).map(IntoReply::into_reply).boxed()
    }
}

/// Everything the dispatcher knows about one handler.
///
/// Path and method patterns are two independently grown lists: every
/// [`request`](HandlerRecord::request) call appends one entry to each, and
/// matching pairs any accepted path with any accepted method.
/// ```rust
/// use ctrlrouter::{Args, Extractor, HandlerRecord};
///
/// let record = HandlerRecord::new("user_info", |args: Args| async move {
///     args.text(0).map(str::to_owned)
/// })
/// .get("/info/{user}")
/// .required(Extractor::path("user"))
/// .response_header([("cache-control", "no-store")]);
///
/// assert_eq!(record.paths(), ["/info/{user}"]);
/// assert_eq!(record.required_indices(), [0]);
/// ```
pub struct HandlerRecord {
    name: String,
    paths: Vec<String>,
    methods: Vec<String>,
    extractors: Vec<Extractor>,
    required: Vec<usize>,
    mutators: Vec<Mutator>,
    handler: Arc<dyn Handler>,
}

impl HandlerRecord {
    /// Creates a record without any pattern; `name` only shows up in logs.
    pub fn new(name: impl Into<String>, handler: impl Handler) -> Self {
        Self {
            name: name.into(),
            paths: Vec::new(),
            methods: Vec::new(),
            extractors: Vec::new(),
            required: Vec::new(),
            mutators: Vec::new(),
            handler: Arc::new(handler),
        }
    }

    /// Appends a path pattern and a method pattern.
    ///
    /// An empty path is a fallback accepted for any remaining path, an empty
    /// method accepts any method. Both only ever produce degraded matches.
    pub fn request(mut self, path: impl Into<String>, method: impl Into<String>) -> Self {
        self.paths.push(path.into());
        self.methods.push(method.into());
        self
    }

    /// Registers `path` for any method.
    pub fn route(self, path: impl Into<String>) -> Self {
        self.request(path, "")
    }

    pub fn get(self, path: impl Into<String>) -> Self {
        self.request(path, "GET")
    }

    pub fn head(self, path: impl Into<String>) -> Self {
        self.request(path, "HEAD")
    }

    pub fn options(self, path: impl Into<String>) -> Self {
        self.request(path, "OPTIONS")
    }

    pub fn post(self, path: impl Into<String>) -> Self {
        self.request(path, "POST")
    }

    pub fn put(self, path: impl Into<String>) -> Self {
        self.request(path, "PUT")
    }

    pub fn patch(self, path: impl Into<String>) -> Self {
        self.request(path, "PATCH")
    }

    pub fn delete(self, path: impl Into<String>) -> Self {
        self.request(path, "DELETE")
    }

    /// Appends the extractor for the next formal parameter.
    pub fn param(mut self, extractor: Extractor) -> Self {
        self.extractors.push(extractor);
        self
    }

    /// Like [`param`](HandlerRecord::param), and rejects the request with
    /// `401` when the value resolves empty.
    pub fn required(mut self, extractor: Extractor) -> Self {
        self.required.push(self.extractors.len());
        self.extractors.push(extractor);
        self
    }

    /// Appends a callback run on the response before parameters resolve.
    pub fn mutator(mut self, mutator: impl Fn(&Context) + Send + Sync + 'static) -> Self {
        self.mutators.push(Arc::new(mutator));
        self
    }

    /// Sets fixed response headers whenever this handler is selected.
    pub fn response_header<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.mutators.push(response::response_header(headers));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn extractors(&self) -> &[Extractor] {
        &self.extractors
    }

    pub fn required_indices(&self) -> &[usize] {
        &self.required
    }

    pub fn mutators(&self) -> &[Mutator] {
        &self.mutators
    }

    pub(crate) fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }
}

impl fmt::Debug for HandlerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRecord")
            .field("name", &self.name)
            .field("paths", &self.paths)
            .field("methods", &self.methods)
            .field("extractors", &self.extractors)
            .field("required", &self.required)
            .field("mutators", &self.mutators.len())
            .finish()
    }
}
