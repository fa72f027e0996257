//! Response side effects and the structured error body.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::Error;
use crate::handler::Reply;

/// A callback applied to the response of a selected handler, before its
/// parameters are resolved.
pub type Mutator = Arc<dyn Fn(&Context) + Send + Sync>;

/// A mutator setting fixed response headers.
pub fn response_header<I, K, V>(headers: I) -> Mutator
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let headers: Vec<(String, String)> = headers
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect();

    Arc::new(move |ctx: &Context| {
        for (name, value) in &headers {
            ctx.set_header(name, value);
        }
    })
}

/// The body written for every recovered failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub code: u16,
    pub path: String,
    pub error: String,
}

impl From<ErrorEnvelope> for Reply {
    fn from(envelope: ErrorEnvelope) -> Self {
        Reply::Json(serde_json::json!({
            "code": envelope.code,
            "path": envelope.path,
            "error": envelope.error,
        }))
    }
}

/// Writes `err` into the response as status and envelope body.
pub fn write_error(ctx: &Context, err: &Error) -> ErrorEnvelope {
    let status = err.status(ctx.status());
    let envelope = ErrorEnvelope {
        code: status.as_u16(),
        path: ctx.path().to_owned(),
        error: err.to_string(),
    };
    ctx.set_status(status);
    ctx.set_body(envelope.clone());
    envelope
}
