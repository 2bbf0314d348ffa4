use crate::error::SourceError;
use async_trait::async_trait;
use serde_json::Value;

/// A Tautulli style command endpoint.
///
/// Implementations return the unwrapped `response.data` payload of a
/// successful call. Parameters with a `None` value are left out of the
/// request. Everything above the HTTP layer (user lookup, history paging,
/// episode availability) is written against this trait so it can run
/// without a server.
#[async_trait]
pub trait TautulliApi: Send + Sync {
    async fn call(&self, command: &str, params: &[(&str, Option<String>)]) -> Result<Value, SourceError>;
}
