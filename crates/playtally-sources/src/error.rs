use thiserror::Error;

/// Failures raised while talking to Tautulli
#[derive(Debug, Error)]
pub enum SourceError {
    /// HTTP level failure: connect, timeout or non-2xx status
    #[error("request for '{command}' failed: {source}")]
    Transport {
        command: String,
        #[source]
        source: reqwest::Error,
    },

    /// The envelope decoded but `response.result` was not "success".
    /// Tautulli reports these with HTTP 200.
    #[error("Tautulli returned result '{result}' for '{command}': {message}")]
    Api {
        command: String,
        result: String,
        message: String,
    },

    #[error("unexpected response for '{command}': {detail}")]
    Decode { command: String, detail: String },

    #[error("user \"{0}\" was not found")]
    UserNotFound(String),

    #[error("invalid server URL '{url}': {detail}")]
    InvalidUrl { url: String, detail: String },
}

impl SourceError {
    pub fn decode(command: &str, detail: impl Into<String>) -> Self {
        SourceError::Decode {
            command: command.to_string(),
            detail: detail.into(),
        }
    }
}
