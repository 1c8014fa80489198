/// Failures talking to the smart-home API.
///
/// Callers mostly treat these uniformly (a generic "error loading" message or
/// a failed action); the variants exist so the HTTP layer can pick a status.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No bearer token is stored; the request was never sent.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("{method} {path} returned status {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ClientError {
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            ClientError::NotAuthenticated | ClientError::Status { status: 401, .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
