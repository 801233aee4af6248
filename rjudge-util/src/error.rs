use reqwest::StatusCode;
use thiserror::Error;

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Failures of a conversation with a remote judge.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Transport failure. Retried at the operation level.
    #[error("Could not reach remote judge")]
    Network(#[from] reqwest::Error),
    /// Remote judge answered with 5xx. Treated like a transport failure.
    #[error("Remote judge returned server error : {0}")]
    ServerError(StatusCode),
    #[error("Received unexpected response : {0}")]
    Protocol(String),
    /// Credentials were rejected or the session went stale.
    #[error("Could not authenticate : {0}")]
    Authentication(String),
    #[error("Could not parse page : {0}")]
    Parse(String),
    #[error("Verdict is not available : {0}")]
    VerdictUnavailable(String),
    #[error("Submission was rejected : {0}")]
    SubmissionRejected(String),
    /// The remote judge accepted the submission but its id could not be confirmed.
    #[error("Submitted to contest {contest_id}, but could not resolve submission id : {reason}")]
    IdResolution { contest_id: String, reason: String },
}

impl RemoteError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::ServerError(_))
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    pub fn is_partial_success(&self) -> bool {
        matches!(self, Self::IdResolution { .. })
    }
}

impl From<retry::Error<RemoteError>> for RemoteError {
    fn from(err: retry::Error<RemoteError>) -> Self {
        match err {
            retry::Error::Operation { error, .. } => error,
            retry::Error::Internal(msg) => Self::Protocol(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient() {
        assert!(RemoteError::ServerError(StatusCode::BAD_GATEWAY).is_transient());
        assert!(!RemoteError::SubmissionRejected("same code".into()).is_transient());
        assert!(!RemoteError::Authentication("rejected".into()).is_transient());
    }

    #[test]
    fn test_display_id_resolution() {
        let err = RemoteError::IdResolution {
            contest_id: "1200".into(),
            reason: "empty history".into(),
        };
        assert!(err.is_partial_success());
        assert_eq!(
            err.to_string(),
            "Submitted to contest 1200, but could not resolve submission id : empty history"
        );
    }
}
