use thiserror::Error;

/// Failure reported by an AWS client, stripped of SDK-specific types.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("no credentials available: {0}")]
    NoCredentials(String),
    #[error("incomplete credentials: {0}")]
    PartialCredentials(String),
    #[error("credential provider failed: {0}")]
    CredentialProvider(String),
    #[error("{code}: {message}")]
    Service { code: String, message: String },
    #[error("{0}")]
    Transport(String),
}

impl ApiError {
    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Service { code, .. } => Some(code.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("AWS credentials not found")]
    NoCredentials,
    #[error("access denied")]
    AccessDenied,
    #[error("AWS credentials are invalid or expired")]
    ExpiredCredentials,
    #[error("AWS error: {0}")]
    Service(String),
}

impl From<ApiError> for CredentialError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NoCredentials(_) | ApiError::PartialCredentials(_) => CredentialError::NoCredentials,
            ApiError::CredentialProvider(_) => CredentialError::ExpiredCredentials,
            ApiError::Service { ref code, .. } => match code.as_str() {
                "AccessDenied" | "AccessDeniedException" => CredentialError::AccessDenied,
                "InvalidClientTokenId" | "ExpiredToken" | "ExpiredTokenException" => {
                    CredentialError::ExpiredCredentials
                }
                _ => CredentialError::Service(err.to_string()),
            },
            ApiError::Transport(msg) => CredentialError::Service(msg),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("AWS Health API requires Business or Enterprise Support")]
    TierRestricted,
    #[error("error fetching events: {0}")]
    Service(String),
}

impl From<ApiError> for FetchError {
    fn from(err: ApiError) -> Self {
        match err.code() {
            Some("SubscriptionRequiredException") => FetchError::TierRestricted,
            _ => FetchError::Service(err.to_string()),
        }
    }
}

/// Failure of an external step driven by the setup wizard.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("AWS CLI not found")]
    CliNotFound,
    #[error("command exited with status {0}")]
    CommandFailed(i32),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(code: &str) -> ApiError {
        ApiError::Service {
            code: code.to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_credential_error_classification() {
        assert_eq!(
            CredentialError::from(ApiError::NoCredentials("none".into())),
            CredentialError::NoCredentials
        );
        assert_eq!(
            CredentialError::from(ApiError::PartialCredentials("half".into())),
            CredentialError::NoCredentials
        );
        assert_eq!(
            CredentialError::from(ApiError::CredentialProvider("sso token expired".into())),
            CredentialError::ExpiredCredentials
        );
        assert_eq!(CredentialError::from(service("AccessDenied")), CredentialError::AccessDenied);
        assert_eq!(
            CredentialError::from(service("InvalidClientTokenId")),
            CredentialError::ExpiredCredentials
        );
        assert_eq!(
            CredentialError::from(service("Throttling")),
            CredentialError::Service("Throttling: boom".to_string())
        );
        assert_eq!(
            CredentialError::from(ApiError::Transport("timed out".into())),
            CredentialError::Service("timed out".to_string())
        );
    }

    #[test]
    fn test_fetch_error_classification() {
        assert_eq!(
            FetchError::from(service("SubscriptionRequiredException")),
            FetchError::TierRestricted
        );

        let err = FetchError::from(service("InternalFailure"));
        assert_eq!(err, FetchError::Service("InternalFailure: boom".to_string()));
        assert!(err.to_string().contains("InternalFailure: boom"));
    }
}
