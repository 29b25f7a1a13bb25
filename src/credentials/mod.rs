pub mod probes;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::EnvironmentProvider;
use crate::errors::{ApiError, CredentialError};
use crate::types::{CredentialMethod, Identity};

pub use probes::{CredentialProbes, PROBE_ORDER, SSO_MARKERS};

/// Source of the caller identity (STS in production).
#[async_trait]
pub trait IdentityProvider {
    async fn get_caller_identity(&self) -> Result<Identity, ApiError>;
}

/// Outcome of a credential check.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Available {
        method: CredentialMethod,
        identity: Identity,
    },
    Unavailable(CredentialError),
}

impl Resolution {
    pub fn is_available(&self) -> bool {
        matches!(self, Resolution::Available { .. })
    }

    pub fn method(&self) -> CredentialMethod {
        match self {
            Resolution::Available { method, .. } => *method,
            Resolution::Unavailable(_) => CredentialMethod::None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Resolution::Available { identity, .. } => Some(identity),
            Resolution::Unavailable(_) => None,
        }
    }

    pub fn error(&self) -> Option<&CredentialError> {
        match self {
            Resolution::Available { .. } => None,
            Resolution::Unavailable(err) => Some(err),
        }
    }
}

pub struct CredentialResolver<I, E> {
    identity: I,
    probes: CredentialProbes<E>,
}

impl<I, E> CredentialResolver<I, E>
where
    I: IdentityProvider,
    E: EnvironmentProvider,
{
    pub fn new(identity: I, probes: CredentialProbes<E>) -> Self {
        Self { identity, probes }
    }

    /// Verify the caller identity, then work out which method supplied it.
    pub async fn resolve(&self) -> Resolution {
        let identity = match self.identity.get_caller_identity().await {
            Ok(identity) => identity,
            Err(e) => {
                warn!("caller identity check failed: {}", e);
                return Resolution::Unavailable(CredentialError::from(e));
            }
        };

        let method = self.probes.detect().await;
        info!("credentials available for account {} via {}", identity.account, method);
        Resolution::Available { method, identity }
    }
}
