use std::path::PathBuf;

use tracing::debug;

use crate::config::EnvironmentProvider;
use crate::types::{Config, CredentialMethod};

/// Probe order mirrors the SDK's default provider chain; first match wins.
pub const PROBE_ORDER: [CredentialMethod; 4] = [
    CredentialMethod::RoleMetadata,
    CredentialMethod::EnvironmentVariables,
    CredentialMethod::SharedFile,
    CredentialMethod::SingleSignOn,
];

pub const SSO_MARKERS: [&str; 2] = ["sso_start_url", "sso_account_id"];

/// Read-only checks that guess where the active credentials came from.
pub struct CredentialProbes<E> {
    env: E,
    home: Option<PathBuf>,
    metadata_endpoint: String,
    http: reqwest::Client,
}

impl<E: EnvironmentProvider> CredentialProbes<E> {
    pub fn new(env: E, config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.metadata_timeout)
            .no_proxy()
            .build()?;
        Ok(Self {
            env,
            home: config.home_dir.clone(),
            metadata_endpoint: config.metadata_endpoint.clone(),
            http,
        })
    }

    pub async fn detect(&self) -> CredentialMethod {
        for method in PROBE_ORDER {
            if self.probe(method).await {
                debug!("credential probe matched: {}", method);
                return method;
            }
        }
        CredentialMethod::Unknown
    }

    pub async fn probe(&self, method: CredentialMethod) -> bool {
        match method {
            CredentialMethod::RoleMetadata => self.metadata_reachable().await,
            CredentialMethod::EnvironmentVariables => self.env_credentials_present(),
            CredentialMethod::SharedFile => self.shared_credentials_file_exists(),
            CredentialMethod::SingleSignOn => self.sso_configured(),
            CredentialMethod::Unknown | CredentialMethod::None => false,
        }
    }

    /// A 2xx answer, or the 401 an IMDSv2-only host gives a tokenless GET.
    async fn metadata_reachable(&self) -> bool {
        match self.http.get(&self.metadata_endpoint).send().await {
            Ok(res) => {
                let status = res.status();
                debug!("metadata endpoint answered with {}", status);
                status.is_success() || status == reqwest::StatusCode::UNAUTHORIZED
            }
            Err(e) => {
                debug!("metadata endpoint unreachable: {}", e);
                false
            }
        }
    }

    fn env_credentials_present(&self) -> bool {
        let set = |key: &str| self.env.get_var(key).map(|v| !v.is_empty()).unwrap_or(false);
        set("AWS_ACCESS_KEY_ID") && set("AWS_SECRET_ACCESS_KEY")
    }

    fn shared_credentials_file_exists(&self) -> bool {
        self.aws_file("credentials").map(|p| p.exists()).unwrap_or(false)
    }

    fn sso_configured(&self) -> bool {
        let Some(path) = self.aws_file("config") else {
            return false;
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => SSO_MARKERS.iter().any(|marker| content.contains(marker)),
            Err(_) => false,
        }
    }

    fn aws_file(&self, name: &str) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join(".aws").join(name))
    }
}
