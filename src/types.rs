use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct Config {
    pub health_region: String,
    pub lookback_days: i64,
    pub metadata_endpoint: String,
    pub metadata_timeout: Duration,
    pub env_file: PathBuf,
    pub home_dir: Option<PathBuf>,
}

/// Caller identity reported by STS for the active credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account: String,
    pub arn: String,
    pub user_id: Option<String>,
}

/// How the active credentials were most likely supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialMethod {
    RoleMetadata,
    EnvironmentVariables,
    SharedFile,
    SingleSignOn,
    Unknown,
    None,
}

impl CredentialMethod {
    pub fn label(&self) -> &'static str {
        match self {
            CredentialMethod::RoleMetadata => "IAM Role (EC2/ECS/Lambda)",
            CredentialMethod::EnvironmentVariables => "Environment Variables",
            CredentialMethod::SharedFile => "~/.aws/credentials",
            CredentialMethod::SingleSignOn => "AWS SSO",
            CredentialMethod::Unknown => "Unknown",
            CredentialMethod::None => "None",
        }
    }
}

impl fmt::Display for CredentialMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Start time as delivered by the Health API, or as free text when it
/// could not be parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum StartTime {
    Instant(DateTime<Utc>),
    Text(String),
}

/// Raw Health event, before any display formatting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthEvent {
    pub arn: Option<String>,
    pub service: Option<String>,
    pub event_type_code: Option<String>,
    pub event_status: Option<String>,
    pub region: Option<String>,
    pub start_time: Option<StartTime>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Open,
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusColor {
    Red,
    Dim,
}

impl EventStatus {
    pub fn glyph(&self) -> &'static str {
        match self {
            EventStatus::Open => "🔴 Open",
            EventStatus::Resolved => "⚪ Closed",
        }
    }

    pub fn color(&self) -> StatusColor {
        match self {
            EventStatus::Open => StatusColor::Red,
            EventStatus::Resolved => StatusColor::Dim,
        }
    }
}

/// Display-ready view of a [`HealthEvent`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEvent {
    pub date: String,
    pub service: String,
    pub region: String,
    pub status: EventStatus,
    pub event_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Filter sent to `DescribeEvents`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub categories: Vec<String>,
    pub status_codes: Vec<String>,
    pub max_results: i32,
}
