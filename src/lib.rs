// Public modules
pub mod types;
pub mod errors;
pub mod config;
pub mod formatting;
pub mod credentials;
pub mod health;
pub mod aws;
pub mod collector;
pub mod report;
pub mod render;
pub mod setup;
pub mod app;

// Re-export commonly used items
pub use types::*;
pub use errors::{ApiError, CredentialError, FetchError, SetupError};
pub use config::{load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use formatting::{format_event_date, format_service, format_region, format_status, format_event_type, normalize_event};
pub use credentials::{CredentialResolver, CredentialProbes, IdentityProvider, Resolution};
pub use health::HealthApi;
pub use collector::{EventBatch, EventCollector};
pub use report::{HealthReport, ReportSummary, ScanOutcome};
pub use render::{Renderer, TerminalRenderer};
pub use app::{run_scan, OutputMode};
