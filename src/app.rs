use std::io;

use tracing::info;

use crate::collector::EventCollector;
use crate::config::EnvironmentProvider;
use crate::credentials::{CredentialResolver, IdentityProvider};
use crate::errors::FetchError;
use crate::health::HealthApi;
use crate::render::{credential_remediation, tier_guidance_lines, Renderer};
use crate::report::ScanOutcome;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_CREDENTIALS: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Table,
    Json,
}

/// Resolve credentials, fetch events and render them. Returns the exit code.
pub async fn run_scan<I, E, H, R>(
    resolver: &CredentialResolver<I, E>,
    collector: &EventCollector<'_, H>,
    renderer: &mut R,
    window_days: i64,
    output: OutputMode,
) -> io::Result<i32>
where
    I: IdentityProvider,
    E: EnvironmentProvider,
    H: HealthApi,
    R: Renderer,
{
    let table = output == OutputMode::Table;

    if table {
        renderer.banner()?;
        renderer.step_started("Verifying AWS credentials")?;
    }
    let resolution = resolver.resolve().await;
    if let Some(err) = resolution.error() {
        if table {
            renderer.step_failed()?;
            renderer.credential_error(err)?;
        } else {
            renderer.diagnostic(&credential_remediation(err))?;
        }
        return Ok(EXIT_CREDENTIALS);
    }

    if table {
        renderer.step_done()?;
        renderer.step_started(&format!("Fetching AWS Health events (last {} days)", window_days))?;
    }
    let outcome = ScanOutcome::from_fetch(collector.fetch_events(window_days).await);
    info!("scan outcome: {}", outcome.label());

    if !table {
        // the main output carries only the JSON array
        let events = match &outcome {
            ScanOutcome::Events(report) => report.events.clone(),
            ScanOutcome::NoEvents => Vec::new(),
            ScanOutcome::TierRestricted => {
                let mut lines = vec![FetchError::TierRestricted.to_string()];
                lines.extend(tier_guidance_lines());
                renderer.diagnostic(&lines)?;
                Vec::new()
            }
            ScanOutcome::FetchFailed(msg) => {
                renderer.diagnostic(&[msg.clone()])?;
                Vec::new()
            }
        };
        renderer.events_json(&events)?;
        return Ok(EXIT_SUCCESS);
    }

    match outcome {
        ScanOutcome::FetchFailed(_) => renderer.step_failed()?,
        _ => renderer.step_done()?,
    }
    renderer.outcome(&outcome, window_days)?;
    renderer.call_to_action()?;
    Ok(EXIT_SUCCESS)
}
