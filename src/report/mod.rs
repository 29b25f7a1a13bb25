use crate::collector::EventBatch;
use crate::errors::FetchError;
use crate::types::NormalizedEvent;

/// Normalized events of one scan plus their status counts.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub events: Vec<NormalizedEvent>,
    summary: ReportSummary,
}

impl HealthReport {
    pub fn from_batch(batch: &EventBatch) -> Self {
        let status_is = |raw: &Option<String>, wanted: &[&str]| {
            let raw = raw.as_deref().unwrap_or("CLOSED");
            wanted.iter().any(|w| raw.eq_ignore_ascii_case(w))
        };
        let open = batch.events.iter().filter(|e| status_is(&e.event_status, &["OPEN"])).count();
        let resolved = batch
            .events
            .iter()
            .filter(|e| status_is(&e.event_status, &["CLOSED", "UPCOMING"]))
            .count();

        Self {
            events: batch.normalized().collect(),
            summary: ReportSummary {
                total: batch.len(),
                open,
                resolved,
            },
        }
    }

    pub fn summary(&self) -> ReportSummary {
        self.summary
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    pub open: usize,
    pub resolved: usize,
}

impl ReportSummary {
    pub fn has_open(&self) -> bool {
        self.open > 0
    }
}

/// Which result path the renderer should take.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Events(HealthReport),
    NoEvents,
    TierRestricted,
    FetchFailed(String),
}

impl ScanOutcome {
    pub fn from_fetch(result: Result<EventBatch, FetchError>) -> Self {
        match result {
            Ok(batch) if batch.is_empty() => ScanOutcome::NoEvents,
            Ok(batch) => ScanOutcome::Events(HealthReport::from_batch(&batch)),
            Err(FetchError::TierRestricted) => ScanOutcome::TierRestricted,
            Err(e @ FetchError::Service(_)) => ScanOutcome::FetchFailed(e.to_string()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScanOutcome::Events(_) => "events",
            ScanOutcome::NoEvents => "no-events",
            ScanOutcome::TierRestricted => "tier-restricted",
            ScanOutcome::FetchFailed(_) => "fetch-failed",
        }
    }
}
