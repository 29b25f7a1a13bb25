use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::ApiError;
use crate::types::{EventQuery, HealthEvent};

pub const ISSUE_CATEGORY: &str = "issue";
pub const QUERY_STATUS_CODES: [&str; 2] = ["open", "closed"];
/// Results are capped at this many events; the pipeline does not paginate.
pub const MAX_EVENTS: i32 = 100;

/// The two Health API calls the event pipeline depends on.
#[async_trait]
pub trait HealthApi {
    async fn describe_events(&self, query: &EventQuery) -> Result<Vec<HealthEvent>, ApiError>;

    /// Latest description per event ARN. ARNs the service does not know are
    /// simply missing from the map.
    async fn describe_event_details(&self, arns: &[String]) -> Result<HashMap<String, String>, ApiError>;
}
