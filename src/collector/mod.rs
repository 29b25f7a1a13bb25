use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::errors::FetchError;
use crate::formatting::normalize_event;
use crate::health::{HealthApi, ISSUE_CATEGORY, MAX_EVENTS, QUERY_STATUS_CODES};
use crate::types::{EventQuery, HealthEvent, NormalizedEvent};

/// Closed window `[now - days, now]`.
pub fn time_window(now: DateTime<Utc>, days: i64) -> (DateTime<Utc>, DateTime<Utc>) {
    (now - Duration::days(days), now)
}

pub fn issue_query(from: DateTime<Utc>, to: DateTime<Utc>) -> EventQuery {
    EventQuery {
        from,
        to,
        categories: vec![ISSUE_CATEGORY.to_string()],
        status_codes: QUERY_STATUS_CODES.iter().map(|s| s.to_string()).collect(),
        max_results: MAX_EVENTS,
    }
}

/// Attach descriptions by ARN. Events without a match are left untouched.
pub fn merge_descriptions(
    events: &mut [HealthEvent],
    descriptions: &std::collections::HashMap<String, String>,
) -> usize {
    let mut merged = 0;
    for event in events.iter_mut() {
        if let Some(text) = event.arn.as_ref().and_then(|arn| descriptions.get(arn)) {
            event.description = Some(text.clone());
            merged += 1;
        }
    }
    merged
}

/// Enriched events from one fetch, in API order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBatch {
    pub events: Vec<HealthEvent>,
}

impl EventBatch {
    pub fn new(events: Vec<HealthEvent>) -> Self {
        Self { events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn normalized(&self) -> impl Iterator<Item = NormalizedEvent> + '_ {
        self.events.iter().map(normalize_event)
    }
}

/// Fetch, enrich and hand back Health issue events.
pub struct EventCollector<'a, H> {
    api: &'a H,
}

impl<'a, H: HealthApi> EventCollector<'a, H> {
    pub fn new(api: &'a H) -> Self {
        Self { api }
    }

    pub async fn fetch_events(&self, window_days: i64) -> Result<EventBatch, FetchError> {
        self.fetch_events_at(Utc::now(), window_days).await
    }

    pub async fn fetch_events_at(&self, now: DateTime<Utc>, window_days: i64) -> Result<EventBatch, FetchError> {
        let (from, to) = time_window(now, window_days);
        info!("Querying Health issue events from {} to {}", from, to);

        let query = issue_query(from, to);
        let mut events = self.api.describe_events(&query).await.map_err(FetchError::from)?;
        info!("Health API returned {} events", events.len());

        if events.is_empty() {
            return Ok(EventBatch::default());
        }

        let arns: Vec<String> = events.iter().filter_map(|e| e.arn.clone()).collect();
        match self.api.describe_event_details(&arns).await {
            Ok(descriptions) => {
                let merged = merge_descriptions(&mut events, &descriptions);
                debug!("merged {} of {} event descriptions", merged, events.len());
            }
            Err(e) => warn!("could not fetch event details, continuing without descriptions: {}", e),
        }

        Ok(EventBatch::new(events))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ApiError;
    use crate::types::{EventStatus, StartTime};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeHealth {
        events: Vec<HealthEvent>,
        descriptions: HashMap<String, String>,
        events_error: Option<ApiError>,
        details_error: Option<ApiError>,
        queries: Mutex<Vec<EventQuery>>,
        detail_calls: Mutex<Vec<Vec<String>>>,
    }

    #[async_trait]
    impl HealthApi for FakeHealth {
        async fn describe_events(&self, query: &EventQuery) -> Result<Vec<HealthEvent>, ApiError> {
            self.queries.lock().unwrap().push(query.clone());
            match &self.events_error {
                Some(e) => Err(e.clone()),
                None => Ok(self.events.clone()),
            }
        }

        async fn describe_event_details(&self, arns: &[String]) -> Result<HashMap<String, String>, ApiError> {
            self.detail_calls.lock().unwrap().push(arns.to_vec());
            match &self.details_error {
                Some(e) => Err(e.clone()),
                None => Ok(self.descriptions.clone()),
            }
        }
    }

    fn event(arn: &str, service: &str, status: &str) -> HealthEvent {
        HealthEvent {
            arn: Some(arn.to_string()),
            service: Some(service.to_string()),
            event_type_code: Some(format!("AWS_{}_OPERATIONAL_ISSUE", service)),
            event_status: Some(status.to_string()),
            region: Some("us-east-1".to_string()),
            start_time: Some(StartTime::Instant(Utc::now() - Duration::days(3))),
            description: None,
        }
    }

    #[test]
    fn test_time_window() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let (from, to) = time_window(now, 90);
        assert_eq!(to, now);
        assert_eq!(from, Utc.with_ymd_and_hms(2024, 4, 1, 12, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_query_filter() {
        let api = FakeHealth::default();
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let batch = EventCollector::new(&api).fetch_events_at(now, 90).await.unwrap();
        assert!(batch.is_empty());

        let queries = api.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        let query = &queries[0];
        assert_eq!(query.categories, vec!["issue"]);
        assert_eq!(query.status_codes, vec!["open", "closed"]);
        assert_eq!(query.max_results, 100);
        assert_eq!(query.to - query.from, Duration::days(90));
        // no enrichment call for an empty result
        assert!(api.detail_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_enrichment() {
        let mut descriptions = HashMap::new();
        descriptions.insert("arn:1".to_string(), "EC2 instance failure".to_string());
        descriptions.insert("arn:3".to_string(), "ELB degradation".to_string());
        let api = FakeHealth {
            events: vec![
                event("arn:1", "EC2", "open"),
                event("arn:2", "RDS", "closed"),
                event("arn:3", "ELASTICLOADBALANCING", "closed"),
            ],
            descriptions,
            ..Default::default()
        };

        let batch = EventCollector::new(&api).fetch_events(90).await.unwrap();
        let normalized: Vec<NormalizedEvent> = batch.normalized().collect();

        assert_eq!(normalized.len(), 3);
        assert_eq!(normalized.iter().filter(|e| e.description.is_some()).count(), 2);
        assert_eq!(normalized[1].description, None);
        assert_eq!(
            normalized.iter().map(|e| e.service.as_str()).collect::<Vec<_>>(),
            vec!["EC2", "RDS", "ELB"]
        );
        assert_eq!(normalized[0].status, EventStatus::Open);

        let calls = api.detail_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], vec!["arn:1", "arn:2", "arn:3"]);
    }

    #[tokio::test]
    async fn test_subscription_required_is_tier_restricted() {
        let api = FakeHealth {
            events_error: Some(ApiError::Service {
                code: "SubscriptionRequiredException".into(),
                message: "Business support required".into(),
            }),
            ..Default::default()
        };
        let result = EventCollector::new(&api).fetch_events(90).await;
        assert_eq!(result, Err(FetchError::TierRestricted));
    }

    #[tokio::test]
    async fn test_other_service_error_is_generic() {
        let api = FakeHealth {
            events_error: Some(ApiError::Transport("connection reset".into())),
            ..Default::default()
        };
        let result = EventCollector::new(&api).fetch_events(90).await;
        assert_eq!(result, Err(FetchError::Service("connection reset".to_string())));
    }

    #[tokio::test]
    async fn test_enrichment_failure_keeps_events() {
        let api = FakeHealth {
            events: vec![event("arn:1", "EC2", "open")],
            details_error: Some(ApiError::Service {
                code: "InvalidParameter".into(),
                message: "bad".into(),
            }),
            ..Default::default()
        };
        let batch = EventCollector::new(&api).fetch_events(90).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.events[0].description, None);
    }

    #[test]
    fn test_merge_descriptions_ignores_events_without_arn() {
        let mut events = vec![HealthEvent::default(), event("arn:9", "S3", "open")];
        let mut descriptions = HashMap::new();
        descriptions.insert("arn:9".to_string(), "S3 latency".to_string());
        assert_eq!(merge_descriptions(&mut events, &descriptions), 1);
        assert_eq!(events[0].description, None);
        assert_eq!(events[1].description.as_deref(), Some("S3 latency"));
    }
}
