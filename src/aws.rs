use std::collections::HashMap;
use std::error::Error;
use std::future::Future;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::error::CredentialsError;
use aws_sdk_health::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_health::primitives::{DateTime as SmithyDateTime, DateTimeFormat};
use aws_sdk_health::types::{DateTimeRange, Event, EventFilter, EventStatusCode, EventTypeCategory};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::credentials::IdentityProvider;
use crate::errors::ApiError;
use crate::health::HealthApi;
use crate::types::{EventQuery, HealthEvent, Identity, StartTime};

/// `DescribeEventDetails` accepts at most this many ARNs per request.
const DETAILS_BATCH_SIZE: usize = 10;

pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}

/// Map an SDK failure onto the crate's error kinds.
pub fn api_error<E, R>(err: SdkError<E, R>) -> ApiError
where
    E: ProvideErrorMetadata + Error + 'static,
    R: std::fmt::Debug + 'static,
{
    let detail = DisplayErrorContext(&err).to_string();
    if let SdkError::ServiceError(ctx) = &err {
        let service_err = ctx.err();
        return ApiError::Service {
            code: service_err.code().unwrap_or("Unknown").to_string(),
            message: service_err.message().map(str::to_string).unwrap_or(detail),
        };
    }
    match credentials_error(&err) {
        Some(CredentialsError::CredentialsNotLoaded(_)) => ApiError::NoCredentials(detail),
        Some(CredentialsError::InvalidConfiguration(_)) => ApiError::PartialCredentials(detail),
        Some(CredentialsError::ProviderTimedOut(_)) | None => ApiError::Transport(detail),
        Some(_) => ApiError::CredentialProvider(detail),
    }
}

/// First credential-chain failure found while walking the source chain.
fn credentials_error<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a CredentialsError> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(found) = e.downcast_ref::<CredentialsError>() {
            return Some(found);
        }
        current = e.source();
    }
    None
}

/// Sends one request per `DETAILS_BATCH_SIZE` ARNs and merges the answers.
async fn fetch_in_batches<F, Fut>(arns: &[String], mut fetch: F) -> Result<HashMap<String, String>, ApiError>
where
    F: FnMut(Vec<String>) -> Fut,
    Fut: Future<Output = Result<HashMap<String, String>, ApiError>>,
{
    let mut merged = HashMap::new();
    for chunk in arns.chunks(DETAILS_BATCH_SIZE) {
        merged.extend(fetch(chunk.to_vec()).await?);
    }
    Ok(merged)
}

pub struct StsIdentityProvider {
    client: aws_sdk_sts::Client,
}

impl StsIdentityProvider {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_sts::Client::new(sdk),
        }
    }
}

#[async_trait]
impl IdentityProvider for StsIdentityProvider {
    async fn get_caller_identity(&self) -> Result<Identity, ApiError> {
        let out = self.client.get_caller_identity().send().await.map_err(api_error)?;
        Ok(Identity {
            account: out.account().unwrap_or_default().to_string(),
            arn: out.arn().unwrap_or_default().to_string(),
            user_id: out.user_id().map(str::to_string),
        })
    }
}

pub struct AwsHealthApi {
    client: aws_sdk_health::Client,
}

impl AwsHealthApi {
    pub fn new(sdk: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_health::Client::new(sdk),
        }
    }
}

#[async_trait]
impl HealthApi for AwsHealthApi {
    async fn describe_events(&self, query: &EventQuery) -> Result<Vec<HealthEvent>, ApiError> {
        let range = DateTimeRange::builder()
            .from(to_smithy(query.from))
            .to(to_smithy(query.to))
            .build();
        let mut filter = EventFilter::builder().start_times(range);
        for category in &query.categories {
            filter = filter.event_type_categories(EventTypeCategory::from(category.as_str()));
        }
        for status in &query.status_codes {
            filter = filter.event_status_codes(EventStatusCode::from(status.as_str()));
        }

        let out = self
            .client
            .describe_events()
            .filter(filter.build())
            .max_results(query.max_results)
            .send()
            .await
            .map_err(api_error)?;

        Ok(out.events().iter().map(event_from_sdk).collect())
    }

    async fn describe_event_details(&self, arns: &[String]) -> Result<HashMap<String, String>, ApiError> {
        fetch_in_batches(arns, move |batch| self.details_batch(batch)).await
    }
}

impl AwsHealthApi {
    async fn details_batch(&self, arns: Vec<String>) -> Result<HashMap<String, String>, ApiError> {
        let out = self
            .client
            .describe_event_details()
            .set_event_arns(Some(arns))
            .send()
            .await
            .map_err(api_error)?;

        if !out.failed_set().is_empty() {
            debug!("{} event details could not be fetched", out.failed_set().len());
        }
        let mut descriptions = HashMap::new();
        for detail in out.successful_set() {
            let arn = detail.event().and_then(|e| e.arn());
            let text = detail.event_description().and_then(|d| d.latest_description());
            if let (Some(arn), Some(text)) = (arn, text) {
                descriptions.insert(arn.to_string(), text.to_string());
            }
        }
        Ok(descriptions)
    }
}

fn to_smithy(dt: DateTime<Utc>) -> SmithyDateTime {
    SmithyDateTime::from_secs(dt.timestamp())
}

fn start_time_from_sdk(dt: &SmithyDateTime) -> Option<StartTime> {
    match DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos()) {
        Some(instant) => Some(StartTime::Instant(instant)),
        None => dt.fmt(DateTimeFormat::DateTime).ok().map(StartTime::Text),
    }
}

fn event_from_sdk(event: &Event) -> HealthEvent {
    HealthEvent {
        arn: event.arn().map(str::to_string),
        service: event.service().map(str::to_string),
        event_type_code: event.event_type_code().map(str::to_string),
        event_status: event.status_code().map(|s| s.as_str().to_string()),
        region: event.region().map(str::to_string),
        start_time: event.start_time().and_then(start_time_from_sdk),
        description: None,
    }
}
