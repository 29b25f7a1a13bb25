use crate::types::{EventStatus, HealthEvent, NormalizedEvent, StartTime};

const SERVICE_LABELS: &[(&str, &str)] = &[
    ("EC2", "EC2"),
    ("RDS", "RDS"),
    ("ELASTICLOADBALANCING", "ELB"),
    ("S3", "S3"),
    ("DYNAMODB", "DynamoDB"),
    ("LAMBDA", "Lambda"),
    ("CLOUDFRONT", "CloudFront"),
];

const MAX_SERVICE_CHARS: usize = 15;
const MAX_EVENT_TYPE_CHARS: usize = 25;

pub fn format_event_date(event: &HealthEvent) -> String {
    match &event.start_time {
        Some(StartTime::Instant(dt)) => dt.format("%Y-%m-%d").to_string(),
        // text timestamps are expected to be ISO-8601 prefixed
        Some(StartTime::Text(s)) => s.chars().take(10).collect(),
        None => "N/A".to_string(),
    }
}

pub fn format_service(event: &HealthEvent) -> String {
    let service = event.service.as_deref().unwrap_or("");
    if service.is_empty() {
        return "Unknown".to_string();
    }
    let upper = service.to_uppercase();
    SERVICE_LABELS
        .iter()
        .find(|(key, _)| upper.contains(key))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| service.chars().take(MAX_SERVICE_CHARS).collect())
}

pub fn format_region(event: &HealthEvent) -> String {
    match event.region.as_deref() {
        Some(region) if !region.is_empty() => region.to_string(),
        _ => "Global".to_string(),
    }
}

pub fn format_status(event: &HealthEvent) -> EventStatus {
    match event.event_status.as_deref() {
        Some(status) if status.eq_ignore_ascii_case("open") => EventStatus::Open,
        _ => EventStatus::Resolved,
    }
}

pub fn format_event_type(event: &HealthEvent) -> String {
    let Some(code) = event.event_type_code.as_deref() else {
        return "Unknown".to_string();
    };
    title_case(&code.replace('_', " "))
        .chars()
        .take(MAX_EVENT_TYPE_CHARS)
        .collect()
}

/// Uppercase the first letter of every alphabetic run and lowercase the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

pub fn normalize_event(event: &HealthEvent) -> NormalizedEvent {
    NormalizedEvent {
        date: format_event_date(event),
        service: format_service(event),
        region: format_region(event),
        status: format_status(event),
        event_type: format_event_type(event),
        description: event.description.clone(),
    }
}
