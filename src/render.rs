use std::io::{self, Write};

use colored::Colorize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, Table};

use crate::errors::CredentialError;
use crate::report::{HealthReport, ReportSummary, ScanOutcome};
use crate::types::{CredentialMethod, EventStatus, Identity, NormalizedEvent, StatusColor};

pub const CTA_URL: &str = "https://awscostguardian.com";
pub const CREDENTIALS_DOCS_URL: &str = "https://docs.aws.amazon.com/cli/latest/userguide/cli-configure-files.html";
pub const HEALTH_IAM_DOCS_URL: &str = "https://docs.aws.amazon.com/health/latest/ug/security_iam_service-with-iam.html";
pub const SUPPORT_PLANS_URL: &str = "https://aws.amazon.com/premiumsupport/";
pub const AWS_CLI_INSTALL_URL: &str = "https://aws.amazon.com/cli/";
pub const SECURITY_CREDENTIALS_URL: &str = "https://console.aws.amazon.com/iam/home#/security_credentials";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
    Hint,
}

/// Everything the scan and the setup wizard print goes through this trait.
pub trait Renderer {
    fn banner(&mut self) -> io::Result<()>;
    fn step_started(&mut self, label: &str) -> io::Result<()>;
    fn step_done(&mut self) -> io::Result<()>;
    fn step_failed(&mut self) -> io::Result<()>;
    fn credential_error(&mut self, err: &CredentialError) -> io::Result<()>;
    fn outcome(&mut self, outcome: &ScanOutcome, window_days: i64) -> io::Result<()>;
    fn events_json(&mut self, events: &[NormalizedEvent]) -> io::Result<()>;
    fn call_to_action(&mut self) -> io::Result<()>;
    fn panel(&mut self, lines: &[String], border: Color) -> io::Result<()>;
    fn message(&mut self, level: MessageLevel, text: &str) -> io::Result<()>;
    /// Text kept off the main output, such as guidance while JSON is written.
    fn diagnostic(&mut self, lines: &[String]) -> io::Result<()>;
}

fn panel_table(lines: &[String], border: Color) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .add_row(vec![Cell::new(lines.join("\n")).fg(border)]);
    table
}

pub fn build_banner() -> Table {
    panel_table(
        &[
            "🔍 AWS SLA Hunter".to_string(),
            "Finding missed SLA credits in your AWS account".to_string(),
        ],
        Color::Cyan,
    )
}

fn status_cell(status: EventStatus) -> Cell {
    let cell = Cell::new(status.glyph()).set_alignment(CellAlignment::Center);
    match status.color() {
        StatusColor::Red => cell.fg(Color::Red).add_attribute(Attribute::Bold),
        StatusColor::Dim => cell.add_attribute(Attribute::Dim),
    }
}

pub fn build_events_table(report: &HealthReport) -> Table {
    let header = ["Date", "Service", "Region", "Status", "Event Type"]
        .into_iter()
        .map(|h| Cell::new(h).fg(Color::Magenta).add_attribute(Attribute::Bold));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);

    for event in &report.events {
        table.add_row(vec![
            Cell::new(&event.date).fg(Color::Cyan),
            Cell::new(&event.service).fg(Color::Green),
            Cell::new(&event.region).fg(Color::Blue),
            status_cell(event.status),
            Cell::new(&event.event_type).fg(Color::Yellow),
        ]);
    }
    table
}

pub fn events_title(count: usize, window_days: i64) -> String {
    format!("AWS Health Events - Last {} Days ({} found)", window_days, count)
}

pub fn summary_lines(summary: &ReportSummary) -> Vec<String> {
    vec![
        format!("Found {} AWS Health events with SLA potential", summary.total),
        format!("● {} Open | ⚪ {} Resolved", summary.open, summary.resolved),
    ]
}

pub fn no_events_lines(window_days: i64) -> Vec<String> {
    vec![
        "✓ All Good".to_string(),
        format!("ℹ️  No SLA-eligible events found in the last {} days.", window_days),
        "Your AWS services are running smoothly! Monitor regularly with aws-sla-hunter.".to_string(),
    ]
}

pub fn tier_guidance_lines() -> Vec<String> {
    vec![
        "⚠️  AWS Health API requires Business or Enterprise Support.".to_string(),
        "📋 You're on a Free/Basic Support Plan".to_string(),
        String::new(),
        "Good news: you have SLA credit rights!".to_string(),
        "AWS provides SLA credits for unplanned downtime, even on free tier.".to_string(),
        String::new(),
        "Option 1: Monitor Manually (Free)".to_string(),
        "  1. Go to AWS Console → Health Dashboard".to_string(),
        "  2. Check for incident reports in your regions".to_string(),
        "  3. If you find issues, open an AWS Support ticket".to_string(),
        "  4. Claim SLA credits in the ticket".to_string(),
        String::new(),
        "Option 2: Upgrade to Business Support".to_string(),
        "  ✓ Unlocks this automated SLA detection".to_string(),
        "  ✓ 24/7 support for production issues".to_string(),
        format!("  🚀 Upgrade: {}", SUPPORT_PLANS_URL),
        String::new(),
        "Option 3: Use awscostguardian.com".to_string(),
        "  • Automates SLA detection across your account".to_string(),
        "  • Works with any support level".to_string(),
        format!("  • Free audit: {}", CTA_URL),
    ]
}

pub fn call_to_action_lines() -> Vec<String> {
    vec![
        "💰 CLAIM YOUR MISSING SLA CREDITS".to_string(),
        String::new(),
        "aws-sla-hunter found events with SLA credit potential,".to_string(),
        "but you'll need to:".to_string(),
        "  1. Calculate financial impact".to_string(),
        "  2. Generate formal claim documents".to_string(),
        "  3. Open AWS support ticket".to_string(),
        "  4. Track reimbursement".to_string(),
        String::new(),
        "Let awscostguardian.com handle this automatically.".to_string(),
        "Our platform analyzes your entire account, calculates credits,".to_string(),
        "generates claims, and tracks reimbursements.".to_string(),
        String::new(),
        "🚀 START YOUR FREE AUDIT".to_string(),
        CTA_URL.to_string(),
        String::new(),
        "Success fee model: we only earn 30% of recovered credits".to_string(),
    ]
}

pub fn credential_remediation(err: &CredentialError) -> Vec<String> {
    match err {
        CredentialError::NoCredentials => vec![
            "❌ ERROR: AWS credentials not found.".to_string(),
            "Please configure AWS credentials using one of these methods:".to_string(),
            "  • AWS CLI: aws configure".to_string(),
            "  • Environment variables: AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY".to_string(),
            "  • IAM Role (EC2/ECS/Lambda)".to_string(),
            "Or run: aws-sla-hunter --setup".to_string(),
            format!("See: {}", CREDENTIALS_DOCS_URL),
        ],
        CredentialError::AccessDenied => vec![
            "❌ ERROR: Access denied.".to_string(),
            "Your IAM user/role needs these permissions:".to_string(),
            "  • health:DescribeEvents".to_string(),
            "  • health:DescribeEventDetails".to_string(),
            format!("See: {}", HEALTH_IAM_DOCS_URL),
        ],
        CredentialError::ExpiredCredentials => vec![
            "❌ ERROR: AWS credentials are invalid or expired.".to_string(),
            "  • SSO users: aws sso login".to_string(),
            "  • Otherwise reconfigure with: aws-sla-hunter --setup".to_string(),
        ],
        CredentialError::Service(msg) => vec![format!("❌ AWS Error: {}", msg)],
    }
}

pub fn auth_lines(method: CredentialMethod, identity: Option<&Identity>) -> Vec<String> {
    let mut lines = vec!["✓ Authentication Method".to_string(), method.label().to_string()];
    if let Some(identity) = identity {
        lines.push(format!("Account: {}", identity.account));
        lines.push(format!("User: {}", identity.arn));
    }
    lines
}

pub struct TerminalRenderer<W: Write, D: Write = io::Stderr> {
    out: W,
    diagnostics: D,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self::with_diagnostics(out, io::stderr())
    }
}

impl<W: Write, D: Write> TerminalRenderer<W, D> {
    pub fn with_diagnostics(out: W, diagnostics: D) -> Self {
        Self { out, diagnostics }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn into_parts(self) -> (W, D) {
        (self.out, self.diagnostics)
    }

    fn table(&mut self, table: &Table) -> io::Result<()> {
        writeln!(self.out, "{}", table)?;
        writeln!(self.out)
    }
}

impl<W: Write, D: Write> Renderer for TerminalRenderer<W, D> {
    fn banner(&mut self) -> io::Result<()> {
        self.table(&build_banner())
    }

    fn step_started(&mut self, label: &str) -> io::Result<()> {
        write!(self.out, "{} {}... ", "→".cyan(), label)?;
        self.out.flush()
    }

    fn step_done(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", "✓".green())?;
        writeln!(self.out)
    }

    fn step_failed(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", "✗".red())?;
        writeln!(self.out)
    }

    fn credential_error(&mut self, err: &CredentialError) -> io::Result<()> {
        let mut lines = credential_remediation(err).into_iter();
        if let Some(first) = lines.next() {
            writeln!(self.out, "{}", first.red())?;
        }
        for line in lines {
            writeln!(self.out, "{}", line)?;
        }
        Ok(())
    }

    fn outcome(&mut self, outcome: &ScanOutcome, window_days: i64) -> io::Result<()> {
        match outcome {
            ScanOutcome::Events(report) => {
                writeln!(
                    self.out,
                    "{}",
                    events_title(report.events.len(), window_days).cyan().bold()
                )?;
                self.table(&build_events_table(report))?;
                let summary = report.summary();
                let border = if summary.has_open() { Color::Red } else { Color::Cyan };
                self.panel(&summary_lines(&summary), border)
            }
            ScanOutcome::NoEvents => self.panel(&no_events_lines(window_days), Color::Yellow),
            ScanOutcome::TierRestricted => self.panel(&tier_guidance_lines(), Color::Yellow),
            ScanOutcome::FetchFailed(msg) => {
                writeln!(self.out, "{}", format!("❌ {}", msg).red())?;
                writeln!(self.out)
            }
        }
    }

    fn events_json(&mut self, events: &[NormalizedEvent]) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut self.out, events)?;
        writeln!(self.out)
    }

    fn call_to_action(&mut self) -> io::Result<()> {
        self.panel(&call_to_action_lines(), Color::Yellow)
    }

    fn panel(&mut self, lines: &[String], border: Color) -> io::Result<()> {
        self.table(&panel_table(lines, border))
    }

    fn message(&mut self, level: MessageLevel, text: &str) -> io::Result<()> {
        let styled = match level {
            MessageLevel::Info => text.cyan(),
            MessageLevel::Success => text.green(),
            MessageLevel::Warning => text.yellow(),
            MessageLevel::Error => text.red(),
            MessageLevel::Hint => text.dimmed(),
        };
        writeln!(self.out, "{}", styled)
    }

    fn diagnostic(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            writeln!(self.diagnostics, "{}", line)?;
        }
        self.diagnostics.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::EventBatch;
    use crate::types::{HealthEvent, StartTime};

    fn sample_report() -> HealthReport {
        let batch = EventBatch::new(vec![
            HealthEvent {
                arn: Some("arn:1".to_string()),
                service: Some("EC2".to_string()),
                event_type_code: Some("AWS_EC2_INSTANCE_FAILURE".to_string()),
                event_status: Some("open".to_string()),
                region: Some("us-east-1".to_string()),
                start_time: Some(StartTime::Text("2024-05-02T10:00:00Z".to_string())),
                description: Some("instance failure".to_string()),
            },
            HealthEvent {
                arn: Some("arn:2".to_string()),
                service: Some("RDS".to_string()),
                event_type_code: Some("AWS_RDS_OUTAGE".to_string()),
                event_status: Some("closed".to_string()),
                region: None,
                start_time: None,
                description: None,
            },
        ]);
        HealthReport::from_batch(&batch)
    }

    fn rendered<F>(f: F) -> String
    where
        F: FnOnce(&mut TerminalRenderer<Vec<u8>>) -> io::Result<()>,
    {
        let mut renderer = TerminalRenderer::new(Vec::new());
        f(&mut renderer).unwrap();
        String::from_utf8(renderer.into_inner()).unwrap()
    }

    #[test]
    fn test_events_table_rows() {
        let text = build_events_table(&sample_report()).to_string();
        for expected in [
            "Date",
            "Event Type",
            "2024-05-02",
            "EC2",
            "us-east-1",
            "🔴 Open",
            "Aws Ec2 Instance Failure",
            "N/A",
            "Global",
            "⚪ Closed",
            "Aws Rds Outage",
        ] {
            assert!(text.contains(expected), "missing {:?} in\n{}", expected, text);
        }
    }

    #[test]
    fn test_outcome_events_renders_table_and_summary() {
        let text = rendered(|r| r.outcome(&ScanOutcome::Events(sample_report()), 90));
        assert!(text.contains("Last 90 Days (2 found)"));
        assert!(text.contains("Found 2 AWS Health events"));
        assert!(text.contains("1 Open"));
        assert!(text.contains("1 Resolved"));
    }

    #[test]
    fn test_outcome_guidance_paths() {
        let text = rendered(|r| r.outcome(&ScanOutcome::NoEvents, 90));
        assert!(text.contains("No SLA-eligible events found in the last 90 days"));
        assert!(!text.contains("Business or Enterprise"));

        let text = rendered(|r| r.outcome(&ScanOutcome::TierRestricted, 90));
        assert!(text.contains("Business or Enterprise Support"));
        assert!(text.contains(SUPPORT_PLANS_URL));

        let text = rendered(|r| r.outcome(&ScanOutcome::FetchFailed("error fetching events: boom".into()), 90));
        assert!(text.contains("error fetching events: boom"));
    }

    #[test]
    fn test_credential_remediation_texts() {
        let no_creds = credential_remediation(&CredentialError::NoCredentials).join("\n");
        assert!(no_creds.contains("aws configure"));
        assert!(no_creds.contains("AWS_ACCESS_KEY_ID"));
        assert!(no_creds.contains("IAM Role"));

        let denied = credential_remediation(&CredentialError::AccessDenied).join("\n");
        assert!(denied.contains("health:DescribeEvents"));
        assert!(denied.contains("health:DescribeEventDetails"));

        let text = rendered(|r| r.credential_error(&CredentialError::Service("Throttling".into())));
        assert!(text.contains("AWS Error: Throttling"));
    }

    #[test]
    fn test_events_json() {
        let report = sample_report();
        let text = rendered(|r| r.events_json(&report.events));
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let items = parsed.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["status"], "open");
        assert_eq!(items[0]["description"], "instance failure");
        assert_eq!(items[1]["status"], "resolved");
        assert!(items[1].get("description").is_none());
    }

    #[test]
    fn test_auth_lines() {
        let identity = Identity {
            account: "123456789012".to_string(),
            arn: "arn:aws:iam::123456789012:user/ops".to_string(),
            user_id: None,
        };
        let lines = auth_lines(CredentialMethod::SingleSignOn, Some(&identity));
        assert_eq!(lines[1], "AWS SSO");
        assert!(lines.contains(&"Account: 123456789012".to_string()));
        assert_eq!(auth_lines(CredentialMethod::Unknown, None).len(), 2);
    }

    #[test]
    fn test_diagnostics_stay_off_main_output() {
        let mut renderer = TerminalRenderer::with_diagnostics(Vec::new(), Vec::new());
        renderer.diagnostic(&tier_guidance_lines()).unwrap();
        let (out, diagnostics) = renderer.into_parts();
        assert!(out.is_empty());
        assert!(String::from_utf8(diagnostics).unwrap().contains("Business or Enterprise Support"));
    }

    #[test]
    fn test_call_to_action_mentions_audit() {
        let text = rendered(|r| r.call_to_action());
        assert!(text.contains("START YOUR FREE AUDIT"));
        assert!(text.contains(CTA_URL));
    }
}
