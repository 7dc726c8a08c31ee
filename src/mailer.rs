//! Report delivery by email
//!
//! Builds a multipart MIME message (HTML body plus the CSV attachment) and
//! sends it as a raw message through SES v2 to the configured distribution
//! list.

use anyhow::{Context, Result};
use aws_sdk_sesv2::primitives::Blob;
use aws_sdk_sesv2::types::{Destination, EmailContent, RawMessage};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;
use tracing::info;

use crate::aws::context::AwsContext;
use crate::config::MailConfig;

/// Email subject and body heading for a report object key.
///
/// Selection follows the key-prefix convention shared with the generator.
pub fn subject_for_key(key: &str) -> (&'static str, &'static str) {
    if key.starts_with("ami_report_") {
        ("Amazon AMI Report", "AWS Machine Image (AMI) Report")
    } else if key.starts_with("snapshot_report_") {
        ("Amazon Snapshot Report", "AWS Snapshot Report")
    } else {
        ("AWS Report", "AWS Report")
    }
}

/// Whether an object key names a mailable report.
pub fn is_report_key(key: &str) -> bool {
    key.ends_with(".csv")
}

/// SES-backed mailer for report objects.
pub struct ReportMailer {
    ses: aws_sdk_sesv2::Client,
    config: MailConfig,
}

impl ReportMailer {
    pub fn from_context(ctx: &AwsContext, config: MailConfig) -> Self {
        Self {
            ses: ctx.ses_client(),
            config,
        }
    }

    /// Mail one report object to the distribution list.
    pub async fn send_report(&self, key: &str, csv: Vec<u8>) -> Result<()> {
        let (subject, heading) = subject_for_key(key);
        let raw = build_message(&self.config, subject, heading, key, csv)?;

        let content = EmailContent::builder()
            .raw(
                RawMessage::builder()
                    .data(Blob::new(raw))
                    .build()
                    .context("Failed to build raw message")?,
            )
            .build();

        let destination = Destination::builder()
            .set_to_addresses(Some(self.config.recipients.clone()))
            .build();

        self.ses
            .send_email()
            .from_email_address(&self.config.sender)
            .destination(destination)
            .content(content)
            .send()
            .await
            .context("SES send failed")?;

        info!(
            key = %key,
            recipients = self.config.recipients.len(),
            subject = %subject,
            "Report emailed"
        );
        Ok(())
    }
}

/// Assemble the multipart message: HTML body plus the CSV attachment named
/// after the report object key.
fn build_message(
    config: &MailConfig,
    subject: &str,
    heading: &str,
    key: &str,
    csv: Vec<u8>,
) -> Result<Vec<u8>> {
    let from: Mailbox = config
        .sender
        .parse()
        .with_context(|| format!("Invalid sender address '{}'", config.sender))?;

    let mut builder = Message::builder().from(from).subject(subject);
    for recipient in &config.recipients {
        let to: Mailbox = recipient
            .parse()
            .with_context(|| format!("Invalid recipient address '{recipient}'"))?;
        builder = builder.to(to);
    }

    let body_html = format!(
        "<html>\n<head></head>\n<body>\n  <h1>{heading}</h1>\n  <p>Report attached as csv file.</p>\n</body>\n</html>"
    );

    let attachment = Attachment::new(key.to_string()).body(
        csv,
        ContentType::parse("text/csv").context("Invalid attachment content type")?,
    );

    let message = builder
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::html(body_html))
                .singlepart(attachment),
        )
        .context("Failed to build email message")?;

    Ok(message.formatted())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_selection_by_prefix() {
        assert_eq!(
            subject_for_key("ami_report_2026-08-24.csv").0,
            "Amazon AMI Report"
        );
        assert_eq!(
            subject_for_key("snapshot_report_2026-08-24.csv").0,
            "Amazon Snapshot Report"
        );
        assert_eq!(subject_for_key("quarterly_summary.csv").0, "AWS Report");
    }

    #[test]
    fn only_csv_keys_are_mailable() {
        assert!(is_report_key("ami_report_2026-08-24.csv"));
        assert!(!is_report_key("ami_report_2026-08-24.csv.tmp"));
        assert!(!is_report_key("readme.txt"));
    }

    #[test]
    fn message_contains_heading_and_attachment_name() {
        let config = MailConfig {
            sender: "reports@example.com".to_string(),
            recipients: vec!["a@example.com".to_string(), "b@example.com".to_string()],
        };
        let raw = build_message(
            &config,
            "Amazon AMI Report",
            "AWS Machine Image (AMI) Report",
            "ami_report_2026-08-24.csv",
            b"Tenant,Name\r\nmgmt,x".to_vec(),
        )
        .unwrap();

        let text = String::from_utf8_lossy(&raw);
        assert!(text.contains("Subject: Amazon AMI Report"));
        assert!(text.contains("AWS Machine Image (AMI) Report"));
        assert!(text.contains("ami_report_2026-08-24.csv"));
        assert!(text.contains("To: a@example.com, b@example.com"));
    }

    #[test]
    fn invalid_sender_rejected() {
        let config = MailConfig {
            sender: "not an address".to_string(),
            recipients: vec!["a@example.com".to_string()],
        };
        assert!(build_message(&config, "s", "h", "k.csv", Vec::new()).is_err());
    }
}
