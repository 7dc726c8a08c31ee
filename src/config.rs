//! Run configuration for report generation and mailing
//!
//! Everything is supplied through CLI flags with environment fallbacks, so
//! the tool works both as a cron job and in an event-driven environment.

use anyhow::{bail, Context, Result};

/// Strongly-typed AWS account ID (12-digit string)
///
/// This newtype prevents accidentally mixing account IDs with other strings
/// and ensures validation happens once, at configuration load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub struct AccountId(String);

impl AccountId {
    /// Parse and validate a 12-digit account ID.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != 12 || !s.bytes().all(|b| b.is_ascii_digit()) {
            bail!("Invalid AWS account ID '{s}' (expected 12 digits)");
        }
        Ok(AccountId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A tenant account enumerated under delegated credentials.
///
/// `name` is the display/aggregation key used in the rendered report;
/// `account_id` is the account whose resources are listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tenant {
    pub name: String,
    pub account_id: AccountId,
}

/// Which inventory a run reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportKind {
    /// Machine image (AMI) inventory
    Ami,
    /// EBS snapshot inventory
    Snapshot,
}

impl ReportKind {
    /// Cross-account role assumed in each tenant account for this kind.
    pub fn role_name(self) -> &'static str {
        match self {
            ReportKind::Ami => "AMI_Reporting",
            ReportKind::Snapshot => "snapshot-reporting",
        }
    }

    /// Report object key prefix (also drives email subject selection).
    pub fn object_prefix(self) -> &'static str {
        match self {
            ReportKind::Ami => "ami_report_",
            ReportKind::Snapshot => "snapshot_report_",
        }
    }

    /// Object key for a report generated on the given date.
    pub fn object_key(self, date: chrono::NaiveDate) -> String {
        format!("{}{}.csv", self.object_prefix(), date.format("%Y-%m-%d"))
    }
}

/// Configuration for one `generate` run.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    /// Destination S3 bucket for the CSV
    pub bucket: String,
    /// KMS key used for server-side encryption of the report object
    pub kms_key_id: String,
    /// Display alias for the home (management) account
    pub home_alias: String,
    /// Home account ID (snapshot listings filter on OwnerIds)
    pub home_account_id: AccountId,
    /// Tenant accounts, in configured order
    pub tenants: Vec<Tenant>,
}

impl ReportConfig {
    /// Build and validate a config from raw (pre-split) inputs.
    ///
    /// The tenant name and account lists are zipped positionally; mismatched
    /// lengths are rejected rather than silently truncated.
    pub fn new(
        bucket: String,
        kms_key_id: String,
        home_alias: String,
        home_account_id: &str,
        tenant_names: &str,
        tenant_accounts: &str,
    ) -> Result<Self> {
        if bucket.trim().is_empty() {
            bail!("Report bucket must not be empty");
        }
        if home_alias.trim().is_empty() {
            bail!("Home account alias must not be empty");
        }
        let home_account_id =
            AccountId::parse(home_account_id).context("Invalid home account ID")?;
        let tenants = parse_tenants(tenant_names, tenant_accounts)?;
        Ok(Self {
            bucket,
            kms_key_id,
            home_alias,
            home_account_id,
            tenants,
        })
    }
}

/// Zip the comma-separated tenant name and account lists into tenants.
///
/// Both lists must have the same number of entries and no blanks. An empty
/// pair of lists is valid (home-account-only report).
pub fn parse_tenants(names: &str, accounts: &str) -> Result<Vec<Tenant>> {
    let names: Vec<&str> = split_list(names);
    let accounts: Vec<&str> = split_list(accounts);

    if names.len() != accounts.len() {
        bail!(
            "Tenant name/account lists differ in length ({} names, {} accounts)",
            names.len(),
            accounts.len()
        );
    }

    let mut tenants = Vec::with_capacity(names.len());
    for (name, account) in names.iter().zip(&accounts) {
        if name.is_empty() {
            bail!("Tenant names must not be empty");
        }
        let account_id = AccountId::parse(account)
            .with_context(|| format!("Invalid account ID for tenant '{name}'"))?;
        tenants.push(Tenant {
            name: (*name).to_string(),
            account_id,
        });
    }
    Ok(tenants)
}

/// Split a comma-separated list, trimming whitespace.
///
/// A fully empty input yields no entries; interior empties are preserved so
/// validation can reject them with a useful message.
fn split_list(s: &str) -> Vec<&str> {
    let s = s.trim();
    if s.is_empty() {
        return Vec::new();
    }
    s.split(',').map(str::trim).collect()
}

/// Configuration for the `mail` subcommand.
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// From address
    pub sender: String,
    /// Recipient addresses, split from the comma-separated list
    pub recipients: Vec<String>,
}

impl MailConfig {
    pub fn new(sender: String, recipients: &str) -> Result<Self> {
        if sender.trim().is_empty() {
            bail!("Sender address must not be empty");
        }
        let recipients: Vec<String> = split_list(recipients)
            .into_iter()
            .map(str::to_string)
            .collect();
        if recipients.is_empty() || recipients.iter().any(String::is_empty) {
            bail!("Recipient list must contain at least one non-empty address");
        }
        Ok(Self { sender, recipients })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_id_validation() {
        assert!(AccountId::parse("111111111111").is_ok());
        assert!(AccountId::parse(" 111111111111 ").is_ok());
        assert!(AccountId::parse("11111111111").is_err());
        assert!(AccountId::parse("1111111111111").is_err());
        assert!(AccountId::parse("11111111111a").is_err());
        assert!(AccountId::parse("").is_err());
    }

    #[test]
    fn tenants_zip_equal_lengths() {
        let tenants = parse_tenants("dev,prod", "111111111111,222222222222").unwrap();
        assert_eq!(tenants.len(), 2);
        assert_eq!(tenants[0].name, "dev");
        assert_eq!(tenants[0].account_id.as_str(), "111111111111");
        assert_eq!(tenants[1].name, "prod");
        assert_eq!(tenants[1].account_id.as_str(), "222222222222");
    }

    #[test]
    fn tenants_length_mismatch_rejected() {
        // The legacy zip silently truncated to the shorter list; we refuse.
        let err = parse_tenants("dev,prod", "111111111111").unwrap_err();
        assert!(err.to_string().contains("differ in length"), "{err}");
    }

    #[test]
    fn tenants_empty_lists_ok() {
        assert!(parse_tenants("", "").unwrap().is_empty());
        assert!(parse_tenants("  ", "").unwrap().is_empty());
    }

    #[test]
    fn tenants_blank_entries_rejected() {
        assert!(parse_tenants("dev,,prod", "1,2,3").is_err());
        assert!(parse_tenants("dev", "notanaccount").is_err());
    }

    #[test]
    fn report_kind_object_key() {
        let date = chrono::NaiveDate::from_ymd_opt(2026, 8, 24).unwrap();
        assert_eq!(
            ReportKind::Ami.object_key(date),
            "ami_report_2026-08-24.csv"
        );
        assert_eq!(
            ReportKind::Snapshot.object_key(date),
            "snapshot_report_2026-08-24.csv"
        );
    }

    #[test]
    fn report_kind_roles() {
        assert_eq!(ReportKind::Ami.role_name(), "AMI_Reporting");
        assert_eq!(ReportKind::Snapshot.role_name(), "snapshot-reporting");
    }

    #[test]
    fn mail_config_recipient_split() {
        let cfg = MailConfig::new(
            "reports@example.com".into(),
            "a@example.com, b@example.com",
        )
        .unwrap();
        assert_eq!(cfg.recipients, vec!["a@example.com", "b@example.com"]);

        assert!(MailConfig::new("reports@example.com".into(), "").is_err());
        assert!(MailConfig::new("".into(), "a@example.com").is_err());
    }
}
