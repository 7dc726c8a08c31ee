//! Cross-account credential delegation
//!
//! For each tenant the run assumes a reporting role in the tenant's account
//! and builds an EC2 client from the resulting short-lived session. Sessions
//! live for one collection call and are never cached or reused.

use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use tracing::debug;

use crate::config::Tenant;

/// Role ARN for a tenant's reporting role.
pub fn role_arn(tenant: &Tenant, role_name: &str) -> String {
    format!("arn:aws:iam::{}:role/{}", tenant.account_id, role_name)
}

/// Session name derived from the tenant, for provider-side auditability.
pub fn session_name(tenant: &Tenant) -> String {
    format!("{}_session", tenant.name)
}

/// Assume the reporting role in a tenant account and return an EC2 client
/// scoped to that account.
pub async fn delegate(
    sts: &aws_sdk_sts::Client,
    tenant: &Tenant,
    role_name: &str,
    region: &str,
) -> Result<aws_sdk_ec2::Client> {
    let arn = role_arn(tenant, role_name);
    debug!(tenant = %tenant.name, role_arn = %arn, "Assuming reporting role");

    let resp = sts
        .assume_role()
        .role_arn(&arn)
        .role_session_name(session_name(tenant))
        .send()
        .await
        .with_context(|| format!("AssumeRole rejected for {arn}"))?;

    let creds = resp
        .credentials()
        .context("No credentials in AssumeRole response")?;

    let session = aws_sdk_ec2::config::Credentials::new(
        creds.access_key_id(),
        creds.secret_access_key(),
        Some(creds.session_token().to_string()),
        None,
        "fleet-report-delegation",
    );

    let config = aws_sdk_ec2::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(session)
        .build();

    Ok(aws_sdk_ec2::Client::from_conf(config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountId;

    fn tenant() -> Tenant {
        Tenant {
            name: "dev".to_string(),
            account_id: AccountId::parse("111111111111").unwrap(),
        }
    }

    #[test]
    fn role_arn_templating() {
        assert_eq!(
            role_arn(&tenant(), "AMI_Reporting"),
            "arn:aws:iam::111111111111:role/AMI_Reporting"
        );
        assert_eq!(
            role_arn(&tenant(), "snapshot-reporting"),
            "arn:aws:iam::111111111111:role/snapshot-reporting"
        );
    }

    #[test]
    fn session_name_from_tenant() {
        assert_eq!(session_name(&tenant()), "dev_session");
    }
}
