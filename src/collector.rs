//! Inventory collection pipeline
//!
//! Lists the home account with the run's own identity, then each configured
//! tenant under delegated credentials, aggregating records under tenant
//! display names. Strictly sequential; the only shared state is the report
//! map being appended to.
//!
//! Failure policy: a tenant whose delegation or listing fails is skipped and
//! recorded, never leaving a partial entry under its key. A home-account
//! failure aborts the run.

use anyhow::{Context, Result};
use std::future::Future;
use tracing::{info, warn};

use crate::aws::context::AwsContext;
use crate::aws::inventory::{InventoryClient, Owner};
use crate::aws::sts;
use crate::config::{ReportConfig, ReportKind, Tenant};
use crate::error::ReportError;
use crate::report::xref::{DescriptionMatcher, ImageXref};
use crate::report::{Record, TenantFailure, TenantReport};

/// Inventory operations needed by the collector, abstracted for testing.
pub trait Inventory: Send + Sync {
    fn list_images(
        &self,
        owner: Owner<'_>,
    ) -> impl Future<Output = Result<Vec<crate::report::ImageRecord>>> + Send;

    fn list_snapshots(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<Vec<crate::report::SnapshotRecord>>> + Send;

    fn resolve_image(&self, image_id: &str) -> impl Future<Output = ImageXref> + Send;
}

impl Inventory for InventoryClient {
    async fn list_images(&self, owner: Owner<'_>) -> Result<Vec<crate::report::ImageRecord>> {
        InventoryClient::list_images(self, owner).await
    }

    async fn list_snapshots(&self, owner_id: &str) -> Result<Vec<crate::report::SnapshotRecord>> {
        InventoryClient::list_snapshots(self, owner_id).await
    }

    async fn resolve_image(&self, image_id: &str) -> ImageXref {
        InventoryClient::resolve_image(self, image_id).await
    }
}

/// Produces inventory clients for the home account and for tenants.
///
/// The AWS implementation delegates per tenant via STS; tests substitute a
/// fixture-backed source.
pub trait InventorySource: Send + Sync {
    type Client: Inventory;

    fn home_client(&self) -> impl Future<Output = Result<Self::Client>> + Send;

    fn tenant_client(&self, tenant: &Tenant) -> impl Future<Output = Result<Self::Client>> + Send;
}

/// STS-backed inventory source used by real runs.
pub struct AwsInventorySource {
    ctx: AwsContext,
    sts: aws_sdk_sts::Client,
    role_name: &'static str,
}

impl AwsInventorySource {
    pub fn new(ctx: AwsContext, kind: ReportKind) -> Self {
        let sts = ctx.sts_client();
        Self {
            ctx,
            sts,
            role_name: kind.role_name(),
        }
    }
}

impl InventorySource for AwsInventorySource {
    type Client = InventoryClient;

    async fn home_client(&self) -> Result<InventoryClient> {
        Ok(InventoryClient::from_context(&self.ctx))
    }

    async fn tenant_client(&self, tenant: &Tenant) -> Result<InventoryClient> {
        let client = sts::delegate(&self.sts, tenant, self.role_name, self.ctx.region()).await?;
        Ok(InventoryClient::new(client))
    }
}

/// Collect the full inventory for one run.
///
/// Returns the aggregated report plus the tenants that were skipped.
pub async fn collect<S: InventorySource>(
    kind: ReportKind,
    source: &S,
    config: &ReportConfig,
) -> Result<(TenantReport, Vec<TenantFailure>)> {
    let mut report = TenantReport::new();
    let mut failures = Vec::new();
    let matcher = DescriptionMatcher::new();

    // Home account first, with the run's own identity. A failure here is
    // fatal: without the home inventory there is nothing worth reporting.
    let home = source
        .home_client()
        .await
        .context("Failed to create home-account client")?;
    let home_records = list_account(
        &home,
        kind,
        Owner::Own,
        config.home_account_id.as_str(),
        &matcher,
    )
    .await
    .with_context(|| format!("Home account '{}' listing failed", config.home_alias))?;

    info!(
        tenant = %config.home_alias,
        records = home_records.len(),
        "Collected home account inventory"
    );
    report.insert(config.home_alias.clone(), home_records);

    for tenant in &config.tenants {
        let client = match source.tenant_client(tenant).await {
            Ok(client) => client,
            Err(source) => {
                skip_tenant(
                    &mut failures,
                    ReportError::Delegation {
                        tenant: tenant.name.clone(),
                        source,
                    },
                );
                continue;
            }
        };

        let owner_id = tenant.account_id.as_str();
        match list_account(&client, kind, Owner::Account(owner_id), owner_id, &matcher).await {
            Ok(records) => {
                info!(tenant = %tenant.name, records = records.len(), "Collected tenant inventory");
                report.insert(tenant.name.clone(), records);
            }
            Err(source) => {
                skip_tenant(
                    &mut failures,
                    ReportError::Listing {
                        tenant: tenant.name.clone(),
                        source,
                    },
                );
            }
        }
    }

    Ok((report, failures))
}

/// Apply the skip-and-continue policy to one tenant-scoped error: log it
/// and record it in the run summary.
fn skip_tenant(failures: &mut Vec<TenantFailure>, err: ReportError) {
    if let Some(failure) = TenantFailure::from_error(&err) {
        warn!(
            tenant = %failure.tenant,
            stage = %failure.stage,
            cause = %failure.cause,
            "Skipping tenant"
        );
        failures.push(failure);
    }
}

/// List one account's resources of the requested kind.
///
/// For snapshots, each record whose description names an image gets one
/// extra DescribeImages round-trip through the same client.
async fn list_account<I: Inventory>(
    client: &I,
    kind: ReportKind,
    owner: Owner<'_>,
    owner_account_id: &str,
    matcher: &DescriptionMatcher,
) -> Result<Vec<Record>> {
    match kind {
        ReportKind::Ami => {
            let images = client.list_images(owner).await?;
            Ok(images.into_iter().map(Record::Image).collect())
        }
        ReportKind::Snapshot => {
            let mut snapshots = client.list_snapshots(owner_account_id).await?;
            for snapshot in &mut snapshots {
                if let Some(image_id) = matcher.image_id(&snapshot.description) {
                    snapshot.derived_image = client.resolve_image(image_id).await;
                }
            }
            Ok(snapshots.into_iter().map(Record::Snapshot).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccountId;
    use crate::report::{FailedStage, ImageRecord, SnapshotRecord};
    use anyhow::anyhow;
    use std::collections::HashMap;

    /// Fixture-backed inventory for one account.
    #[derive(Default, Clone)]
    struct FakeInventory {
        images: Vec<ImageRecord>,
        snapshots: Vec<SnapshotRecord>,
        list_fails: bool,
        known_images: HashMap<String, String>,
    }

    impl Inventory for FakeInventory {
        async fn list_images(&self, _owner: Owner<'_>) -> Result<Vec<ImageRecord>> {
            if self.list_fails {
                return Err(anyhow!("RequestLimitExceeded"));
            }
            Ok(self.images.clone())
        }

        async fn list_snapshots(&self, _owner_id: &str) -> Result<Vec<SnapshotRecord>> {
            if self.list_fails {
                return Err(anyhow!("RequestLimitExceeded"));
            }
            Ok(self.snapshots.clone())
        }

        async fn resolve_image(&self, image_id: &str) -> ImageXref {
            match self.known_images.get(image_id) {
                Some(state) => ImageXref::Found {
                    image_id: image_id.to_string(),
                    state: state.clone(),
                },
                None => ImageXref::Missing {
                    image_id: image_id.to_string(),
                },
            }
        }
    }

    /// Fixture source: per-account inventories plus tenants whose
    /// delegation is rejected.
    #[derive(Default)]
    struct FakeSource {
        home: FakeInventory,
        tenants: HashMap<String, FakeInventory>,
        delegation_denied: Vec<String>,
    }

    impl InventorySource for FakeSource {
        type Client = FakeInventory;

        async fn home_client(&self) -> Result<FakeInventory> {
            Ok(self.home.clone())
        }

        async fn tenant_client(&self, tenant: &Tenant) -> Result<FakeInventory> {
            if self.delegation_denied.contains(&tenant.name) {
                return Err(anyhow!("AccessDenied: not authorized to assume role")
                    .context(format!("AssumeRole rejected for tenant '{}'", tenant.name)));
            }
            Ok(self.tenants.get(&tenant.name).cloned().unwrap_or_default())
        }
    }

    fn config(tenant_names: &[&str]) -> ReportConfig {
        let tenants = tenant_names
            .iter()
            .enumerate()
            .map(|(i, name)| Tenant {
                name: (*name).to_string(),
                account_id: AccountId::parse(&format!("{:012}", i + 1)).unwrap(),
            })
            .collect();
        ReportConfig {
            bucket: "reports".into(),
            kms_key_id: "key".into(),
            home_alias: "mgmt".into(),
            home_account_id: AccountId::parse("999999999999").unwrap(),
            tenants,
        }
    }

    fn image(id: &str) -> ImageRecord {
        ImageRecord {
            image_id: id.to_string(),
            name: id.to_string(),
            state: "available".into(),
            creation_date: "2026-08-01T00:00:00.000Z".into(),
            root_device_type: "ebs".into(),
            root_device_name: "/dev/xvda".into(),
            snapshot_id: Some(format!("snap-for-{id}")),
        }
    }

    fn snapshot(id: &str, description: &str) -> SnapshotRecord {
        SnapshotRecord {
            snapshot_id: id.to_string(),
            description: description.to_string(),
            state: "completed".into(),
            start_time: chrono::DateTime::UNIX_EPOCH,
            volume_id: "vol-1".into(),
            volume_size: 8,
            tags: Vec::new(),
            derived_image: ImageXref::None,
        }
    }

    #[tokio::test]
    async fn aggregation_keys_are_tenant_names_plus_home_alias() {
        let mut source = FakeSource::default();
        source.tenants.insert("dev".into(), FakeInventory::default());
        source.tenants.insert("prod".into(), FakeInventory::default());

        let (report, failures) = collect(ReportKind::Ami, &source, &config(&["dev", "prod"]))
            .await
            .unwrap();

        let keys: Vec<&str> = report.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["dev", "mgmt", "prod"]);
        assert!(failures.is_empty());
    }

    #[tokio::test]
    async fn delegation_failure_skips_tenant_without_stale_entry() {
        let mut source = FakeSource::default();
        source.home.images = vec![image("ami-home")];
        source.delegation_denied.push("dev".into());
        source.tenants.insert(
            "prod".into(),
            FakeInventory {
                images: vec![image("ami-prod")],
                ..Default::default()
            },
        );

        let (report, failures) = collect(ReportKind::Ami, &source, &config(&["dev", "prod"]))
            .await
            .unwrap();

        assert!(!report.contains_key("dev"));
        assert!(report.contains_key("prod"));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].tenant, "dev");
        assert_eq!(failures[0].stage, FailedStage::Delegation);
        // The full source chain of the typed delegation error is preserved
        assert!(failures[0].cause.contains("AssumeRole rejected"));
        assert!(failures[0].cause.contains("AccessDenied"));
    }

    #[tokio::test]
    async fn listing_failure_skips_tenant_and_continues() {
        let mut source = FakeSource::default();
        source.tenants.insert(
            "dev".into(),
            FakeInventory {
                list_fails: true,
                ..Default::default()
            },
        );
        source.tenants.insert(
            "prod".into(),
            FakeInventory {
                images: vec![image("ami-prod")],
                ..Default::default()
            },
        );

        let (report, failures) = collect(ReportKind::Ami, &source, &config(&["dev", "prod"]))
            .await
            .unwrap();

        assert!(!report.contains_key("dev"));
        assert_eq!(report["prod"].len(), 1);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].stage, FailedStage::Listing);
    }

    #[tokio::test]
    async fn home_listing_failure_aborts_run() {
        let source = FakeSource {
            home: FakeInventory {
                list_fails: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let err = collect(ReportKind::Ami, &source, &config(&[]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("mgmt"), "{err}");
    }

    #[tokio::test]
    async fn snapshot_xref_resolved_through_owning_client() {
        let mut home = FakeInventory::default();
        home.snapshots = vec![
            snapshot(
                "snap-1",
                "Created by CreateImage(i-0123) for ami-0abc from vol-xyz",
            ),
            snapshot("snap-2", "manual backup"),
            snapshot(
                "snap-3",
                "Created by CreateImage(i-9) for ami-gone from vol-9",
            ),
        ];
        home.known_images
            .insert("ami-0abc".to_string(), "available".to_string());

        let source = FakeSource {
            home,
            ..Default::default()
        };

        let (report, _) = collect(ReportKind::Snapshot, &source, &config(&[]))
            .await
            .unwrap();

        let records = &report["mgmt"];
        let xref = |i: usize| match &records[i] {
            Record::Snapshot(s) => &s.derived_image,
            _ => panic!("expected snapshot record"),
        };
        assert_eq!(
            *xref(0),
            ImageXref::Found {
                image_id: "ami-0abc".into(),
                state: "available".into()
            }
        );
        assert_eq!(*xref(1), ImageXref::None);
        assert_eq!(
            *xref(2),
            ImageXref::Missing {
                image_id: "ami-gone".into()
            }
        );
    }
}
