//! EC2 inventory listings
//!
//! Wraps DescribeImages / DescribeSnapshots and converts the SDK types into
//! the report's record types. Listing is one call per account; result-set
//! pagination is out of scope for this tool.

use anyhow::{Context, Result};
use aws_sdk_ec2::types::{Image, Snapshot};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::aws::context::AwsContext;
use crate::report::xref::ImageXref;
use crate::report::{ImageRecord, SnapshotRecord};

/// Which account's resources a listing call targets.
#[derive(Debug, Clone, Copy)]
pub enum Owner<'a> {
    /// The caller's own account (`Owners=["self"]`)
    Own,
    /// A specific account by ID
    Account(&'a str),
}

/// EC2 client wrapper for inventory calls.
///
/// Built either from the run's own identity ([`InventoryClient::from_context`])
/// or from a delegated session (`InventoryClient::new` with the client
/// returned by [`crate::aws::sts::delegate`]).
pub struct InventoryClient {
    client: aws_sdk_ec2::Client,
}

impl InventoryClient {
    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }

    /// Create a client using the caller's own identity.
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }

    /// List machine images owned by the given account.
    pub async fn list_images(&self, owner: Owner<'_>) -> Result<Vec<ImageRecord>> {
        let owner_value = match owner {
            Owner::Own => "self",
            Owner::Account(id) => id,
        };
        let resp = self
            .client
            .describe_images()
            .owners(owner_value)
            .send()
            .await
            .context("DescribeImages failed")?;

        let records = resp.images().iter().map(image_record).collect();
        Ok(records)
    }

    /// List EBS snapshots owned by the given account ID.
    ///
    /// Snapshot listings always filter by explicit account ID (the provider
    /// has no "self" shorthand for `OwnerIds`).
    pub async fn list_snapshots(&self, owner_id: &str) -> Result<Vec<SnapshotRecord>> {
        let resp = self
            .client
            .describe_snapshots()
            .owner_ids(owner_id)
            .send()
            .await
            .context("DescribeSnapshots failed")?;

        let records = resp.snapshots().iter().map(snapshot_record).collect();
        Ok(records)
    }

    /// Look up the lifecycle state of an image referenced by a snapshot.
    ///
    /// Best-effort: a deregistered image surfaces as an error from
    /// DescribeImages, and transient failures are treated identically. The
    /// report never fails on this path.
    pub async fn resolve_image(&self, image_id: &str) -> ImageXref {
        match self
            .client
            .describe_images()
            .image_ids(image_id)
            .send()
            .await
        {
            Ok(resp) => match resp.images().first().and_then(|img| img.state()) {
                Some(state) => ImageXref::Found {
                    image_id: image_id.to_string(),
                    state: state.as_str().to_string(),
                },
                None => ImageXref::Missing {
                    image_id: image_id.to_string(),
                },
            },
            Err(err) => {
                debug!(image_id = %image_id, error = %err, "Image lookup failed, recording as missing");
                ImageXref::Missing {
                    image_id: image_id.to_string(),
                }
            }
        }
    }
}

/// Convert an SDK image into a report record.
///
/// `snapshot_id` stays `None` when the block-device mapping list is empty or
/// its first entry carries no EBS snapshot; the renderer rejects such
/// records rather than emitting a blank field.
fn image_record(image: &Image) -> ImageRecord {
    let snapshot_id = image
        .block_device_mappings()
        .first()
        .and_then(|mapping| mapping.ebs())
        .and_then(|ebs| ebs.snapshot_id())
        .map(str::to_string);

    ImageRecord {
        image_id: image.image_id().unwrap_or_default().to_string(),
        name: image.name().unwrap_or_default().to_string(),
        state: image
            .state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        creation_date: image.creation_date().unwrap_or_default().to_string(),
        root_device_type: image
            .root_device_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        root_device_name: image.root_device_name().unwrap_or_default().to_string(),
        snapshot_id,
    }
}

/// Convert an SDK snapshot into a report record.
///
/// The cross-reference field starts as [`ImageXref::None`]; the collector
/// fills it in for snapshots whose description names an image.
fn snapshot_record(snapshot: &Snapshot) -> SnapshotRecord {
    let tags = snapshot
        .tags()
        .iter()
        .map(|tag| {
            (
                tag.key().unwrap_or_default().to_string(),
                tag.value().unwrap_or_default().to_string(),
            )
        })
        .collect();

    SnapshotRecord {
        snapshot_id: snapshot.snapshot_id().unwrap_or_default().to_string(),
        description: snapshot.description().unwrap_or_default().to_string(),
        state: snapshot
            .state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        start_time: snapshot
            .start_time()
            .map(smithy_to_chrono)
            .unwrap_or_default(),
        volume_id: snapshot.volume_id().unwrap_or_default().to_string(),
        volume_size: snapshot.volume_size().unwrap_or_default() as i64,
        tags,
        derived_image: ImageXref::None,
    }
}

fn smithy_to_chrono(dt: &aws_smithy_types::DateTime) -> DateTime<Utc> {
    match DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()) {
        Some(converted) => converted,
        None => {
            debug!(secs = dt.secs(), "Timestamp out of range, rendering epoch");
            DateTime::default()
        }
    }
}
