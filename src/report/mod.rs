//! Report data model
//!
//! A [`TenantReport`] maps tenant display names to the records collected for
//! that tenant. `BTreeMap` keys give the renderer its lexicographic tenant
//! order; records within a tenant stay in provider-returned order.

pub mod render;
pub mod tags;
pub mod xref;

use std::collections::BTreeMap;

use crate::error::ReportError;
use crate::report::xref::ImageXref;

/// One machine image owned by a tenant.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub image_id: String,
    pub name: String,
    pub state: String,
    /// Provider-supplied ISO-8601 timestamp, emitted verbatim
    pub creation_date: String,
    pub root_device_type: String,
    pub root_device_name: String,
    /// Snapshot backing the first block-device mapping entry.
    /// `None` marks a malformed record; the renderer fails on it.
    pub snapshot_id: Option<String>,
}

/// One EBS snapshot owned by a tenant.
#[derive(Debug, Clone)]
pub struct SnapshotRecord {
    pub snapshot_id: String,
    pub description: String,
    pub state: String,
    /// Rendered as RFC 3339
    pub start_time: chrono::DateTime<chrono::Utc>,
    pub volume_id: String,
    pub volume_size: i64,
    /// Raw tags as returned by the provider (keys not guaranteed unique)
    pub tags: Vec<(String, String)>,
    /// Best-effort link to the image this snapshot was created for
    pub derived_image: ImageXref,
}

/// A record of either kind; one report only ever holds one variant.
#[derive(Debug, Clone)]
pub enum Record {
    Image(ImageRecord),
    Snapshot(SnapshotRecord),
}

/// Collected inventory keyed by tenant display name.
pub type TenantReport = BTreeMap<String, Vec<Record>>;

/// Stage at which a tenant dropped out of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedStage {
    Delegation,
    Listing,
}

impl std::fmt::Display for FailedStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailedStage::Delegation => write!(f, "delegation"),
            FailedStage::Listing => write!(f, "listing"),
        }
    }
}

/// A tenant that was skipped, with the stage and cause.
///
/// Skipped tenants contribute no key to the [`TenantReport`]; they surface
/// only in logs and the run summary.
#[derive(Debug)]
pub struct TenantFailure {
    pub tenant: String,
    pub stage: FailedStage,
    pub cause: String,
}

impl TenantFailure {
    /// Build a failure record from a tenant-scoped pipeline error.
    ///
    /// Returns `None` for errors that carry no tenant (render and delivery
    /// failures are fatal to the run, not skippable). The cause preserves
    /// the full source chain of the underlying error.
    pub fn from_error(err: &ReportError) -> Option<Self> {
        let (stage, source) = match err {
            ReportError::Delegation { source, .. } => (FailedStage::Delegation, source),
            ReportError::Listing { source, .. } => (FailedStage::Listing, source),
            _ => return None,
        };
        Some(Self {
            tenant: err.tenant()?.to_string(),
            stage,
            cause: format!("{source:#}"),
        })
    }
}
