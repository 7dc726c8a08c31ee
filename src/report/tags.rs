//! Fixed-schema projection over raw resource tags
//!
//! Snapshot reports surface a handful of well-known tag keys as dedicated
//! CSV columns. The projection is total: any raw tag set maps to a full
//! projection, with unrecognized keys dropped and absent keys left empty.

/// Tag keys recognized by the snapshot report schema
pub const TAG_NAME: &str = "Name";
pub const TAG_RETENTION: &str = "SnapshotRetentionPeriod";
pub const TAG_COST_CONTROL: &str = "CostControl";
pub const TAG_SNAPSHOT_SET: &str = "SnapshotSet";
pub const TAG_POC: &str = "POC";

/// Fixed-schema view over a resource's raw tags.
///
/// Always construct via [`TagProjection::project`]; each call produces a
/// fresh value, so no state leaks between records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagProjection {
    pub name: String,
    pub snapshot_retention_period: String,
    pub cost_control: String,
    pub snapshot_set: String,
    pub poc: String,
}

impl TagProjection {
    /// Overlay raw tags onto the all-empty default, left to right.
    ///
    /// Duplicate keys: last occurrence wins. Unrecognized keys are ignored.
    pub fn project(tags: &[(String, String)]) -> Self {
        let mut proj = Self::default();
        for (key, value) in tags {
            match key.as_str() {
                TAG_NAME => proj.name = value.clone(),
                TAG_RETENTION => proj.snapshot_retention_period = value.clone(),
                TAG_COST_CONTROL => proj.cost_control = value.clone(),
                TAG_SNAPSHOT_SET => proj.snapshot_set = value.clone(),
                TAG_POC => proj.poc = value.clone(),
                _ => {}
            }
        }
        proj
    }
}
