//! CSV rendering
//!
//! Output contract: fixed header line per report kind, one line per record,
//! tenants in ascending lexicographic order, records in provider order, CRLF
//! between records, no trailing terminator. Fields are quoted per RFC 4180
//! when they contain a comma, quote, CR or LF; the column schema and
//! ordering are the compatibility contract and never change.

use crate::config::ReportKind;
use crate::error::ReportError;
use crate::report::tags::TagProjection;
use crate::report::{ImageRecord, Record, SnapshotRecord, TenantReport};

/// Image report header (column names and order are an external contract)
pub const AMI_HEADER: &str =
    "Tenant,Name,ImageId,State,CreationDate,RootDeviceType,RootDeviceName,SnapshotId";

/// Snapshot report header, current (14-column) format version
pub const SNAPSHOT_HEADER: &str = "Tenant,Name,SnapshotId,Description,State,StartTime,VolumeId,\
                                   VolumeSize,ImageId,ImageStatus,SnapshotRetentionPeriod,\
                                   CostControl,SnapshotSet,POC";

/// Render a collected report as CSV text.
pub fn render(kind: ReportKind, report: &TenantReport) -> Result<String, ReportError> {
    let mut csv = String::from(match kind {
        ReportKind::Ami => AMI_HEADER,
        ReportKind::Snapshot => SNAPSHOT_HEADER,
    });

    // BTreeMap iteration gives the lexicographic tenant order.
    for (tenant, records) in report {
        for record in records {
            csv.push_str("\r\n");
            let fields = match record {
                Record::Image(image) => image_fields(tenant, image)?,
                Record::Snapshot(snapshot) => snapshot_fields(tenant, snapshot),
            };
            push_row(&mut csv, &fields);
        }
    }
    Ok(csv)
}

fn image_fields(tenant: &str, image: &ImageRecord) -> Result<Vec<String>, ReportError> {
    let snapshot_id = image.snapshot_id.as_deref().ok_or_else(|| ReportError::Render {
        reason: format!(
            "image {} has no block device mapping with an EBS snapshot",
            image.image_id
        ),
    })?;
    Ok(vec![
        tenant.to_string(),
        image.name.clone(),
        image.image_id.clone(),
        image.state.clone(),
        image.creation_date.clone(),
        image.root_device_type.clone(),
        image.root_device_name.clone(),
        snapshot_id.to_string(),
    ])
}

fn snapshot_fields(tenant: &str, snapshot: &SnapshotRecord) -> Vec<String> {
    let tags = TagProjection::project(&snapshot.tags);
    let (image_id, image_status) = snapshot.derived_image.columns();
    vec![
        tenant.to_string(),
        tags.name,
        snapshot.snapshot_id.clone(),
        snapshot.description.clone(),
        snapshot.state.clone(),
        snapshot.start_time.to_rfc3339(),
        snapshot.volume_id.clone(),
        snapshot.volume_size.to_string(),
        image_id.to_string(),
        image_status.to_string(),
        tags.snapshot_retention_period,
        tags.cost_control,
        tags.snapshot_set,
        tags.poc,
    ]
}

fn push_row(csv: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            csv.push(',');
        }
        push_field(csv, field);
    }
}

/// Append one field, quoting only when required by RFC 4180.
fn push_field(csv: &mut String, field: &str) {
    if field.contains(['"', ',', '\r', '\n']) {
        csv.push('"');
        for c in field.chars() {
            if c == '"' {
                csv.push('"');
            }
            csv.push(c);
        }
        csv.push('"');
    } else {
        csv.push_str(field);
    }
}
