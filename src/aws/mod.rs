//! AWS client modules
//!
//! Thin wrappers around the AWS SDK clients used by the report pipeline:
//! - STS: cross-account credential delegation
//! - EC2: image and snapshot inventory listings
//! - S3: report object storage
//! - SES: report delivery (see `crate::mailer`)

pub mod context;
pub mod inventory;
pub mod s3;
pub mod sts;

pub use context::AwsContext;
pub use inventory::InventoryClient;
pub use s3::ReportStore;
