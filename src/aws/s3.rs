//! Report object storage
//!
//! Uploads rendered CSV reports with SSE-KMS and fetches them back for
//! mailing.

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{ServerSideEncryption, StorageClass};
use tracing::info;

use crate::aws::context::AwsContext;

/// S3 client wrapper for report objects.
pub struct ReportStore {
    client: aws_sdk_s3::Client,
}

impl ReportStore {
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }

    /// Upload a rendered report, encrypted under the configured KMS key.
    pub async fn upload_report(
        &self,
        bucket: &str,
        key: &str,
        csv: String,
        kms_key_id: &str,
    ) -> Result<()> {
        info!(bucket = %bucket, key = %key, size = csv.len(), "Uploading report");

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(csv.into_bytes()))
            .content_type("text/csv")
            .server_side_encryption(ServerSideEncryption::AwsKms)
            .ssekms_key_id(kms_key_id)
            .storage_class(StorageClass::ReducedRedundancy)
            .send()
            .await
            .with_context(|| format!("Failed to upload report to s3://{bucket}/{key}"))?;

        Ok(())
    }

    /// Download a report object for mailing.
    pub async fn download_report(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .with_context(|| format!("Failed to fetch report s3://{bucket}/{key}"))?;

        let body = resp
            .body
            .collect()
            .await
            .context("Failed to read report body")?;

        Ok(body.into_bytes().to_vec())
    }
}
