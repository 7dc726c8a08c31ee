//! Typed errors for the report pipeline stages
//!
//! One variant per stage so a single diagnostic names the failing stage,
//! the tenant (where applicable), and the underlying cause. Image-status
//! lookup failures are deliberately absent: the cross-reference resolver
//! absorbs them into a sentinel value rather than failing the run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    /// Cross-account AssumeRole was rejected (expired trust policy, missing
    /// permissions, throttling). Never retried; the collector decides
    /// whether to skip the tenant.
    #[error("Delegation failed for tenant '{tenant}'")]
    Delegation {
        tenant: String,
        #[source]
        source: anyhow::Error,
    },

    /// The provider rejected a listing call for one account.
    #[error("Listing failed for tenant '{tenant}'")]
    Listing {
        tenant: String,
        #[source]
        source: anyhow::Error,
    },

    /// A collected record cannot be rendered (e.g. an image with no
    /// block-device mapping). Fatal to the run.
    #[error("Malformed record: {reason}")]
    Render { reason: String },

    /// S3 upload or email send failed. Fatal to the run.
    #[error("Delivery failed: {stage}")]
    Delivery {
        stage: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ReportError {
    /// Tenant the error applies to, for per-tenant failure accounting.
    pub fn tenant(&self) -> Option<&str> {
        match self {
            ReportError::Delegation { tenant, .. } | ReportError::Listing { tenant, .. } => {
                Some(tenant)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_stage_and_tenant() {
        let err = ReportError::Delegation {
            tenant: "dev".into(),
            source: anyhow::anyhow!("AccessDenied"),
        };
        assert!(err.to_string().contains("dev"));
        assert_eq!(err.tenant(), Some("dev"));

        let err = ReportError::Render {
            reason: "image ami-1 has no block device mapping".into(),
        };
        assert!(err.to_string().contains("ami-1"));
        assert_eq!(err.tenant(), None);
    }
}
