//! fleet-report - multi-account AWS inventory reports
//!
//! Collects machine image (AMI) and EBS snapshot inventories across a home
//! account plus a configured set of tenant accounts (via STS AssumeRole),
//! renders them as CSV, uploads the result to S3, and mails it to a
//! distribution list on an S3 event trigger.

pub mod aws;
pub mod collector;
pub mod config;
pub mod error;
pub mod event;
pub mod mailer;
pub mod report;
