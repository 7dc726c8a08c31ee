//! fleet-report: multi-account AWS inventory reports as CSV
//!
//! `generate` collects AMI or snapshot inventories across the home account
//! and all configured tenants and uploads the CSV to S3. `mail` consumes an
//! S3 event notification and emails the named report to the distribution
//! list.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleet_report::aws::context::AwsContext;
use fleet_report::aws::s3::ReportStore;
use fleet_report::collector::{self, AwsInventorySource};
use fleet_report::config::{MailConfig, ReportConfig, ReportKind};
use fleet_report::error::ReportError;
use fleet_report::event::S3Event;
use fleet_report::mailer::{self, ReportMailer};
use fleet_report::report::render;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "fleet-report")]
#[command(about = "Multi-account AWS inventory reports (AMIs and EBS snapshots)")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Which inventory to report on
    #[arg(long, value_enum)]
    kind: ReportKind,

    /// Destination S3 bucket for the CSV report
    #[arg(long, env = "REPORT_S3_BUCKET")]
    bucket: String,

    /// KMS key ID for server-side encryption of the report object
    #[arg(long, env = "REPORT_KMS_KEY_ID")]
    kms_key_id: String,

    /// Display alias for the home (management) account
    #[arg(long, env = "MGMT_ACCOUNT_ALIAS")]
    home_alias: String,

    /// Home account ID (12 digits)
    #[arg(long, env = "MGMT_ACCOUNT_ID")]
    home_account: String,

    /// Comma-separated tenant display names (zipped with --tenant-accounts)
    #[arg(long, env = "TENANT_NAMES", default_value = "")]
    tenant_names: String,

    /// Comma-separated tenant account IDs
    #[arg(long, env = "TENANT_ACCOUNTS", default_value = "")]
    tenant_accounts: String,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    region: String,
}

#[derive(clap::Args, Debug)]
struct MailArgs {
    /// Path to the S3 event notification JSON naming the report object
    #[arg(long)]
    event: std::path::PathBuf,

    /// From address
    #[arg(long, env = "REPORT_SENDER")]
    sender: String,

    /// Comma-separated recipient addresses
    #[arg(long, env = "REPORT_RECIPIENTS")]
    recipients: String,

    /// AWS region
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    region: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect an inventory report and upload it to S3
    Generate(GenerateArgs),

    /// Email a report object named by an S3 event notification
    Mail(MailArgs),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print error in a user-friendly way
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();

    let _ = writeln!(stderr, "\n\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    match args.command {
        Command::Generate(args) => generate(args).await,
        Command::Mail(args) => mail(args).await,
    }
}

async fn generate(args: GenerateArgs) -> Result<()> {
    let config = ReportConfig::new(
        args.bucket,
        args.kms_key_id,
        args.home_alias,
        &args.home_account,
        &args.tenant_names,
        &args.tenant_accounts,
    )
    .context("Invalid report configuration")?;

    info!(
        kind = ?args.kind,
        region = %args.region,
        tenants = config.tenants.len(),
        "Starting report generation"
    );

    let ctx = AwsContext::new(&args.region).await;
    let source = AwsInventorySource::new(ctx.clone(), args.kind);

    let (report, failures) = collector::collect(args.kind, &source, &config).await?;
    for failure in &failures {
        warn!(
            tenant = %failure.tenant,
            stage = %failure.stage,
            cause = %failure.cause,
            "Tenant omitted from report"
        );
    }

    let csv = render::render(args.kind, &report)?;

    let key = args.kind.object_key(chrono::Utc::now().date_naive());
    let store = ReportStore::from_context(&ctx);
    store
        .upload_report(&config.bucket, &key, csv, &config.kms_key_id)
        .await
        .map_err(|source| ReportError::Delivery {
            stage: "s3 upload",
            source,
        })?;

    info!(
        bucket = %config.bucket,
        key = %key,
        tenants = report.len(),
        skipped = failures.len(),
        "Report saved"
    );
    Ok(())
}

async fn mail(args: MailArgs) -> Result<()> {
    let config = MailConfig::new(args.sender, &args.recipients)?;

    let raw = std::fs::read_to_string(&args.event)
        .with_context(|| format!("Failed to read event file {}", args.event.display()))?;
    let event: S3Event = serde_json::from_str(&raw).context("Malformed S3 event notification")?;

    let ctx = AwsContext::new(&args.region).await;
    let store = ReportStore::from_context(&ctx);
    let sender = ReportMailer::from_context(&ctx, config);

    for record in &event.records {
        let bucket = &record.s3.bucket.name;
        let key = &record.s3.object.key;

        if !mailer::is_report_key(key) {
            info!(key = %key, "Ignoring non-report object");
            continue;
        }

        let csv = store
            .download_report(bucket, key)
            .await
            .map_err(|source| ReportError::Delivery {
                stage: "s3 download",
                source,
            })?;

        sender
            .send_report(key, csv)
            .await
            .map_err(|source| ReportError::Delivery {
                stage: "email send",
                source,
            })?;
    }

    Ok(())
}
