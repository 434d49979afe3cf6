use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use fixver::config::AppConfig;
use fixver::error::AppError;
use fixver::issues;
use fixver::jira::{JiraClient, VersionField, VersionRef};
use fixver::redact::RedactingMakeWriter;
use fixver::retry::RetryPolicy;
use fixver::transport::HttpTransport;
use fixver::update::{run_update, UpdatePlan};

#[derive(Parser)]
#[command(
    name = "fixver",
    about = "Batch-add a fix/affected version to Jira issues"
)]
struct Cli {
    /// Issue keys, comma or whitespace separated
    #[arg(long, conflicts_with = "issues_file")]
    issues: Option<String>,

    /// File with issue keys (JSON array or plain text)
    #[arg(long)]
    issues_file: Option<PathBuf>,

    /// Target version by name
    #[arg(long, conflicts_with = "version_id")]
    version: Option<String>,

    /// Target version by its stable id
    #[arg(long)]
    version_id: Option<String>,

    /// Which version field to update
    #[arg(long, value_enum, default_value = "fix")]
    field: VersionField,

    /// Report what would be updated without calling the server
    #[arg(long)]
    dry_run: bool,

    /// Override the configured concurrency limit
    #[arg(long)]
    concurrency: Option<usize>,

    /// Override the configured per-request attempt limit
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(concurrency) = cli.concurrency {
        config.update.concurrency = concurrency;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.update.max_attempts = max_attempts;
    }
    config.validate()?;

    // Initialize tracing only after the config is known so the credential
    // value can be scrubbed from every log line for the run's lifetime
    let writer = RedactingMakeWriter::new(std::io::stderr, vec![config.token().to_string()]);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(writer))
        .init();

    let issue_list = match (&cli.issues, &cli.issues_file) {
        (Some(inline), None) => issues::parse_issue_list(inline),
        (None, Some(path)) => issues::load_issue_file(path)?,
        _ => {
            return Err(
                AppError::Config("provide exactly one of --issues or --issues-file".to_string())
                    .into(),
            );
        }
    };
    if issue_list.is_empty() {
        return Err(AppError::Config("no issue keys to process".to_string()).into());
    }

    let version = match (cli.version, cli.version_id) {
        (Some(name), None) => VersionRef::Name(name),
        (None, Some(id)) => VersionRef::Id(id),
        _ => {
            return Err(AppError::Config(
                "provide exactly one of --version or --version-id".to_string(),
            )
            .into());
        }
    };

    let transport = Arc::new(HttpTransport::new());
    let retry = RetryPolicy::new(config.update.max_attempts);
    let client = Arc::new(JiraClient::new(
        transport,
        retry,
        &config.jira.base_url,
        &config.jira.user,
        &config.jira.token,
    ));

    let plan = UpdatePlan {
        issues: issue_list,
        version,
        field: cli.field,
        dry_run: cli.dry_run,
        concurrency: config.update.concurrency,
    };

    tracing::info!(
        issues = plan.issues.len(),
        field = plan.field.api_name(),
        version = plan.version.value(),
        concurrency = plan.concurrency,
        dry_run = plan.dry_run,
        "Starting update run"
    );

    let report = run_update(client, &plan).await;

    tracing::info!(
        updated = report.updated.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Run complete"
    );
    for issue in &report.updated {
        tracing::info!(issue = %issue, "updated");
    }
    for issue in &report.skipped {
        tracing::info!(issue = %issue, "skipped");
    }
    for failure in &report.failed {
        tracing::error!(issue = %failure.issue, error = %failure.error, "failed");
    }

    // 0 clean, 1 total failure, 2 partial failure; pre-flight errors exit 1
    // through the error return above
    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else if report.all_failed() {
        ExitCode::from(1)
    } else {
        ExitCode::from(2)
    })
}
