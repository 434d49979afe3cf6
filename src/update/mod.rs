//! The concurrent update engine: fans issues out under a bounded
//! concurrency gate, applies the per-issue fetch/skip/update procedure,
//! and aggregates outcomes into a [`RunReport`].

pub mod report;

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::jira::{JiraClient, VersionField, VersionRef};

pub use report::{FailedIssue, IssueOutcome, RunReport};

/// Immutable description of one run. Shared read-only by all workers.
#[derive(Debug, Clone)]
pub struct UpdatePlan {
    pub issues: Vec<String>,
    pub version: VersionRef,
    pub field: VersionField,
    pub dry_run: bool,
    /// Maximum number of issues processed at any instant. Must be >= 1,
    /// enforced at pre-flight.
    pub concurrency: usize,
}

/// Drive every issue in the plan to a terminal outcome.
///
/// A single issue's failure never affects its siblings; the report is
/// returned only once every issue has been resolved. Exactly one outcome
/// is recorded per input issue, duplicates included.
pub async fn run_update(client: Arc<JiraClient>, plan: &UpdatePlan) -> RunReport {
    let gate = Arc::new(Semaphore::new(plan.concurrency));

    let handles: Vec<_> = plan
        .issues
        .iter()
        .cloned()
        .map(|issue| {
            let client = Arc::clone(&client);
            let gate = Arc::clone(&gate);
            let version = plan.version.clone();
            let field = plan.field;
            let dry_run = plan.dry_run;

            tokio::spawn(async move {
                // Slot held for the whole of this issue's processing,
                // released on every exit path when the permit drops
                let _permit = match gate.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return IssueOutcome::Failed("concurrency gate closed".to_string());
                    }
                };
                process_issue(&client, &issue, &version, field, dry_run).await
            })
        })
        .collect();

    let mut report = RunReport::default();
    for (issue, handle) in plan.issues.iter().zip(handles) {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            // A panicked task still yields a terminal outcome for its issue
            Err(e) => {
                tracing::error!(issue = %issue, error = %e, "Issue task aborted");
                IssueOutcome::Failed(format!("task aborted: {e}"))
            }
        };
        report.record(issue.clone(), outcome);
    }
    report
}

/// The per-issue procedure: dry-run short-circuit, fetch, idempotency
/// check, write, classify. All errors are converted to a `Failed` outcome
/// at this boundary.
async fn process_issue(
    client: &JiraClient,
    issue: &str,
    version: &VersionRef,
    field: VersionField,
    dry_run: bool,
) -> IssueOutcome {
    if dry_run {
        tracing::info!(
            issue = issue,
            version = version.value(),
            field = field.api_name(),
            "Dry run, would add version"
        );
        return IssueOutcome::Updated;
    }

    let current = match client.current_versions(issue, field).await {
        Ok(versions) => versions,
        Err(e) => {
            tracing::error!(issue = issue, error = %e, "Fetching current versions failed");
            return IssueOutcome::Failed(e.to_string());
        }
    };

    if version.present_in(&current) {
        tracing::info!(
            issue = issue,
            version = version.value(),
            "Version already present, skipping"
        );
        return IssueOutcome::Skipped;
    }

    match client.add_version(issue, field, version).await {
        Ok(()) => {
            tracing::info!(issue = issue, version = version.value(), "Version added");
            IssueOutcome::Updated
        }
        Err(e) => {
            tracing::error!(issue = issue, error = %e, "Adding version failed");
            IssueOutcome::Failed(e.to_string())
        }
    }
}
