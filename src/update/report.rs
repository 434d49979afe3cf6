/// Terminal classification of one issue. Every input issue lands in
/// exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueOutcome {
    Updated,
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedIssue {
    pub issue: String,
    pub error: String,
}

/// Aggregate result of a run. Built empty, populated once per issue as
/// worker tasks complete, and handed back only after every task has
/// finished.
#[derive(Debug, Default)]
pub struct RunReport {
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<FailedIssue>,
}

impl RunReport {
    pub fn record(&mut self, issue: String, outcome: IssueOutcome) {
        match outcome {
            IssueOutcome::Updated => self.updated.push(issue),
            IssueOutcome::Skipped => self.skipped.push(issue),
            IssueOutcome::Failed(error) => self.failed.push(FailedIssue { issue, error }),
        }
    }

    pub fn total(&self) -> usize {
        self.updated.len() + self.skipped.len() + self.failed.len()
    }

    /// No failures at all.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Every issue failed; nothing was updated or skipped.
    pub fn all_failed(&self) -> bool {
        !self.failed.is_empty() && self.updated.is_empty() && self.skipped.is_empty()
    }
}
