pub mod config;
pub mod error;
pub mod issues;
pub mod jira;
pub mod redact;
pub mod retry;
pub mod transport;
pub mod update;

#[cfg(test)]
pub(crate) mod test_support;
