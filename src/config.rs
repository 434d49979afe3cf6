use serde::Deserialize;

use crate::error::{AppError, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub jira: JiraConfig,
    #[serde(default)]
    pub update: UpdateConfig,
}

#[derive(Deserialize, Clone)]
pub struct JiraConfig {
    /// Base URL of the Jira REST API, e.g. `https://jira.example.com/rest/api/2`.
    pub base_url: String,
    pub user: String,
    pub token: String,
}

// Manual Debug impl to avoid leaking the API token
impl std::fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpdateConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    4
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Load from file if specified
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            // Try default paths
            builder = builder.add_source(config::File::with_name("fixver").required(false));
        }

        // Environment variable overrides with FIXVER_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("FIXVER")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let config: AppConfig = config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Pre-flight validation. Violations abort the run before any issue is touched.
    pub fn validate(&self) -> Result<()> {
        if self.jira.base_url.trim().is_empty() {
            return Err(AppError::Config("jira.base_url must not be empty".to_string()));
        }
        if self.update.concurrency < 1 {
            return Err(AppError::Config(
                "update.concurrency must be at least 1".to_string(),
            ));
        }
        if self.update.max_attempts < 1 {
            return Err(AppError::Config(
                "update.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn token(&self) -> &str {
        &self.jira.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            jira: JiraConfig {
                base_url: "https://jira.example.com/rest/api/2".to_string(),
                user: "bot".to_string(),
                token: "s3cret".to_string(),
            },
            update: UpdateConfig::default(),
        }
    }

    #[test]
    fn defaults_are_sane() {
        let config = sample();
        assert_eq!(config.update.concurrency, 4);
        assert_eq!(config.update.max_attempts, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut config = sample();
        config.update.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        let mut config = sample();
        config.update.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let config = sample();
        let rendered = format!("{:?}", config.jira);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("s3cret"));
    }
}
