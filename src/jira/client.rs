use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde_json::json;

use crate::error::{AppError, Result};
use crate::retry::RetryPolicy;
use crate::transport::{basic_auth, ApiRequest, Transport};

use super::types::{parse_versions, VersionEntry, VersionField, VersionRef};

/// Thin client for the two issue operations the tool needs: read the
/// current version field and add a version to it. All requests go through
/// the retry policy.
pub struct JiraClient {
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    base_url: String,
    auth_header: String,
}

impl JiraClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        retry: RetryPolicy,
        base_url: &str,
        user: &str,
        token: &str,
    ) -> Self {
        Self {
            transport,
            retry,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: basic_auth(user, token),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.auth_header) {
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn issue_url(&self, issue: &str) -> String {
        format!("{}/issue/{}", self.base_url, urlencoding::encode(issue))
    }

    /// Fetch the current entries of `field`, scoped to that field only.
    ///
    /// A non-2xx after retries is an error embedding status and body.
    /// A 2xx with an unusable body is an empty list, not an error.
    pub async fn current_versions(
        &self,
        issue: &str,
        field: VersionField,
    ) -> Result<Vec<VersionEntry>> {
        let url = format!("{}?fields={}", self.issue_url(issue), field.api_name());
        let request = ApiRequest::new(Method::GET, url).with_headers(self.headers());

        let response = self.retry.execute(self.transport.as_ref(), &request).await?;

        if !response.status.is_success() {
            return Err(AppError::JiraApi(format!(
                "GET {issue} returned {}: {}",
                response.status.as_u16(),
                response.body
            )));
        }

        Ok(parse_versions(&response.body, field))
    }

    /// Issue the add-version patch for `field`.
    pub async fn add_version(
        &self,
        issue: &str,
        field: VersionField,
        version: &VersionRef,
    ) -> Result<()> {
        let mut update = serde_json::Map::new();
        update.insert(
            field.api_name().to_string(),
            json!([{ "add": version.add_payload() }]),
        );
        let payload = json!({ "update": update });

        let request = ApiRequest::new(Method::PUT, self.issue_url(issue))
            .with_body(payload)
            .with_headers(self.headers());

        let response = self.retry.execute(self.transport.as_ref(), &request).await?;

        if !response.status.is_success() {
            return Err(AppError::JiraApi(format!(
                "PUT {issue} returned {}: {}",
                response.status.as_u16(),
                response.body
            )));
        }

        Ok(())
    }
}
