use crate::config::settings::JiraCredentials;
use crate::errors::{EpicError, Result};
use crate::models::issue::{IssueFields, IssueHandle, JiraErrorBody, SearchResponse};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

const SEARCH_PAGE_SIZE: u64 = 50;

/// The operations the epic workflows need from an issue tracker.
#[async_trait]
pub trait IssueTracker {
    async fn create_issue(&self, fields: &IssueFields) -> Result<IssueHandle>;

    async fn get_issue(&self, key: &str) -> Result<IssueHandle>;

    /// Every issue matching `jql`; empty when nothing matches.
    async fn search_issues(&self, jql: &str) -> Result<Vec<IssueHandle>>;
}

pub struct JiraClient {
    client: Client,
    base_url: String,
    email: String,
    api_token: String,
}

impl JiraClient {
    /// Builds a client and checks the credentials against `/myself`.
    pub async fn connect(credentials: &JiraCredentials) -> Result<Self> {
        let client = Self::new(
            credentials.server.clone(),
            credentials.user_email.clone(),
            credentials.api_token.clone(),
        );
        client.verify_session().await?;
        Ok(client)
    }

    fn new(base_url: String, email: String, api_token: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            email,
            api_token,
        }
    }

    async fn verify_session(&self) -> Result<()> {
        let url = format!("{}/rest/api/2/myself", self.base_url);
        debug!(%url, "Authenticating");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.email, Some(&self.api_token))
            .send()
            .await
            .map_err(|e| EpicError::JiraAuthFailed(format!("Could not reach {}: {}", self.base_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(EpicError::JiraAuthFailed(format!(
                "Jira rejected the credentials ({}){}",
                status,
                detail_suffix(&text)
            )));
        }

        Ok(())
    }

    fn issue_url(&self, key: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}",
            self.base_url,
            urlencoding::encode(key)
        )
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    async fn create_issue(&self, fields: &IssueFields) -> Result<IssueHandle> {
        let url = format!("{}/rest/api/2/issue", self.base_url);
        debug!(%url, "Creating issue");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.email, Some(&self.api_token))
            .json(&fields.to_payload())
            .send()
            .await
            .map_err(|e| EpicError::issue_creation("Failed to send issue to Jira", Some(e.to_string())))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(EpicError::issue_creation(
                format!("Jira rejected the issue ({})", status),
                Some(remote_error_text(&text)),
            ));
        }

        let issue = response.json::<IssueHandle>().await?;
        debug!(key = %issue.key, id = %issue.id, "Issue created");
        Ok(issue)
    }

    async fn get_issue(&self, key: &str) -> Result<IssueHandle> {
        let url = self.issue_url(key);
        debug!(%url, "Fetching issue");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.email, Some(&self.api_token))
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => {
                Err(EpicError::JiraIssueNotFound(key.to_string()))
            }
            status if !status.is_success() => Err(api_error(response).await),
            _ => Ok(response.json::<IssueHandle>().await?),
        }
    }

    async fn search_issues(&self, jql: &str) -> Result<Vec<IssueHandle>> {
        let url = format!("{}/rest/api/2/search", self.base_url);
        let mut issues: Vec<IssueHandle> = Vec::new();
        let mut start_at: u64 = 0;

        loop {
            debug!(%url, jql, start_at, "Searching issues");

            let response = self
                .client
                .get(&url)
                .basic_auth(&self.email, Some(&self.api_token))
                .query(&[
                    ("jql", jql.to_string()),
                    ("startAt", start_at.to_string()),
                    ("maxResults", SEARCH_PAGE_SIZE.to_string()),
                    ("fields", "summary,description,issuetype".to_string()),
                ])
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(api_error(response).await);
            }

            let page = response.json::<SearchResponse>().await?;
            let page_size = page.issues.len() as u64;
            let total = page.total;

            issues.extend(page.issues);
            start_at = page.start_at + page_size;

            if page_size == 0 || start_at >= total {
                break;
            }
        }

        Ok(issues)
    }
}

async fn api_error(response: Response) -> EpicError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    EpicError::JiraApiError(status.as_u16(), remote_error_text(&text))
}

/// Jira's structured error summary when the body has one, otherwise the raw text.
fn remote_error_text(text: &str) -> String {
    serde_json::from_str::<JiraErrorBody>(text)
        .ok()
        .and_then(|body| body.condensed())
        .unwrap_or_else(|| text.trim().to_string())
}

fn detail_suffix(text: &str) -> String {
    let detail = remote_error_text(text);
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {}", detail)
    }
}
