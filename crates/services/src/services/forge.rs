//! Outbound forge API client.
//!
//! Covers the label endpoints the sync engine needs. The trait seam exists
//! so label sync can be tested against a recording fake without a live
//! forge. Endpoint shapes follow the Gitea v1 API, which GitHub's REST API
//! matches for these routes.

use async_trait::async_trait;
use db::models::integration::Integration;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("forge returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("integration has no access token")]
    MissingCredentials,
    #[error("integration has no API base URL")]
    MissingBaseUrl,
}

/// Everything needed to address one repository on one forge.
#[derive(Debug, Clone)]
pub struct RepoRef {
    pub api_base_url: String,
    pub owner: String,
    pub name: String,
    pub token: String,
}

impl RepoRef {
    pub fn from_integration(integration: &Integration) -> Result<Self, ForgeError> {
        let api_base_url = integration
            .api_base_url
            .clone()
            .ok_or(ForgeError::MissingBaseUrl)?;
        let token = integration
            .access_token
            .clone()
            .ok_or(ForgeError::MissingCredentials)?;
        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            owner: integration.repo_owner.clone(),
            name: integration.repo_name.clone(),
            token,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgeLabel {
    pub id: i64,
    pub name: String,
    pub color: String,
}

#[async_trait]
pub trait ForgeApi: Send + Sync {
    async fn get_label(&self, repo: &RepoRef, name: &str) -> Result<Option<ForgeLabel>, ForgeError>;
    async fn create_label(
        &self,
        repo: &RepoRef,
        name: &str,
        color: &str,
    ) -> Result<ForgeLabel, ForgeError>;
    async fn add_labels(
        &self,
        repo: &RepoRef,
        issue_number: i64,
        label_ids: &[i64],
    ) -> Result<(), ForgeError>;
    async fn remove_label(
        &self,
        repo: &RepoRef,
        issue_number: i64,
        label_id: i64,
    ) -> Result<(), ForgeError>;
}

#[derive(Clone)]
pub struct HttpForgeClient {
    client: reqwest::Client,
}

impl HttpForgeClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    fn repo_url(repo: &RepoRef, suffix: &str) -> String {
        format!(
            "{}/api/v1/repos/{}/{}{}",
            repo.api_base_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            suffix
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ForgeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ForgeError::Status { status, body })
    }
}

impl Default for HttpForgeClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ForgeApi for HttpForgeClient {
    async fn get_label(&self, repo: &RepoRef, name: &str) -> Result<Option<ForgeLabel>, ForgeError> {
        let response = self
            .client
            .get(Self::repo_url(repo, "/labels"))
            .header("Authorization", format!("token {}", repo.token))
            .send()
            .await?;
        let labels: Vec<ForgeLabel> = Self::check(response).await?.json().await?;
        Ok(labels.into_iter().find(|l| l.name.eq_ignore_ascii_case(name)))
    }

    async fn create_label(
        &self,
        repo: &RepoRef,
        name: &str,
        color: &str,
    ) -> Result<ForgeLabel, ForgeError> {
        let response = self
            .client
            .post(Self::repo_url(repo, "/labels"))
            .header("Authorization", format!("token {}", repo.token))
            .json(&serde_json::json!({ "name": name, "color": color }))
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn add_labels(
        &self,
        repo: &RepoRef,
        issue_number: i64,
        label_ids: &[i64],
    ) -> Result<(), ForgeError> {
        let response = self
            .client
            .post(Self::repo_url(
                repo,
                &format!("/issues/{issue_number}/labels"),
            ))
            .header("Authorization", format!("token {}", repo.token))
            .json(&serde_json::json!({ "labels": label_ids }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn remove_label(
        &self,
        repo: &RepoRef,
        issue_number: i64,
        label_id: i64,
    ) -> Result<(), ForgeError> {
        let response = self
            .client
            .delete(Self::repo_url(
                repo,
                &format!("/issues/{issue_number}/labels/{label_id}"),
            ))
            .header("Authorization", format!("token {}", repo.token))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
