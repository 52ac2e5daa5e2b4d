//! GitLab (issues, wiki pages, repository commits) connector.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use jervis_core::model::{Capability, Connection};

use crate::connectors::apply_auth;
use crate::error::{Error, Result};
use crate::polling::{ExternalSource, RemoteItem};

const PAGE_SIZE: u32 = 50;

const CAPABILITIES: [Capability; 3] = [Capability::Bugtracker, Capability::Wiki, Capability::Repository];

#[derive(Debug, Deserialize)]
struct GitlabIssue {
    iid: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct GitlabWikiPage {
    slug: String,
    title: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct GitlabCommit {
    id: String,
    title: String,
    message: String,
    committed_date: DateTime<Utc>,
}

/// Polls a single GitLab project's issues, wiki pages, and commits.
pub struct GitlabSource {
    client: reqwest::Client,
    /// Numeric or URL-encoded `namespace%2Fproject` path, appended to the
    /// connection's `base_url` when building API requests.
    project_id: String,
}

impl GitlabSource {
    /// Build the source against a shared HTTP client and project id.
    #[must_use]
    pub fn new(client: reqwest::Client, project_id: impl Into<String>) -> Self {
        Self { client, project_id: project_id.into() }
    }
}

async fn fetch_issues(client: &reqwest::Client, connection: &Connection, project_id: &str) -> Result<Vec<RemoteItem>> {
    let url = format!(
        "{}/api/v4/projects/{project_id}/issues",
        connection.base_url.trim_end_matches('/')
    );
    let builder = client
        .get(&url)
        .query(&[("order_by", "updated_at"), ("per_page", &PAGE_SIZE.to_string())])
        .timeout(std::time::Duration::from_millis(connection.timeout_ms));
    let response = apply_auth(builder, &connection.auth).send().await?;

    if !response.status().is_success() {
        return Err(Error::Provider {
            provider: "gitlab",
            message: format!("issue listing returned {}", response.status()),
        });
    }

    let issues: Vec<GitlabIssue> = response.json().await.map_err(|e| Error::MalformedResponse(e.to_string()))?;

    Ok(issues
        .into_iter()
        .map(|issue| RemoteItem {
            remote_id: issue.iid.to_string(),
            capability: Capability::Bugtracker,
            title: issue.title,
            body: issue.description.unwrap_or_default(),
            attachments: Vec::new(),
            parent_ref: None,
            updated_at: issue.updated_at,
        })
        .collect())
}

async fn fetch_wiki_pages(client: &reqwest::Client, connection: &Connection, project_id: &str) -> Result<Vec<RemoteItem>> {
    let url = format!(
        "{}/api/v4/projects/{project_id}/wikis",
        connection.base_url.trim_end_matches('/')
    );
    let builder = client
        .get(&url)
        .query(&[("with_content", "1")])
        .timeout(std::time::Duration::from_millis(connection.timeout_ms));
    let response = apply_auth(builder, &connection.auth).send().await?;

    if !response.status().is_success() {
        return Err(Error::Provider {
            provider: "gitlab",
            message: format!("wiki listing returned {}", response.status()),
        });
    }

    let pages: Vec<GitlabWikiPage> = response.json().await.map_err(|e| Error::MalformedResponse(e.to_string()))?;

    Ok(pages
        .into_iter()
        .map(|page| RemoteItem {
            remote_id: page.slug,
            capability: Capability::Wiki,
            title: page.title,
            body: page.content,
            attachments: Vec::new(),
            parent_ref: None,
            updated_at: Utc::now(),
        })
        .collect())
}

async fn fetch_commits(client: &reqwest::Client, connection: &Connection, project_id: &str) -> Result<Vec<RemoteItem>> {
    let url = format!(
        "{}/api/v4/projects/{project_id}/repository/commits",
        connection.base_url.trim_end_matches('/')
    );
    let builder = client
        .get(&url)
        .query(&[("per_page", &PAGE_SIZE.to_string())])
        .timeout(std::time::Duration::from_millis(connection.timeout_ms));
    let response = apply_auth(builder, &connection.auth).send().await?;

    if !response.status().is_success() {
        return Err(Error::Provider {
            provider: "gitlab",
            message: format!("commit listing returned {}", response.status()),
        });
    }

    let commits: Vec<GitlabCommit> = response.json().await.map_err(|e| Error::MalformedResponse(e.to_string()))?;

    Ok(commits
        .into_iter()
        .map(|commit| RemoteItem {
            remote_id: commit.id,
            capability: Capability::Repository,
            title: commit.title,
            body: commit.message,
            attachments: Vec::new(),
            parent_ref: None,
            updated_at: commit.committed_date,
        })
        .collect())
}

#[async_trait]
impl ExternalSource for GitlabSource {
    fn capabilities(&self) -> &[Capability] {
        &CAPABILITIES
    }

    async fn fetch_items(&self, connection: &Connection, capability: Capability) -> Result<Vec<RemoteItem>> {
        match capability {
            Capability::Bugtracker => fetch_issues(&self.client, connection, &self.project_id).await,
            Capability::Wiki => fetch_wiki_pages(&self.client, connection, &self.project_id).await,
            Capability::Repository => fetch_commits(&self.client, connection, &self.project_id).await,
            other => Err(Error::Provider {
                provider: "gitlab",
                message: format!("unsupported capability: {other:?}"),
            }),
        }
    }
}
