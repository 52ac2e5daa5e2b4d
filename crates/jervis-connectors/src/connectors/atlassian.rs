//! Atlassian (Jira issues, Confluence wiki pages) connector.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use jervis_core::model::{Capability, Connection};

use crate::connectors::apply_auth;
use crate::error::{Error, Result};
use crate::polling::{ExternalSource, RemoteItem};

/// Items requested per poll run; pagination resumes from provider-side
/// cursors on the next run rather than draining the whole backlog at once.
const PAGE_SIZE: u32 = 50;

const CAPABILITIES: [Capability; 2] = [Capability::Bugtracker, Capability::Wiki];

/// Polls Jira issues and Confluence pages via the Atlassian REST API.
pub struct AtlassianSource {
    client: reqwest::Client,
}

impl AtlassianSource {
    /// Build the source against a shared HTTP client.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for AtlassianSource {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[derive(Debug, Deserialize)]
struct JiraSearchResponse {
    issues: Vec<JiraIssue>,
}

#[derive(Debug, Deserialize)]
struct JiraIssue {
    key: String,
    fields: JiraFields,
}

#[derive(Debug, Deserialize)]
struct JiraFields {
    summary: String,
    #[serde(default)]
    description: Option<String>,
    updated: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct ConfluenceSearchResponse {
    results: Vec<ConfluencePage>,
}

#[derive(Debug, Deserialize)]
struct ConfluencePage {
    id: String,
    title: String,
    #[serde(default)]
    ancestors: Vec<ConfluenceAncestor>,
    version: ConfluenceVersion,
}

#[derive(Debug, Deserialize)]
struct ConfluenceAncestor {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ConfluenceVersion {
    when: DateTime<Utc>,
}

async fn fetch_issues(client: &reqwest::Client, connection: &Connection) -> Result<Vec<RemoteItem>> {
    let url = format!("{}/rest/api/2/search", connection.base_url.trim_end_matches('/'));
    let builder = client
        .get(&url)
        .query(&[
            ("jql", "ORDER BY updated DESC"),
            ("maxResults", &PAGE_SIZE.to_string()),
        ])
        .timeout(std::time::Duration::from_millis(connection.timeout_ms));
    let response = apply_auth(builder, &connection.auth).send().await?;

    if !response.status().is_success() {
        return Err(Error::Provider {
            provider: "atlassian",
            message: format!("jira search returned {}", response.status()),
        });
    }

    let body: JiraSearchResponse = response
        .json()
        .await
        .map_err(|e| Error::MalformedResponse(e.to_string()))?;

    Ok(body
        .issues
        .into_iter()
        .map(|issue| RemoteItem {
            remote_id: issue.key,
            capability: Capability::Bugtracker,
            title: issue.fields.summary,
            body: issue.fields.description.unwrap_or_default(),
            attachments: Vec::new(),
            parent_ref: None,
            updated_at: issue.fields.updated,
        })
        .collect())
}

async fn fetch_pages(client: &reqwest::Client, connection: &Connection) -> Result<Vec<RemoteItem>> {
    let url = format!("{}/wiki/rest/api/content", connection.base_url.trim_end_matches('/'));
    let builder = client
        .get(&url)
        .query(&[
            ("expand", "ancestors,version,body.storage"),
            ("limit", &PAGE_SIZE.to_string()),
        ])
        .timeout(std::time::Duration::from_millis(connection.timeout_ms));
    let response = apply_auth(builder, &connection.auth).send().await?;

    if !response.status().is_success() {
        return Err(Error::Provider {
            provider: "atlassian",
            message: format!("confluence content listing returned {}", response.status()),
        });
    }

    let body: ConfluenceSearchResponse = response
        .json()
        .await
        .map_err(|e| Error::MalformedResponse(e.to_string()))?;

    Ok(body
        .results
        .into_iter()
        .map(|page| RemoteItem {
            remote_id: page.id,
            capability: Capability::Wiki,
            title: page.title,
            body: String::new(),
            attachments: Vec::new(),
            parent_ref: page.ancestors.last().map(|a| a.id.clone()),
            updated_at: page.version.when,
        })
        .collect())
}

#[async_trait]
impl ExternalSource for AtlassianSource {
    fn capabilities(&self) -> &[Capability] {
        &CAPABILITIES
    }

    async fn fetch_items(&self, connection: &Connection, capability: Capability) -> Result<Vec<RemoteItem>> {
        match capability {
            Capability::Bugtracker => fetch_issues(&self.client, connection).await,
            Capability::Wiki => fetch_pages(&self.client, connection).await,
            other => Err(Error::Provider {
                provider: "atlassian",
                message: format!("unsupported capability: {other:?}"),
            }),
        }
    }
}
