//! Mailbox connector, polled through a JMAP-style REST endpoint rather than
//! raw IMAP — there is no IMAP client in this workspace's dependency stack,
//! and every other source here already speaks to its provider over HTTP.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use jervis_core::model::{Capability, Connection};

use crate::connectors::apply_auth;
use crate::error::{Error, Result};
use crate::polling::{ExternalSource, RemoteItem};

const PAGE_SIZE: u32 = 50;

const CAPABILITIES: [Capability; 1] = [Capability::Mail];

#[derive(Debug, Deserialize)]
struct MailboxResponse {
    messages: Vec<MailMessage>,
}

#[derive(Debug, Deserialize)]
struct MailMessage {
    id: String,
    subject: String,
    #[serde(default)]
    text_body: String,
    #[serde(default)]
    attachments: Vec<MailAttachment>,
    #[serde(default)]
    thread_id: Option<String>,
    received_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct MailAttachment {
    filename: String,
}

/// Polls a single mailbox for newly received messages.
pub struct EmailSource {
    client: reqwest::Client,
}

impl EmailSource {
    /// Build the source against a shared HTTP client.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for EmailSource {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

async fn fetch_messages(client: &reqwest::Client, connection: &Connection) -> Result<Vec<RemoteItem>> {
    let url = format!("{}/mailbox/messages", connection.base_url.trim_end_matches('/'));
    let builder = client
        .get(&url)
        .query(&[("order_by", "received_at_desc"), ("limit", &PAGE_SIZE.to_string())])
        .timeout(std::time::Duration::from_millis(connection.timeout_ms));
    let response = apply_auth(builder, &connection.auth).send().await?;

    if !response.status().is_success() {
        return Err(Error::Provider {
            provider: "email",
            message: format!("mailbox listing returned {}", response.status()),
        });
    }

    let body: MailboxResponse = response
        .json()
        .await
        .map_err(|e| Error::MalformedResponse(e.to_string()))?;

    Ok(body
        .messages
        .into_iter()
        .map(|message| RemoteItem {
            remote_id: message.id,
            capability: Capability::Mail,
            title: message.subject,
            body: message.text_body,
            attachments: message.attachments.into_iter().map(|a| a.filename).collect(),
            parent_ref: message.thread_id,
            updated_at: message.received_at,
        })
        .collect())
}

#[async_trait]
impl ExternalSource for EmailSource {
    fn capabilities(&self) -> &[Capability] {
        &CAPABILITIES
    }

    async fn fetch_items(&self, connection: &Connection, capability: Capability) -> Result<Vec<RemoteItem>> {
        match capability {
            Capability::Mail => fetch_messages(&self.client, connection).await,
            other => Err(Error::Provider {
                provider: "email",
                message: format!("unsupported capability: {other:?}"),
            }),
        }
    }
}
