//! Wires configured [`ConnectionConfig`] entries into concrete connector
//! sources and a background sweep that drives the poll algorithm (C7)
//! against each of them on a fixed interval.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use jervis_connectors::{poll_connection, AtlassianSource, EmailSource, ExternalSource, GitlabSource, PollingContext};
use jervis_core::ids::{ClientId, ConnectionId, ObjectId};
use jervis_core::model::{AuthConfig, Capability, Connection, ConnectionProvider, ConnectionScope};

use crate::config::ConnectionConfig;
use crate::item_sink::ItemStoreSink;

fn capabilities_for(provider: ConnectionProvider) -> HashSet<Capability> {
    match provider {
        ConnectionProvider::Atlassian => [Capability::Bugtracker, Capability::Wiki].into_iter().collect(),
        ConnectionProvider::Gitlab => {
            [Capability::Bugtracker, Capability::Wiki, Capability::Repository].into_iter().collect()
        }
        ConnectionProvider::Email => [Capability::Mail].into_iter().collect(),
    }
}

fn auth_from(config: &ConnectionConfig) -> AuthConfig {
    if let Some(token) = &config.token {
        AuthConfig::Bearer { token: token.clone() }
    } else if let (Some(username), Some(password)) = (&config.username, &config.password) {
        AuthConfig::Basic {
            username: username.clone(),
            password: password.clone(),
        }
    } else {
        AuthConfig::None
    }
}

fn client_id_from(config: &ConnectionConfig) -> Result<ClientId> {
    match &config.client_id {
        Some(hex) => ObjectId::from_hex(hex)
            .map(ClientId)
            .map_err(|_| anyhow!("connection client_id is not a valid hex object id: {hex}")),
        None => Ok(ClientId::new()),
    }
}

fn build_source(provider: ConnectionProvider, config: &ConnectionConfig, client: reqwest::Client) -> Result<Arc<dyn ExternalSource>> {
    match provider {
        ConnectionProvider::Atlassian => Ok(Arc::new(AtlassianSource::new(client))),
        ConnectionProvider::Gitlab => {
            let project_id = config
                .project_id
                .clone()
                .context("gitlab connections require project_id")?;
            Ok(Arc::new(GitlabSource::new(client, project_id)))
        }
        ConnectionProvider::Email => Ok(Arc::new(EmailSource::new(client))),
    }
}

fn parse_provider(name: &str) -> Result<ConnectionProvider> {
    match name {
        "atlassian" => Ok(ConnectionProvider::Atlassian),
        "gitlab" => Ok(ConnectionProvider::Gitlab),
        "email" => Ok(ConnectionProvider::Email),
        other => Err(anyhow!("unknown connector provider: {other}")),
    }
}

fn build_connection(provider: ConnectionProvider, config: &ConnectionConfig) -> Result<Connection> {
    Ok(Connection {
        id: ConnectionId::new(),
        scope: ConnectionScope::Client(client_id_from(config)?),
        provider,
        base_url: config.base_url.clone(),
        auth: auth_from(config),
        timeout_ms: config.timeout_ms,
        available_capabilities: capabilities_for(provider),
    })
}

/// Build every configured connection's source + [`Connection`] pair, ready
/// for repeated polling.
pub fn build_connections(configs: &[ConnectionConfig]) -> Result<Vec<(Connection, Arc<dyn ExternalSource>)>> {
    let http = reqwest::Client::new();
    configs
        .iter()
        .map(|config| {
            let provider = parse_provider(&config.provider)?;
            let connection = build_connection(provider, config)?;
            let source = build_source(provider, config, http.clone())?;
            Ok((connection, source))
        })
        .collect()
}

/// Spawn the background sweep that polls every configured connection every
/// `poll_interval_secs`, forever, until the process exits.
pub fn spawn_polling_loop(
    connections: Vec<(Connection, Arc<dyn ExternalSource>)>,
    sink: Arc<ItemStoreSink>,
    poll_interval_secs: u64,
) {
    if connections.is_empty() {
        info!("no connector connections configured, polling loop will idle");
    }

    tokio::spawn(async move {
        let context = PollingContext::default();
        let mut ticker = tokio::time::interval(Duration::from_secs(poll_interval_secs.max(1)));
        loop {
            ticker.tick().await;
            for (connection, source) in &connections {
                let result = poll_connection(source.as_ref(), sink.as_ref(), connection, &context).await;
                if result.errors > 0 {
                    warn!(connection_id = %connection.id, ?result, "poll run completed with errors");
                } else {
                    info!(connection_id = %connection.id, ?result, "poll run completed");
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ConnectionConfig {
        ConnectionConfig {
            provider: "gitlab".to_string(),
            base_url: "https://gitlab.example.com".to_string(),
            project_id: None,
            token: None,
            username: None,
            password: None,
            timeout_ms: 30_000,
            client_id: None,
        }
    }

    #[test]
    fn parse_provider_accepts_known_names() {
        assert_eq!(parse_provider("atlassian").unwrap(), ConnectionProvider::Atlassian);
        assert_eq!(parse_provider("gitlab").unwrap(), ConnectionProvider::Gitlab);
        assert_eq!(parse_provider("email").unwrap(), ConnectionProvider::Email);
    }

    #[test]
    fn parse_provider_rejects_unknown_names() {
        assert!(parse_provider("slack").is_err());
    }

    #[test]
    fn capabilities_match_provider() {
        assert_eq!(
            capabilities_for(ConnectionProvider::Atlassian),
            [Capability::Bugtracker, Capability::Wiki].into_iter().collect()
        );
        assert_eq!(
            capabilities_for(ConnectionProvider::Gitlab),
            [Capability::Bugtracker, Capability::Wiki, Capability::Repository]
                .into_iter()
                .collect()
        );
        assert_eq!(capabilities_for(ConnectionProvider::Email), [Capability::Mail].into_iter().collect());
    }

    #[test]
    fn auth_prefers_bearer_over_basic() {
        let mut config = base_config();
        config.token = Some("secret".to_string());
        config.username = Some("ignored".to_string());
        config.password = Some("ignored".to_string());
        assert!(matches!(auth_from(&config), AuthConfig::Bearer { token } if token == "secret"));
    }

    #[test]
    fn auth_falls_back_to_basic() {
        let mut config = base_config();
        config.username = Some("alice".to_string());
        config.password = Some("hunter2".to_string());
        assert!(matches!(auth_from(&config), AuthConfig::Basic { username, .. } if username == "alice"));
    }

    #[test]
    fn auth_defaults_to_none() {
        assert!(matches!(auth_from(&base_config()), AuthConfig::None));
    }

    #[test]
    fn client_id_from_mints_when_absent() {
        assert!(client_id_from(&base_config()).is_ok());
    }

    #[test]
    fn client_id_from_rejects_invalid_hex() {
        let mut config = base_config();
        config.client_id = Some("not-hex".to_string());
        assert!(client_id_from(&config).is_err());
    }

    #[test]
    fn build_connection_requires_project_id_for_gitlab() {
        let config = base_config();
        let err = build_source(ConnectionProvider::Gitlab, &config, reqwest::Client::new()).unwrap_err();
        assert!(err.to_string().contains("project_id"));
    }
}
