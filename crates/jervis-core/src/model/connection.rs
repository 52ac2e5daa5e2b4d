use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::ids::{ClientId, ConnectionId, ProjectId};

/// External source provider a [`Connection`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionProvider {
    /// Jira/Confluence
    Atlassian,
    /// GitLab issues/wikis/repositories
    Gitlab,
    /// IMAP mailbox
    Email,
}

/// Capability a connection exposes; a connection may offer several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Issue tracker (Jira, GitLab issues)
    Bugtracker,
    /// Wiki (Confluence, GitLab wiki)
    Wiki,
    /// Source repository
    Repository,
    /// Mailbox
    Mail,
}

/// How a connection authenticates against its provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum AuthConfig {
    /// Username/password
    Basic {
        /// Account username
        username: String,
        /// Account password or app password
        password: String,
    },
    /// Bearer token
    Bearer {
        /// Opaque token, provider-specific format
        token: String,
    },
    /// No authentication required (public instance)
    None,
}

/// Where a connection is attached: client-level connections are inherited by
/// every project, project-level connections are scoped to one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ConnectionScope {
    /// Visible to every project under this client
    Client(ClientId),
    /// Visible only to this project
    Project(ProjectId),
}

/// Configuration of one external source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// Opaque id
    pub id: ConnectionId,
    /// Where this connection is attached
    pub scope: ConnectionScope,
    /// Which provider this connection talks to
    pub provider: ConnectionProvider,
    /// Provider base URL
    pub base_url: String,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Request timeout, milliseconds
    pub timeout_ms: u64,
    /// Capabilities this connection exposes
    pub available_capabilities: HashSet<Capability>,
}

impl Connection {
    /// Whether this connection can service a given capability.
    #[must_use]
    pub fn supports(&self, capability: Capability) -> bool {
        self.available_capabilities.contains(&capability)
    }

    /// The client this connection is ultimately scoped under. Project-scoped
    /// connections don't carry their owning client directly; callers resolve
    /// it via the project when needed.
    #[must_use]
    pub fn client_scope(&self) -> Option<ClientId> {
        match self.scope {
            ConnectionScope::Client(id) => Some(id),
            ConnectionScope::Project(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_lookup() {
        let connection = Connection {
            id: ConnectionId::new(),
            scope: ConnectionScope::Client(ClientId::new()),
            provider: ConnectionProvider::Gitlab,
            base_url: "https://gitlab.example.com".to_string(),
            auth: AuthConfig::Bearer {
                token: "secret".to_string(),
            },
            timeout_ms: 30_000,
            available_capabilities: [Capability::Repository, Capability::Bugtracker]
                .into_iter()
                .collect(),
        };
        assert!(connection.supports(Capability::Repository));
        assert!(!connection.supports(Capability::Mail));
    }
}
