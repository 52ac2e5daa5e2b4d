//! Illustrative provider connectors implementing [`crate::polling::ExternalSource`].

mod atlassian;
mod email;
mod gitlab;

pub use atlassian::AtlassianSource;
pub use email::EmailSource;
pub use gitlab::GitlabSource;

use jervis_core::model::AuthConfig;

/// Apply a connection's [`AuthConfig`] to an outgoing request.
pub(crate) fn apply_auth(builder: reqwest::RequestBuilder, auth: &AuthConfig) -> reqwest::RequestBuilder {
    match auth {
        AuthConfig::Basic { username, password } => builder.basic_auth(username, Some(password)),
        AuthConfig::Bearer { token } => builder.bearer_auth(token),
        AuthConfig::None => builder,
    }
}
