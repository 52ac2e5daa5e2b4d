use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::ClientId;

/// A top-level tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Opaque id, stable for the client's lifetime
    pub id: ClientId,
    /// Lowercase `[a-z0-9-]+` slug, unique across clients
    pub slug: String,
    /// Default language used when a platform has no override
    pub default_language: String,
    /// Per-platform language overrides, e.g. `"slack" -> "fr"`
    pub platform_languages: HashMap<String, String>,
}

/// Returned when a slug fails validation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid client slug {0:?}: must match [a-z0-9-]+")]
pub struct InvalidSlug(pub String);

impl Client {
    /// Construct a client, validating the slug per the data model's
    /// `[a-z0-9-]+` invariant.
    pub fn new(slug: impl Into<String>, default_language: impl Into<String>) -> Result<Self, InvalidSlug> {
        let slug = slug.into();
        if !is_valid_slug(&slug) {
            return Err(InvalidSlug(slug));
        }
        Ok(Self {
            id: ClientId::new(),
            slug,
            default_language: default_language.into(),
            platform_languages: HashMap::new(),
        })
    }

    /// Resolve the language for a given platform, falling back to the default.
    #[must_use]
    pub fn language_for(&self, platform: &str) -> &str {
        self.platform_languages
            .get(platform)
            .map_or(self.default_language.as_str(), String::as_str)
    }
}

fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_uppercase_and_symbols() {
        assert!(Client::new("Acme", "en").is_err());
        assert!(Client::new("acme_corp", "en").is_err());
        assert!(Client::new("acme-corp-1", "en").is_ok());
    }

    #[test]
    fn falls_back_to_default_language() {
        let mut client = Client::new("acme", "en").unwrap();
        client
            .platform_languages
            .insert("slack".to_string(), "fr".to_string());
        assert_eq!(client.language_for("slack"), "fr");
        assert_eq!(client.language_for("email"), "en");
    }
}
