use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::{ClientId, ProjectId};

/// Per-project indexing configuration: which files a connector should index.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IndexingRules {
    /// Glob patterns a path must match at least one of
    pub include_globs: Vec<String>,
    /// Glob patterns that exclude an otherwise-included path
    pub exclude_globs: Vec<String>,
    /// Files larger than this (bytes) are skipped
    pub max_file_size_bytes: u64,
}

/// A project belonging to exactly one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Opaque id
    pub id: ProjectId,
    /// Owning client
    pub client_id: ClientId,
    /// Human-readable name
    pub name: String,
    /// Indexing rules applied by connectors scoped to this project
    pub indexing_rules: IndexingRules,
    /// Per-platform language overrides, layered over the client's defaults
    pub platform_languages: HashMap<String, String>,
}

impl Project {
    /// Create a project with empty indexing rules.
    #[must_use]
    pub fn new(client_id: ClientId, name: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(),
            client_id,
            name: name.into(),
            indexing_rules: IndexingRules::default(),
            platform_languages: HashMap::new(),
        }
    }

    /// Whether a path should be indexed under this project's rules.
    #[must_use]
    pub fn should_index(&self, path: &str) -> bool {
        let included = self.indexing_rules.include_globs.is_empty()
            || self
                .indexing_rules
                .include_globs
                .iter()
                .any(|pat| glob_match(pat, path));
        let excluded = self
            .indexing_rules
            .exclude_globs
            .iter()
            .any(|pat| glob_match(pat, path));
        included && !excluded
    }
}

/// Minimal `*`/`**` glob matcher; connectors with richer needs should use a
/// dedicated glob crate, this only needs to answer yes/no for simple patterns.
fn glob_match(pattern: &str, path: &str) -> bool {
    if let Some(suffix) = pattern.strip_prefix("**/") {
        return path.ends_with(suffix) || glob_match(suffix, path);
    }
    if let Some(prefix) = pattern.strip_suffix("/**") {
        return path.starts_with(prefix);
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return path.starts_with(prefix);
    }
    pattern == path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_include_list_means_everything_included() {
        let project = Project::new(ClientId::new(), "demo");
        assert!(project.should_index("src/main.rs"));
    }

    #[test]
    fn exclude_overrides_include() {
        let mut project = Project::new(ClientId::new(), "demo");
        project.indexing_rules.include_globs.push("**/*.rs".to_string());
        project.indexing_rules.exclude_globs.push("target/**".to_string());
        assert!(project.should_index("src/main.rs"));
        assert!(!project.should_index("target/debug/main.rs"));
    }
}
