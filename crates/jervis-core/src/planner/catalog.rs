//! Tool catalog the tool-reasoning phase resolves `toolName` against.

/// One entry in the catalog the planner/tool-reasoning phase is shown.
#[derive(Debug, Clone)]
pub struct ToolCatalogEntry {
    /// Canonical tool name, matched case-insensitively
    pub name: String,
    /// Alternate names the model may produce for this tool
    pub aliases: Vec<String>,
    /// Description shown to the LLM when listing the catalog
    pub description: String,
}

/// A catalog of available tools plus the fallback used when resolution fails.
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    entries: Vec<ToolCatalogEntry>,
    /// Name of the tool used when a requested name resolves to nothing —
    /// typically a general reasoning/no-op tool, never itself unresolvable
    pub fallback_tool: String,
}

impl ToolCatalog {
    /// Build a catalog from its entries and fallback tool name.
    #[must_use]
    pub fn new(entries: Vec<ToolCatalogEntry>, fallback_tool: impl Into<String>) -> Self {
        Self {
            entries,
            fallback_tool: fallback_tool.into(),
        }
    }

    /// Render a human/LLM-readable description of every entry, one per line.
    #[must_use]
    pub fn describe(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.name, e.description))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Resolve a model-produced tool name to a catalog entry's canonical
    /// name: exact case-insensitive match, then alias match, then fallback.
    #[must_use]
    pub fn resolve(&self, requested: &str) -> String {
        let requested_lower = requested.to_lowercase();

        if let Some(entry) = self
            .entries
            .iter()
            .find(|e| e.name.to_lowercase() == requested_lower)
        {
            return entry.name.clone();
        }

        if let Some(entry) = self.entries.iter().find(|e| {
            e.aliases
                .iter()
                .any(|alias| alias.to_lowercase() == requested_lower)
        }) {
            return entry.name.clone();
        }

        self.fallback_tool.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ToolCatalog {
        ToolCatalog::new(
            vec![
                ToolCatalogEntry {
                    name: "search_wiki".to_string(),
                    aliases: vec!["wiki_search".to_string()],
                    description: "Search the wiki".to_string(),
                },
                ToolCatalogEntry {
                    name: "reason".to_string(),
                    aliases: vec![],
                    description: "General reasoning, no external effect".to_string(),
                },
            ],
            "reason",
        )
    }

    #[test]
    fn exact_case_insensitive_match_wins() {
        assert_eq!(catalog().resolve("Search_Wiki"), "search_wiki");
    }

    #[test]
    fn alias_match_is_used_when_no_exact_match() {
        assert_eq!(catalog().resolve("Wiki_Search"), "search_wiki");
    }

    #[test]
    fn unknown_name_falls_back() {
        assert_eq!(catalog().resolve("fetch_weather"), "reason");
    }
}
