//! Web search tool — DuckDuckGo HTML scraping (no API key required).
//!
//! Uses system `curl` for HTTP requests to avoid TLS fingerprint-based bot
//! detection (rustls' JA3 fingerprint gets blocked by DuckDuckGo).

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use jervis_core::model::{TaskContext, ToolResult};

use crate::registry::Tool;

const DEFAULT_MAX_RESULTS: usize = 5;
const DEFAULT_REGION: &str = "us-en";
const SEARCH_TIMEOUT_SECS: u64 = 15;
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, serde::Serialize)]
struct SearchResult {
    title: String,
    url: String,
    snippet: String,
}

/// DuckDuckGo HTML-based web search tool.
///
/// The instruction is used verbatim as the search query; no structured
/// parameter extraction is needed beyond trimming.
pub struct WebSearchTool;

impl WebSearchTool {
    /// Build the tool.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search_tool"
    }

    fn aliases(&self) -> &[&str] {
        &["web_search", "search_the_web"]
    }

    fn description(&self) -> &str {
        "Searches the web via DuckDuckGo and returns titles, URLs, and snippets. \
         Use for real-time information not found in the project's indexed content."
    }

    async fn execute(&self, instruction: &str, _context: &TaskContext) -> ToolResult {
        let query = instruction.trim();
        if query.is_empty() {
            return ToolResult::failure(self.name(), "empty search query");
        }

        match fetch_search_results(query, DEFAULT_REGION, DEFAULT_MAX_RESULTS).await {
            Ok(results) => ToolResult::success(
                self.name(),
                format!("{} result(s) for \"{query}\"", results.len()),
                serde_json::json!({ "query": query, "results": results }),
            ),
            Err(message) => ToolResult::failure(self.name(), message),
        }
    }
}

async fn fetch_search_results(
    query: &str,
    region: &str,
    max_results: usize,
) -> Result<Vec<SearchResult>, String> {
    let url = "https://html.duckduckgo.com/html/";
    let form_data = format!(
        "q={}&kl={}",
        urlencoding::encode(query),
        urlencoding::encode(region),
    );

    debug!(query, region, "fetching DuckDuckGo search results via curl POST");

    let output = tokio::process::Command::new("curl")
        .args([
            "-s",
            "-X",
            "POST",
            url,
            "-d",
            &form_data,
            "-H",
            &format!("User-Agent: {USER_AGENT}"),
            "-H",
            "Referer: https://html.duckduckgo.com/",
            "--max-time",
            &SEARCH_TIMEOUT_SECS.to_string(),
        ])
        .output()
        .await
        .map_err(|e| format!("failed to execute curl: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("curl exited with {}: {stderr}", output.status));
    }

    let html = String::from_utf8_lossy(&output.stdout).to_string();
    if html.contains("anomaly-modal") {
        warn!("DuckDuckGo returned CAPTCHA page — bot detection triggered");
        return Err("DuckDuckGo CAPTCHA triggered; search temporarily blocked".to_string());
    }

    Ok(parse_search_results(&html, max_results))
}

fn parse_search_results(html: &str, max_results: usize) -> Vec<SearchResult> {
    let title_re = Regex::new(r#"<a[^>]+class="result__a"[^>]+href="([^"]*)"[^>]*>(.*?)</a>"#)
        .expect("title regex");
    let snippet_re = Regex::new(r#"<a[^>]+class="result__snippet"[^>]*>(.*?)</a>"#).expect("snippet regex");

    let titles: Vec<(String, String)> = title_re
        .captures_iter(html)
        .map(|cap| {
            let raw_url = cap.get(1).map_or("", |m| m.as_str());
            let url = extract_real_url(raw_url);
            let title = strip_html_tags(cap.get(2).map_or("", |m| m.as_str()));
            (url, title)
        })
        .collect();

    let snippets: Vec<String> = snippet_re
        .captures_iter(html)
        .map(|cap| strip_html_tags(cap.get(1).map_or("", |m| m.as_str())))
        .collect();

    titles
        .into_iter()
        .enumerate()
        .take(max_results)
        .map(|(i, (url, title))| SearchResult {
            title,
            url,
            snippet: snippets.get(i).cloned().unwrap_or_default(),
        })
        .filter(|r| !r.url.is_empty() && !r.title.is_empty())
        .collect()
}

fn extract_real_url(raw: &str) -> String {
    if let Some(pos) = raw.find("uddg=") {
        let rest = &raw[pos + 5..];
        let end = rest.find('&').unwrap_or(rest.len());
        urlencoding::decode(&rest[..end])
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| rest[..end].to_string())
    } else {
        raw.to_string()
    }
}

fn strip_html_tags(s: &str) -> String {
    let tag_re = Regex::new(r"<[^>]+>").expect("tag regex");
    tag_re
        .replace_all(s, "")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jervis_core::ids::ClientId;

    #[test]
    fn strip_html_tags_decodes_entities() {
        assert_eq!(strip_html_tags("<b>hello</b> world &amp; friends"), "hello world & friends");
    }

    #[test]
    fn extract_real_url_unwraps_duckduckgo_redirect() {
        let raw = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=abc";
        assert_eq!(extract_real_url(raw), "https://example.com");
        assert_eq!(extract_real_url("https://example.com"), "https://example.com");
    }

    #[test]
    fn parse_sample_html_extracts_title_url_snippet() {
        let html = r#"
            <div class="result">
                <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com">Example Title</a>
                <a class="result__snippet">This is a snippet about example.</a>
            </div>
        "#;
        let results = parse_search_results(html, 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Example Title");
        assert_eq!(results[0].url, "https://example.com");
    }

    #[tokio::test]
    async fn empty_query_fails_without_a_network_call() {
        let tool = WebSearchTool::new();
        let context = TaskContext::new(ClientId::new(), None);
        let result = tool.execute("   ", &context).await;
        assert!(!result.success);
    }
}
