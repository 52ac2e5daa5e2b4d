//! `REPOSITORY_READ_TOOL` — reads one file out of a project's repository.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use jervis_core::model::{TaskContext, ToolResult};

use crate::registry::Tool;

/// Directories a natural-language instruction is never allowed to resolve into.
static BLOCKED_DIRECTORIES: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    vec![
        "/etc", "/root", "/var/log", "/boot", "/dev", "/proc", "/sys", "/usr/bin", "/usr/sbin",
        "/bin", "/sbin", "/var/run", "/run",
    ]
});

/// Maximum bytes read from a single file before the result is truncated.
const MAX_READ_BYTES: usize = 200_000;

/// Pull the file path out of an instruction, stripping a leading verb like
/// `read ` or surrounding quotes — the tool-reasoning phase is prompted to
/// pass a bare path, but models occasionally wrap it in a sentence.
fn extract_path(instruction: &str) -> &str {
    let trimmed = instruction.trim().trim_matches(|c| c == '"' || c == '\'');
    trimmed
        .strip_prefix("read ")
        .or_else(|| trimmed.strip_prefix("Read "))
        .unwrap_or(trimmed)
        .trim()
}

fn validate_path(path: &str) -> Result<PathBuf, String> {
    if path.is_empty() {
        return Err("empty path".to_string());
    }
    let path_buf = PathBuf::from(path);
    let path_str = path_buf.to_string_lossy();
    if path_str.contains("..") {
        warn!(path, "path traversal attempt detected");
        return Err("path traversal (..) is not allowed".to_string());
    }
    for blocked in BLOCKED_DIRECTORIES.iter() {
        if path_str.starts_with(blocked) {
            warn!(path, blocked, "access to blocked directory");
            return Err(format!("access to '{blocked}' is restricted"));
        }
    }

    let canonical = if path_buf.exists() {
        path_buf
            .canonicalize()
            .map_err(|e| format!("cannot resolve path '{path}': {e}"))?
    } else {
        return Err(format!("no such file: '{path}'"));
    };
    let canonical_str = canonical.to_string_lossy();
    for blocked in BLOCKED_DIRECTORIES.iter() {
        if canonical_str.starts_with(blocked) {
            warn!(original = path, resolved = %canonical_str, blocked, "symlink resolves into a blocked directory");
            return Err(format!("access denied: path resolves into restricted area '{blocked}'"));
        }
    }
    Ok(canonical)
}

async fn read_truncated(path: &Path) -> std::io::Result<(String, bool)> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut buf = vec![0u8; MAX_READ_BYTES + 1];
    let mut total = 0usize;
    loop {
        let read = file.read(&mut buf[total..]).await?;
        if read == 0 {
            break;
        }
        total += read;
        if total > MAX_READ_BYTES {
            break;
        }
    }
    let truncated = total > MAX_READ_BYTES;
    buf.truncate(total.min(MAX_READ_BYTES));
    Ok((String::from_utf8_lossy(&buf).into_owned(), truncated))
}

/// Reads a single repository file and returns its contents as tool output.
pub struct RepositoryReadTool;

impl RepositoryReadTool {
    /// Build the tool.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Default for RepositoryReadTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for RepositoryReadTool {
    fn name(&self) -> &str {
        "repository_read_tool"
    }

    fn aliases(&self) -> &[&str] {
        &["repository_read", "read_file", "file_read"]
    }

    fn description(&self) -> &str {
        "Reads the contents of one file from the project repository. \
         Instruction should be the file path, optionally prefixed with \"read \"."
    }

    async fn execute(&self, instruction: &str, _context: &TaskContext) -> ToolResult {
        let path = extract_path(instruction);
        let resolved = match validate_path(path) {
            Ok(p) => p,
            Err(message) => return ToolResult::failure(self.name(), message),
        };

        match read_truncated(&resolved).await {
            Ok((content, truncated)) => {
                debug!(path, truncated, "repository file read");
                let summary = if truncated {
                    format!("read {path} (truncated at {MAX_READ_BYTES} bytes)")
                } else {
                    format!("read {path}")
                };
                ToolResult::success(
                    self.name(),
                    summary,
                    serde_json::json!({ "path": path, "content": content, "truncated": truncated }),
                )
            }
            Err(e) => ToolResult::failure(self.name(), format!("failed to read '{path}': {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jervis_core::ids::ClientId;

    #[test]
    fn extract_path_strips_leading_verb_and_quotes() {
        assert_eq!(extract_path("read \"README.md\""), "README.md");
        assert_eq!(extract_path("Cargo.toml"), "Cargo.toml");
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let tool = RepositoryReadTool::new();
        let context = TaskContext::new(ClientId::new(), None);
        let result = tool.execute("../../etc/passwd", &context).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn rejects_blocked_directory() {
        let tool = RepositoryReadTool::new();
        let context = TaskContext::new(ClientId::new(), None);
        let result = tool.execute("/etc/hosts", &context).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn reads_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("notes.txt");
        tokio::fs::write(&file_path, b"hello jervis").await.unwrap();

        let tool = RepositoryReadTool::new();
        let context = TaskContext::new(ClientId::new(), None);
        let result = tool.execute(file_path.to_str().unwrap(), &context).await;
        assert!(result.success);
        assert_eq!(result.content["content"], "hello jervis");
    }
}
