//! Built-in tools shipped with this crate's [`crate::registry::JervisToolRegistry`].

mod analysis_reasoning;
mod repository_read;
mod web_search;

pub use analysis_reasoning::AnalysisReasoningTool;
pub use repository_read::RepositoryReadTool;
pub use web_search::WebSearchTool;
