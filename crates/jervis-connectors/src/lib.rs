//! Jervis Connectors - Polling Handler Framework (C7)
//!
//! Generic poll algorithm plus illustrative provider sources:
//! - Atlassian (Jira issues, Confluence wiki pages)
//! - GitLab (issues, wiki pages, repository commits)
//! - Email (mailbox, polled over a JMAP-style REST endpoint)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod connectors;
pub mod error;
pub mod polling;
pub mod util;

pub use connectors::{AtlassianSource, EmailSource, GitlabSource};
pub use error::{Error, Result};
pub use polling::{poll_connection, ExternalSource, IndexedItemSink, PollingContext, PollingResult, RemoteItem};
