use std::future::Future;

use serde::{Deserialize, Serialize};

/// A task shown alongside the block, reduced to what is displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub title: String,
}

/// A remote source of open tasks.
///
/// Fetching is best-effort: any failure yields an empty list, never an error.
pub trait TaskSource {
    /// Unique identifier (e.g. "notion").
    fn name(&self) -> &str;

    /// Human-readable display name.
    fn display_name(&self) -> &str;

    /// Whether credentials are present.
    fn is_configured(&self) -> bool;

    fn fetch_tasks(&self) -> impl Future<Output = Vec<TaskSummary>> + Send;
}
