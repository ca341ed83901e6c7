use reqwest::Client;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::{CoreError, StoreError};
use crate::integrations::traits::{TaskSource, TaskSummary};
use crate::settings::Settings;
use crate::store::KeyValueStore;

const NOTION_API: &str = "https://api.notion.com";
const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u64 = 100;
const MAX_TASKS: usize = 3;
const UNTITLED: &str = "Untitled Task";
const DONE_STATUSES: [&str; 2] = ["Done", "Completed"];

pub struct NotionTaskSource {
    client: Client,
    base_url: String,
    settings: Settings,
}

impl NotionTaskSource {
    pub fn new(settings: Settings) -> Self {
        Self {
            client: Client::new(),
            base_url: NOTION_API.to_string(),
            settings,
        }
    }

    /// Credentials from the settings keys of `store`.
    pub fn from_store<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, StoreError> {
        Ok(Self::new(Settings::load(store)?))
    }

    /// Point at a different API host (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Query the database and return its raw pages.
    async fn query(&self) -> Result<Vec<Value>, CoreError> {
        let url = format!(
            "{}/v1/databases/{}/query",
            self.base_url, self.settings.database_id
        );
        let resp = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.settings.api_token))
            .header("Notion-Version", NOTION_VERSION)
            .header("Content-Type", "application/json")
            .json(&json!({ "page_size": PAGE_SIZE }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(CoreError::Integration {
                service: "notion".to_string(),
                message: format!("Notion API error (HTTP {status}): {text}"),
                source: None,
            });
        }

        let body: Value = resp.json().await?;
        Ok(body
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }
}

impl TaskSource for NotionTaskSource {
    fn name(&self) -> &str {
        "notion"
    }

    fn display_name(&self) -> &str {
        "Notion"
    }

    fn is_configured(&self) -> bool {
        self.settings.is_complete()
    }

    async fn fetch_tasks(&self) -> Vec<TaskSummary> {
        if !self.is_configured() {
            return Vec::new();
        }
        match self.query().await {
            Ok(pages) => select_open_tasks(&pages),
            Err(error) => {
                warn!(%error, "fetching Notion tasks failed");
                Vec::new()
            }
        }
    }
}

/// Keep pages not marked done, first three, reduced to their titles.
pub fn select_open_tasks(pages: &[Value]) -> Vec<TaskSummary> {
    pages
        .iter()
        .filter(|page| is_open(page))
        .take(MAX_TASKS)
        .map(|page| TaskSummary {
            title: title_of(page),
        })
        .collect()
}

fn is_open(page: &Value) -> bool {
    let Some(properties) = page.get("properties").and_then(Value::as_object) else {
        return true;
    };

    // A status property decides on its own.
    if let Some(status) = properties
        .get("Status")
        .filter(|p| p.get("type").and_then(Value::as_str) == Some("status"))
    {
        let name = status
            .get("status")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str);
        return !matches!(name, Some(n) if DONE_STATUSES.contains(&n));
    }

    !properties.values().any(|prop| {
        prop.get("type").and_then(Value::as_str) == Some("checkbox")
            && prop.get("checkbox").and_then(Value::as_bool) == Some(true)
    })
}

fn title_of(page: &Value) -> String {
    let title_prop = page
        .get("properties")
        .and_then(Value::as_object)
        .and_then(|props| {
            props.values().find_map(|prop| {
                if prop.get("type").and_then(Value::as_str) != Some("title") {
                    return None;
                }
                prop.get("title")
                    .and_then(Value::as_array)
                    .and_then(|parts| parts.first())
            })
        });

    title_prop
        .and_then(|first| {
            first
                .get("plain_text")
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .or_else(|| {
                    first
                        .get("text")
                        .and_then(|t| t.get("content"))
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                })
        })
        .unwrap_or(UNTITLED)
        .to_string()
}
