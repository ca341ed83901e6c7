use tracing::{debug, warn};

use focus_overlay_core::{NotionTaskSource, SqliteStore, TaskSource};

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::open()?;
    let source = match std::env::var("FOCUS_OVERLAY_NOTION_URL") {
        Ok(base) => NotionTaskSource::from_store(&store)?.with_base_url(base),
        Err(_) => NotionTaskSource::from_store(&store)?,
    };
    if !source.is_configured() {
        warn!(
            "{} is not configured; run `focus-overlay settings set`",
            source.display_name()
        );
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let tasks = runtime.block_on(source.fetch_tasks());
    debug!(count = tasks.len(), source = source.name(), "fetched tasks");

    if json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
    } else if tasks.is_empty() {
        println!("no open tasks");
    } else {
        for task in tasks {
            println!("- {}", task.title);
        }
    }
    Ok(())
}
