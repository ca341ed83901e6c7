use serde::Serialize;
use tracing::debug;
use url::Url;

use focus_overlay_core::{
    Config, DecisionController, Event, HeadlessDocument, OverlayView, PageRuntime, Phase,
    SqliteStore, SystemClock,
};

#[derive(Serialize)]
struct VisitReport {
    url: String,
    phase: Phase,
    overlay: Option<OverlayView>,
    monitor_remaining_ms: Option<u64>,
    events: Vec<Event>,
}

/// Run one page-load cycle against the persistent store and print the outcome.
pub fn run(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = Url::parse(url)?;
    let config = Config::load()?;
    let store = SqliteStore::open()?;
    debug!(%url, blocklist = config.blocklist.len(), "visiting");

    let controller = DecisionController::new(
        HeadlessDocument::loaded(url.as_str()),
        config.blocklist(),
        config.controller_settings(),
    );
    let mut runtime = PageRuntime::new(controller, store, SystemClock);
    runtime.load();

    let now = runtime.now_ms();
    let controller = runtime.controller();
    let report = VisitReport {
        url: url.to_string(),
        phase: controller.phase().clone(),
        overlay: controller.overlay_view(),
        monitor_remaining_ms: controller.monitor_remaining_ms(now),
        events: runtime.take_events(),
    };
    debug!(phase = ?report.phase, events = report.events.len(), "visit settled");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
