use std::collections::BTreeSet;

use chrono::SecondsFormat;
use serde::Serialize;

use focus_overlay_core::clock::to_datetime;
use focus_overlay_core::grant::{active_grant, UNLOCK_KEY_PREFIX};
use focus_overlay_core::{
    unlock_key, Clock, Config, Grant, KeyValueStore, SqliteStore, SystemClock,
};

#[derive(Serialize)]
struct HostStatus {
    hostname: String,
    blocklisted: bool,
    unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unlock_until: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    remaining_secs: Option<u64>,
}

/// Write a grant for `host` lasting `minutes`, as the duration picker would.
pub fn grant(host: &str, minutes: u64) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    if !config.blocklist().is_blocked(host) {
        return Err(format!("{host} is not on the blocklist").into());
    }
    if !config.overlay.durations_min.contains(&minutes) {
        return Err(format!(
            "unsupported duration {minutes} min (choose one of {:?})",
            config.overlay.durations_min
        )
        .into());
    }

    let mut store = SqliteStore::open()?;
    let grant = Grant::for_minutes(SystemClock.now_ms(), minutes);
    store.set(&unlock_key(host), grant.to_value())?;
    println!(
        "unlocked {host} until {}",
        to_datetime(grant.unlock_until_ms).to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    Ok(())
}

pub fn status(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let blocklist = config.blocklist();
    let store = SqliteStore::open()?;
    let now = SystemClock.now_ms();

    let mut hosts: BTreeSet<String> = blocklist.hosts().map(str::to_owned).collect();
    for key in store.keys_with_prefix(UNLOCK_KEY_PREFIX)? {
        hosts.insert(key[UNLOCK_KEY_PREFIX.len()..].to_string());
    }

    let mut rows = Vec::new();
    for hostname in hosts {
        let value = store.get(&unlock_key(&hostname))?;
        let grant = active_grant(value.as_ref(), now);
        rows.push(HostStatus {
            blocklisted: blocklist.is_blocked(&hostname),
            unlocked: grant.is_some(),
            unlock_until: grant.map(|g| {
                to_datetime(g.unlock_until_ms).to_rfc3339_opts(SecondsFormat::Secs, true)
            }),
            remaining_secs: grant.map(|g| g.remaining_ms(now) / 1_000),
            hostname,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("blocklist is empty");
        return Ok(());
    }
    for row in rows {
        let state = match (row.unlocked, row.remaining_secs) {
            (true, Some(secs)) => format!("unlocked ({}m {:02}s left)", secs / 60, secs % 60),
            _ if row.blocklisted => "blocked".to_string(),
            _ => "not blocklisted".to_string(),
        };
        println!("{:<28} {state}", row.hostname);
    }
    Ok(())
}

pub fn revoke(host: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = SqliteStore::open()?;
    store.remove(&unlock_key(host))?;
    println!("revoked {host}");
    Ok(())
}
