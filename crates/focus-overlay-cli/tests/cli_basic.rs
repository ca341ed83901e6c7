//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command against `data_dir` and return (stdout, stderr, code).
fn run_cli(data_dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focus-overlay"))
        .args(args)
        .env("FOCUS_OVERLAY_DATA_DIR", data_dir.path())
        .env_remove("FOCUS_OVERLAY_LOG")
        .env_remove("FOCUS_OVERLAY_NOTION_URL")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

/// Same as [`run_cli`] with `FOCUS_OVERLAY_LOG` set.
fn run_cli_logged(data_dir: &TempDir, filter: &str, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focus-overlay"))
        .args(args)
        .env("FOCUS_OVERLAY_DATA_DIR", data_dir.path())
        .env("FOCUS_OVERLAY_LOG", filter)
        .output()
        .expect("Failed to execute CLI command");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

fn json(stdout: &str) -> Value {
    serde_json::from_str(stdout).expect("stdout is JSON")
}

#[test]
fn test_visit_blocked_host_shows_prompt() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["visit", "https://www.youtube.com/watch?v=1"]);
    assert_eq!(code, 0);

    let report = json(&stdout);
    assert_eq!(report["phase"]["state"], "blocked");
    assert_eq!(report["phase"]["hostname"], "www.youtube.com");
    assert_eq!(report["overlay"]["mode"], "prompt");
    assert_eq!(report["overlay"]["continue_enabled"], false);
    assert!(report["monitor_remaining_ms"].is_null());
}

#[test]
fn test_visit_unlisted_host_is_untouched() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["visit", "https://example.com/"]);
    assert_eq!(code, 0);

    let report = json(&stdout);
    assert_eq!(report["phase"]["state"], "unblocked");
    assert!(report["overlay"].is_null());
}

#[test]
fn test_visit_rejects_invalid_url() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["visit", "not a url"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn test_grant_then_visit_is_unlocked() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["grant", "instagram.com", "10"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("unlocked instagram.com until "));

    let (stdout, _, code) = run_cli(&dir, &["visit", "https://instagram.com/"]);
    assert_eq!(code, 0);
    let report = json(&stdout);
    assert_eq!(report["phase"]["state"], "unlocked");
    assert!(report["overlay"].is_null());
    let remaining = report["monitor_remaining_ms"].as_u64().unwrap();
    assert!(remaining > 9 * 60_000 && remaining <= 10 * 60_000);

    // The grant is per host.
    let (stdout, _, _) = run_cli(&dir, &["visit", "https://www.instagram.com/"]);
    assert_eq!(json(&stdout)["phase"]["state"], "blocked");
}

#[test]
fn test_grant_validates_host_and_duration() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["grant", "example.com", "10"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not on the blocklist"));

    let (_, stderr, code) = run_cli(&dir, &["grant", "youtube.com", "7"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unsupported duration"));
}

#[test]
fn test_revoke_blocks_again() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["grant", "youtube.com", "1"]);
    let (stdout, _, code) = run_cli(&dir, &["revoke", "youtube.com"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("revoked youtube.com"));

    let (stdout, _, _) = run_cli(&dir, &["visit", "https://youtube.com/"]);
    assert_eq!(json(&stdout)["phase"]["state"], "blocked");
}

#[test]
fn test_status_json() {
    let dir = TempDir::new().unwrap();
    run_cli(&dir, &["grant", "youtube.com", "20"]);
    let (stdout, _, code) = run_cli(&dir, &["status", "--json"]);
    assert_eq!(code, 0);

    let rows = json(&stdout);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    let youtube = rows.iter().find(|r| r["hostname"] == "youtube.com").unwrap();
    assert_eq!(youtube["unlocked"], true);
    assert!(youtube["remaining_secs"].as_u64().unwrap() > 19 * 60);
    let insta = rows.iter().find(|r| r["hostname"] == "instagram.com").unwrap();
    assert_eq!(insta["unlocked"], false);
    assert!(insta.get("unlock_until").is_none());
}

#[test]
fn test_status_plain() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["status"]);
    assert_eq!(code, 0);
    assert!(stdout.lines().any(|l| l.starts_with("youtube.com") && l.ends_with("blocked")));
}

#[test]
fn test_config_get_set_list_reset() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["config", "get", "overlay.cooldown_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "10");

    let (stdout, _, code) = run_cli(&dir, &["config", "set", "blocklist", "news.example, x.com"]);
    assert_eq!(code, 0);
    assert!(stdout.contains(r#"blocklist = ["news.example","x.com"]"#));
    assert!(stdout.contains("2 host(s) blocked"));
    let (stdout, _, _) = run_cli(&dir, &["visit", "https://x.com/home"]);
    assert_eq!(json(&stdout)["phase"]["state"], "blocked");
    let (stdout, _, _) = run_cli(&dir, &["visit", "https://youtube.com/"]);
    assert_eq!(json(&stdout)["phase"]["state"], "unblocked");

    let (stdout, _, code) = run_cli(&dir, &["config", "list", "--json"]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout)["blocklist"][1], "x.com");

    let (stdout, _, code) = run_cli(&dir, &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("[overlay]"));
    assert!(stdout.contains("cooldown_secs = 10"));

    let (stdout, _, code) = run_cli(&dir, &["config", "reset"]);
    assert_eq!(code, 0);
    assert!(stdout.contains(
        "blocklist reset to: youtube.com, www.youtube.com, instagram.com, www.instagram.com"
    ));
    assert!(stdout.contains("unlock durations: 1, 10, 20 min; cooldown 10s"));
    let (stdout, _, _) = run_cli(&dir, &["config", "get", "blocklist"]);
    assert!(stdout.contains("youtube.com"));
}

#[test]
fn test_config_set_echoes_stored_value() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["config", "set", "overlay.durations_min", "[5, 15]"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "overlay.durations_min = [5,15]");

    let (_, stderr, code) = run_cli(&dir, &["grant", "youtube.com", "10"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("[5, 15]"));
}

#[test]
fn test_config_path_is_inside_data_dir() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["config", "path"]);
    assert_eq!(code, 0);
    assert_eq!(
        std::path::PathBuf::from(stdout.trim()),
        dir.path().join("config.toml")
    );
}

#[test]
fn test_config_rejects_bad_values() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(&dir, &["config", "set", "overlay.durations_min", "0"]);
    assert_eq!(code, 1);
    let (_, stderr, code) = run_cli(&dir, &["config", "get", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_settings_set_and_show() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["settings", "set", "--token", "  ", "--database", "db"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Please fill in all fields"));

    let (stdout, _, code) = run_cli(
        &dir,
        &["settings", "set", "--token", " secret_abcd1234 ", "--database", "db9"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("Settings saved successfully!"));

    let (stdout, _, code) = run_cli(&dir, &["settings", "show", "--json"]);
    assert_eq!(code, 0);
    let shown = json(&stdout);
    assert_eq!(shown["api_token"], "***********1234");
    assert_eq!(shown["database_id"], "db9");
    assert_eq!(shown["configured"], true);
}

#[test]
fn test_tasks_without_credentials_is_empty() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) = run_cli(&dir, &["tasks", "--json"]);
    assert_eq!(code, 0);
    assert_eq!(json(&stdout), serde_json::json!([]));
    assert!(stderr.contains("Notion is not configured"));
}

#[test]
fn test_log_filter_controls_diagnostics() {
    let dir = TempDir::new().unwrap();
    let (stdout, stderr, code) =
        run_cli_logged(&dir, "debug", &["visit", "https://youtube.com/"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("visiting"));
    assert!(stderr.contains("visit settled"));
    // Logs never mix into the JSON report.
    assert_eq!(json(&stdout)["phase"]["state"], "blocked");

    let (_, stderr, _) = run_cli_logged(&dir, "error", &["tasks"]);
    assert!(!stderr.contains("not configured"));
}
