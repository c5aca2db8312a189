//! Integration tests for the full harvest pipeline over in-memory and
//! export-backed sessions.

use std::fs;
use std::path::Path;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use tempfile::tempdir;

use tgharvest::config::{ConfigFile, Overrides};
use tgharvest::prelude::*;

fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn settings(channels: &[&str], start: &str, end: &str, out: &Path) -> Settings {
    let channels = channels.iter().map(|c| ChannelId::parse(c).unwrap()).collect();
    Settings::new(channels, DateWindow::parse(start, end).unwrap())
        .unwrap()
        .with_output_dir(out)
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// =========================================================================
// Documented scenarios
// =========================================================================

#[test]
fn test_only_window_message_is_written() {
    let dir = tempdir().unwrap();
    let mut session = MemorySession::new().with_channel(
        "@test",
        vec![
            RawMessage::new(3, at(2024, 2, 1, 8)).with_text("too new"),
            RawMessage::new(2, at(2024, 1, 15, 8)).with_text("in range"),
            RawMessage::new(1, at(2023, 12, 31, 8)).with_text("too old"),
        ],
    );
    let settings = settings(&["@test"], "2024-01-01", "2024-01-31", dir.path());

    let summary = scrape_all(&mut session, &settings).unwrap();
    assert!(summary.is_success());

    let value = read_json(&dir.path().join("test_messages.json"));
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], 2);
    assert_eq!(records[0]["message"], "in range");
}

#[test]
fn test_absent_counters_are_null_in_file() {
    let dir = tempdir().unwrap();
    let mut session = MemorySession::new().with_channel(
        "@test",
        vec![RawMessage::new(7, at(2024, 1, 10, 12)).with_text("hi").with_forwards(5)],
    );
    let settings = settings(&["@test"], "2024-01-01", "2024-01-31", dir.path());
    scrape_all(&mut session, &settings).unwrap();

    let value = read_json(&dir.path().join("test_messages.json"));
    assert_eq!(
        value,
        json!([{
            "id": 7,
            "date": "2024-01-10T12:00:00+00:00",
            "message": "hi",
            "views": null,
            "forwards": 5,
            "reactions": null
        }])
    );
}

#[test]
fn test_private_channel_does_not_block_others() {
    let dir = tempdir().unwrap();
    let mut session = MemorySession::new()
        .with_inaccessible("@private", "CHANNEL_PRIVATE")
        .with_channel("@open", vec![RawMessage::new(1, at(2024, 1, 5, 0))]);
    let settings = settings(&["@private", "@open"], "2024-01-01", "2024-01-31", dir.path());

    let summary = scrape_all(&mut session, &settings).unwrap();
    assert_eq!(summary.completed.len(), 1);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].channel.as_str(), "@private");
    assert!(dir.path().join("open_messages.json").exists());
    assert!(!dir.path().join("private_messages.json").exists());
}

#[test]
fn test_empty_window_writes_empty_array() {
    let dir = tempdir().unwrap();
    let mut session = MemorySession::new().with_channel(
        "@quiet",
        vec![RawMessage::new(1, at(2023, 6, 1, 0))],
    );
    let settings = settings(&["@quiet"], "2024-01-01", "2024-01-31", dir.path());

    let summary = scrape_all(&mut session, &settings).unwrap();
    assert!(summary.is_success());
    assert_eq!(summary.total_records(), 0);
    let content = fs::read_to_string(dir.path().join("quiet_messages.json")).unwrap();
    assert_eq!(content.trim(), "[]");
}

// =========================================================================
// Ordering and idempotence
// =========================================================================

#[test]
fn test_records_keep_feed_order() {
    let dir = tempdir().unwrap();
    let feed: Vec<RawMessage> = (0..250)
        .map(|i| RawMessage::new(1000 - i, at(2024, 1, 20, 0) - chrono::Duration::minutes(i)))
        .collect();
    let mut session = MemorySession::new().with_channel("@long", feed);
    let settings = settings(&["@long"], "2024-01-01", "2024-01-31", dir.path());

    let summary = scrape_all(&mut session, &settings).unwrap();
    assert_eq!(summary.completed[0].records, 250);
    assert_eq!(summary.completed[0].pages, 3);

    let value = read_json(&summary.completed[0].path);
    let ids: Vec<i64> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_i64().unwrap())
        .collect();
    assert!(ids.windows(2).all(|w| w[0] > w[1]));
}

#[test]
fn test_rerun_is_byte_identical() {
    let dir = tempdir().unwrap();
    let feed = vec![
        RawMessage::new(3, at(2024, 1, 20, 9))
            .with_text("Привет 👋")
            .with_views(10)
            .with_reaction("👍", 4)
            .with_reaction("❤", 1),
        RawMessage::new(2, at(2024, 1, 2, 9)).with_views(3),
    ];
    let settings = settings(&["@same"], "2024-01-01", "2024-01-31", dir.path());
    let path = dir.path().join("same_messages.json");

    let mut first = MemorySession::new().with_channel("@same", feed.clone());
    scrape_all(&mut first, &settings).unwrap();
    let before = fs::read(&path).unwrap();

    let mut second = MemorySession::new().with_channel("@same", feed);
    scrape_all(&mut second, &settings).unwrap();
    assert_eq!(before, fs::read(&path).unwrap());
}

#[test]
fn test_unordered_feed_is_scanned_fully() {
    let dir = tempdir().unwrap();
    let feed = vec![
        RawMessage::new(5, at(2024, 1, 30, 0)),
        RawMessage::new(1, at(2023, 1, 1, 0)),
        RawMessage::new(4, at(2024, 1, 3, 0)),
    ];
    let mut session = MemorySession::new().with_channel("@mixed", feed).unordered();
    let settings = settings(&["@mixed"], "2024-01-01", "2024-01-31", dir.path());

    let summary = scrape_all(&mut session, &settings).unwrap();
    assert_eq!(summary.total_records(), 2);
}

// =========================================================================
// Config file to output file, through a Telegram Desktop export
// =========================================================================

#[test]
fn test_config_file_with_export_session() {
    let dir = tempdir().unwrap();
    let exports = dir.path().join("exports");
    fs::create_dir_all(exports.join("rust_news")).unwrap();
    fs::write(
        exports.join("rust_news").join("result.json"),
        r#"{
  "name": "Rust News",
  "type": "public_channel",
  "id": 1234567890,
  "messages": [
    {"id": 10, "type": "message", "date": "2024-01-14T23:30:00", "date_unixtime": "1705275000", "text": "older"},
    {"id": 11, "type": "service", "date_unixtime": "1705314600", "action": "pin_message", "text": ""},
    {"id": 12, "type": "message", "date": "2024-01-15T10:30:00", "date_unixtime": "1705314600",
     "text": ["Release ", {"type": "link", "text": "notes"}], "views": 1250, "forwards": 3,
     "reactions": [{"type": "emoji", "count": 17, "emoji": "👍"}, {"type": "emoji", "count": 2, "emoji": "🔥"}]},
    {"id": 13, "type": "message", "date_unixtime": "1705400000", "text": "later"}
  ]
}"#,
    )
    .unwrap();

    let config_path = dir.path().join("config.yaml");
    fs::write(
        &config_path,
        format!(
            "channels:\n  - \"@rust_news\"\nstart_date: \"2024-01-15\"\nend_date: \"2024-01-15\"\noutput_dir: {}\nsession:\n  export_dir: {}\n",
            dir.path().join("data").display(),
            exports.display()
        ),
    )
    .unwrap();

    let settings = ConfigFile::load(&config_path)
        .unwrap()
        .resolve(&Overrides::default())
        .unwrap();
    let mut session = tgharvest::session::open(settings.session(), None).unwrap();
    let summary = scrape_all(&mut session, &settings).unwrap();
    assert!(summary.is_success());

    let value = read_json(&dir.path().join("data").join("rust_news_messages.json"));
    assert_eq!(
        value,
        json!([{
            "id": 12,
            "date": "2024-01-15T10:30:00+00:00",
            "message": "Release notes",
            "views": 1250,
            "forwards": 3,
            "reactions": {
                "count": 19,
                "reactions": [{"emoji": "👍", "count": 17}, {"emoji": "🔥", "count": 2}]
            }
        }])
    );
}

#[test]
fn test_cli_overrides_replace_config_values() {
    let dir = tempdir().unwrap();
    let config = ConfigFile::from_yaml_str(
        "channels: [\"@a\"]\nstart_date: \"2024-01-01\"\nend_date: \"2024-01-31\"\n",
    )
    .unwrap();
    let overrides = Overrides::new()
        .with_channels(["@b", "@c"])
        .with_end_date("2024-01-10")
        .with_output_dir(dir.path());

    let settings = config.resolve(&overrides).unwrap();
    let channels: Vec<&str> = settings.channels().iter().map(ChannelId::as_str).collect();
    assert_eq!(channels, ["@b", "@c"]);
    assert_eq!(settings.window().to_string(), "2024-01-01..=2024-01-10");
    assert_eq!(settings.output_dir(), dir.path());
}
