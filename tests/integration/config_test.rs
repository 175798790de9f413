// Integration tests for configuration loading

use statusboard::config::{self, DEFAULT_CONFIG_FILE};
use statusboard::core::dashboard::{CodeMatch, Theme};
use statusboard::BoardError;
use std::time::Duration;
use tempfile::TempDir;

const HOME: &str = r#"
title: "Home Lab"
theme: light
refresh: 10m
groups:
  - name: "Media"
    tiles:
      - name: "Jellyfin"
        icon: "icons/jellyfin.svg"
        link: "https://media.lan"
        slots:
          - name: "web"
            check:
              type: http
              target: "https://media.lan/health"
              timeout: 3s
            rules:
              - match: { code: 200, output: "Healthy" }
                status: { id: ok, label: "🟢" }
              - match: { code: "5\\d\\d" }
                status: { id: down, label: "🔴" }
            default_status: { id: unknown, label: "❔" }
  - name: "Backups"
    tiles:
      - name: "Restic"
        generate:
          command: "restic snapshots --json > /tmp/snap.json"
        slots:
          - name: "last"
            check: { type: command, target: "test -s /tmp/snap.json" }
            rules:
              - match: { code: 0 }
                status: { id: ok, label: "🟢" }
              - match: {}
                status: { id: stale, label: "🟡" }
"#;

#[test]
fn test_load_full_config_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(DEFAULT_CONFIG_FILE);
    std::fs::write(&path, HOME).unwrap();

    let dash = config::load(&path).unwrap();

    assert_eq!(dash.title, "Home Lab");
    assert_eq!(dash.theme, Theme::Light);
    assert_eq!(dash.refresh, Some(Duration::from_secs(600)));
    assert_eq!(dash.groups.len(), 2);
    assert_eq!(dash.tile_count(), 2);
    assert_eq!(dash.slot_count(), 2);

    let web = &dash.groups[0].tiles[0].slots[0];
    assert_eq!(web.check.timeout, Some(Duration::from_secs(3)));
    assert!(matches!(web.rules[0].matcher.code, Some(CodeMatch::Exact(200))));
    assert!(web.rules[0].matcher.output.is_some());
    assert!(matches!(web.rules[1].matcher.code, Some(CodeMatch::Pattern(_))));

    let restic = &dash.groups[1].tiles[0];
    assert!(restic.generate.is_some());
    assert!(restic.slots[0].rules[1].matcher.is_catch_all());
}

#[test]
fn test_zero_refresh_disables_reload() {
    let yaml = HOME.replace("refresh: 10m", "refresh: \"0\"");
    let dash = config::parse(&yaml).unwrap();
    assert_eq!(dash.refresh, None);
}

#[test]
fn test_errors_name_the_offending_element() {
    let yaml = HOME.replace("type: command", "type: exec");
    let err = config::parse(&yaml).unwrap_err();
    assert!(matches!(err, BoardError::Config(_)));
    let text = err.to_string();
    assert!(text.starts_with("config: "), "{}", text);
    assert!(text.contains("group[1] \"Backups\""), "{}", text);
    assert!(text.contains("tile[0] \"Restic\""), "{}", text);
    assert!(text.contains("slot[0] \"last\""), "{}", text);
    assert!(text.contains("\"exec\""), "{}", text);
}

#[test]
fn test_code_must_be_number_or_string() {
    let yaml = HOME.replace("code: 200,", "code: [200],");
    assert!(config::parse(&yaml).is_err());
}
