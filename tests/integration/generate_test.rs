// End-to-end tests for the generate command

use statusboard::commands::generate::{run, GenerateArgs};
use std::path::Path;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const CONFIG: &str = r#"
title: "E2E"
groups:
  - name: "Local"
    tiles:
      - name: "Shell"
        icon: "logo.svg"
        generate:
          command: "echo generated"
        slots:
          - name: "echo"
            check: { type: command, target: "echo alive" }
            rules:
              - match: { code: 0, output: "alive" }
                status: { id: ok, label: "UP" }
              - match: {}
                status: { id: down, label: "DOWN" }
"#;

fn setup() -> (TempDir, GenerateArgs) {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("statusboard.yaml"), CONFIG).unwrap();
    std::fs::write(dir.path().join("logo.svg"), "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();

    let args = GenerateArgs {
        config: dir.path().join("statusboard.yaml"),
        output: dir.path().join("index.html"),
        dry_run: false,
        json: false,
        concurrency: 2,
        generate_first: false,
        deadline: None,
        verbose: false,
    };
    (dir, args)
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[test]
fn test_generate_writes_html() {
    let (_dir, args) = setup();

    let summary = run(&args, CancellationToken::new()).unwrap().unwrap();
    let html = read(&args.output);

    assert_eq!(summary.slots, 1);
    assert_eq!(summary.bytes_written, html.len());
    assert!(!summary.cancelled);
    assert!(html.contains("<title>E2E</title>"));
    assert!(html.contains("status-ok"));
    assert!(html.contains("data:image/svg+xml;base64,"));
}

#[test]
fn test_generate_writes_json() {
    let (_dir, mut args) = setup();
    args.json = true;
    args.output = args.output.with_extension("json");

    run(&args, CancellationToken::new()).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&read(&args.output)).unwrap();

    let tile = &value["groups"][0]["tiles"][0];
    assert_eq!(value["title"], "E2E");
    assert_eq!(value["theme"], "dark");
    assert_eq!(tile["generate"]["state"], "ok");
    assert_eq!(tile["slots"][0]["status"]["id"], "ok");
    assert_eq!(tile["slots"][0]["output"], "alive");
}

#[test]
fn test_dry_run_writes_nothing() {
    let (_dir, mut args) = setup();
    args.dry_run = true;

    assert!(run(&args, CancellationToken::new()).unwrap().is_none());
    assert!(!args.output.exists());
}

#[test]
fn test_invalid_config_fails() {
    let (dir, args) = setup();
    std::fs::write(dir.path().join("statusboard.yaml"), "title: \"\"\n").unwrap();

    let err = run(&args, CancellationToken::new()).unwrap_err();
    assert!(format!("{:#}", err).contains("title is required"));
    assert!(!args.output.exists());
}
