// Integration tests for check execution against real probes

use statusboard::config;
use statusboard::core::dashboard::{GenerateOutcome, RunOptions, Runner};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

fn board(http_base: &str) -> String {
    format!(
        r#"
title: "Runner"
groups:
  - name: "Web"
    tiles:
      - name: "api"
        slots:
          - name: "health"
            check: {{ type: http, target: "{base}/health" }}
            rules:
              - match: {{ code: 200, output: "maintenance" }}
                status: {{ id: maint, label: "M" }}
              - match: {{ code: 200 }}
                status: {{ id: ok, label: "OK" }}
              - match: {{ code: "5\\d\\d" }}
                status: {{ id: down, label: "DOWN" }}
          - name: "missing"
            check: {{ type: http, target: "{base}/missing" }}
            rules:
              - match: {{ code: 200 }}
                status: {{ id: ok, label: "OK" }}
            default_status: {{ id: odd, label: "?" }}
          - name: "refused"
            check: {{ type: http, target: "http://127.0.0.1:1/", timeout: 2s }}
            rules:
              - match: {{ code: 200 }}
                status: {{ id: ok, label: "OK" }}
              - match: {{}}
                status: {{ id: unreachable, label: "X" }}
  - name: "Shell"
    tiles:
      - name: "host"
        slots:
          - name: "updates"
            check: {{ type: command, target: "echo '3 updates available'" }}
            rules:
              - match: {{ code: 0, output: "[1-9][0-9]* updates" }}
                status: {{ id: pending, label: "U" }}
              - match: {{ code: 0 }}
                status: {{ id: ok, label: "OK" }}
          - name: "missing-binary"
            check: {{ type: command, target: "definitely-not-a-real-binary-xyz" }}
            rules:
              - match: {{ code: 127 }}
                status: {{ id: matched-code, label: "!" }}
"#,
        base = http_base
    )
}

#[tokio::test]
async fn test_mixed_probes_resolve_independently() {
    let mut server = mockito::Server::new_async().await;
    let _health = server
        .mock("GET", "/health")
        .with_status(503)
        .with_body("upstream down")
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/missing")
        .with_status(404)
        .create_async()
        .await;

    let dash = config::parse(&board(&server.url())).unwrap();
    let result = Runner::new(RunOptions::default())
        .run(&dash, CancellationToken::new())
        .await
        .unwrap();

    let statuses: Vec<(&str, &str)> = result
        .slots()
        .map(|(_, slot)| (slot.name.as_str(), slot.status.id.as_str()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("health", "down"),
            ("missing", "odd"),
            ("refused", "unreachable"),
            ("updates", "pending"),
            // Spawn failure is an execution error: code rules never match it.
            ("missing-binary", "error"),
        ]
    );
    let health = &result.groups[0].tiles[0].slots[0];
    assert_eq!(health.output, "upstream down");
}

#[tokio::test]
async fn test_output_rule_takes_precedence_when_declared_first() {
    let mut server = mockito::Server::new_async().await;
    let _health = server
        .mock("GET", "/health")
        .with_status(200)
        .with_body("{\"maintenance\": true}")
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/missing")
        .with_status(200)
        .create_async()
        .await;

    let dash = config::parse(&board(&server.url())).unwrap();
    let result = Runner::new(RunOptions::default())
        .run(&dash, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.groups[0].tiles[0].slots[0].status.id, "maint");
    assert_eq!(result.groups[0].tiles[0].slots[1].status.id, "ok");
}

#[tokio::test]
async fn test_cancellation_stops_a_slow_run() {
    let dash = config::parse(
        r#"
title: "Slow"
groups:
  - name: "G"
    tiles:
      - name: "T"
        generate: { command: "sleep 30" }
        slots:
          - name: "a"
            check: { type: command, target: "sleep 30" }
            rules: [{ match: {}, status: { id: done, label: "." } }]
          - name: "b"
            check: { type: command, target: "sleep 30" }
            rules: [{ match: { code: 0 }, status: { id: ok, label: "." } }]
"#,
    )
    .unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let result = Runner::new(RunOptions::default())
        .run(&dash, cancel)
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(10));
    let tile = &result.groups[0].tiles[0];
    assert!(matches!(tile.generate, Some(GenerateOutcome::Failed { .. })));
    assert_eq!(tile.slots[0].status.id, "done");
    assert_eq!(tile.slots[1].status.id, "error");
}
