// Integration tests for HTML rendering with asset inlining

use statusboard::core::dashboard::{GroupResult, SlotResult, Status, Theme, TileResult};
use statusboard::{DashboardResult, Renderer};

fn result(icon: Option<String>) -> DashboardResult {
    DashboardResult {
        title: "Assets".to_string(),
        theme: Theme::Dark,
        refresh_seconds: 60,
        groups: vec![GroupResult {
            name: "G".to_string(),
            tiles: vec![TileResult {
                name: "Remote".to_string(),
                icon,
                link: None,
                banner: None,
                generate: None,
                slots: vec![SlotResult {
                    name: "s".to_string(),
                    status: Status::new("ok", "OK"),
                    output: String::new(),
                }],
            }],
        }],
    }
}

#[tokio::test]
async fn test_remote_icon_is_fetched_and_inlined() {
    let mut server = mockito::Server::new_async().await;
    let _icon = server
        .mock("GET", "/icon.png")
        .with_status(200)
        .with_header("content-type", "image/png")
        .with_body(b"\x89PNG\r\n\x1a\n".to_vec())
        .create_async()
        .await;

    let html = Renderer::new(".")
        .unwrap()
        .render(&result(Some(format!("{}/icon.png", server.url()))))
        .await
        .unwrap();

    assert!(html.contains("src=\"data:image/png;base64,iVBORw0KGgo=\""));
    assert!(html.contains("<meta http-equiv=\"refresh\" content=\"60\">"));
}

#[tokio::test]
async fn test_failed_remote_icon_is_not_fatal() {
    let mut server = mockito::Server::new_async().await;
    let _icon = server
        .mock("GET", "/icon.png")
        .with_status(500)
        .create_async()
        .await;

    let html = Renderer::new(".")
        .unwrap()
        .render(&result(Some(format!("{}/icon.png", server.url()))))
        .await
        .unwrap();

    assert!(html.contains("<span class=\"icon initial\">R</span>"));
}
