//! Static HTML rendering of an evaluated dashboard.
//!
//! The page is fully self-contained: the stylesheet is embedded and tile
//! icons and banners are inlined as `data:` URIs.

pub mod assets;

use futures_util::future::join_all;
use minijinja::Environment;
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::dashboard::results::{DashboardResult, GenerateOutcome, TileResult};
use crate::error::Result;

const TEMPLATE_NAME: &str = "dashboard.html";
const TEMPLATE: &str = include_str!("templates/dashboard.html");
const STYLESHEET: &str = include_str!("templates/style.css");

#[derive(Serialize)]
struct PageView<'a> {
    title: &'a str,
    theme: &'static str,
    css: &'static str,
    refresh_seconds: u64,
    generated_at: String,
    version: &'a str,
    groups: Vec<GroupView<'a>>,
}

#[derive(Serialize)]
struct GroupView<'a> {
    name: &'a str,
    tiles: Vec<TileView<'a>>,
}

#[derive(Serialize)]
struct TileView<'a> {
    name: &'a str,
    link: Option<&'a str>,
    icon_data: Option<String>,
    banner_data: Option<String>,
    generate_error: Option<&'a str>,
    slots: Vec<SlotView<'a>>,
}

#[derive(Serialize)]
struct SlotView<'a> {
    name: &'a str,
    id: &'a str,
    label: &'a str,
    output: &'a str,
}

/// Renders [`DashboardResult`]s into HTML pages.
pub struct Renderer {
    env: Environment<'static>,
    base_dir: PathBuf,
    version: String,
    client: reqwest::Client,
}

impl Renderer {
    /// `base_dir` anchors relative icon and banner paths, normally the
    /// directory holding the configuration file.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut env = Environment::new();
        env.add_filter("initial", first_char);
        env.add_template(TEMPLATE_NAME, TEMPLATE)?;

        Ok(Self {
            env,
            base_dir: base_dir.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            client: reqwest::Client::builder().build()?,
        })
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Render the page. Asset failures are logged and the tile is rendered
    /// without the asset; only template errors fail the call.
    pub async fn render(&self, result: &DashboardResult) -> Result<String> {
        let tiles = result.groups.iter().flat_map(|g| &g.tiles);
        let mut resolved = join_all(tiles.map(|tile| self.tile_view(tile))).await.into_iter();

        let groups = result
            .groups
            .iter()
            .map(|group| GroupView {
                name: &group.name,
                tiles: resolved.by_ref().take(group.tiles.len()).collect(),
            })
            .collect();

        let page = PageView {
            title: &result.title,
            theme: result.theme.as_str(),
            css: STYLESHEET,
            refresh_seconds: result.refresh_seconds,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            version: &self.version,
            groups,
        };

        let template = self.env.get_template(TEMPLATE_NAME)?;
        Ok(template.render(page)?)
    }

    async fn tile_view<'a>(&self, tile: &'a TileResult) -> TileView<'a> {
        let icon_data = match tile.icon.as_deref() {
            Some(icon) => self.inline(&tile.name, "icon", icon).await,
            None => None,
        };
        let banner_data = match &tile.banner {
            Some(banner) => self.inline(&tile.name, "banner", &banner.src).await,
            None => None,
        };

        TileView {
            name: &tile.name,
            link: tile.link.as_deref(),
            icon_data,
            banner_data,
            generate_error: match &tile.generate {
                Some(GenerateOutcome::Failed { error }) => Some(error.as_str()),
                _ => None,
            },
            slots: tile
                .slots
                .iter()
                .map(|slot| SlotView {
                    name: &slot.name,
                    id: &slot.status.id,
                    label: &slot.status.label,
                    output: slot.output.trim(),
                })
                .collect(),
        }
    }

    async fn inline(&self, tile: &str, what: &str, reference: &str) -> Option<String> {
        match assets::resolve(reference, &self.base_dir, &self.client).await {
            Ok(uri) => Some(uri),
            Err(e) => {
                log::warn!("resolving {} for {:?}: {}", what, tile, e);
                None
            }
        }
    }
}

/// First character of `name`, or `?` when empty.
pub fn first_char(name: &str) -> String {
    name.chars().next().map_or_else(|| "?".to_string(), String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dashboard::model::{Banner, Status, Theme};
    use crate::core::dashboard::results::{GroupResult, SlotResult};
    use tempfile::TempDir;

    fn tile(name: &str) -> TileResult {
        TileResult {
            name: name.to_string(),
            icon: None,
            link: None,
            banner: None,
            generate: None,
            slots: vec![SlotResult {
                name: "status".to_string(),
                status: Status::new("ok", "✅"),
                output: "  all good\n".to_string(),
            }],
        }
    }

    fn result(tiles: Vec<TileResult>) -> DashboardResult {
        DashboardResult {
            title: "Test Dashboard".to_string(),
            theme: Theme::Dark,
            refresh_seconds: 0,
            groups: vec![GroupResult {
                name: "Services".to_string(),
                tiles,
            }],
        }
    }

    async fn render(result: &DashboardResult) -> String {
        Renderer::new("/tmp")
            .unwrap()
            .with_version("test")
            .render(result)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_basic_output() {
        let html = render(&result(vec![tile("Example")])).await;

        for needle in [
            "<!DOCTYPE html>",
            "<title>Test Dashboard</title>",
            "data-theme=\"dark\"",
            "Services",
            "Example",
            "✅",
            "status-ok",
            "title=\"all good\"",
            "statusboard test",
        ] {
            assert!(html.contains(needle), "missing {:?}", needle);
        }
        assert!(!html.contains("http-equiv=\"refresh\""));
    }

    #[tokio::test]
    async fn test_light_theme_and_refresh() {
        let mut res = result(vec![tile("Example")]);
        res.theme = Theme::Light;
        res.refresh_seconds = 300;

        let html = render(&res).await;
        assert!(html.contains("data-theme=\"light\""));
        assert!(html.contains("<meta http-equiv=\"refresh\" content=\"300\">"));
    }

    #[tokio::test]
    async fn test_values_are_escaped() {
        let mut t = tile("<script>alert(1)</script>");
        t.slots[0].output = "<b>bold</b>".to_string();
        let html = render(&result(vec![t])).await;

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>bold</b>"));
    }

    #[tokio::test]
    async fn test_missing_icon_falls_back_to_initial() {
        let mut t = tile("Nextcloud");
        t.icon = Some("does-not-exist.png".to_string());
        let html = render(&result(vec![t])).await;

        assert!(html.contains("<span class=\"icon initial\">N</span>"));
        assert!(!html.contains("data:image"));
    }

    #[tokio::test]
    async fn test_icon_and_banner_are_inlined() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("icon.png"), b"\x89PNG\r\n\x1a\n").unwrap();
        std::fs::write(dir.path().join("banner.gif"), b"GIF89a").unwrap();

        let mut t = tile("App");
        t.icon = Some("icon.png".to_string());
        t.banner = Some(Banner {
            src: "banner.gif".to_string(),
        });

        let html = Renderer::new(dir.path())
            .unwrap()
            .render(&result(vec![t]))
            .await
            .unwrap();
        assert!(html.contains("src=\"data:image/png;base64,"));
        assert!(html.contains("class=\"banner\" src=\"data:image/gif;base64,"));
        assert!(!html.contains("icon initial"));
    }

    #[tokio::test]
    async fn test_link_and_generate_error() {
        let mut t = tile("Linked");
        t.link = Some("https://example.com".to_string());
        t.generate = Some(GenerateOutcome::Failed {
            error: "exit status 2".to_string(),
        });
        let html = render(&result(vec![t])).await;

        assert!(html.contains("<a class=\"tile\""));
        assert!(html.contains("example.com"));
        assert!(html.contains("generate failed"));
        assert!(html.contains("exit status 2"));
    }

    #[tokio::test]
    async fn test_tiles_keep_group_order() {
        let mut res = result(vec![tile("First"), tile("Second")]);
        res.groups.push(GroupResult {
            name: "Other".to_string(),
            tiles: vec![tile("Third")],
        });
        let html = render(&res).await;

        let first = html.find("First").unwrap();
        let second = html.find("Second").unwrap();
        let other = html.find("Other").unwrap();
        let third = html.find("Third").unwrap();
        assert!(first < second && second < other && other < third);
    }

    #[test]
    fn test_first_char() {
        assert_eq!(first_char("Nextcloud"), "N");
        assert_eq!(first_char("ñandu"), "ñ");
        assert_eq!(first_char(""), "?");
    }
}
