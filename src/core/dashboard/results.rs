//! Resolved output tree handed to the renderer.
//!
//! Mirrors the group/tile/slot shape of [`Dashboard`] one to one.

use serde::Serialize;

use super::model::{Banner, Dashboard, Status, Theme};

/// Evaluated status of a single slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotResult {
    pub name: String,
    pub status: Status,
    /// Raw probe output, kept for display on hover.
    pub output: String,
}

/// What happened to a tile's generate step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum GenerateOutcome {
    Ok,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct TileResult {
    pub name: String,
    pub icon: Option<String>,
    pub link: Option<String>,
    pub banner: Option<Banner>,
    /// `None` when the tile has no generate step.
    pub generate: Option<GenerateOutcome>,
    pub slots: Vec<SlotResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupResult {
    pub name: String,
    pub tiles: Vec<TileResult>,
}

/// The fully evaluated dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResult {
    pub title: String,
    pub theme: Theme,
    /// 0 means no auto-refresh.
    pub refresh_seconds: u64,
    pub groups: Vec<GroupResult>,
}

impl DashboardResult {
    /// Header fields copied from the configuration, without groups.
    pub(crate) fn header(dashboard: &Dashboard) -> Self {
        Self {
            title: dashboard.title.clone(),
            theme: dashboard.theme,
            refresh_seconds: dashboard.refresh.map(|d| d.as_secs()).unwrap_or(0),
            groups: Vec::with_capacity(dashboard.groups.len()),
        }
    }

    /// Iterate over every slot result with its tile name.
    pub fn slots(&self) -> impl Iterator<Item = (&str, &SlotResult)> {
        self.groups
            .iter()
            .flat_map(|g| &g.tiles)
            .flat_map(|t| t.slots.iter().map(move |s| (t.name.as_str(), s)))
    }
}
