//! In-memory dashboard model.
//!
//! These types are produced by [`crate::core::config`] and consumed read-only
//! by the runner and the evaluator. Regexes are already compiled here; the
//! textual decoding lives in the configuration layer.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeout applied to a check when none (or zero) is configured.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout applied to a generate step when none (or zero) is configured.
pub const DEFAULT_GENERATE_TIMEOUT: Duration = Duration::from_secs(60);

/// A status identifier and its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub id: String,
    pub label: String,
}

impl Status {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Condition on the probe's result code.
#[derive(Debug, Clone)]
pub enum CodeMatch {
    /// Numeric equality.
    Exact(i64),
    /// Regex matched against the decimal rendering of the code.
    Pattern(Regex),
}

impl CodeMatch {
    pub fn matches(&self, code: i64) -> bool {
        match self {
            CodeMatch::Exact(expected) => *expected == code,
            CodeMatch::Pattern(re) => re.is_match(&code.to_string()),
        }
    }
}

/// Conditions of a rule. An empty match is a catch-all.
#[derive(Debug, Clone, Default)]
pub struct Match {
    pub code: Option<CodeMatch>,
    /// Searched unanchored anywhere in the output.
    pub output: Option<Regex>,
}

impl Match {
    /// The catch-all shape, with no conditions.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn exact(code: i64) -> Self {
        Self {
            code: Some(CodeMatch::Exact(code)),
            output: None,
        }
    }

    pub fn pattern(code: Regex) -> Self {
        Self {
            code: Some(CodeMatch::Pattern(code)),
            output: None,
        }
    }

    pub fn with_output(mut self, output: Regex) -> Self {
        self.output = Some(output);
        self
    }

    pub fn is_catch_all(&self) -> bool {
        self.code.is_none() && self.output.is_none()
    }
}

/// A condition and the status it resolves to.
#[derive(Debug, Clone)]
pub struct Rule {
    pub matcher: Match,
    pub status: Status,
}

impl Rule {
    pub fn new(matcher: Match, status: Status) -> Self {
        Self { matcher, status }
    }
}

/// How to obtain status information for a slot.
#[derive(Debug, Clone)]
pub struct Check {
    /// `"http"` or `"command"`.
    pub kind: String,
    /// URL or command line.
    pub target: String,
    pub timeout: Option<Duration>,
}

impl Check {
    pub fn http(target: impl Into<String>) -> Self {
        Self {
            kind: "http".to_string(),
            target: target.into(),
            timeout: None,
        }
    }

    pub fn command(target: impl Into<String>) -> Self {
        Self {
            kind: "command".to_string(),
            target: target.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn effective_timeout(&self) -> Duration {
        non_zero_or(self.timeout, DEFAULT_CHECK_TIMEOUT)
    }
}

/// Side-effect command run once per tile.
#[derive(Debug, Clone)]
pub struct Generate {
    pub command: String,
    pub timeout: Option<Duration>,
}

impl Generate {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
        }
    }

    pub fn effective_timeout(&self) -> Duration {
        non_zero_or(self.timeout, DEFAULT_GENERATE_TIMEOUT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
    pub src: String,
}

/// A named status indicator backed by exactly one check.
#[derive(Debug, Clone)]
pub struct Slot {
    pub name: String,
    pub check: Check,
    pub rules: Vec<Rule>,
    pub default_status: Option<Status>,
}

/// One dashboard entry representing a monitored service.
#[derive(Debug, Clone, Default)]
pub struct Tile {
    pub name: String,
    pub icon: Option<String>,
    pub link: Option<String>,
    pub generate: Option<Generate>,
    pub slots: Vec<Slot>,
    pub banner: Option<Banner>,
}

#[derive(Debug, Clone, Default)]
pub struct Group {
    pub name: String,
    pub tiles: Vec<Tile>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

/// Root of the validated configuration tree.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub title: String,
    pub theme: Theme,
    /// Page auto-refresh interval; `None` disables it.
    pub refresh: Option<Duration>,
    pub groups: Vec<Group>,
}

impl Dashboard {
    pub fn tile_count(&self) -> usize {
        self.groups.iter().map(|g| g.tiles.len()).sum()
    }

    pub fn slot_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| &g.tiles)
            .map(|t| t.slots.len())
            .sum()
    }
}

fn non_zero_or(timeout: Option<Duration>, fallback: Duration) -> Duration {
    match timeout {
        Some(t) if !t.is_zero() => t,
        _ => fallback,
    }
}
