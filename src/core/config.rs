//! YAML configuration loading and validation.
//!
//! The file is decoded into loosely typed `Raw*` structs first, then validated
//! and converted into the [`Dashboard`] model. Every validation error names
//! the offending group/tile/slot/rule by index and name.

use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

use super::dashboard::model::{
    Banner, Check, CodeMatch, Dashboard, Generate, Group, Match, Rule, Slot, Status, Theme, Tile,
};
use super::dashboard::probes::CheckKind;
use crate::error::{BoardError, Result};

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "statusboard.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    title: String,
    theme: Option<String>,
    refresh: Option<String>,
    groups: Vec<RawGroup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGroup {
    name: String,
    tiles: Vec<RawTile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTile {
    name: String,
    #[serde(alias = "display")]
    icon: Option<String>,
    link: Option<String>,
    generate: Option<RawGenerate>,
    banner: Option<RawBanner>,
    slots: Vec<RawSlot>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGenerate {
    command: String,
    timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawBanner {
    src: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSlot {
    name: String,
    check: RawCheck,
    rules: Vec<RawRule>,
    default_status: Option<RawStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCheck {
    #[serde(rename = "type")]
    kind: String,
    target: String,
    timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRule {
    #[serde(rename = "match")]
    matcher: RawMatch,
    status: RawStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMatch {
    code: Option<RawCode>,
    output: Option<String>,
}

/// An integer is an exact code, a string is a regex.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCode {
    Exact(i64),
    Pattern(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStatus {
    id: String,
    label: String,
}

/// Read and validate the configuration at `path`.
pub fn load(path: &Path) -> Result<Dashboard> {
    let text = fs::read_to_string(path).map_err(|e| {
        BoardError::config(format!("reading config file {}: {}", path.display(), e))
    })?;
    parse(&text)
}

/// Decode and validate a YAML document.
pub fn parse(text: &str) -> Result<Dashboard> {
    let raw: RawConfig = serde_yaml::from_str(text)?;
    convert(raw)
}

fn convert(raw: RawConfig) -> Result<Dashboard> {
    if raw.title.trim().is_empty() {
        return Err(BoardError::config("title is required"));
    }

    let theme = match raw.theme.as_deref().unwrap_or("") {
        "" | "dark" => Theme::Dark,
        "light" => Theme::Light,
        other => {
            return Err(BoardError::config(format!(
                "theme must be \"dark\" or \"light\", got {:?}",
                other
            )))
        }
    };

    let refresh = match raw.refresh.as_deref() {
        None => None,
        Some(text) => {
            let interval = parse_duration(text)
                .map_err(|e| BoardError::config(format!("refresh: {}", e)))?;
            (!interval.is_zero()).then_some(interval)
        }
    };

    if raw.groups.is_empty() {
        return Err(BoardError::config("at least one group is required"));
    }

    let groups = raw
        .groups
        .into_iter()
        .enumerate()
        .map(|(gi, group)| convert_group(gi, group))
        .collect::<Result<Vec<_>>>()?;

    Ok(Dashboard {
        title: raw.title,
        theme,
        refresh,
        groups,
    })
}

fn convert_group(gi: usize, raw: RawGroup) -> Result<Group> {
    if raw.name.is_empty() {
        return Err(BoardError::config(format!("group[{}]: name is required", gi)));
    }
    let prefix = format!("group[{}] {:?}", gi, raw.name);
    if raw.tiles.is_empty() {
        return Err(BoardError::config(format!(
            "{}: at least one tile is required",
            prefix
        )));
    }

    let tiles = raw
        .tiles
        .into_iter()
        .enumerate()
        .map(|(ti, tile)| convert_tile(&prefix, ti, tile))
        .collect::<Result<Vec<_>>>()?;

    Ok(Group {
        name: raw.name,
        tiles,
    })
}

fn convert_tile(group_prefix: &str, ti: usize, raw: RawTile) -> Result<Tile> {
    if raw.name.is_empty() {
        return Err(BoardError::config(format!(
            "{}, tile[{}]: name is required",
            group_prefix, ti
        )));
    }
    let prefix = format!("{}, tile[{}] {:?}", group_prefix, ti, raw.name);

    let generate = match raw.generate {
        None => None,
        Some(generate) => {
            if generate.command.trim().is_empty() {
                return Err(BoardError::config(format!(
                    "{}: generate.command is required when generate is specified",
                    prefix
                )));
            }
            Some(Generate {
                command: generate.command,
                timeout: optional_duration(&prefix, "generate.timeout", generate.timeout)?,
            })
        }
    };

    let banner = match raw.banner {
        None => None,
        Some(banner) if banner.src.is_empty() => {
            return Err(BoardError::config(format!(
                "{}: banner.src is required when banner is specified",
                prefix
            )))
        }
        Some(banner) => Some(Banner { src: banner.src }),
    };

    let slots = raw
        .slots
        .into_iter()
        .enumerate()
        .map(|(si, slot)| convert_slot(&prefix, si, slot))
        .collect::<Result<Vec<_>>>()?;

    Ok(Tile {
        name: raw.name,
        icon: raw.icon.filter(|icon| !icon.is_empty()),
        link: raw.link.filter(|link| !link.is_empty()),
        generate,
        slots,
        banner,
    })
}

fn convert_slot(tile_prefix: &str, si: usize, raw: RawSlot) -> Result<Slot> {
    if raw.name.is_empty() {
        return Err(BoardError::config(format!(
            "{}, slot[{}]: name is required",
            tile_prefix, si
        )));
    }
    let prefix = format!("{}, slot[{}] {:?}", tile_prefix, si, raw.name);

    if raw.check.kind.is_empty() {
        return Err(BoardError::config(format!("{}: check.type is required", prefix)));
    }
    let kind: CheckKind = raw.check.kind.parse().map_err(|_| {
        BoardError::config(format!(
            "{}: check.type must be \"http\" or \"command\", got {:?}",
            prefix, raw.check.kind
        ))
    })?;
    if raw.check.target.trim().is_empty() {
        return Err(BoardError::config(format!("{}: check.target is required", prefix)));
    }
    if kind == CheckKind::Http {
        validate_http_target(&raw.check.target)
            .map_err(|e| BoardError::config(format!("{}: check.target {}", prefix, e)))?;
    }

    if raw.rules.is_empty() {
        return Err(BoardError::config(format!(
            "{}: at least one rule is required",
            prefix
        )));
    }

    let rules = raw
        .rules
        .into_iter()
        .enumerate()
        .map(|(ri, rule)| convert_rule(&format!("{}, rule[{}]", prefix, ri), rule))
        .collect::<Result<Vec<_>>>()?;

    let default_status = raw
        .default_status
        .map(|status| convert_status(&prefix, "default_status", status))
        .transpose()?;

    Ok(Slot {
        name: raw.name,
        check: Check {
            kind: kind.as_str().to_string(),
            target: raw.check.target,
            timeout: optional_duration(&prefix, "check.timeout", raw.check.timeout)?,
        },
        rules,
        default_status,
    })
}

fn convert_rule(prefix: &str, raw: RawRule) -> Result<Rule> {
    let status = convert_status(prefix, "status", raw.status)?;

    let code = match raw.matcher.code {
        None => None,
        Some(RawCode::Exact(code)) => Some(CodeMatch::Exact(code)),
        Some(RawCode::Pattern(pattern)) => {
            let re = Regex::new(&pattern).map_err(|e| {
                BoardError::config(format!(
                    "{}: invalid code regex {:?}: {}",
                    prefix, pattern, e
                ))
            })?;
            Some(CodeMatch::Pattern(re))
        }
    };

    // An empty output pattern is treated as absent, like the other optional strings.
    let output = match raw.matcher.output.filter(|o| !o.is_empty()) {
        None => None,
        Some(pattern) => Some(Regex::new(&pattern).map_err(|e| {
            BoardError::config(format!(
                "{}: invalid output regex {:?}: {}",
                prefix, pattern, e
            ))
        })?),
    };

    Ok(Rule::new(Match { code, output }, status))
}

fn convert_status(prefix: &str, field: &str, raw: RawStatus) -> Result<Status> {
    if raw.id.is_empty() {
        return Err(BoardError::config(format!("{}: {}.id is required", prefix, field)));
    }
    if raw.label.is_empty() {
        return Err(BoardError::config(format!(
            "{}: {}.label is required",
            prefix, field
        )));
    }
    Ok(Status::new(raw.id, raw.label))
}

fn optional_duration(prefix: &str, field: &str, raw: Option<String>) -> Result<Option<Duration>> {
    raw.map(|text| {
        parse_duration(&text).map_err(|e| BoardError::config(format!("{}: {}: {}", prefix, field, e)))
    })
    .transpose()
}

fn validate_http_target(target: &str) -> std::result::Result<(), String> {
    let url = Url::parse(target).map_err(|e| format!("is not a valid URL: {}", e))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("must use http or https, got {:?}", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("has no host".to_string());
    }
    Ok(())
}

/// Parse a duration such as `500ms`, `10s`, `1m30s` or `1.5h`.
///
/// Accepted units are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`. A bare
/// `0` is the only unitless value. Negative durations are rejected.
pub fn parse_duration(text: &str) -> std::result::Result<Duration, String> {
    let invalid = || format!("invalid duration {:?}", text);

    let trimmed = text.trim();
    if trimmed == "0" {
        return Ok(Duration::ZERO);
    }
    if trimmed.starts_with('-') {
        return Err(format!("negative duration {:?}", text));
    }
    let mut rest = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut nanos = 0f64;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_end == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_end].parse().map_err(|_| invalid())?;
        rest = &rest[number_end..];

        let unit_end = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            "" => return Err(format!("missing unit in duration {:?}", text)),
            unit => return Err(format!("unknown unit {:?} in duration {:?}", unit, text)),
        };
        nanos += value * scale;
        rest = &rest[unit_end..];
    }

    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}
