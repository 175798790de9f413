//! Rule evaluation: turns a probe result into a display status.
//!
//! Rules are tried in declared order and the first match wins. A result
//! carrying an execution error can only be matched by a catch-all rule.

use super::model::{Match, Rule, Status};
use super::probes::ProbeResult;

/// Status used when no rule matches and the slot has no default.
pub const BUILTIN_ERROR_ID: &str = "error";
pub const BUILTIN_ERROR_LABEL: &str = "⚡";

pub fn builtin_error_status() -> Status {
    Status::new(BUILTIN_ERROR_ID, BUILTIN_ERROR_LABEL)
}

/// Resolve `result` against `rules`, falling back to `default_status` and
/// then to [`builtin_error_status`].
pub fn evaluate(result: &ProbeResult, rules: &[Rule], default_status: Option<&Status>) -> Status {
    rules
        .iter()
        .find(|rule| matches_rule(result, &rule.matcher))
        .map(|rule| rule.status.clone())
        .unwrap_or_else(|| fallback_status(default_status))
}

/// The status a slot resolves to when nothing matched.
pub fn fallback_status(default_status: Option<&Status>) -> Status {
    default_status.cloned().unwrap_or_else(builtin_error_status)
}

/// Whether `matcher` accepts `result`. All specified conditions must hold.
pub fn matches_rule(result: &ProbeResult, matcher: &Match) -> bool {
    // Nothing trustworthy to test on an execution error.
    if result.is_error() {
        return matcher.is_catch_all();
    }

    if let Some(code) = &matcher.code {
        if !code.matches(result.code) {
            return false;
        }
    }

    if let Some(output) = &matcher.output {
        if !output.is_match(&result.output) {
            return false;
        }
    }

    true
}
