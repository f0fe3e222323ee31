//! Keyword based severity classification.
//!
//! Every check works on an already lower-cased line and uses plain substring
//! containment, so "timeouts" counts as "timeout". The tiers are tried in the
//! order of [`TIERS`] and the first one that matches wins.

use dockscope_types::Severity;

/// A keyword that marks a line as an error
struct ErrorRule {
    keyword: &'static str,

    /// Substring that must also be present for the keyword to count
    requires: Option<&'static str>,

    /// Substrings that cancel the keyword
    unless: &'static [&'static str],
}

/// Lines carrying these are reporting the absence of errors
const NO_ERROR_MARKERS: [&str; 3] = ["errors: []", "errors:[]", "error: null"];

const ERROR_RULES: [ErrorRule; 6] = [
    ErrorRule {
        keyword: "error",
        requires: None,
        unless: &["no error", "error: null"],
    },
    ErrorRule {
        keyword: "exception",
        requires: None,
        unless: &["no exception", "exception: null"],
    },
    // "failed" alone is too common in benign lines
    ErrorRule {
        keyword: "failed",
        requires: Some("failure"),
        unless: &[],
    },
    ErrorRule {
        keyword: "panic",
        requires: None,
        unless: &["no panic", "panic: null"],
    },
    ErrorRule {
        keyword: "fatal",
        requires: None,
        unless: &["no fatal", "fatal: null"],
    },
    ErrorRule {
        keyword: "critical",
        requires: None,
        unless: &["no critical", "critical: null"],
    },
];

/// State transitions and successes are never warnings
const WARNING_SUPPRESSORS: [&str; 3] = ["status from", "changed status", "success"];

/// "retry" is only a warning next to one of these
const RETRY_CONTEXT: [&str; 3] = ["failed", "error", "timeout"];

const WARNING_KEYWORDS: [&str; 5] = ["warn", "warning", "deprecated", "timeout", "unavailable"];

const INFO_KEYWORDS: [&str; 4] = ["info", "information", "notice", "success"];

const DEBUG_KEYWORDS: [&str; 3] = ["debug", "trace", "verbose"];

/// Classification tiers in priority order
const TIERS: [(Severity, fn(&str) -> bool); 4] = [
    (Severity::Error, is_error),
    (Severity::Warning, is_warning),
    (Severity::Info, is_info),
    (Severity::Debug, is_debug),
];

/// Assign a severity to a lower-cased line
pub fn classify(lower_line: &str) -> Severity {
    TIERS
        .iter()
        .find(|(_, detect)| detect(lower_line))
        .map(|(severity, _)| *severity)
        .unwrap_or(Severity::None)
}

pub fn is_error(line: &str) -> bool {
    if contains_any(line, &NO_ERROR_MARKERS) {
        return false;
    }

    ERROR_RULES.iter().any(|rule| {
        line.contains(rule.keyword)
            && rule.requires.is_none_or(|context| line.contains(context))
            && !contains_any(line, rule.unless)
    })
}

pub fn is_warning(line: &str) -> bool {
    if contains_any(line, &WARNING_SUPPRESSORS) {
        return false;
    }

    if line.contains("retry") && contains_any(line, &RETRY_CONTEXT) {
        return true;
    }

    contains_any(line, &WARNING_KEYWORDS)
}

pub fn is_info(line: &str) -> bool {
    contains_any(line, &INFO_KEYWORDS)
}

pub fn is_debug(line: &str) -> bool {
    contains_any(line, &DEBUG_KEYWORDS)
}

fn contains_any(line: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| line.contains(needle))
}
