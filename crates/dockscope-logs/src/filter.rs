use std::collections::HashSet;

use dockscope_types::{LogRecord, Severity};

/// Which severities are shown
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelSelection {
    /// No restriction; keywords are irrelevant
    All,
    /// Only these severities, plus custom keyword matches
    Only(HashSet<Severity>),
}

/// Level switches as given on the command line
#[derive(Clone, Debug, Default)]
pub struct LevelFlags {
    pub all: bool,
    pub errors: bool,
    pub warnings: bool,
    pub info: bool,
    pub debug: bool,

    /// Level names from a `--levels` list
    pub levels: Vec<String>,
}

impl LevelSelection {
    /// Resolve command line switches.
    ///
    /// Nothing selected means everything is shown. A level list that names
    /// nothing known still counts as a selection and yields an empty mask.
    pub fn from_flags(flags: &LevelFlags) -> Self {
        // A supplied list counts even when every entry is blank
        let nothing_selected = !flags.errors
            && !flags.warnings
            && !flags.info
            && !flags.debug
            && flags.levels.is_empty();
        if flags.all || nothing_selected {
            return Self::All;
        }

        let mut enabled = HashSet::new();
        let switches = [
            (flags.errors, Severity::Error),
            (flags.warnings, Severity::Warning),
            (flags.info, Severity::Info),
            (flags.debug, Severity::Debug),
        ];
        for (on, severity) in switches {
            if on {
                enabled.insert(severity);
            }
        }

        for level in flags.levels.iter().map(|l| l.trim()).filter(|l| !l.is_empty()) {
            match Severity::from_level_name(level) {
                Some(severity) => {
                    enabled.insert(severity);
                }
                None => tracing::warn!(level, "ignoring unknown log level"),
            }
        }

        Self::Only(enabled)
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn contains(&self, severity: Severity) -> bool {
        match self {
            Self::All => true,
            Self::Only(enabled) => enabled.contains(&severity),
        }
    }
}

/// Line and source filters, fixed for the whole run
#[derive(Clone, Debug)]
pub struct FilterConfig {
    levels: LevelSelection,

    /// Lower-cased keywords that let a line through regardless of severity
    keywords: Vec<String>,

    /// Lower-cased source name substrings (empty = all sources)
    source_filters: Vec<String>,
}

impl FilterConfig {
    /// Create a filter with the given level selection and no keywords
    pub fn new(levels: LevelSelection) -> Self {
        Self {
            levels,
            keywords: Vec::new(),
            source_filters: Vec::new(),
        }
    }

    /// Show everything from every source
    pub fn show_all() -> Self {
        Self::new(LevelSelection::All)
    }

    /// Set custom keywords; blank entries are dropped
    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords = normalize(keywords);
        self
    }

    /// Set source name filters; blank entries are dropped
    pub fn with_source_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.source_filters = normalize(filters);
        self
    }

    /// Whether a line should be emitted, given its lower-cased text
    fn allows(&self, lower_line: &str, severity: Severity) -> bool {
        if self.levels.is_all() {
            return true;
        }

        if self.keywords.iter().any(|k| lower_line.contains(k.as_str())) {
            return true;
        }

        self.levels.contains(severity)
    }

    /// Whether a source should be monitored at all
    pub fn admits_source(&self, name: &str) -> bool {
        matches_source_name(name, &self.source_filters)
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::show_all()
    }
}

/// Whether a classified record passes the filter
pub fn should_emit(record: &LogRecord, config: &FilterConfig) -> bool {
    config.allows(&record.text.to_lowercase(), record.severity)
}

/// Case-insensitive substring match of a source name against filters.
///
/// An empty filter list admits every source.
pub fn matches_source_name<S: AsRef<str>>(name: &str, filters: &[S]) -> bool {
    if filters.is_empty() {
        return true;
    }

    let name = name.to_lowercase();
    filters
        .iter()
        .any(|f| name.contains(&f.as_ref().to_lowercase()))
}

fn normalize<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| v.as_ref().trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockscope_types::{Source, SourceInfo};

    fn record(text: &str, severity: Severity) -> LogRecord {
        let source = Source::new(SourceInfo::new("abc", "api-1"), None);
        LogRecord::new(&source, text.to_string(), text.to_string(), severity)
    }

    fn only(levels: &[Severity]) -> LevelSelection {
        LevelSelection::Only(levels.iter().copied().collect())
    }

    #[test]
    fn test_show_all_passes_everything() {
        let config = FilterConfig::show_all().with_keywords(["auth"]);
        for severity in [
            Severity::Error,
            Severity::Warning,
            Severity::Info,
            Severity::Debug,
            Severity::None,
        ] {
            assert!(should_emit(&record("anything at all", severity), &config));
        }
    }

    #[test]
    fn test_keywords_override_empty_mask() {
        let config = FilterConfig::new(only(&[])).with_keywords(["auth"]);
        assert!(should_emit(&record("AUTH token refreshed", Severity::None), &config));
        assert!(should_emit(&record("auth failed", Severity::Debug), &config));
        assert!(!should_emit(&record("cache warmed", Severity::Info), &config));
    }

    #[test]
    fn test_severity_mask() {
        let config = FilterConfig::new(only(&[Severity::Error, Severity::Warning]));
        assert!(should_emit(&record("error: x", Severity::Error), &config));
        assert!(should_emit(&record("warn: y", Severity::Warning), &config));
        assert!(!should_emit(&record("info: z", Severity::Info), &config));
        assert!(!should_emit(&record("plain", Severity::None), &config));
    }

    #[test]
    fn test_keywords_are_normalized() {
        let config = FilterConfig::new(only(&[])).with_keywords([" Payment ", "", "  "]);
        assert_eq!(config.keywords, ["payment"]);
        assert!(should_emit(&record("payment accepted", Severity::None), &config));
        // Blank keywords must not match every line
        assert!(!should_emit(&record("unrelated", Severity::None), &config));
    }

    #[test]
    fn test_matches_source_name() {
        assert!(matches_source_name("api-gateway-1", &["api"]));
        assert!(!matches_source_name("db", &["api"]));
        assert!(matches_source_name::<&str>("db", &[]));
        assert!(matches_source_name("Billing-API", &["api"]));
        assert!(matches_source_name("worker", &["db", "WORK"]));
    }

    #[test]
    fn test_admits_source() {
        let config = FilterConfig::show_all().with_source_filters(["web", " "]);
        assert!(config.admits_source("shop-web-1"));
        assert!(!config.admits_source("shop-db-1"));
        assert!(FilterConfig::show_all().admits_source("anything"));
    }

    #[test]
    fn test_nothing_selected_means_all() {
        assert_eq!(LevelSelection::from_flags(&LevelFlags::default()), LevelSelection::All);
    }

    #[test]
    fn test_all_flag_wins() {
        let flags = LevelFlags {
            all: true,
            errors: true,
            ..Default::default()
        };
        assert!(LevelSelection::from_flags(&flags).is_all());
    }

    #[test]
    fn test_flags_and_level_list_combine() {
        let flags = LevelFlags {
            errors: true,
            levels: vec!["WARNING".to_string(), " debug ".to_string(), "bogus".to_string()],
            ..Default::default()
        };
        assert_eq!(
            LevelSelection::from_flags(&flags),
            only(&[Severity::Error, Severity::Warning, Severity::Debug])
        );
    }

    #[test]
    fn test_unknown_levels_give_empty_mask() {
        let flags = LevelFlags {
            levels: vec!["loud".to_string()],
            ..Default::default()
        };
        assert_eq!(LevelSelection::from_flags(&flags), only(&[]));
    }

    #[test]
    fn test_blank_level_list_gives_empty_mask() {
        for levels in [vec!["".to_string()], vec!["".to_string(), " ".to_string()]] {
            let flags = LevelFlags {
                levels,
                ..Default::default()
            };
            assert_eq!(LevelSelection::from_flags(&flags), only(&[]));
        }

        // Keywords still get through an empty mask
        let flags = LevelFlags {
            levels: vec!["".to_string()],
            ..Default::default()
        };
        let config = FilterConfig::new(LevelSelection::from_flags(&flags)).with_keywords(["auth"]);
        assert!(!should_emit(&record("error: disk full", Severity::Error), &config));
        assert!(should_emit(&record("auth ok", Severity::None), &config));
    }
}
