use crossterm::style::{Attribute, Attributes, Color, ContentStyle};

use dockscope_types::Severity;

/// Style per severity
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Theme {
    error: ContentStyle,
    warning: ContentStyle,
    info: ContentStyle,
    debug: ContentStyle,
    none: ContentStyle,
}

impl Theme {
    // Log level colors
    pub const LOG_ERROR: Color = Color::Red;
    pub const LOG_WARN: Color = Color::Yellow;
    pub const LOG_INFO: Color = Color::Green;
    pub const LOG_DEBUG: Color = Color::Cyan;
    pub const LOG_PLAIN: Color = Color::Green;

    /// Colored theme: errors and warnings in bold
    pub fn colored() -> Self {
        Self {
            error: Self::fg(Self::LOG_ERROR, Attribute::Bold.into()),
            warning: Self::fg(Self::LOG_WARN, Attribute::Bold.into()),
            info: Self::fg(Self::LOG_INFO, Attributes::default()),
            debug: Self::fg(Self::LOG_DEBUG, Attributes::default()),
            none: Self::fg(Self::LOG_PLAIN, Attributes::default()),
        }
    }

    /// No styling at all
    pub fn plain() -> Self {
        Self {
            error: ContentStyle::default(),
            warning: ContentStyle::default(),
            info: ContentStyle::default(),
            debug: ContentStyle::default(),
            none: ContentStyle::default(),
        }
    }

    pub fn style(&self, severity: Severity) -> ContentStyle {
        match severity {
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
            Severity::Debug => self.debug,
            Severity::None => self.none,
        }
    }

    /// Whether this theme emits any escape codes
    pub fn is_plain(&self) -> bool {
        *self == Self::plain()
    }

    fn fg(color: Color, attributes: Attributes) -> ContentStyle {
        ContentStyle {
            foreground_color: Some(color),
            attributes,
            ..ContentStyle::default()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::colored()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_and_warning_are_bold() {
        let theme = Theme::colored();
        let error = theme.style(Severity::Error);
        assert_eq!(error.foreground_color, Some(Color::Red));
        assert!(error.attributes.has(Attribute::Bold));

        let warning = theme.style(Severity::Warning);
        assert_eq!(warning.foreground_color, Some(Color::Yellow));
        assert!(warning.attributes.has(Attribute::Bold));
    }

    #[test]
    fn test_normal_lines_are_green() {
        let theme = Theme::colored();
        assert_eq!(theme.style(Severity::Info).foreground_color, Some(Color::Green));
        assert_eq!(theme.style(Severity::None).foreground_color, Some(Color::Green));
        assert!(!theme.style(Severity::None).attributes.has(Attribute::Bold));
    }

    #[test]
    fn test_plain_theme() {
        assert!(Theme::plain().is_plain());
        assert!(!Theme::colored().is_plain());
        assert_eq!(Theme::plain().style(Severity::Error), ContentStyle::default());
    }
}
