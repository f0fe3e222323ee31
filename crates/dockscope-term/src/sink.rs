use std::io::{self, IsTerminal, Stdout, Write};
use std::str::FromStr;

use parking_lot::Mutex;

use crate::theme::Theme;
use dockscope_logs::RecordSink;
use dockscope_types::Severity;

/// When to emit color codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Color when writing to a terminal and `NO_COLOR` is unset
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Decide for the given output
    pub fn enabled(self, is_terminal: bool, no_color_set: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => is_terminal && !no_color_set,
        }
    }

    /// Decide for this process's stdout
    pub fn enabled_for_stdout(self) -> bool {
        let no_color_set = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        self.enabled(io::stdout().is_terminal(), no_color_set)
    }

    /// Theme matching this mode on stdout
    pub fn theme_for_stdout(self) -> Theme {
        // crossterm checks NO_COLOR on its own when writing colors
        if self == Self::Always {
            crossterm::style::force_color_output(true);
        }

        if self.enabled_for_stdout() {
            Theme::colored()
        } else {
            Theme::plain()
        }
    }
}

impl FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => Err(format!(
                "invalid color mode '{other}' (expected auto, always or never)"
            )),
        }
    }
}

/// Writes each line, styled by severity, as a single locked write
pub struct TerminalSink<W: Write + Send = Stdout> {
    out: Mutex<W>,
    theme: Theme,
}

impl TerminalSink<Stdout> {
    pub fn stdout(theme: Theme) -> Self {
        Self::new(io::stdout(), theme)
    }
}

impl<W: Write + Send> TerminalSink<W> {
    pub fn new(out: W, theme: Theme) -> Self {
        Self {
            out: Mutex::new(out),
            theme,
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn render(&self, severity: Severity, line: &str) -> String {
        if self.theme.is_plain() {
            format!("{line}\n")
        } else {
            format!("{}\n", self.theme.style(severity).apply(line))
        }
    }
}

impl<W: Write + Send + 'static> RecordSink for TerminalSink<W> {
    fn write(&self, severity: Severity, line: &str) -> io::Result<()> {
        // Render before locking so the critical section is one write
        let rendered = self.render(severity, line);

        let mut out = self.out.lock();
        out.write_all(rendered.as_bytes())?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_output() {
        let sink = TerminalSink::new(Vec::new(), Theme::plain());
        sink.write(Severity::Error, "[2024-01-15 10:30:00] [db] ERROR: disk full")
            .unwrap();
        sink.write(Severity::None, "[2024-01-15 10:30:01] [db] ok").unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            out,
            "[2024-01-15 10:30:00] [db] ERROR: disk full\n[2024-01-15 10:30:01] [db] ok\n"
        );
    }

    #[test]
    fn test_colored_output_wraps_line() {
        let sink = TerminalSink::new(Vec::new(), Theme::colored());
        sink.write(Severity::Error, "boom").unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.starts_with('\x1b'));
        assert!(out.contains("boom"));
        assert!(out.ends_with('\n'));
        assert_eq!(out.matches('\n').count(), 1);
    }

    #[test]
    fn test_concurrent_writes_stay_whole() {
        let sink = TerminalSink::new(Vec::new(), Theme::plain());

        std::thread::scope(|scope| {
            for worker in 0..4 {
                let sink = &sink;
                scope.spawn(move || {
                    for i in 0..200 {
                        let line = format!("worker-{worker} line {i} {}", "x".repeat(64));
                        sink.write(Severity::Info, &line).unwrap();
                    }
                });
            }
        });

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 800);
        for line in lines {
            assert!(line.starts_with("worker-"), "{line}");
            assert!(line.ends_with(&"x".repeat(64)), "{line}");
        }
    }

    #[test]
    fn test_color_mode() {
        assert!(ColorMode::Always.enabled(false, true));
        assert!(!ColorMode::Never.enabled(true, false));
        assert!(ColorMode::Auto.enabled(true, false));
        assert!(!ColorMode::Auto.enabled(false, false));
        assert!(!ColorMode::Auto.enabled(true, true));
    }

    #[test]
    fn test_always_keeps_colors() {
        let theme = ColorMode::Always.theme_for_stdout();
        assert!(!theme.is_plain());

        let sink = TerminalSink::new(Vec::new(), theme);
        sink.write(Severity::Error, "boom").unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.contains("\x1b[38;5;9m"), "{out:?}");
    }

    #[test]
    fn test_color_mode_parse() {
        assert_eq!("ALWAYS".parse::<ColorMode>(), Ok(ColorMode::Always));
        assert_eq!("never".parse::<ColorMode>(), Ok(ColorMode::Never));
        assert!("rainbow".parse::<ColorMode>().is_err());
    }
}
