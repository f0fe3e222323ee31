use std::sync::LazyLock;

use regex::Regex;

/// `ESC [` followed by parameters and a final letter
static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("valid ANSI pattern"));

/// Clean a raw line for display and classification.
///
/// Removes terminal escape sequences, control characters other than tab,
/// newline and carriage return (which covers NUL), and surrounding
/// whitespace. Escapes go first so their `ESC` byte is still there to match.
pub fn sanitize(raw: &str) -> String {
    let without_escapes = ANSI_ESCAPE.replace_all(raw, "");

    let cleaned: String = without_escapes
        .chars()
        .filter(|&c| !is_stripped_control(c))
        .collect();

    cleaned.trim().to_string()
}

fn is_stripped_control(c: char) -> bool {
    (c as u32) < 32 && !matches!(c, '\t' | '\n' | '\r')
}
