//! Terminal output utilities: notes and table rendering.

// ---------------------------------------------------------------------------
// ANSI Color/Style helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM").map(|t| t != "dumb").unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Formatted notes
// ---------------------------------------------------------------------------

pub fn note_info(msg: &str) {
    if supports_color() {
        println!("{CYAN}{BOLD}ℹ{RESET} {msg}");
    } else {
        println!("INFO: {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        println!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        println!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

/// Render a two-column field/value table, widths by visible characters.
pub fn render_pairs<'a>(
    headers: (&str, &str),
    rows: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> String {
    let rows: Vec<(&str, &str)> = rows.into_iter().collect();
    let width = |s: &str| strip_ansi(s).chars().count();
    let key_width = rows
        .iter()
        .map(|(k, _)| width(k))
        .chain(std::iter::once(width(headers.0)))
        .max()
        .unwrap_or(0);

    let pad = |s: &str| format!("{s}{}", " ".repeat(key_width.saturating_sub(width(s))));
    let mut out = format!("  {}  {}\n", pad(headers.0), headers.1);
    out.push_str(&format!("  {}  {}\n", "-".repeat(key_width), "-".repeat(width(headers.1))));
    for (key, value) in rows {
        out.push_str(&format!("  {}  {}\n", pad(key), value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn renders_aligned_pairs() {
        let table = render_pairs(("Field", "Value"), [("Gross", "65,080 kg"), ("Date In", "08/Sep/25")]);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "  Field    Value");
        assert_eq!(lines[2], "  Gross    65,080 kg");
        assert_eq!(lines[3], "  Date In  08/Sep/25");
    }
}
