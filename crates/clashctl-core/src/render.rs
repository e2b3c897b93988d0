//! Plain-text rendering helpers: tables, delay coloring, byte and duration formats.

use std::fmt::Write as _;
use std::time::Duration;

use crossterm::style::{Color, Stylize};

/// Highest delay still shown as fast.
pub const FAST_DELAY_MAX_MS: u64 = 500;

/// Marker shown in place of a delay when no probe succeeded.
pub const MARK_FAILED: &str = "✗";

/// Marker printed after a successful switch.
pub const MARK_OK: &str = "✓";

/// Color bucket for a delay value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayClass {
    /// `0`: unprobed or failed. Red dash.
    Failed,
    /// `1..=500` ms. Green.
    Fast,
    /// Above 500 ms. Yellow.
    Slow,
}

impl DelayClass {
    pub fn classify(delay_ms: u64) -> Self {
        match delay_ms {
            0 => DelayClass::Failed,
            1..=FAST_DELAY_MAX_MS => DelayClass::Fast,
            _ => DelayClass::Slow,
        }
    }

    pub fn color(self) -> Color {
        match self {
            DelayClass::Failed => Color::Red,
            DelayClass::Fast => Color::Green,
            DelayClass::Slow => Color::Yellow,
        }
    }

    /// Text shown for `delay_ms` in this class.
    pub fn label(delay_ms: u64) -> String {
        match DelayClass::classify(delay_ms) {
            DelayClass::Failed => MARK_FAILED.to_string(),
            _ => format!("{delay_ms}ms"),
        }
    }
}

/// One table cell with an optional foreground color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub color: Option<Color>,
}

impl Cell {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }
}

impl From<String> for Cell {
    fn from(text: String) -> Self {
        Cell::new(text)
    }
}

impl From<&str> for Cell {
    fn from(text: &str) -> Self {
        Cell::new(text)
    }
}

/// Column-aligned table with a rounded border.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                let len = cell.text.chars().count();
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(len),
                    None => widths.push(len),
                }
            }
        }
        widths
    }

    /// Render with ANSI colors.
    pub fn render(&self) -> String {
        self.render_with(true)
    }

    /// Render without any escape sequences.
    pub fn render_plain(&self) -> String {
        self.render_with(false)
    }

    fn render_with(&self, colored: bool) -> String {
        let widths = self.widths();
        let mut out = String::new();

        border(&mut out, &widths, '╭', '┬', '╮');
        let header: Vec<Cell> = self.headers.iter().map(|h| Cell::new(h.as_str())).collect();
        line(&mut out, &widths, &header, false);
        border(&mut out, &widths, '├', '┼', '┤');
        for row in &self.rows {
            line(&mut out, &widths, row, colored);
        }
        border(&mut out, &widths, '╰', '┴', '╯');
        out
    }
}

fn border(out: &mut String, widths: &[usize], left: char, mid: char, right: char) {
    out.push(left);
    for (i, w) in widths.iter().enumerate() {
        if i > 0 {
            out.push(mid);
        }
        out.push_str(&"─".repeat(w + 2));
    }
    out.push(right);
    out.push('\n');
}

fn line(out: &mut String, widths: &[usize], cells: &[Cell], colored: bool) {
    out.push('│');
    for (i, w) in widths.iter().enumerate() {
        let (text, color) = cells
            .get(i)
            .map_or(("", None), |c| (c.text.as_str(), c.color));
        let padded = format!("{text:<w$}");
        match color {
            Some(color) if colored => {
                let _ = write!(out, " {} │", padded.with(color));
            }
            _ => {
                let _ = write!(out, " {padded} │");
            }
        }
    }
    out.push('\n');
}

/// Binary-prefixed byte count, e.g. `1.50 KB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KB", "MB", "GB", "TB", "PB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}

/// `HH:MM:SS`.
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_delay_classification_buckets() {
        assert_eq!(DelayClass::classify(0), DelayClass::Failed);
        assert_eq!(DelayClass::classify(1), DelayClass::Fast);
        assert_eq!(DelayClass::classify(500), DelayClass::Fast);
        assert_eq!(DelayClass::classify(501), DelayClass::Slow);
    }

    #[test]
    fn test_delay_colors() {
        assert_eq!(DelayClass::classify(0).color(), Color::Red);
        assert_eq!(DelayClass::classify(1).color(), Color::Green);
        assert_eq!(DelayClass::classify(500).color(), Color::Green);
        assert_eq!(DelayClass::classify(501).color(), Color::Yellow);
    }

    #[test]
    fn test_delay_labels() {
        assert_eq!(DelayClass::label(0), "✗");
        assert_eq!(DelayClass::label(120), "120ms");
    }

    #[test]
    fn test_render_plain_table() {
        let mut table = TextTable::new(["Id", "Name"]);
        table.push_row(vec![Cell::new("0"), Cell::colored("alpha", Color::Green)]);
        table.push_row(vec![Cell::new("10"), Cell::new("b")]);

        let expected = "\
╭────┬───────╮
│ Id │ Name  │
├────┼───────┤
│ 0  │ alpha │
│ 10 │ b     │
╰────┴───────╯
";
        assert_eq!(table.render_plain(), expected);
    }

    #[test]
    fn test_render_colored_keeps_text() {
        let mut table = TextTable::new(["Delay"]);
        table.push_row(vec![Cell::colored("120ms", Color::Green)]);
        let out = table.render();
        assert!(out.contains("120ms"));
        assert!(out.starts_with('╭'));
        assert!(out.ends_with("╯\n"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(0)), "00:00:00");
        assert_eq!(format_duration(Duration::from_secs(61)), "00:01:01");
        assert_eq!(format_duration(Duration::from_secs(3661)), "01:01:01");
    }
}
