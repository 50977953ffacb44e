use std::io::{self, IsTerminal, Write};

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::field::Field;
use crate::tab::TabSummary;
use crate::view::ViewSnapshot;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

#[derive(Serialize)]
struct JsonListing<'a, R> {
    #[serde(flatten)]
    snapshot: &'a ViewSnapshot,
    rows: &'a [&'a R],
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = cfg.get_bool("color")?.unwrap_or(true);

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip_all)]
    pub fn print_listing<R>(&self, snapshot: &ViewSnapshot, columns: &[Field<R>], rows: &[&R]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_tab_strip(&mut out, snapshot)?;
        self.write_filter_summary(&mut out, snapshot)?;
        writeln!(out)?;
        self.write_rows(&mut out, columns, rows)?;
        Ok(())
    }

    pub fn print_tabs(&self, snapshot: &ViewSnapshot) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_tab_strip(&mut out, snapshot)?;
        self.write_filter_summary(&mut out, snapshot)
    }

    pub fn print_json<R: Serialize>(&self, snapshot: &ViewSnapshot, rows: Option<&[&R]>) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        match rows {
            Some(rows) => serde_json::to_writer_pretty(&mut out, &JsonListing { snapshot, rows })?,
            None => serde_json::to_writer_pretty(&mut out, snapshot)?,
        }
        writeln!(out)?;
        Ok(())
    }

    /// One line: every tab with its count, the active one bracketed.
    pub fn write_tab_strip<W: Write>(&self, mut writer: W, snapshot: &ViewSnapshot) -> anyhow::Result<()> {
        let active = snapshot.state.active_tab_id();
        let cells: Vec<String> = snapshot
            .tabs
            .iter()
            .map(|tab| self.tab_cell(tab, tab.id == active))
            .collect();
        writeln!(writer, "{}", cells.join("  "))?;
        Ok(())
    }

    pub fn write_filter_summary<W: Write>(&self, mut writer: W, snapshot: &ViewSnapshot) -> anyhow::Result<()> {
        write!(writer, "showing {} of {}", snapshot.visible, snapshot.total)?;
        if snapshot.active_filters > 0 {
            let hint = format!("Clear filters ({})", snapshot.active_filters);
            write!(writer, "  {}", self.paint(&hint, "2"))?;
        }
        writeln!(writer)?;
        Ok(())
    }

    pub fn write_rows<W: Write, R>(&self, writer: W, columns: &[Field<R>], rows: &[&R]) -> anyhow::Result<()> {
        let headers: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();
        let cells = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| single_line(column.value(row).as_deref().unwrap_or("")))
                    .collect::<Vec<String>>()
            })
            .collect();
        write_table(writer, headers, cells)
    }

    fn tab_cell(&self, tab: &TabSummary, active: bool) -> String {
        let label = match tab.color.as_deref().and_then(hex_rgb) {
            Some((r, g, b)) => self.paint(&tab.label, &format!("38;2;{r};{g};{b}")),
            None => tab.label.clone(),
        };
        let text = format!("{label} ({})", tab.count);
        if active {
            self.paint(&format!("[{text}]"), "1")
        } else {
            text
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |at: usize| u8::from_str_radix(&digits[at..at + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

fn single_line(value: &str) -> String {
    value.replace(['\n', '\r'], " ")
}

fn write_table<W: Write>(mut writer: W, headers: Vec<String>, rows: Vec<Vec<String>>) -> anyhow::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| UnicodeWidthStr::width(h.as_str())).collect();

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let render_line = |cells: &[String]| {
        let mut line = String::new();
        for (cell, width) in cells.iter().zip(&widths) {
            let visible = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            line.push_str(cell);
            line.push_str(&" ".repeat(width.saturating_sub(visible) + 1));
        }
        line.trim_end().to_string()
    };

    writeln!(writer, "{}", render_line(&headers))?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    writeln!(writer, "{}", render_line(&rule))?;
    for row in &rows {
        writeln!(writer, "{}", render_line(row))?;
    }

    Ok(())
}

/// Drops CSI escape sequences (`ESC [ ... final-byte`).
fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\x1b' {
            out.push(ch);
            continue;
        }
        if chars.peek() == Some(&'[') {
            chars.next();
        }
        for code in chars.by_ref() {
            if code.is_ascii_alphabetic() {
                break;
            }
        }
    }

    out
}
