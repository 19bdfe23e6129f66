//! Text rendering of table lines
//!
//! Both renderers are pure: they return the finished text and leave writing
//! to the caller.

use colored::{ColoredString, Colorize};
use termtree::Tree;

use crate::application::services::TableLine;
use crate::config::{OutputFormat, Settings};

/// Render lines in the configured format.
pub fn render(lines: &[TableLine], settings: &Settings, title: &str) -> String {
    match settings.format {
        OutputFormat::Table => render_table(lines, settings),
        OutputFormat::Tree => render_tree(lines, settings, title),
    }
}

/// One line per row, indented by `depth * indent` spaces.
pub fn render_table(lines: &[TableLine], settings: &Settings) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(&" ".repeat(line.depth * settings.indent));
        out.push_str(&format_line(line, settings));
        out.push('\n');
    }
    out
}

/// Box-drawing tree under a single title node.
///
/// Rows arrive in pre-order, so a row at depth `d` belongs to the closest
/// preceding row at depth `d - 1`.
pub fn render_tree(lines: &[TableLine], settings: &Settings, title: &str) -> String {
    let mut stack: Vec<Tree<String>> = vec![Tree::new(paint(
        title.to_string(),
        settings.color,
        |s| s.bold(),
    ))];

    for line in lines {
        let level = line.depth + 1;
        while stack.len() > level {
            fold_top(&mut stack);
        }
        stack.push(Tree::new(format_line(line, settings)));
    }
    while stack.len() > 1 {
        fold_top(&mut stack);
    }

    stack.pop().map(|tree| tree.to_string()).unwrap_or_default()
}

fn fold_top(stack: &mut Vec<Tree<String>>) {
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.push(done);
        }
    }
}

/// Label, then `[status]`, then the folded region end.
pub fn format_line(line: &TableLine, settings: &Settings) -> String {
    let mut text = if line.region_start {
        paint(line.label.clone(), settings.color, |s| s.cyan().bold())
    } else {
        line.label.clone()
    };

    if settings.show_status {
        if let Some(status) = &line.status {
            let status = status.clone();
            let painted = match status.as_str() {
                "success" | "done" => paint(status, settings.color, |s| s.green()),
                "failed" | "error" | "aborted" => paint(status, settings.color, |s| s.red()),
                "running" | "queued" | "paused" => paint(status, settings.color, |s| s.yellow()),
                _ => paint(status, settings.color, |s| s.dimmed()),
            };
            text.push_str(&format!(" [{}]", painted));
        }
    }

    if settings.show_paired_end {
        if let Some(end) = &line.paired_end {
            text.push_str(&format!(
                " {}",
                paint(format!("… {}", end), settings.color, |s| s.dimmed())
            ));
        }
    }

    text
}

fn paint(text: String, color: bool, style: impl FnOnce(ColoredString) -> ColoredString) -> String {
    if color {
        style(text.as_str().into()).to_string()
    } else {
        text
    }
}
