//! Export of a finished review as a paginated plain-text document
//!
//! `export_sections` is the data contract: seven titled blocks in a fixed
//! order covering every field of the record exactly once. `paginate` and
//! `render_document` lay those blocks out on fixed-width pages.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::normalize::{normalize, Mode};
use crate::review::{format_score, ReviewRecord};

pub const EXPORT_PREFIX: &str = "CodeSense_Report_";
pub const DOCUMENT_TITLE: &str = "CodeSense Review Report";

const EMPTY_NARRATIVE: &str = "Not provided.";
const EMPTY_LIST: &str = "None reported.";
const BULLET: &str = "- ";
const FORM_FEED: char = '\u{000C}';

/// Page geometry for exported documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportLayout {
    pub columns: usize,
    pub lines_per_page: usize,
}

impl Default for ExportLayout {
    fn default() -> Self {
        Self {
            columns: 90,
            lines_per_page: 60,
        }
    }
}

impl ExportLayout {
    // Below this a page can't hold a heading, a body line and the footer
    const MIN_LINES: usize = 8;
    const MIN_COLUMNS: usize = 20;

    fn clamped(self) -> Self {
        Self {
            columns: self.columns.max(Self::MIN_COLUMNS),
            lines_per_page: self.lines_per_page.max(Self::MIN_LINES),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSection {
    pub heading: &'static str,
    pub kind: Mode,
    pub body: Vec<String>,
}

impl ExportSection {
    fn narrative(heading: &'static str, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            vec![EMPTY_NARRATIVE.to_string()]
        } else {
            text.trim_end().lines().map(|l| l.trim_end().to_string()).collect()
        };
        Self {
            heading,
            kind: Mode::Narrative,
            body,
        }
    }

    fn list(heading: &'static str, text: &str) -> Self {
        let items = normalize(text, Mode::EnumeratedList);
        if items.is_empty() {
            return Self {
                heading,
                kind: Mode::Narrative,
                body: vec![EMPTY_LIST.to_string()],
            };
        }
        Self {
            heading,
            kind: Mode::EnumeratedList,
            body: items,
        }
    }
}

/// The seven export blocks, in order: file, score, summary, readability,
/// modularity, bugs, suggestions.
pub fn export_sections(file_name: &str, record: &ReviewRecord) -> Vec<ExportSection> {
    vec![
        ExportSection::narrative("File", file_name),
        ExportSection::narrative("Code Quality Score", &format!("{}/10", format_score(record.score))),
        ExportSection::narrative("Overall Summary", &record.summary),
        ExportSection::narrative("Readability Analysis", &record.readability),
        ExportSection::narrative("Modularity & Structure", &record.modularity),
        ExportSection::list("Potential Bugs & Issues", &record.bugs),
        ExportSection::list("Actionable Improvement Suggestions", &record.suggestions),
    ]
}

/// File name for the exported document of `source_name`.
pub fn export_file_name(source_name: &str) -> String {
    let safe: String = source_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    format!("{}{}.txt", EXPORT_PREFIX, safe)
}

/// Greedy word wrap on character count. Words longer than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if current_len > 0 {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current_len == 0 { word.len() } else { current_len + 1 + word.len() };
        if needed > width && current_len > 0 {
            lines.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current_len > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.extend(word.iter());
        current_len += word.len();
    }

    if current_len > 0 || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// `title` wrapped to `columns`, followed by a rule as wide as its longest line.
fn underlined(title: &str, rule: char, columns: usize) -> Vec<String> {
    let mut lines = wrap(title, columns);
    let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    lines.push(rule.to_string().repeat(width));
    lines
}

/// Lines a section occupies once wrapped, heading included.
fn section_lines(section: &ExportSection, columns: usize) -> (Vec<String>, Vec<String>) {
    let heading = underlined(section.heading, '-', columns);

    let mut body = Vec::new();
    for entry in &section.body {
        match section.kind {
            Mode::Narrative => {
                for paragraph in entry.lines() {
                    body.extend(wrap(paragraph, columns));
                }
            }
            Mode::EnumeratedList => {
                let indent = " ".repeat(BULLET.len());
                for (i, line) in wrap(entry, columns - BULLET.len()).into_iter().enumerate() {
                    let lead = if i == 0 { BULLET } else { indent.as_str() };
                    body.push(format!("{}{}", lead, line));
                }
            }
        }
    }
    (heading, body)
}

/// Lay the sections out on pages. Each page ends with a `Page N of M` footer,
/// and a heading never sits at the bottom of a page without its first line.
pub fn paginate(sections: &[ExportSection], layout: ExportLayout) -> Vec<Vec<String>> {
    let layout = layout.clamped();
    // Two lines reserved for the footer
    let height = layout.lines_per_page - 2;

    let mut pages: Vec<Vec<String>> = Vec::new();
    let mut page = underlined(DOCUMENT_TITLE, '=', layout.columns);
    page.push(String::new());

    for section in sections {
        let (heading, body) = section_lines(section, layout.columns);

        if page.len() + heading.len() + 1 > height {
            pages.push(std::mem::take(&mut page));
        }
        page.extend(heading);

        for line in body {
            if page.len() >= height {
                pages.push(std::mem::take(&mut page));
            }
            page.push(line);
        }

        if page.len() < height {
            page.push(String::new());
        }
    }

    if !page.is_empty() {
        pages.push(page);
    }

    let total = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        while page.last().is_some_and(|l| l.is_empty()) {
            page.pop();
        }
        page.push(String::new());
        page.push(format!("Page {} of {}", i + 1, total));
    }
    pages
}

/// Join pages into the final text, separated by form feeds.
pub fn render_document(pages: &[Vec<String>]) -> String {
    let mut out = pages
        .iter()
        .map(|page| page.join("\n"))
        .collect::<Vec<_>>()
        .join(&format!("\n{}", FORM_FEED));
    out.push('\n');
    out
}

/// Write the export for `file_name` into `dir`, returning the written path.
pub fn write_export(
    dir: &Path,
    file_name: &str,
    record: &ReviewRecord,
    layout: ExportLayout,
) -> Result<PathBuf> {
    let sections = export_sections(file_name, record);
    let pages = paginate(&sections, layout);
    let document = render_document(&pages);

    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;
    let path = dir.join(export_file_name(file_name));
    std::fs::write(&path, document)
        .with_context(|| format!("writing export {}", path.display()))?;

    info!(path = %path.display(), pages = pages.len(), "review exported");
    Ok(path)
}
