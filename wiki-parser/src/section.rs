//! Content extraction for a single section unit.

use crate::table::{self, Table, TableError};
use crate::text::{element_text, normalize, trim_blank_lines};
use scraper::ElementRef;
use serde::Serialize;

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const LIST_TAGS: &[&str] = &["ul", "ol", "dl"];

/// Which optional constructs the extractor keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Extract tables and infoboxes.
    pub include_tables: bool,
    /// Keep lists as body lines.
    pub include_lists: bool,
    /// Reserved for link extraction; no extractor reads it yet.
    pub include_links: bool,
}

/// Title, body lines and tables of one section unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Section {
    /// Text of the last heading among the unit's direct children.
    pub title: String,
    /// Paragraph (and optionally list) texts with boundary blanks trimmed.
    pub body: Vec<String>,
    /// Tables extracted from direct children.
    pub tables: Vec<Table>,
    /// Table candidates that could not be extracted.
    #[serde(skip)]
    pub dropped: Vec<TableError>,
}

impl Section {
    /// Extracts a section from the direct children of `node`.
    ///
    /// Nested `<section>` children are skipped; they are units of their own.
    pub fn parse(node: ElementRef<'_>, config: &ExtractConfig) -> Self {
        let mut section = Section::default();
        let mut body = Vec::new();

        for child in node.children().filter_map(ElementRef::wrap) {
            let tag = child.value().name();
            if HEADING_TAGS.contains(&tag) {
                section.title = normalize(&element_text(child));
                continue;
            }

            if let Some(layout) = table::classify(child) {
                if config.include_tables {
                    match table::extract(child, layout) {
                        Ok(table) => section.tables.push(table),
                        Err(err) => section.dropped.push(err),
                    }
                }
                continue;
            }

            if LIST_TAGS.contains(&tag) {
                if config.include_lists {
                    body.push(normalize(&element_text(child)));
                }
            } else if tag == "p" {
                body.push(normalize(&element_text(child)));
            }
        }

        section.body = trim_blank_lines(body);
        section
    }

    /// Body lines joined by newlines and normalized.
    pub fn text(&self) -> String {
        normalize(&self.body.join("\n"))
    }
}
