//! Table and infobox extraction into a uniform row/cell model.
//!
//! Candidates are classified by tag and class, in precedence order:
//!
//! | element | class         | layout                      |
//! |---------|---------------|-----------------------------|
//! | `div`   | `infobox_v3`  | [`TableLayout::InfoboxV3`]  |
//! | `table` | `infobox_v2`  | [`TableLayout::InfoboxV2`]  |
//! | `table` | `infobox`     | [`TableLayout::Infobox`]    |
//! | `table` | anything else | [`TableLayout::Plain`]      |
//!
//! Anything else is not a table candidate at all.

use crate::text::{children_named, element_text, normalize, render_cell};
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

const INFOBOX_V3_CLASS: &str = "infobox_v3";
const INFOBOX_V2_CLASS: &str = "infobox_v2";
const INFOBOX_CLASS: &str = "infobox";

/// Structural layout detected for a table candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLayout {
    /// `div.infobox_v3`: several sibling tables and bare elements.
    InfoboxV3,
    /// `table.infobox_v2`: one table whose first row carries the title.
    InfoboxV2,
    /// `table.infobox`: generic infobox, not supported yet.
    Infobox,
    /// Any other `table`.
    Plain,
}

impl fmt::Display for TableLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InfoboxV3 => write!(f, "infobox_v3"),
            Self::InfoboxV2 => write!(f, "infobox_v2"),
            Self::Infobox => write!(f, "infobox"),
            Self::Plain => write!(f, "table"),
        }
    }
}

/// Output kind of an extracted table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    /// Plain HTML table.
    Table,
    /// Infobox summary panel.
    Infobox,
}

/// Whether a cell came from a `th` or a `td`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellRole {
    /// `th` cell.
    #[serde(rename = "header")]
    Header,
    /// `td` cell.
    #[serde(rename = "cell")]
    Data,
}

/// One rendered table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Header or data.
    #[serde(rename = "type")]
    pub role: CellRole,
    /// Normalized cell text.
    pub value: String,
}

impl Cell {
    /// Builds a header cell.
    pub fn header(value: impl Into<String>) -> Self {
        Self {
            role: CellRole::Header,
            value: value.into(),
        }
    }

    /// Builds a data cell.
    pub fn data(value: impl Into<String>) -> Self {
        Self {
            role: CellRole::Data,
            value: value.into(),
        }
    }
}

/// Ordered cells of one table row.
pub type Row = Vec<Cell>;

/// An extracted table or infobox.
///
/// `description`, `section_title` and `section_text` stay empty until the
/// enclosing article annotates the table during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Caption, or the lifted first value for infoboxes.
    pub title: String,
    /// Data rows.
    pub data: Vec<Row>,
    /// Table or infobox.
    #[serde(rename = "type")]
    pub kind: TableKind,
    /// Article description.
    #[serde(default)]
    pub description: String,
    /// Title of the owning section.
    #[serde(default)]
    pub section_title: String,
    /// Normalized body text of the owning section.
    #[serde(default)]
    pub section_text: String,
}

impl Table {
    fn new(kind: TableKind, title: String, data: Vec<Row>) -> Self {
        Self {
            title,
            data,
            kind,
            description: String::new(),
            section_title: String::new(),
            section_text: String::new(),
        }
    }
}

/// Reasons a table candidate yields no table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// An infobox had no entry to use as its title.
    EmptyInfobox(TableLayout),
    /// The generic `infobox` layout has no extractor.
    UnsupportedInfobox,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInfobox(layout) => write!(f, "{layout} has no entry to use as title"),
            Self::UnsupportedInfobox => write!(f, "plain infobox layout is not supported"),
        }
    }
}

impl std::error::Error for TableError {}

/// Classifies a candidate, returning `None` when it is not table-eligible.
pub fn classify(element: ElementRef<'_>) -> Option<TableLayout> {
    let value = element.value();
    let has_class = |name: &str| value.classes().any(|class| class == name);
    match value.name() {
        "div" if has_class(INFOBOX_V3_CLASS) => Some(TableLayout::InfoboxV3),
        "table" if has_class(INFOBOX_V2_CLASS) => Some(TableLayout::InfoboxV2),
        "table" if has_class(INFOBOX_CLASS) => Some(TableLayout::Infobox),
        "table" => Some(TableLayout::Plain),
        _ => None,
    }
}

/// Extracts `element` according to `layout`.
pub fn extract(element: ElementRef<'_>, layout: TableLayout) -> Result<Table, TableError> {
    match layout {
        TableLayout::InfoboxV3 => extract_infobox_v3(element),
        TableLayout::InfoboxV2 => extract_infobox_v2(element),
        TableLayout::Infobox => Err(TableError::UnsupportedInfobox),
        TableLayout::Plain => Ok(extract_plain(element)),
    }
}

fn extract_plain(table: ElementRef<'_>) -> Table {
    let title = caption_text(table).unwrap_or_default();
    let data = body_rows(table).unwrap_or_else(|| {
        warn!(caption = %title, "table without tbody");
        Vec::new()
    });
    Table::new(TableKind::Table, title, data)
}

fn extract_infobox_v2(table: ElementRef<'_>) -> Result<Table, TableError> {
    let mut data = body_rows(table).unwrap_or_default();
    let title = lift_title(&mut data).ok_or(TableError::EmptyInfobox(TableLayout::InfoboxV2))?;
    Ok(Table::new(TableKind::Infobox, title, data))
}

fn extract_infobox_v3(container: ElementRef<'_>) -> Result<Table, TableError> {
    let mut data = Vec::new();
    for child in container.children().filter_map(ElementRef::wrap) {
        if child.value().name() == "table" {
            if let Some(caption) = caption_text(child) {
                data.push(vec![Cell::header(caption)]);
            }
            match body_rows(child) {
                Some(rows) => data.extend(rows),
                None => warn!("infobox_v3 table without tbody"),
            }
        } else {
            let text = normalize(&element_text(child));
            if !text.is_empty() {
                data.push(vec![Cell::header(text)]);
            }
        }
    }

    let title = lift_title(&mut data).ok_or(TableError::EmptyInfobox(TableLayout::InfoboxV3))?;
    Ok(Table::new(TableKind::Infobox, title, data))
}

/// Removes the first row and returns its first value.
fn lift_title(rows: &mut Vec<Row>) -> Option<String> {
    if rows.is_empty() {
        return None;
    }
    rows.remove(0).into_iter().next().map(|cell| cell.value)
}

fn caption_text(table: ElementRef<'_>) -> Option<String> {
    children_named(table, "caption")
        .next()
        .map(|caption| normalize(&element_text(caption)))
}

/// Rows of every `tbody` child, or `None` when the table has no `tbody`.
fn body_rows(table: ElementRef<'_>) -> Option<Vec<Row>> {
    let mut bodies = children_named(table, "tbody").peekable();
    bodies.peek()?;
    let rows = bodies
        .flat_map(|tbody| children_named(tbody, "tr"))
        .map(parse_row)
        .filter(|row| !row.is_empty())
        .collect();
    Some(rows)
}

fn parse_row(tr: ElementRef<'_>) -> Row {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter_map(|cell| match cell.value().name() {
            "th" => Some(Cell::header(render_cell(cell))),
            "td" => Some(Cell::data(render_cell(cell))),
            _ => None,
        })
        .collect()
}
