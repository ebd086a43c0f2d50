//! Extract sections, tables, and infoboxes from Wikimedia Enterprise HTML.
//!
//! An article body is processed in four steps:
//!
//! 1. [`tree`] flattens the nested `<section>` hierarchy into units in
//!    depth-first pre-order.
//! 2. [`section`] extracts the title, paragraph lines, and tables found among
//!    each unit's direct children.
//! 3. [`table`] classifies table candidates (plain tables and the two infobox
//!    layouts) and renders them into rows of cells.
//! 4. [`article`] stitches the sections into one flat [`ArticleRecord`].

pub mod article;
pub mod section;
pub mod table;
pub mod text;
pub mod tree;

pub use article::{Article, ArticleRecord};
pub use section::{ExtractConfig, Section};
pub use table::{Cell, CellRole, Row, Table, TableError, TableKind, TableLayout};
pub use tree::{SectionTree, SectionUnit};

/// Extracts the sections of an HTML article body.
///
/// # Example
///
/// ```
/// use wiki_parser::{extract_sections, ExtractConfig};
///
/// let html = r#"<body><section><h2>Intro</h2><p>Hello world.</p></section></body>"#;
/// let sections = extract_sections(html, &ExtractConfig::default());
/// assert_eq!(sections.len(), 2);
/// assert_eq!(sections[1].title, "Intro");
/// assert_eq!(sections[1].body, vec!["Hello world."]);
/// ```
pub fn extract_sections(html: &str, config: &ExtractConfig) -> Vec<Section> {
    Article::parse("", "", "", html, config).sections
}

/// Extracts and assembles a whole article in one call.
///
/// # Example
///
/// ```
/// use wiki_parser::{extract_article, ExtractConfig};
///
/// let html = r#"<body><section><p>Hello <b>world</b>.</p></section></body>"#;
/// let record = extract_article("1", "https://x.test/Hello", "Hello", html, &ExtractConfig::default());
/// assert_eq!(record.body, "Hello\n\nHello world.");
/// assert!(record.tables.is_empty());
/// ```
pub fn extract_article(
    id: &str,
    url: &str,
    title: &str,
    html: &str,
    config: &ExtractConfig,
) -> ArticleRecord {
    Article::parse(id, url, title, html, config).assemble()
}
