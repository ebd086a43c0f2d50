//! Assembly of extracted sections into one flat article record.

use crate::section::{ExtractConfig, Section};
use crate::table::{Table, TableError};
use crate::text::normalize;
use crate::tree::SectionTree;
use scraper::Html;
use serde::{Deserialize, Serialize};

/// An article split into its linearized sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Source identifier.
    pub id: String,
    /// Canonical URL.
    pub url: String,
    /// Article name.
    pub title: String,
    /// Sections in depth-first pre-order; the body root comes first.
    pub sections: Vec<Section>,
}

/// Serialized form of an assembled article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Source identifier.
    pub id: String,
    /// Canonical URL.
    pub url: String,
    /// Article name.
    pub title: String,
    /// Title and section texts separated by blank lines.
    pub body: String,
    /// Annotated tables from every section, omitted when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<Table>,
}

impl Article {
    /// Parses `html` and extracts every section unit.
    pub fn parse(
        id: impl Into<String>,
        url: impl Into<String>,
        title: impl Into<String>,
        html: &str,
        config: &ExtractConfig,
    ) -> Self {
        let document = Html::parse_document(html);
        let tree = SectionTree::from_document(&document);
        let sections = tree
            .iter()
            .map(|unit| Section::parse(unit.node, config))
            .collect();
        Self {
            id: id.into(),
            url: url.into(),
            title: title.into(),
            sections,
        }
    }

    /// Body lines of the first section, concatenated without separators and
    /// normalized.
    pub fn description(&self) -> String {
        self.sections
            .first()
            .map(|section| normalize(&section.body.concat()))
            .unwrap_or_default()
    }

    /// Table candidates dropped across all sections.
    pub fn table_errors(&self) -> impl Iterator<Item = &TableError> {
        self.sections.iter().flat_map(|section| section.dropped.iter())
    }

    /// Flattens the sections into a record, annotating every table with the
    /// article description and its owning section.
    pub fn assemble(self) -> ArticleRecord {
        let description = self.description();
        let mut parts = vec![self.title.clone()];
        let mut tables = Vec::new();

        for section in self.sections {
            let text = section.text();
            if !text.is_empty() {
                if section.title.is_empty() {
                    parts.push(text.clone());
                } else {
                    parts.push(format!("{}.\n{}", section.title, text));
                }
            }

            for mut table in section.tables {
                table.description = description.clone();
                table.section_title = section.title.clone();
                table.section_text = text.clone();
                tables.push(table);
            }
        }

        ArticleRecord {
            id: self.id,
            url: self.url,
            title: self.title,
            body: normalize(&parts.join("\n\n")),
            tables,
        }
    }
}

impl ArticleRecord {
    /// One-line JSON rendering.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// `<doc>`-wrapped plain-text rendering.
    pub fn to_doc_text(&self) -> String {
        format!(
            "<doc id=\"{}\" url=\"{}\" title={}>\n{}\n</doc>",
            self.id, self.url, self.title, self.body
        )
    }
}
