//! Decoding of one dump record into a rendered output line.

use crate::controls::OutputFormat;
use crate::reader::RawRecord;
use serde::Deserialize;
use std::fmt;
use tracing::error;
use wiki_parser::{Article, ExtractConfig};

/// Fields read from one Enterprise HTML dump record.
#[derive(Debug, Deserialize)]
pub struct DumpDocument {
    /// Page identifier (a number in Enterprise dumps, a string elsewhere).
    pub identifier: Identifier,
    /// Canonical page URL.
    pub url: String,
    /// Page title.
    pub name: String,
    /// Rendered article.
    pub article_body: ArticleBody,
}

/// Rendered body of a dump record.
#[derive(Debug, Deserialize)]
pub struct ArticleBody {
    /// Full HTML document.
    pub html: String,
}

/// Page identifier, accepted as either a JSON string or number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    /// Numeric id.
    Number(u64),
    /// Textual id.
    Text(String),
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// A record turned into its output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedDocument {
    /// Rendered record, without the trailing newline.
    pub line: String,
    /// Table candidates dropped while extracting.
    pub dropped_tables: usize,
}

/// Reasons a record produces no output.
#[derive(Debug)]
pub enum DocumentError {
    /// The payload is not a valid dump record.
    Decode(serde_json::Error),
    /// The assembled record could not be serialized.
    Encode(serde_json::Error),
    /// Extraction panicked; holds the panic message.
    Panicked(String),
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(err) => write!(f, "invalid dump record: {err}"),
            Self::Encode(err) => write!(f, "failed to serialize article: {err}"),
            Self::Panicked(message) => write!(f, "extraction panicked: {message}"),
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Decode(err) | Self::Encode(err) => Some(err),
            Self::Panicked(_) => None,
        }
    }
}

/// Decodes, extracts and renders one record.
pub fn process_record(
    record: &RawRecord,
    config: &ExtractConfig,
    format: OutputFormat,
) -> Result<ProcessedDocument, DocumentError> {
    let document: DumpDocument =
        serde_json::from_slice(&record.payload).map_err(DocumentError::Decode)?;

    let article = Article::parse(
        document.identifier.to_string(),
        document.url,
        document.name,
        &document.article_body.html,
        config,
    );
    let mut dropped_tables = 0;
    for err in article.table_errors() {
        dropped_tables += 1;
        error!(source_index = record.source_index, id = %article.id, %err, "table dropped");
    }

    let assembled = article.assemble();
    let line = match format {
        OutputFormat::Json => assembled.to_json().map_err(DocumentError::Encode)?,
        OutputFormat::Text => assembled.to_doc_text(),
    };
    Ok(ProcessedDocument {
        line,
        dropped_tables,
    })
}
