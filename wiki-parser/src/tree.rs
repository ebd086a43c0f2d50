//! Flattens the nested `<section>` hierarchy of an article body.
//!
//! Every section becomes its own [`SectionUnit`]. Units are stored in a flat
//! arena in depth-first pre-order, so a section's subsections come right after
//! it and before any later sibling. A unit's extractable content is limited to
//! its direct children; nested sections are separate units.

use scraper::{ElementRef, Html, Selector};
use std::collections::VecDeque;

const SECTION_TAG: &str = "section";

/// One flattened node of the section hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct SectionUnit<'a> {
    /// Discovery id. The root is 0; ids are never reused.
    pub id: u64,
    /// Id of the enclosing unit (the root points at itself).
    pub parent_id: u64,
    /// Element whose direct children hold this unit's content.
    pub node: ElementRef<'a>,
}

/// Arena of section units in depth-first pre-order.
#[derive(Debug, Clone)]
pub struct SectionTree<'a> {
    units: Vec<SectionUnit<'a>>,
}

impl<'a> SectionTree<'a> {
    /// Linearizes a parsed document starting at its `<body>`.
    pub fn from_document(document: &'a Html) -> Self {
        Self::build(body_root(document))
    }

    /// Linearizes the section hierarchy rooted at `root`.
    pub fn build(root: ElementRef<'a>) -> Self {
        let mut units = Vec::new();
        let mut pending = VecDeque::from([(0u64, 0u64, root)]);
        let mut next_id = 0u64;

        while let Some((id, parent_id, node)) = pending.pop_front() {
            units.push(SectionUnit {
                id,
                parent_id,
                node,
            });

            let subsections: Vec<_> = node
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| child.value().name() == SECTION_TAG)
                .map(|child| {
                    next_id += 1;
                    (next_id, id, child)
                })
                .collect();
            // Front of the queue, in document order, ahead of queued siblings.
            for item in subsections.into_iter().rev() {
                pending.push_front(item);
            }
        }

        Self { units }
    }

    /// Units in traversal order.
    pub fn iter(&self) -> impl Iterator<Item = &SectionUnit<'a>> {
        self.units.iter()
    }

    /// Number of units, root included.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// True when the tree holds no units. A built tree always holds the root.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

fn body_root(document: &Html) -> ElementRef<'_> {
    Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element())
}
