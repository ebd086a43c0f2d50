//! Text helpers shared by the section and table extractors.

use scraper::node::Node;
use scraper::ElementRef;
use unicode_normalization::UnicodeNormalization;

/// Applies NFKD normalization and trims surrounding whitespace.
///
/// Normalizing an already-normalized string returns it unchanged.
///
/// ```
/// use wiki_parser::text::normalize;
///
/// assert_eq!(normalize("  ﬁn\u{a0}"), "fin");
/// assert_eq!(normalize(&normalize("Zürich")), normalize("Zürich"));
/// ```
pub fn normalize(input: &str) -> String {
    let decomposed: String = input.nfkd().collect();
    decomposed.trim().to_string()
}

/// Returns true for entries that render as nothing (empty, line breaks, spaces).
pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Drops blank entries from both ends of `lines`, keeping interior blanks.
pub fn trim_blank_lines(mut lines: Vec<String>) -> Vec<String> {
    while lines.last().is_some_and(|line| is_blank(line)) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|line| is_blank(line)).count();
    lines.drain(..leading);
    lines
}

/// Concatenates every descendant text node of `element`, unnormalized.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Renders a cell depth first, turning `<br>` into line breaks.
pub fn render_cell(element: ElementRef<'_>) -> String {
    let mut fragments = Vec::new();
    collect_fragments(element, &mut fragments);
    normalize(&trim_blank_lines(fragments).concat())
}

fn collect_fragments(element: ElementRef<'_>, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push(text.to_string()),
            Node::Element(inner) => {
                if inner.name() == "br" {
                    out.push("\n".to_string());
                }
                if let Some(inner) = ElementRef::wrap(child) {
                    collect_fragments(inner, out);
                }
            }
            _ => {}
        }
    }
}

/// Direct element children of `element` with the given tag name.
pub(crate) fn children_named<'a>(
    element: ElementRef<'a>,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scraper::{Html, Selector};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn trims_boundary_blank_lines() {
        let lines = strings(&["", "\n", "text", "\n", ""]);
        assert_eq!(trim_blank_lines(lines), strings(&["text"]));
    }

    #[test]
    fn keeps_interior_blank_lines() {
        let lines = strings(&["a", "", "b"]);
        assert_eq!(trim_blank_lines(lines), strings(&["a", "", "b"]));
    }

    #[test]
    fn all_blank_lines_trim_to_empty() {
        assert!(trim_blank_lines(strings(&["", "\n", " "])).is_empty());
    }

    #[test]
    fn normalization_is_idempotent() {
        for input in ["Crème brûlée", "  x²  ", "Ⅻ", "plain", ""] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn normalization_decomposes_compatibility_forms() {
        assert_eq!(normalize("x²"), "x2");
        assert_eq!(normalize("é"), "e\u{301}");
    }

    #[test]
    fn renders_line_breaks_in_cells() {
        let html = Html::parse_document(
            "<table><tr><td><br>Line one<br/><b>Line</b> two<br></td></tr></table>",
        );
        let td = Selector::parse("td").unwrap();
        let cell = html.select(&td).next().unwrap();
        assert_eq!(render_cell(cell), "Line one\nLine two");
    }
}
