//! Inline footnote reference resolution.
//!
//! Block text is rebuilt by serializing the block's nodes. Same-document
//! anchors (`href="#id"`) are looked up in the chapter's [`FootnoteIndex`]
//! and written out as their placeholder at the position they occupy, so two
//! anchors with identical markup pointing at different notes never get
//! confused. Any other anchor is dropped together with its content.

use std::ops::Range;
use std::sync::Arc;

use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::{ElementRef, Node};

use crate::Result;
use crate::content::Footnote;
use crate::footnotes::FootnoteIndex;

const VOID_ELEMENTS: [&str; 10] = ["area", "base", "col", "embed", "hr", "img", "input", "link", "meta", "wbr"];

/// Text of a block with its footnote anchors replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolved {
    pub text: String,
    /// Referenced footnotes in anchor order, one entry per anchor.
    pub footnotes: Vec<Arc<Footnote>>,
    visible: bool,
}

impl Resolved {
    /// Whether nothing a reader would see was written: no non-whitespace
    /// text, no placeholder and no image. Empty inline tags do not count.
    pub fn is_blank(&self) -> bool {
        !self.visible
    }
}

/// Serializes `nodes`, resolving every footnote anchor against `index`.
///
/// Line breaks and comments are not written.
///
/// # Errors
///
/// Returns [`RanobeError::MissingFootnote`](crate::RanobeError::MissingFootnote)
/// for an anchor whose target the chapter does not define.
pub fn resolve_references<'a, I>(nodes: I, index: &mut FootnoteIndex) -> Result<Resolved>
where
    I: IntoIterator<Item = NodeRef<'a, Node>>,
{
    let mut writer = Writer::new(Some(index), None);
    for node in nodes {
        writer.write_node(node)?;
    }
    Ok(writer.out)
}

/// Serializes the part of `element` inside `segment`, a range of pre-order
/// positions within `element` (the element itself is position 0).
///
/// Inline elements crossing an edge of the segment are closed and reopened,
/// so `<i>a<br>b</i>` cut at the `br` gives `<i>a</i>` and `<i>b</i>`.
pub fn resolve_segment(
    element: ElementRef<'_>, segment: Range<usize>, index: &mut FootnoteIndex,
) -> Result<Resolved> {
    let mut writer = Writer::new(Some(index), Some(segment));
    writer.position = 1;
    for child in element.children() {
        writer.write_node(child)?;
    }
    Ok(writer.out)
}

/// Inline markup of a footnote body. Anchors, back-references included,
/// are left out.
pub(crate) fn note_markup(item: ElementRef<'_>) -> String {
    let mut writer = Writer::new(None, None);
    let written: Result<()> = item.children().try_for_each(|child| writer.write_node(child).map(drop));
    match written {
        Ok(()) => writer.out.text.trim().to_string(),
        Err(_) => String::new(),
    }
}

struct Writer<'i> {
    /// `None` drops same-document anchors instead of resolving them.
    index: Option<&'i mut FootnoteIndex>,
    segment: Option<Range<usize>>,
    position: usize,
    out: Resolved,
}

impl<'i> Writer<'i> {
    fn new(index: Option<&'i mut FootnoteIndex>, segment: Option<Range<usize>>) -> Self {
        Self { index, segment, position: 0, out: Resolved::default() }
    }

    /// Writes `node` and returns whether any of it landed in the output.
    fn write_node(&mut self, node: NodeRef<'_, Node>) -> Result<bool> {
        let position = self.position;
        self.position += 1;
        let in_segment = self.segment.as_ref().is_none_or(|segment| segment.contains(&position));

        match node.value() {
            Node::Text(text) if in_segment => {
                self.out.visible |= !text.trim().is_empty();
                escape_text(text, &mut self.out.text);
                Ok(true)
            }
            Node::Element(el) => match el.name() {
                "br" => {
                    self.skip_descendants(node);
                    Ok(false)
                }
                "a" => {
                    self.skip_descendants(node);
                    if in_segment { self.write_anchor(node, el) } else { Ok(false) }
                }
                name if VOID_ELEMENTS.contains(&name) => {
                    self.skip_descendants(node);
                    if in_segment {
                        open_tag(el, &mut self.out.text);
                        self.out.visible |= name == "img";
                    }
                    Ok(in_segment)
                }
                name => {
                    let mark = self.out.text.len();
                    open_tag(el, &mut self.out.text);

                    let mut wrote = in_segment;
                    for child in node.children() {
                        wrote |= self.write_node(child)?;
                    }

                    if wrote {
                        self.out.text.push_str("</");
                        self.out.text.push_str(name);
                        self.out.text.push('>');
                    } else {
                        self.out.text.truncate(mark);
                    }
                    Ok(wrote)
                }
            },
            _ => Ok(false),
        }
    }

    fn skip_descendants(&mut self, node: NodeRef<'_, Node>) {
        self.position += node.descendants().count() - 1;
    }

    fn write_anchor(&mut self, node: NodeRef<'_, Node>, el: &Element) -> Result<bool> {
        let Some(id) = el.attr("href").and_then(|href| href.strip_prefix('#')) else {
            return Ok(false);
        };

        if id.is_empty() {
            tracing::debug!("dropping anchor without target");
            return Ok(false);
        }

        let Some(index) = self.index.as_deref_mut() else {
            return Ok(false);
        };

        let placeholder = ElementRef::wrap(node).map(|a| a.text().collect::<String>()).unwrap_or_default();
        let placeholder = placeholder.trim();

        let footnote = index.resolve(id, placeholder)?;
        self.out.visible |= !placeholder.is_empty();
        escape_text(placeholder, &mut self.out.text);
        self.out.footnotes.push(footnote);
        Ok(true)
    }
}

fn open_tag(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(el.name());
    for (name, value) in el.attrs() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        for c in value.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '"' => out.push_str("&quot;"),
                _ => out.push(c),
            }
        }
        out.push('"');
    }
    out.push('>');
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RanobeError;
    use crate::parse::{Document, selector};
    use crate::report::Recorder;
    use rstest::rstest;

    const NOTES: &str = r##"<ol class="footnotes"><li id="fn1">Первая сноска</li><li id="fn2">Вторая сноска</li></ol>"##;

    fn resolve(block: &str) -> Result<Resolved> {
        let doc = Document::parse_fragment(&format!("<p>{block}</p>{NOTES}")).unwrap();
        let lists = selector("ol.footnotes").unwrap();
        let mut index = FootnoteIndex::build(doc.root(), &lists, &Recorder::default());
        let p = doc.select_first("p").unwrap().unwrap();
        resolve_references(p.element().children(), &mut index)
    }

    #[test]
    fn test_inline_markup_is_kept() {
        let resolved = resolve("Он <i>сказал</i> &amp; <b class=\"x\">ушёл</b>").unwrap();
        assert_eq!(resolved.text, "Он <i>сказал</i> &amp; <b class=\"x\">ушёл</b>");
        assert!(resolved.footnotes.is_empty());
    }

    #[test]
    fn test_external_anchors_are_removed_with_content() {
        let resolved = resolve(r#"Текст<a href="https://example.com">ссылка</a> дальше<a>x</a>"#).unwrap();
        assert_eq!(resolved.text, "Текст дальше");
    }

    #[test]
    fn test_anchor_replaced_by_placeholder() {
        let resolved = resolve(r##"Слово<sup><a href="#fn1">1</a></sup>."##).unwrap();
        assert_eq!(resolved.text, "Слово<sup>1</sup>.");
        assert_eq!(resolved.footnotes.len(), 1);
        assert_eq!(resolved.footnotes[0].id, "fn1");
        assert_eq!(resolved.footnotes[0].placeholder, "1");
        assert_eq!(resolved.footnotes[0].content.text, "Первая сноска");
    }

    #[test]
    fn test_identical_anchor_markup_resolves_in_place() {
        let resolved = resolve(r##"А<a href="#fn1">*</a> Б<a href="#fn2">*</a> В<a href="#fn1">*</a>"##).unwrap();
        assert_eq!(resolved.text, "А* Б* В*");
        let ids: Vec<&str> = resolved.footnotes.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["fn1", "fn2", "fn1"]);
        assert!(Arc::ptr_eq(&resolved.footnotes[0], &resolved.footnotes[2]));
    }

    #[test]
    fn test_dangling_anchor_fails() {
        let err = resolve(r##"Текст<a href="#fn9">9</a>"##).unwrap_err();
        assert!(matches!(err, RanobeError::MissingFootnote { id } if id == "fn9"));
    }

    #[test]
    fn test_empty_target_and_breaks_are_dropped() {
        let resolved = resolve(r##"Раз<br>два<a href="#">↑</a><img src="a.png"><!-- c -->"##).unwrap();
        assert_eq!(resolved.text, "Раздва<img src=\"a.png\">");
    }

    #[rstest]
    #[case("<b> </b>", true)]
    #[case("<span class=\"x\"></span>&nbsp;", true)]
    #[case(r#"<a href="https://example.com">ссылка</a>"#, true)]
    #[case("<b>x</b>", false)]
    #[case(r#"<img src="a.png">"#, false)]
    #[case(r##"<sup><a href="#fn1">1</a></sup>"##, false)]
    fn test_blank_means_nothing_visible(#[case] block: &str, #[case] blank: bool) {
        assert_eq!(resolve(block).unwrap().is_blank(), blank);
    }

    fn segments(block: &str) -> Vec<String> {
        let doc = Document::parse_fragment(&format!("<p>{block}</p>{NOTES}")).unwrap();
        let lists = selector("ol.footnotes").unwrap();
        let mut index = FootnoteIndex::build(doc.root(), &lists, &Recorder::default());
        let p = doc.select_first("p").unwrap().unwrap().element();

        let breaks: Vec<usize> = p
            .descendants()
            .enumerate()
            .filter(|(_, node)| matches!(node.value(), Node::Element(el) if el.name() == "br"))
            .map(|(position, _)| position)
            .collect();
        let total = p.descendants().count();

        let mut edges = vec![0];
        edges.extend(&breaks);
        edges.push(total);
        edges
            .windows(2)
            .map(|w| resolve_segment(p, w[0] + 1..w[1], &mut index).unwrap().text)
            .collect()
    }

    #[test]
    fn test_segment_reopens_inline_tags() {
        assert_eq!(segments("<i>Hello<br>World</i>"), vec!["<i>Hello</i>", "<i>World</i>"]);
        assert_eq!(
            segments("Раз <b>два<i>три<br>четыре</i></b> пять"),
            vec!["Раз <b>два<i>три</i></b>", "<b><i>четыре</i></b> пять"]
        );
    }

    #[test]
    fn test_segment_resolves_anchors_inside_range_only() {
        let doc_segments = segments(r##"А<a href="#fn1">1</a><br>Б<a href="#fn2">2</a>"##);
        assert_eq!(doc_segments, vec!["А1", "Б2"]);
    }

    #[test]
    fn test_note_markup_escapes_and_skips_anchors() {
        let doc = Document::parse_fragment(
            r##"<ol><li id="n">A &amp; <i>B</i> <a href="#back">↑</a><a href="https://x">x</a></li></ol>"##,
        )
        .unwrap();
        let li = doc.select_first("li").unwrap().unwrap().element();
        assert_eq!(note_markup(li), "A &amp; <i>B</i>");
    }
}
