//! Block classification of a chapter container.
//!
//! Each direct child element of the container becomes at most a few
//! [`Block`]s. Paragraph wrappers around non-text content are discarded, and
//! with line-break splitting enabled a paragraph is cut at every `br`, however
//! deeply it is nested in inline markup.

use std::ops::Range;

use ego_tree::NodeRef;
use scraper::{ElementRef, Node};

/// Semantic type of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    /// Header with its level, 1 to 6.
    Header(u8),
    Image,
    Blockquote,
}

impl BlockKind {
    /// Classifies a tag name; `None` for tags that carry no content block.
    pub fn from_tag(name: &str) -> Option<Self> {
        match name {
            "p" => Some(Self::Paragraph),
            "img" => Some(Self::Image),
            "blockquote" => Some(Self::Blockquote),
            _ => header_level(name).map(Self::Header),
        }
    }
}

fn header_level(name: &str) -> Option<u8> {
    match name.as_bytes() {
        [b'h', level @ b'1'..=b'6'] => Some(level - b'0'),
        _ => None,
    }
}

/// A classified unit of a chapter container.
#[derive(Debug, Clone)]
pub struct Block<'a> {
    pub kind: BlockKind,
    /// Element whose attributes (alignment, media ID) apply to the block.
    pub element: ElementRef<'a>,
    /// Pre-order positions within `element` covered by one piece of a split
    /// paragraph; `None` when the block is the whole element.
    pub segment: Option<Range<usize>>,
}

impl<'a> Block<'a> {
    fn whole(kind: BlockKind, element: ElementRef<'a>) -> Self {
        Self { kind, element, segment: None }
    }
}

/// Classifies the direct children of `container` in document order.
pub fn collect_blocks(container: ElementRef<'_>, split_breaks: bool) -> Vec<Block<'_>> {
    let mut blocks = Vec::new();

    for child in container.children().filter_map(ElementRef::wrap) {
        let name = child.value().name();
        let Some(kind) = BlockKind::from_tag(name) else {
            tracing::debug!(tag = name, "ignoring unsupported block");
            continue;
        };

        match kind {
            BlockKind::Paragraph => {
                if let Some(inner) = unwrap_paragraph(child) {
                    blocks.push(inner);
                } else if split_breaks {
                    blocks.extend(split_paragraph(child));
                } else {
                    blocks.push(Block::whole(kind, child));
                }
            }
            BlockKind::Header(_) | BlockKind::Image | BlockKind::Blockquote => blocks.push(Block::whole(kind, child)),
        }
    }

    blocks
}

/// First descendant blockquote, else image, else header of a paragraph.
fn unwrap_paragraph(paragraph: ElementRef<'_>) -> Option<Block<'_>> {
    let descendants: Vec<ElementRef<'_>> = paragraph.descendants().skip(1).filter_map(ElementRef::wrap).collect();

    let find = |wanted: fn(BlockKind) -> bool| {
        descendants.iter().copied().find_map(|el| {
            BlockKind::from_tag(el.value().name()).filter(|kind| wanted(*kind)).map(|kind| Block::whole(kind, el))
        })
    };

    find(|kind| kind == BlockKind::Blockquote)
        .or_else(|| find(|kind| kind == BlockKind::Image))
        .or_else(|| find(|kind| matches!(kind, BlockKind::Header(_))))
}

/// Pieces of a paragraph between its `br` tags, blank ones dropped.
fn split_paragraph(paragraph: ElementRef<'_>) -> Vec<Block<'_>> {
    let nodes: Vec<NodeRef<'_, Node>> = paragraph.descendants().collect();
    let mut segments = Vec::new();
    let mut start = 1;

    for (position, node) in nodes.iter().enumerate().skip(1) {
        if matches!(node.value(), Node::Element(el) if el.name() == "br") {
            segments.push(start..position);
            start = position + 1;
        }
    }
    segments.push(start..nodes.len());

    segments
        .into_iter()
        .filter(|segment| !is_blank(&nodes[segment.clone()]))
        .map(|segment| Block { kind: BlockKind::Paragraph, element: paragraph, segment: Some(segment) })
        .collect()
}

fn is_blank(nodes: &[NodeRef<'_, Node>]) -> bool {
    nodes.iter().all(|node| match node.value() {
        Node::Text(text) => text.trim().is_empty(),
        Node::Element(el) => el.name() != "img",
        _ => true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::Document;
    use rstest::rstest;

    fn kinds(html: &str, split: bool) -> Vec<BlockKind> {
        let doc = Document::parse_fragment(html).unwrap();
        collect_blocks(doc.root(), split).iter().map(|b| b.kind).collect()
    }

    #[rstest]
    #[case("p", Some(BlockKind::Paragraph))]
    #[case("h1", Some(BlockKind::Header(1)))]
    #[case("h6", Some(BlockKind::Header(6)))]
    #[case("h7", None)]
    #[case("img", Some(BlockKind::Image))]
    #[case("blockquote", Some(BlockKind::Blockquote))]
    #[case("ol", None)]
    #[case("table", None)]
    fn test_from_tag(#[case] tag: &str, #[case] expected: Option<BlockKind>) {
        assert_eq!(BlockKind::from_tag(tag), expected);
    }

    #[test]
    fn test_unsupported_children_are_ignored() {
        let html = r#"<p>Один</p><hr><ol class="footnotes"><li id="a">x</li></ol><h3>Два</h3><table><tr><td>t</td></tr></table>"#;
        assert_eq!(kinds(html, false), vec![BlockKind::Paragraph, BlockKind::Header(3)]);
    }

    #[test]
    fn test_paragraph_wrapping_image_is_unwrapped() {
        let doc = Document::parse_fragment(r#"<p align="center"><span><img data-media-id="5"></span></p>"#).unwrap();
        let blocks = collect_blocks(doc.root(), false);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Image);
        assert_eq!(blocks[0].element.value().name(), "img");
        assert_eq!(blocks[0].element.value().attr("align"), None);
    }

    #[test]
    fn test_text_paragraph_is_not_unwrapped() {
        let doc = Document::parse_fragment("<p class=\"text-center\"><b>Жирный</b> текст</p>").unwrap();
        let blocks = collect_blocks(doc.root(), false);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(blocks[0].element.value().name(), "p");
        assert_eq!(blocks[0].segment, None);
    }

    #[test]
    fn test_split_on_breaks_keeps_attributes() {
        let doc = Document::parse_fragment(r#"<p style="text-align: right">Раз<br>Два<br><i>Три</i></p>"#).unwrap();
        let blocks = collect_blocks(doc.root(), true);
        assert_eq!(blocks.len(), 3);
        for block in &blocks {
            assert_eq!(block.kind, BlockKind::Paragraph);
            assert_eq!(block.element.value().attr("style"), Some("text-align: right"));
        }
    }

    #[test]
    fn test_split_drops_blank_segments() {
        assert_eq!(kinds("<p>Hello<br>World<br></p>", true).len(), 2);
        assert_eq!(kinds("<p><br> <br></p>", true).len(), 0);
        assert_eq!(kinds("<p>Hello<br>World<br></p>", false).len(), 1);
    }

    #[test]
    fn test_split_on_nested_breaks() {
        let doc = Document::parse_fragment("<p><i>Hello<br>World</i><br><b> </b></p>").unwrap();
        let blocks = collect_blocks(doc.root(), true);
        // p=0 i=1 Hello=2 br=3 World=4 br=5 b=6 " "=7
        let segments: Vec<_> = blocks.iter().map(|b| b.segment.clone()).collect();
        assert_eq!(segments, vec![Some(1..3), Some(4..5)]);
    }
}
