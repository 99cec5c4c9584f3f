//! Content element builders.
//!
//! Turns classified [`Block`]s into [`ContentElement`]s. Text builders run
//! the inline reference resolver; every builder reads alignment from the
//! block's element.

use std::ops::Range;

use scraper::ElementRef;

use crate::Result;
use crate::blocks::{Block, BlockKind};
use crate::content::{Alignment, Blockquote, ContentElement, Header, Image, Paragraph};
use crate::footnotes::FootnoteIndex;
use crate::references::{resolve_references, resolve_segment};
use crate::report::Reporter;
use crate::site::SiteAdapter;

/// Reads alignment from `style`, `align` or a `text-*`/`align-*` class.
pub fn parse_alignment(element: ElementRef<'_>) -> Option<Alignment> {
    let el = element.value();

    let from_style = el.attr("style").and_then(|style| {
        style.split(';').find_map(|declaration| {
            let (property, value) = declaration.split_once(':')?;
            if property.trim().eq_ignore_ascii_case("text-align") { Alignment::from_keyword(value) } else { None }
        })
    });

    from_style.or_else(|| el.attr("align").and_then(Alignment::from_keyword)).or_else(|| {
        el.classes().find_map(|class| {
            class
                .strip_prefix("text-")
                .or_else(|| class.strip_prefix("align-"))
                .and_then(Alignment::from_keyword)
        })
    })
}

/// Builds a paragraph from `element`, or from the `segment` of it left by
/// line-break splitting. Nothing visible yields `None`.
pub fn build_paragraph(
    element: ElementRef<'_>, segment: Option<Range<usize>>, index: &mut FootnoteIndex,
) -> Result<Option<Paragraph>> {
    let resolved = match segment {
        Some(segment) => resolve_segment(element, segment, index)?,
        None => resolve_references(element.children(), index)?,
    };

    if resolved.is_blank() {
        return Ok(None);
    }

    Ok(Some(Paragraph {
        text: resolved.text.trim().to_string(),
        align: parse_alignment(element),
        footnotes: resolved.footnotes,
    }))
}

pub fn build_header(element: ElementRef<'_>, level: u8, index: &mut FootnoteIndex) -> Result<Option<Header>> {
    let resolved = resolve_references(element.children(), index)?;

    if resolved.is_blank() {
        return Ok(None);
    }

    Ok(Some(Header { text: resolved.text.trim().to_string(), level, align: parse_alignment(element), footnotes: resolved.footnotes }))
}

/// Builds an image pointing at the media endpoint for its media ID, or at
/// its `data-src`/`src` when it has none.
pub fn build_image(element: ElementRef<'_>, adapter: &dyn SiteAdapter, reporter: &dyn Reporter) -> Option<Image> {
    let el = element.value();
    let align = parse_alignment(element);

    if let Some(media_id) = el.attr(adapter.media_id_attr()).map(str::trim).filter(|id| !id.is_empty()) {
        return Some(Image { url: adapter.media_url(media_id), media_id: Some(media_id.to_string()), align });
    }

    match el.attr("data-src").or_else(|| el.attr("src")).filter(|src| !src.trim().is_empty()) {
        Some(src) => Some(Image { url: src.trim().to_string(), media_id: None, align }),
        None => {
            reporter.warning("Image without source skipped.");
            None
        }
    }
}

/// Builds a blockquote from its direct `p` and `img` children.
///
/// A quote with bare text and no such children becomes one paragraph.
pub fn build_blockquote(
    element: ElementRef<'_>, adapter: &dyn SiteAdapter, index: &mut FootnoteIndex, reporter: &dyn Reporter,
) -> Result<Option<Blockquote>> {
    let mut elements = Vec::new();
    let mut structured = false;

    for child in element.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "p" => {
                structured = true;
                if let Some(paragraph) = build_paragraph(child, None, index)? {
                    elements.push(ContentElement::Paragraph(paragraph));
                }
            }
            "img" => {
                structured = true;
                if let Some(image) = build_image(child, adapter, reporter) {
                    elements.push(ContentElement::Image(image));
                }
            }
            _ => {}
        }
    }

    if !structured && let Some(paragraph) = build_paragraph(element, None, index)? {
        elements.push(ContentElement::Paragraph(paragraph));
    }

    if elements.is_empty() {
        return Ok(None);
    }

    Ok(Some(Blockquote { elements, align: parse_alignment(element) }))
}

/// Builds the element for one block.
pub fn build_element(
    block: &Block<'_>, adapter: &dyn SiteAdapter, index: &mut FootnoteIndex, reporter: &dyn Reporter,
) -> Result<Option<ContentElement>> {
    Ok(match block.kind {
        BlockKind::Paragraph => {
            build_paragraph(block.element, block.segment.clone(), index)?.map(ContentElement::Paragraph)
        }
        BlockKind::Header(level) => build_header(block.element, level, index)?.map(ContentElement::Header),
        BlockKind::Image => build_image(block.element, adapter, reporter).map(ContentElement::Image),
        BlockKind::Blockquote => {
            build_blockquote(block.element, adapter, index, reporter)?.map(ContentElement::Blockquote)
        }
    })
}
