//! Chapter markup to content elements.

use url::Url;

use crate::Result;
use crate::blocks::collect_blocks;
use crate::builders::build_element;
use crate::content::ContentElement;
use crate::footnotes::FootnoteIndex;
use crate::parse::Document;
use crate::preprocess::{PreprocessConfig, preprocess_html};
use crate::report::Reporter;
use crate::site::SiteAdapter;

/// Converts the markup of one chapter container into content elements.
///
/// The fragment is cleaned, its footnote lists are indexed, and every
/// top-level block is classified and built in document order. `base_url`
/// makes relative image sources absolute.
///
/// # Errors
///
/// Returns [`RanobeError::MissingFootnote`](crate::RanobeError::MissingFootnote)
/// when a block references a footnote the container does not define.
///
/// # Example
///
/// ```rust
/// use ranobe_core::{ContentElement, Recorder, adapter_for, convert_chapter, SiteFormat};
///
/// let adapter = adapter_for(SiteFormat::Modern, "ranobelib.me").unwrap();
/// let elements = convert_chapter("<p>Hello<br>World<br></p>", adapter.as_ref(), None, &Recorder::default()).unwrap();
///
/// assert_eq!(elements.len(), 2);
/// assert!(matches!(&elements[1], ContentElement::Paragraph(p) if p.text == "World"));
/// ```
pub fn convert_chapter(
    html: &str, adapter: &dyn SiteAdapter, base_url: Option<&Url>, reporter: &dyn Reporter,
) -> Result<Vec<ContentElement>> {
    let config = PreprocessConfig { base_url: base_url.cloned(), ..Default::default() };
    let cleaned = preprocess_html(html, &config);
    let doc = Document::parse_fragment(&cleaned)?;
    let container = doc.root();

    let mut index = FootnoteIndex::build(container, adapter.footnote_lists(), reporter);
    let blocks = collect_blocks(container, adapter.splits_line_breaks());

    let mut elements = Vec::with_capacity(blocks.len());
    for block in &blocks {
        if let Some(element) = build_element(block, adapter, &mut index, reporter)? {
            elements.push(element);
        }
    }

    tracing::debug!(blocks = blocks.len(), elements = elements.len(), footnotes = index.len(), "chapter converted");
    Ok(elements)
}
