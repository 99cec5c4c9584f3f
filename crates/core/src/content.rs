//! Typed content elements produced by chapter conversion.
//!
//! A converted chapter is an ordered list of [`ContentElement`]s. Paragraph
//! and header text keeps inline markup (`<i>`, `<b>`, `<sup>`...) with
//! footnote anchors replaced by their placeholders; the footnotes themselves
//! travel alongside the element so they can be rendered as endnotes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Horizontal alignment taken from the source tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Parses an alignment keyword such as `center` or `Right`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().to_lowercase().as_str() {
            "left" | "start" => Some(Self::Left),
            "center" | "middle" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }
}

/// A block of text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub footnotes: Vec<Arc<Footnote>>,
}

impl Paragraph {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Default::default() }
    }
}

/// A section header inside a chapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub text: String,
    pub level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub footnotes: Vec<Arc<Footnote>>,
}

/// An illustration.
///
/// `url` is the media API endpoint until the image resolution pass swaps it
/// for the final file URL. Images given by plain `src` have no `media_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
}

/// A quotation holding paragraphs and images, one level deep.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Blockquote {
    pub elements: Vec<ContentElement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align: Option<Alignment>,
}

/// One typed unit of chapter content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentElement {
    Paragraph(Paragraph),
    Header(Header),
    Image(Image),
    Blockquote(Blockquote),
}

impl ContentElement {
    pub fn align(&self) -> Option<Alignment> {
        match self {
            Self::Paragraph(p) => p.align,
            Self::Header(h) => h.align,
            Self::Image(i) => i.align,
            Self::Blockquote(b) => b.align,
        }
    }

    /// Footnotes referenced by this element in anchor order, including those
    /// of nested blockquote children.
    pub fn footnotes(&self) -> Vec<&Arc<Footnote>> {
        match self {
            Self::Paragraph(p) => p.footnotes.iter().collect(),
            Self::Header(h) => h.footnotes.iter().collect(),
            Self::Image(_) => Vec::new(),
            Self::Blockquote(b) => b.elements.iter().flat_map(|e| e.footnotes()).collect(),
        }
    }

    /// Images of this element, nested ones included, for URL resolution.
    pub fn images_mut(&mut self) -> Vec<&mut Image> {
        match self {
            Self::Image(image) => vec![image],
            Self::Blockquote(b) => b.elements.iter_mut().flat_map(|e| e.images_mut()).collect(),
            Self::Paragraph(_) | Self::Header(_) => Vec::new(),
        }
    }
}

/// A note attached to chapter text.
///
/// `placeholder` is the visible text of the anchor that referenced the note
/// (usually a number or an asterisk); it stays in the surrounding text where
/// the anchor used to be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footnote {
    pub id: String,
    pub placeholder: String,
    pub content: Paragraph,
}

impl Footnote {
    pub fn new(id: impl Into<String>, content: Paragraph) -> Self {
        Self { id: id.into(), placeholder: String::new(), content }
    }

    /// Returns a copy of this footnote carrying another placeholder.
    pub fn with_placeholder(&self, placeholder: impl Into<String>) -> Self {
        Self { placeholder: placeholder.into(), ..self.clone() }
    }

    /// Replaces the first occurrence of `anchor_markup` in `text` with the
    /// placeholder.
    ///
    /// The conversion pipeline splices placeholders by position while
    /// serializing; this is for callers holding already-serialized markup.
    ///
    /// ```rust
    /// use ranobe_core::{Footnote, Paragraph};
    ///
    /// let note = Footnote::new("fn1", Paragraph::new("A note")).with_placeholder("1");
    /// let text = note.replace_in_text("Word<a href=\"#fn1\">1</a>.", "<a href=\"#fn1\">1</a>");
    /// assert_eq!(text, "Word1.");
    /// ```
    pub fn replace_in_text(&self, text: &str, anchor_markup: &str) -> String {
        text.replacen(anchor_markup, &self.placeholder, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_keywords() {
        assert_eq!(Alignment::from_keyword("Center"), Some(Alignment::Center));
        assert_eq!(Alignment::from_keyword(" right "), Some(Alignment::Right));
        assert_eq!(Alignment::from_keyword("inherit"), None);
    }

    #[test]
    fn test_element_serializes_with_type_tag() {
        let element = ContentElement::Paragraph(Paragraph::new("Hello"));
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["type"], "paragraph");
        assert_eq!(json["text"], "Hello");
        assert!(json.get("footnotes").is_none());
        assert!(json.get("align").is_none());
    }

    #[test]
    fn test_blockquote_collects_nested_footnotes() {
        let note = Arc::new(Footnote::new("fn1", Paragraph::new("note")).with_placeholder("*"));
        let inner = Paragraph { text: "quoted*".to_string(), align: None, footnotes: vec![note.clone()] };
        let quote = ContentElement::Blockquote(Blockquote {
            elements: vec![ContentElement::Paragraph(inner)],
            align: Some(Alignment::Center),
        });

        let notes = quote.footnotes();
        assert_eq!(notes.len(), 1);
        assert!(Arc::ptr_eq(notes[0], &note));
        assert_eq!(quote.align(), Some(Alignment::Center));
    }

    #[test]
    fn test_replace_in_text_only_first_occurrence() {
        let note = Footnote::new("a", Paragraph::new("x")).with_placeholder("[1]");
        let anchor = "<a href=\"#a\">1</a>";
        let text = format!("one{anchor} two{anchor}");
        assert_eq!(note.replace_in_text(&text, anchor), format!("one[1] two{anchor}"));
    }

    #[test]
    fn test_images_mut_reaches_blockquote_children() {
        let mut quote = ContentElement::Blockquote(Blockquote {
            elements: vec![ContentElement::Image(Image { url: "u".to_string(), media_id: None, align: None })],
            align: None,
        });
        for image in quote.images_mut() {
            image.url = "resolved".to_string();
        }
        let ContentElement::Blockquote(b) = quote else { panic!("expected blockquote") };
        assert_eq!(b.elements[0], ContentElement::Image(Image { url: "resolved".to_string(), media_id: None, align: None }));
    }
}
