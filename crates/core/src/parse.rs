//! HTML parsing and DOM querying.
//!
//! This module provides the [`Document`] and [`Element`] types used by the
//! metadata extractor and the chapter adapters to query server-rendered
//! pages with CSS selectors.
//!
//! # Example
//!
//! ```rust
//! use ranobe_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <div class="book-author">Author</div>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html).unwrap();
//! let authors = doc.select("div.book-author").unwrap();
//! assert_eq!(authors[0].text(), "Author");
//! ```

use scraper::{ElementRef, Html, Selector};

use crate::{RanobeError, Result};

/// Compiles a CSS selector, mapping failures to [`RanobeError::HtmlParseError`].
pub fn selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| RanobeError::HtmlParseError(format!("Invalid selector: {}", e)))
}

/// Represents a parsed HTML document or fragment.
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a complete HTML page.
    pub fn parse(html: &str) -> Result<Self> {
        Ok(Self { html: Html::parse_document(html) })
    }

    /// Parses an HTML fragment such as a chapter body or an embedded
    /// description. The fragment's top-level nodes become the children of
    /// [`Document::root`].
    pub fn parse_fragment(html: &str) -> Result<Self> {
        Ok(Self { html: Html::parse_fragment(html) })
    }

    /// Gets the root element.
    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`RanobeError::HtmlParseError`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ranobe_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html).unwrap();
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = self::selector(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first element matching a CSS selector.
    pub fn select_first(&'_ self, selector: &str) -> Result<Option<Element<'_>>> {
        let sel = self::selector(selector)?;
        Ok(self.html.select(&sel).next().map(|el| Element { element: el }))
    }

    /// Gets all text content from the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

/// A wrapper around scraper's ElementRef.
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the wrapped scraper element.
    pub fn element(&self) -> ElementRef<'a> {
        self.element
    }

    /// Gets the inner HTML of this element.
    pub fn inner_html(&self) -> String {
        self.element.inner_html()
    }

    /// Gets the outer HTML of this element.
    pub fn outer_html(&self) -> String {
        self.element.html()
    }

    /// Gets the concatenated text nodes within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`RanobeError::HtmlParseError`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = self::selector(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Selects the first descendant element matching a CSS selector.
    pub fn select_first(&self, selector: &str) -> Result<Option<Element<'a>>> {
        let sel = self::selector(selector)?;
        Ok(self.element.select(&sel).next().map(|el| Element { element: el }))
    }
}
