//! Footnote index of a single chapter.
//!
//! Chapters list their notes at the end of the container as `<ol>`/`<ul>`
//! items carrying an `id`; the text refers to them with `<a href="#id">`.
//! The index is built once per chapter container and consulted by the
//! inline reference resolver for every block of that same container.

use std::collections::HashMap;
use std::sync::Arc;

use scraper::{ElementRef, Selector};

use crate::content::{Footnote, Paragraph};
use crate::references::note_markup;
use crate::report::Reporter;
use crate::{RanobeError, Result};

/// Lookup table from site-local footnote ID to footnote.
#[derive(Debug, Clone, Default)]
pub struct FootnoteIndex {
    notes: HashMap<String, Arc<Footnote>>,
}

impl FootnoteIndex {
    /// Builds the index from every list matched by `lists` inside `container`.
    ///
    /// Items without an `id` cannot be referenced; they are reported and
    /// dropped.
    pub fn build(container: ElementRef<'_>, lists: &Selector, reporter: &dyn Reporter) -> Self {
        let mut notes = HashMap::new();

        for list in container.select(lists) {
            for item in list.children().filter_map(ElementRef::wrap) {
                if item.value().name() != "li" {
                    continue;
                }

                let Some(id) = item.value().id() else {
                    reporter.warning("Footnote list item without id skipped.");
                    continue;
                };

                let text = note_markup(item);
                notes.insert(id.to_string(), Arc::new(Footnote::new(id, Paragraph::new(text))));
            }
        }

        tracing::debug!(count = notes.len(), "footnote index built");
        Self { notes }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.notes.contains_key(id)
    }

    /// Resolves `id` for an anchor showing `placeholder`.
    ///
    /// Anchors repeating the same placeholder share one [`Arc`]. A different
    /// placeholder replaces the stored entry with a fresh footnote, leaving
    /// earlier holders of the old one untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RanobeError::MissingFootnote`] when the chapter defines no
    /// such note.
    pub fn resolve(&mut self, id: &str, placeholder: &str) -> Result<Arc<Footnote>> {
        let entry = self
            .notes
            .get_mut(id)
            .ok_or_else(|| RanobeError::MissingFootnote { id: id.to_string() })?;

        if entry.placeholder != placeholder {
            *entry = Arc::new(entry.with_placeholder(placeholder));
        }

        Ok(Arc::clone(entry))
    }
}
