use std::sync::Arc;

use crate::content::{ContentElement, Footnote};
use crate::title::{Chapter, ChapterType};

/// Configuration for Markdown rendering
#[derive(Debug, Clone)]
pub struct MarkdownConfig {
    /// Start with the chapter's display heading
    pub include_title_heading: bool,
    /// Append referenced footnotes as a numbered list
    pub include_endnotes: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self { include_title_heading: true, include_endnotes: true }
    }
}

/// Display heading of a chapter, e.g. `Том 1. Глава 3: Буря`.
pub fn chapter_heading(chapter: &Chapter) -> String {
    let label = match chapter.kind {
        ChapterType::Chapter => "Глава",
        ChapterType::Prologue => "Пролог",
        ChapterType::Epilogue => "Эпилог",
        ChapterType::Extra => "Экстра",
        ChapterType::Afterword => "Послесловие",
        ChapterType::Illustrations => "Иллюстрации",
    };

    let mut heading = format!("Том {}. {}", chapter.volume, label);
    if let Some(number) = &chapter.number {
        heading.push(' ');
        heading.push_str(number);
    }
    if let Some(name) = &chapter.name {
        heading.push_str(": ");
        heading.push_str(name);
    }
    heading
}

/// Render a chapter to Markdown
pub fn chapter_to_markdown(chapter: &Chapter, config: &MarkdownConfig) -> String {
    let mut output = String::new();

    if config.include_title_heading {
        output.push_str(&format!("# {}\n\n", chapter_heading(chapter)));
    }

    output.push_str(&content_to_markdown(&chapter.content, config));
    output
}

/// Render content elements to Markdown, with footnotes as endnotes
pub fn content_to_markdown(elements: &[ContentElement], config: &MarkdownConfig) -> String {
    let mut output = String::new();

    for element in elements {
        let block = render_element(element);
        if !block.is_empty() {
            output.push_str(&block);
            output.push_str("\n\n");
        }
    }

    if config.include_endnotes {
        let notes = endnotes(elements);
        if !notes.is_empty() {
            output.push_str("---\n\n");
            for (index, note) in notes.iter().enumerate() {
                output.push_str(&format!(
                    "{}. **{}** {}\n",
                    index + 1,
                    note.placeholder,
                    html_to_markdown(&note.content.text)
                ));
            }
        }
    }

    output.trim_end().to_string() + "\n"
}

fn render_element(element: &ContentElement) -> String {
    match element {
        ContentElement::Paragraph(p) => html_to_markdown(&p.text),
        ContentElement::Header(h) => {
            format!("{} {}", "#".repeat(usize::from(h.level.clamp(1, 6))), html_to_markdown(&h.text))
        }
        ContentElement::Image(i) => format!("![]({})", i.url),
        ContentElement::Blockquote(b) => b
            .elements
            .iter()
            .map(render_element)
            .flat_map(|block| block.lines().map(|line| format!("> {}", line).trim_end().to_string()).collect::<Vec<_>>())
            .collect::<Vec<_>>()
            .join("\n>\n"),
    }
}

/// Referenced footnotes in first-reference order, each listed once.
fn endnotes(elements: &[ContentElement]) -> Vec<&Arc<Footnote>> {
    let mut notes: Vec<&Arc<Footnote>> = Vec::new();
    for note in elements.iter().flat_map(ContentElement::footnotes) {
        if !notes.iter().any(|seen| Arc::ptr_eq(seen, note)) {
            notes.push(note);
        }
    }
    notes
}

/// Convert inline HTML to Markdown using htmd crate
#[cfg(feature = "markdown")]
fn html_to_markdown(html: &str) -> String {
    htmd::convert(html).map(|md| md.trim().to_string()).unwrap_or_else(|_| html.to_string())
}

/// Fallback HTML to text conversion when markdown feature is disabled
#[cfg(not(feature = "markdown"))]
fn html_to_markdown(html: &str) -> String {
    let doc = scraper::Html::parse_fragment(html);
    doc.root_element().text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Blockquote, Header, Image, Paragraph};

    fn paragraph(text: &str, notes: Vec<Arc<Footnote>>) -> ContentElement {
        ContentElement::Paragraph(Paragraph { text: text.to_string(), align: None, footnotes: notes })
    }

    #[test]
    fn test_chapter_heading() {
        let chapter = Chapter {
            volume: 2,
            number: Some("3.5".to_string()),
            name: Some("Буря".to_string()),
            ..Default::default()
        };
        assert_eq!(chapter_heading(&chapter), "Том 2. Глава 3.5: Буря");

        let prologue = Chapter { volume: 1, kind: ChapterType::Prologue, ..Default::default() };
        assert_eq!(chapter_heading(&prologue), "Том 1. Пролог");
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn test_inline_markup_and_blocks() {
        let elements = vec![
            ContentElement::Header(Header { text: "Часть".to_string(), level: 2, align: None, footnotes: vec![] }),
            paragraph("Он <em>ушёл</em>.", vec![]),
            ContentElement::Image(Image { url: "https://cdn/x.png".to_string(), media_id: None, align: None }),
            ContentElement::Blockquote(Blockquote { elements: vec![paragraph("Цитата", vec![])], align: None }),
        ];

        let markdown = content_to_markdown(&elements, &MarkdownConfig::default());
        assert!(markdown.starts_with("## Часть\n\nОн "));
        assert!(!markdown.contains("<em>"));
        assert!(markdown.ends_with("![](https://cdn/x.png)\n\n> Цитата\n"));
    }

    #[test]
    fn test_endnotes_listed_once_in_order() {
        let first = Arc::new(Footnote::new("a", Paragraph::new("Первая")).with_placeholder("1"));
        let second = Arc::new(Footnote::new("b", Paragraph::new("Вторая")).with_placeholder("2"));
        let elements = vec![
            paragraph("x2", vec![second.clone()]),
            paragraph("y1 z2", vec![first.clone(), second.clone()]),
        ];

        let markdown = content_to_markdown(&elements, &MarkdownConfig::default());
        let notes: Vec<&str> = markdown.lines().filter(|line| line.starts_with(char::is_numeric)).collect();
        assert_eq!(notes, vec!["1. **2** Вторая", "2. **1** Первая"]);
    }

    #[test]
    fn test_endnotes_can_be_disabled() {
        let note = Arc::new(Footnote::new("a", Paragraph::new("Сноска")).with_placeholder("*"));
        let config = MarkdownConfig { include_endnotes: false, ..Default::default() };
        let markdown = content_to_markdown(&[paragraph("x*", vec![note])], &config);
        assert!(!markdown.contains("Сноска"));
    }
}
