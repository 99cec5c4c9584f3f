//! Chapter display name parsing.
//!
//! Listings name chapters like `Том 2 Глава 15.5 - Буря` or `Эпилог`. The
//! parser splits such a string into volume, number, type and name.

use std::sync::LazyLock;

use regex::Regex;

use crate::title::ChapterType;

static VOLUME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*том\s+(\d+)\s*[-–—:.,]?\s*").expect("valid volume regex"));

static CHAPTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(глава|пролог|эпилог|экстра|дополнительная история|послесловие|иллюстрации)\b\s*(\d+(?:[.,]\d+)?)?\s*(?:[-–—:.]\s*)?(.*)$",
    )
    .expect("valid chapter regex")
});

/// Structured form of a chapter display name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChapterHeader {
    /// Volume given in the name, overriding the listing's volume.
    pub volume: Option<u32>,
    pub number: Option<String>,
    pub kind: ChapterType,
    pub name: Option<String>,
}

fn kind_for(keyword: &str) -> ChapterType {
    match keyword.to_lowercase().as_str() {
        "пролог" => ChapterType::Prologue,
        "эпилог" => ChapterType::Epilogue,
        "экстра" | "дополнительная история" => ChapterType::Extra,
        "послесловие" => ChapterType::Afterword,
        "иллюстрации" => ChapterType::Illustrations,
        _ => ChapterType::Chapter,
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() { None } else { Some(text.to_string()) }
}

/// Parses a chapter display name.
///
/// Anything that does not start with a known keyword becomes a plain
/// chapter without number, named by the text itself.
///
/// ```rust
/// use ranobe_core::{ChapterType, parse_chapter_header};
///
/// let header = parse_chapter_header("Том 2 Глава 15.5 - Буря");
/// assert_eq!(header.volume, Some(2));
/// assert_eq!(header.number.as_deref(), Some("15.5"));
/// assert_eq!(header.kind, ChapterType::Chapter);
/// assert_eq!(header.name.as_deref(), Some("Буря"));
/// ```
pub fn parse_chapter_header(raw: &str) -> ChapterHeader {
    let mut rest = raw.trim();
    let mut header = ChapterHeader::default();

    if let Some(caps) = VOLUME.captures(rest) {
        header.volume = caps[1].parse().ok();
        rest = &rest[caps[0].len()..];
    }

    match CHAPTER.captures(rest) {
        Some(caps) => {
            header.kind = kind_for(&caps[1]);
            header.number = caps.get(2).map(|n| n.as_str().replace(',', "."));
            header.name = caps.get(3).and_then(|name| non_empty(name.as_str()));
        }
        None => header.name = non_empty(rest),
    }

    header
}
