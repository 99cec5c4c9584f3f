//! Title, branch and chapter records.

use serde::{Deserialize, Serialize};

use crate::content::ContentElement;
use crate::{RanobeError, Result};

/// Translation lifecycle of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ongoing,
    Dropped,
    Completed,
}

/// Kind of a chapter entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterType {
    #[default]
    Chapter,
    Prologue,
    Epilogue,
    Extra,
    Afterword,
    Illustrations,
}

/// One chapter of a branch.
///
/// `content` stays empty after enumeration and is filled by amendment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chapter {
    pub id: u64,
    pub slug: String,
    pub volume: u32,
    pub number: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: ChapterType,
    #[serde(default)]
    pub content: Vec<ContentElement>,
}

impl Chapter {
    /// Whether amendment has already populated this chapter.
    pub fn is_amended(&self) -> bool {
        !self.content.is_empty()
    }
}

/// A release line of a title.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Branch {
    pub id: u64,
    pub chapters: Vec<Chapter>,
}

impl Branch {
    pub fn new(id: u64) -> Self {
        Self { id, chapters: Vec::new() }
    }

    pub fn add_chapter(&mut self, chapter: Chapter) {
        self.chapters.push(chapter);
    }

    pub fn chapter_mut(&mut self, id: u64) -> Option<&mut Chapter> {
        self.chapters.iter_mut().find(|c| c.id == id)
    }
}

/// Aggregate root of one parse run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Title {
    pub id: u64,
    pub slug: String,
    pub localized_name: Option<String>,
    pub eng_name: Option<String>,
    #[serde(default)]
    pub another_names: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content_language: Option<String>,
    pub original_language: Option<String>,
    pub publication_year: Option<i32>,
    pub status: Option<Status>,
    pub age_limit: Option<u8>,
    #[serde(default)]
    pub covers: Vec<String>,
    #[serde(default)]
    pub branches: Vec<Branch>,
}

impl Title {
    /// Creates an empty title whose ID is the numeric slug prefix.
    pub fn from_slug(slug: &str) -> Result<Self> {
        let id = title_id_from_slug(slug)?;
        Ok(Self { id, slug: slug.to_string(), ..Default::default() })
    }

    pub fn add_author(&mut self, author: &str) {
        push_unique(&mut self.authors, author);
    }

    pub fn add_cover(&mut self, url: &str) {
        push_unique(&mut self.covers, url);
    }

    pub fn set_genres<I, S>(&mut self, genres: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.genres.clear();
        for genre in genres {
            push_unique(&mut self.genres, genre.as_ref());
        }
    }

    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags.clear();
        for tag in tags {
            push_unique(&mut self.tags, tag.as_ref());
        }
    }

    /// Total number of chapters across branches.
    pub fn chapters_count(&self) -> usize {
        self.branches.iter().map(|b| b.chapters.len()).sum()
    }
}

/// Extracts the numeric title ID leading a slug (`"7045-solo-leveling"` → 7045).
pub fn title_id_from_slug(slug: &str) -> Result<u64> {
    slug.split('-')
        .next()
        .and_then(|prefix| prefix.trim().parse().ok())
        .ok_or_else(|| RanobeError::InvalidSlug(slug.to_string()))
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() && !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_id_from_slug() {
        assert_eq!(title_id_from_slug("7045-solo-leveling").unwrap(), 7045);
        assert_eq!(title_id_from_slug("12").unwrap(), 12);
        assert!(matches!(title_id_from_slug("solo-leveling"), Err(RanobeError::InvalidSlug(_))));
        assert!(title_id_from_slug("").is_err());
    }

    #[test]
    fn test_from_slug() {
        let title = Title::from_slug("15-tensura").unwrap();
        assert_eq!(title.id, 15);
        assert_eq!(title.slug, "15-tensura");
        assert!(title.branches.is_empty());
    }

    #[test]
    fn test_sets_are_deduplicated_in_order() {
        let mut title = Title::default();
        title.set_tags(["Магия", "Гарем", "Магия", " "]);
        title.add_author("Автор");
        title.add_author("Автор");
        assert_eq!(title.tags, vec!["Магия", "Гарем"]);
        assert_eq!(title.authors, vec!["Автор"]);
    }

    #[test]
    fn test_chapter_serializes_kind_as_type() {
        let chapter = Chapter { id: 1, slug: "c1".to_string(), volume: 1, ..Default::default() };
        let json = serde_json::to_value(&chapter).unwrap();
        assert_eq!(json["type"], "chapter");
        assert!(!chapter.is_amended());
    }
}
