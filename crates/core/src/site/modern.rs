//! Rules of the JSON API site generation.
//!
//! Every endpoint answers `{"data": ...}`. Chapter bodies and title summaries
//! are HTML fragments embedded in the JSON.

use scraper::Selector;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use super::{FeedEntry, ListingChapter, ListingVolume, SiteAdapter, SiteFormat, with_filters};
use crate::metadata::extract_modern_metadata;
use crate::parse::selector;
use crate::report::Reporter;
use crate::title::{Chapter, Title};
use crate::{RanobeError, Result};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(deserialize_with = "number_or_string")]
    number: u32,
    #[serde(default)]
    chapters: Vec<VolumeChapter>,
}

#[derive(Debug, Deserialize)]
struct VolumeChapter {
    id: u64,
    slug: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChapterBody {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Book {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct Update {
    book: Book,
    published_at: String,
}

#[derive(Debug, Deserialize)]
struct Media {
    url: Option<String>,
}

/// Volume numbers arrive either as numbers or as numeric strings.
fn number_or_string<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| D::Error::custom("volume number out of range")),
        Value::String(s) => s.trim().parse().map_err(D::Error::custom),
        _ => Err(D::Error::custom("expected volume number")),
    }
}

fn data<T: DeserializeOwned>(body: &str) -> Result<T> {
    Ok(serde_json::from_str::<Envelope<T>>(body)?.data)
}

/// Adapter for the `api.{site}/api/v2` endpoints.
pub struct ModernAdapter {
    api: String,
    footnote_lists: Selector,
}

impl ModernAdapter {
    pub fn new(site: &str) -> Result<Self> {
        Ok(Self {
            api: format!("https://api.{}/api/v2", site),
            footnote_lists: selector("section.footnotes ol, section.footnotes ul")?,
        })
    }
}

impl SiteAdapter for ModernAdapter {
    fn format(&self) -> SiteFormat {
        SiteFormat::Modern
    }

    fn title_url(&self, slug: &str) -> String {
        format!("{}/books/{}", self.api, slug)
    }

    fn listing_url(&self, title_id: u64) -> String {
        format!("{}/books/{}/chapters", self.api, title_id)
    }

    fn chapter_url(&self, _title: &Title, chapter: &Chapter) -> String {
        format!("{}/chapters/{}", self.api, chapter.id)
    }

    fn media_url(&self, media_id: &str) -> String {
        format!("{}/media/{}", self.api, media_id)
    }

    fn catalog_url(&self, page: u32, filters: Option<&str>) -> String {
        with_filters(format!("{}/books?page={}", self.api, page), filters)
    }

    fn updates_url(&self, page: u32) -> String {
        format!("{}/updates?page={}", self.api, page)
    }

    fn footnote_lists(&self) -> &Selector {
        &self.footnote_lists
    }

    fn media_id_attr(&self) -> &'static str {
        "data-id"
    }

    fn splits_line_breaks(&self) -> bool {
        true
    }

    fn extract_metadata(&self, body: &str, title: &mut Title, pretty: bool, reporter: &dyn Reporter) -> Result<()> {
        let data: Value = data(body)?;
        if !data.is_object() {
            return Err(RanobeError::MissingData("title object".to_string()));
        }

        extract_modern_metadata(&data, title, pretty, reporter);
        Ok(())
    }

    fn parse_listing(&self, body: &str) -> Result<Vec<ListingVolume>> {
        let volumes: Vec<Volume> = data(body)?;

        Ok(volumes
            .into_iter()
            .map(|volume| ListingVolume {
                number: volume.number,
                chapters: volume
                    .chapters
                    .into_iter()
                    .map(|c| ListingChapter { id: c.id, slug: c.slug, name: c.name })
                    .collect(),
            })
            .collect())
    }

    fn chapter_fragment(&self, body: &str, _chapter: &Chapter) -> Result<Option<String>> {
        let chapter: ChapterBody = data(body)?;
        Ok(chapter.content.filter(|content| !content.trim().is_empty()))
    }

    fn parse_media(&self, body: &str) -> Option<String> {
        data::<Media>(body).ok()?.url.filter(|url| !url.is_empty())
    }

    fn parse_catalog(&self, body: &str) -> Result<Vec<String>> {
        let books: Vec<Book> = data(body)?;
        Ok(books.into_iter().map(|book| book.slug).collect())
    }

    fn parse_updates(&self, body: &str) -> Result<Vec<FeedEntry>> {
        let updates: Vec<Update> = data(body)?;
        Ok(updates.into_iter().map(|u| FeedEntry { slug: u.book.slug, published: u.published_at }).collect())
    }

    fn parse_timestamp(&self, raw: &str) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(raw.trim(), &Rfc3339).ok()
    }
}
