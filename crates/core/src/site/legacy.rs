//! Rules of the server-rendered site generation.

use scraper::Selector;
use serde::Deserialize;
use time::macros::{format_description, offset};
use time::{OffsetDateTime, PrimitiveDateTime};

use super::{FeedEntry, ListingChapter, ListingVolume, SiteAdapter, SiteFormat, with_filters};
use crate::Result;
use crate::parse::{Document, selector};
use crate::report::Reporter;
use crate::title::{Chapter, Title};

#[derive(Debug, Deserialize)]
struct Contents {
    #[serde(default)]
    volumes: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    number: u32,
    #[serde(default)]
    chapters: Vec<ContentsChapter>,
}

#[derive(Debug, Deserialize)]
struct ContentsChapter {
    id: u64,
    slug: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct CatalogItem {
    slug: String,
}

#[derive(Debug, Deserialize)]
struct UpdateItem {
    slug: String,
    updated_at: String,
}

#[derive(Debug, Deserialize)]
struct Media {
    url: Option<String>,
}

/// Adapter for server-rendered title and chapter pages.
pub struct LegacyAdapter {
    site: String,
    footnote_lists: Selector,
}

impl LegacyAdapter {
    pub fn new(site: &str) -> Result<Self> {
        Ok(Self { site: site.to_string(), footnote_lists: selector("ol.footnotes, ul.footnotes")? })
    }
}

impl SiteAdapter for LegacyAdapter {
    fn format(&self) -> SiteFormat {
        SiteFormat::Legacy
    }

    fn title_url(&self, slug: &str) -> String {
        format!("https://{}/ranobe/{}", self.site, slug)
    }

    fn listing_url(&self, title_id: u64) -> String {
        format!("https://{}/api/ranobe/{}/contents", self.site, title_id)
    }

    fn chapter_url(&self, title: &Title, chapter: &Chapter) -> String {
        format!("https://{}/ranobe/{}/{}", self.site, title.slug, chapter.slug)
    }

    fn media_url(&self, media_id: &str) -> String {
        format!("https://{}/api/media/{}", self.site, media_id)
    }

    fn catalog_url(&self, page: u32, filters: Option<&str>) -> String {
        with_filters(format!("https://{}/api/ranobe/search?page={}", self.site, page), filters)
    }

    fn updates_url(&self, page: u32) -> String {
        format!("https://{}/api/ranobe/updates?page={}", self.site, page)
    }

    fn footnote_lists(&self) -> &Selector {
        &self.footnote_lists
    }

    fn media_id_attr(&self) -> &'static str {
        "data-media-id"
    }

    fn splits_line_breaks(&self) -> bool {
        false
    }

    fn extract_metadata(&self, body: &str, title: &mut Title, pretty: bool, reporter: &dyn Reporter) -> Result<()> {
        let doc = Document::parse(body)?;
        doc.extract_legacy_metadata(title, pretty, reporter);
        Ok(())
    }

    fn parse_listing(&self, body: &str) -> Result<Vec<ListingVolume>> {
        let contents: Contents = serde_json::from_str(body)?;

        Ok(contents
            .volumes
            .into_iter()
            .map(|volume| ListingVolume {
                number: volume.number,
                chapters: volume
                    .chapters
                    .into_iter()
                    .map(|c| ListingChapter { id: c.id, slug: c.slug, name: c.title })
                    .collect(),
            })
            .collect())
    }

    fn chapter_fragment(&self, body: &str, chapter: &Chapter) -> Result<Option<String>> {
        let doc = Document::parse(body)?;
        let container = doc.select_first(&format!("div.chapter-content[data-id=\"{}\"]", chapter.id))?;
        Ok(container.map(|c| c.inner_html()))
    }

    fn parse_media(&self, body: &str) -> Option<String> {
        serde_json::from_str::<Media>(body).ok()?.url.filter(|url| !url.is_empty())
    }

    fn parse_catalog(&self, body: &str) -> Result<Vec<String>> {
        let page: Page<CatalogItem> = serde_json::from_str(body)?;
        Ok(page.items.into_iter().map(|item| item.slug).collect())
    }

    fn parse_updates(&self, body: &str) -> Result<Vec<FeedEntry>> {
        let page: Page<UpdateItem> = serde_json::from_str(body)?;
        Ok(page.items.into_iter().map(|item| FeedEntry { slug: item.slug, published: item.updated_at }).collect())
    }

    /// Parses `DD.MM.YYYY HH:MM` in Moscow time.
    fn parse_timestamp(&self, raw: &str) -> Option<OffsetDateTime> {
        let format = format_description!("[day].[month].[year] [hour]:[minute]");
        PrimitiveDateTime::parse(raw.trim(), format).ok().map(|dt| dt.assume_offset(offset!(+3)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn adapter() -> LegacyAdapter {
        LegacyAdapter::new("ranobelib.me").unwrap()
    }

    #[test]
    fn test_urls() {
        let adapter = adapter();
        let title = Title::from_slug("7045-solo-leveling").unwrap();
        let chapter = Chapter { id: 11, slug: "v1/c1".to_string(), ..Default::default() };

        assert_eq!(adapter.title_url("7045-solo-leveling"), "https://ranobelib.me/ranobe/7045-solo-leveling");
        assert_eq!(adapter.listing_url(7045), "https://ranobelib.me/api/ranobe/7045/contents");
        assert_eq!(adapter.chapter_url(&title, &chapter), "https://ranobelib.me/ranobe/7045-solo-leveling/v1/c1");
        assert_eq!(adapter.media_url("42"), "https://ranobelib.me/api/media/42");
        assert_eq!(adapter.catalog_url(2, Some("genres=5")), "https://ranobelib.me/api/ranobe/search?page=2&genres=5");
        assert_eq!(adapter.updates_url(1), "https://ranobelib.me/api/ranobe/updates?page=1");
    }

    #[test]
    fn test_parse_listing() {
        let body = r#"{"volumes": [
            {"number": 1, "chapters": [{"id": 1, "slug": "v1/c1", "title": "Глава 1 - Начало"}]},
            {"number": 2, "chapters": []}
        ]}"#;
        let volumes = adapter().parse_listing(body).unwrap();
        assert_eq!(volumes.len(), 2);
        assert_eq!(volumes[0].chapters[0].name, "Глава 1 - Начало");
        assert!(volumes[1].chapters.is_empty());
    }

    #[test]
    fn test_chapter_fragment_matches_id() {
        let body = r#"<div class="chapter-content" data-id="3"><p>Другая</p></div>
            <div class="chapter-content" data-id="4"><p>Нужная</p></div>"#;
        let chapter = Chapter { id: 4, ..Default::default() };
        assert_eq!(adapter().chapter_fragment(body, &chapter).unwrap().as_deref(), Some("<p>Нужная</p>"));

        let missing = Chapter { id: 5, ..Default::default() };
        assert!(adapter().chapter_fragment(body, &missing).unwrap().is_none());
    }

    #[test]
    fn test_parse_timestamp_moscow_time() {
        let parsed = adapter().parse_timestamp("18.10.2026 15:30").unwrap();
        assert_eq!(parsed, datetime!(2026-10-18 12:30 UTC));
        assert!(adapter().parse_timestamp("вчера").is_none());
    }

    #[test]
    fn test_parse_media() {
        assert_eq!(adapter().parse_media(r#"{"url": "https://cdn/x.png"}"#).as_deref(), Some("https://cdn/x.png"));
        assert!(adapter().parse_media(r#"{"url": ""}"#).is_none());
        assert!(adapter().parse_media("<html>").is_none());
    }

    #[test]
    fn test_parse_feeds() {
        let adapter = adapter();
        assert_eq!(adapter.parse_catalog(r#"{"items": [{"slug": "1-a"}, {"slug": "2-b"}]}"#).unwrap(), vec!["1-a", "2-b"]);
        assert!(adapter.parse_catalog(r#"{}"#).unwrap().is_empty());

        let entries = adapter.parse_updates(r#"{"items": [{"slug": "1-a", "updated_at": "01.01.2026 00:00"}]}"#).unwrap();
        assert_eq!(entries, vec![FeedEntry { slug: "1-a".to_string(), published: "01.01.2026 00:00".to_string() }]);
    }
}
