//! Site adapters.
//!
//! The site has served two markup generations. Everything that differs
//! between them (endpoint URLs, selectors, JSON shapes, date formats) lives
//! behind [`SiteAdapter`], so the conversion pipeline, the enumerator and the
//! collector are written once.

pub mod legacy;
pub mod modern;

use std::fmt;
use std::str::FromStr;

use scraper::Selector;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use legacy::LegacyAdapter;
pub use modern::ModernAdapter;

use crate::report::Reporter;
use crate::title::{Chapter, Title};
use crate::{RanobeError, Result};

/// Host used when settings name none.
pub const DEFAULT_SITE: &str = "ranobelib.me";

/// Markup generation served by the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteFormat {
    /// Server-rendered pages.
    #[default]
    Legacy,
    /// JSON API with embedded HTML fragments.
    Modern,
}

impl fmt::Display for SiteFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Modern => write!(f, "modern"),
        }
    }
}

impl FromStr for SiteFormat {
    type Err = RanobeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(Self::Legacy),
            "modern" => Ok(Self::Modern),
            other => Err(RanobeError::ConfigError(format!("Unknown site format: {}", other))),
        }
    }
}

/// A volume of the chapter listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingVolume {
    pub number: u32,
    pub chapters: Vec<ListingChapter>,
}

/// A chapter of the chapter listing, before its name is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingChapter {
    pub id: u64,
    pub slug: String,
    /// Display name such as `Том 2 Глава 5 - Буря`.
    pub name: String,
}

/// An entry of the recent updates feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub slug: String,
    /// Raw timestamp as served, parsed by [`SiteAdapter::parse_timestamp`].
    pub published: String,
}

/// Format-specific rules of one site generation.
pub trait SiteAdapter: Send + Sync {
    fn format(&self) -> SiteFormat;

    fn title_url(&self, slug: &str) -> String;

    fn listing_url(&self, title_id: u64) -> String;

    fn chapter_url(&self, title: &Title, chapter: &Chapter) -> String;

    /// Media API endpoint resolving `media_id` to a file URL.
    fn media_url(&self, media_id: &str) -> String;

    fn catalog_url(&self, page: u32, filters: Option<&str>) -> String;

    fn updates_url(&self, page: u32) -> String;

    /// Lists holding a chapter's footnotes.
    fn footnote_lists(&self) -> &Selector;

    /// Attribute of `img` tags carrying the media ID.
    fn media_id_attr(&self) -> &'static str;

    /// Whether a paragraph is split into several at each `br`.
    fn splits_line_breaks(&self) -> bool;

    /// Fills `title` from the title endpoint's body.
    ///
    /// Missing or unrecognized fields are reported, not returned as errors;
    /// an error means the body itself could not be read.
    fn extract_metadata(&self, body: &str, title: &mut Title, pretty: bool, reporter: &dyn Reporter) -> Result<()>;

    fn parse_listing(&self, body: &str) -> Result<Vec<ListingVolume>>;

    /// Markup of the chapter's content container, `None` when the page has
    /// no such container.
    fn chapter_fragment(&self, body: &str, chapter: &Chapter) -> Result<Option<String>>;

    /// File URL from the media endpoint's body.
    fn parse_media(&self, body: &str) -> Option<String>;

    /// Title slugs of one catalog page.
    fn parse_catalog(&self, body: &str) -> Result<Vec<String>>;

    fn parse_updates(&self, body: &str) -> Result<Vec<FeedEntry>>;

    fn parse_timestamp(&self, raw: &str) -> Option<OffsetDateTime>;
}

/// Builds the adapter for `format` serving `site`.
pub fn adapter_for(format: SiteFormat, site: &str) -> Result<Box<dyn SiteAdapter>> {
    Ok(match format {
        SiteFormat::Legacy => Box::new(LegacyAdapter::new(site)?),
        SiteFormat::Modern => Box::new(ModernAdapter::new(site)?),
    })
}

/// Appends `&filters` to a catalog URL, tolerating a leading `&` or `?`.
fn with_filters(mut url: String, filters: Option<&str>) -> String {
    if let Some(filters) = filters.map(|f| f.trim_start_matches(['&', '?'])).filter(|f| !f.is_empty()) {
        url.push('&');
        url.push_str(filters);
    }
    url
}
