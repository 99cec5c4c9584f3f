//! Title parsing orchestration.
//!
//! A run goes title page → chapter listing → chapter pages → media
//! endpoints, one request at a time, with the configured delay between
//! chapter pages.

use std::sync::Arc;

use url::Url;

use crate::chapters::enumerate_chapters;
use crate::content::{ContentElement, Image};
use crate::convert::convert_chapter;
use crate::fetch::{Requestor, get_ok};
use crate::report::Reporter;
use crate::settings::Settings;
use crate::site::{SiteAdapter, adapter_for};
use crate::title::{Branch, Chapter, Title};
use crate::{RanobeError, Result};

/// Parses titles of one site with one set of settings.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use ranobe_core::{HttpRequestor, Settings, TitleParser, TracingReporter};
///
/// # async fn run() -> ranobe_core::Result<()> {
/// let settings = Settings::default();
/// let requestor = HttpRequestor::new(&settings.fetch_config())?;
/// let parser = TitleParser::new(requestor, settings, Arc::new(TracingReporter))?;
///
/// let title = parser.parse_full("7045-solo-leveling", true).await?;
/// println!("{} chapters", title.chapters_count());
/// # Ok(())
/// # }
/// ```
pub struct TitleParser<R: Requestor> {
    requestor: R,
    adapter: Box<dyn SiteAdapter>,
    reporter: Arc<dyn Reporter>,
    settings: Settings,
}

impl<R: Requestor> TitleParser<R> {
    /// Creates a parser using the adapter selected by `settings.format`.
    pub fn new(requestor: R, settings: Settings, reporter: Arc<dyn Reporter>) -> Result<Self> {
        let adapter = adapter_for(settings.format, &settings.site)?;
        Ok(Self { requestor, adapter, reporter, settings })
    }

    pub fn adapter(&self) -> &dyn SiteAdapter {
        self.adapter.as_ref()
    }

    pub fn requestor(&self) -> &R {
        &self.requestor
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Requests the title page and extracts metadata.
    ///
    /// # Errors
    ///
    /// [`RanobeError::InvalidSlug`] for a slug without numeric ID and
    /// [`RanobeError::Request`] when the title page cannot be loaded.
    pub async fn parse(&self, slug: &str) -> Result<Title> {
        let mut title = Title::from_slug(slug)?;
        let url = self.adapter.title_url(slug);

        let response = get_ok(&self.requestor, &url, self.reporter.as_ref(), "Unable to request title data.").await?;
        self.adapter.extract_metadata(&response.text, &mut title, self.settings.pretty, self.reporter.as_ref())?;

        tracing::info!(slug, name = ?title.localized_name, "title parsed");
        Ok(title)
    }

    /// Fills the title's branch from its chapter listing.
    pub async fn enumerate(&self, title: &mut Title) -> Result<()> {
        enumerate_chapters(&self.requestor, self.adapter.as_ref(), title, self.reporter.as_ref()).await
    }

    /// Requests a chapter page and converts its content.
    ///
    /// A page without the chapter's container is reported through
    /// [`Reporter::chapter_not_found`] and leaves the chapter empty.
    pub async fn amend(&self, title: &Title, chapter: &mut Chapter) -> Result<()> {
        let url = self.adapter.chapter_url(title, chapter);
        let response = get_ok(&self.requestor, &url, self.reporter.as_ref(), "Unable to request chapter.").await?;

        let Some(fragment) = self.adapter.chapter_fragment(&response.text, chapter)? else {
            self.reporter.chapter_not_found(chapter);
            return Ok(());
        };

        let base_url = Url::parse(&url).ok();
        let mut content = convert_chapter(&fragment, self.adapter.as_ref(), base_url.as_ref(), self.reporter.as_ref())?;
        self.resolve_images(&mut content).await;

        tracing::debug!(chapter = chapter.id, elements = content.len(), "chapter amended");
        chapter.content = content;
        Ok(())
    }

    /// Amends every chapter that has no content yet, sleeping the configured
    /// delay between chapters. Returns the number of chapters amended.
    ///
    /// A chapter referencing an undefined footnote is reported and left
    /// empty; transport errors stop the run.
    pub async fn amend_all(&self, title: &mut Title) -> Result<usize> {
        let mut branches = std::mem::take(&mut title.branches);
        let result = self.amend_branches(title, &mut branches).await;
        title.branches = branches;
        result
    }

    async fn amend_branches(&self, title: &Title, branches: &mut [Branch]) -> Result<usize> {
        let mut amended = 0;
        let mut first = true;

        for chapter in branches.iter_mut().flat_map(|b| b.chapters.iter_mut()) {
            if chapter.is_amended() {
                continue;
            }

            if !first {
                tokio::time::sleep(self.settings.delay()).await;
            }
            first = false;

            match self.amend(title, chapter).await {
                Ok(()) if chapter.is_amended() => amended += 1,
                Ok(()) => {}
                Err(RanobeError::MissingFootnote { id }) => self
                    .reporter
                    .warning(&format!("Chapter {} references undefined footnote \"{}\".", chapter.id, id)),
                Err(e) => return Err(e),
            }
        }

        tracing::info!(title = title.id, amended, "chapters amended");
        Ok(amended)
    }

    /// Converts one chapter of a saved title again, replacing its content.
    ///
    /// # Errors
    ///
    /// [`RanobeError::MissingData`] when no branch holds `chapter_id`; the
    /// chapter page is not requested in that case.
    pub async fn repair(&self, title: &mut Title, chapter_id: u64) -> Result<()> {
        let Some(mut chapter) =
            title.branches.iter().flat_map(|b| &b.chapters).find(|c| c.id == chapter_id).cloned()
        else {
            return Err(RanobeError::MissingData(format!("chapter {} in title {}", chapter_id, title.slug)));
        };

        chapter.content.clear();
        self.amend(title, &mut chapter).await?;

        if let Some(slot) = title.branches.iter_mut().find_map(|b| b.chapter_mut(chapter_id)) {
            *slot = chapter;
        }
        tracing::info!(title = title.id, chapter = chapter_id, "chapter repaired");
        Ok(())
    }

    /// Replaces media endpoint URLs with final file URLs.
    ///
    /// Failures keep the endpoint URL and are reported as warnings.
    pub async fn resolve_images(&self, elements: &mut [ContentElement]) {
        for element in elements.iter_mut() {
            for image in element.images_mut() {
                self.resolve_image(image).await;
            }
        }
    }

    async fn resolve_image(&self, image: &mut Image) {
        if image.media_id.is_none() {
            return;
        }

        match self.requestor.get(&image.url).await {
            Ok(response) if response.ok() => match self.adapter.parse_media(&response.text) {
                Some(url) => image.url = url,
                None => self.reporter.warning(&format!("Unable to read media response: {}", image.url)),
            },
            Ok(response) => {
                self.reporter.warning(&format!("Unable to resolve image (status {}): {}", response.status, image.url))
            }
            Err(e) => self.reporter.warning(&format!("Unable to resolve image {}: {}", image.url, e)),
        }
    }

    /// Parses a title, enumerates its chapters and, when `amend` is set,
    /// converts every chapter.
    pub async fn parse_full(&self, slug: &str, amend: bool) -> Result<Title> {
        let mut title = self.parse(slug).await?;
        self.enumerate(&mut title).await?;

        if amend {
            self.amend_all(&mut title).await?;
        }

        Ok(title)
    }
}
