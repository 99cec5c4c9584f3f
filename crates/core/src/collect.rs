//! Catalog and recent updates collection.
//!
//! Both feeds are paginated; pages are requested one after another with the
//! configured delay between them.

use std::time::Duration;

use time::OffsetDateTime;

use crate::Result;
use crate::fetch::{Requestor, get_ok};
use crate::report::Reporter;
use crate::site::SiteAdapter;

/// Gathers title slugs from the catalog or the updates feed.
pub struct Collector<'a, R: Requestor> {
    requestor: &'a R,
    adapter: &'a dyn SiteAdapter,
    reporter: &'a dyn Reporter,
    delay: Duration,
    page_limit: Option<u32>,
}

impl<'a, R: Requestor> Collector<'a, R> {
    pub fn new(requestor: &'a R, adapter: &'a dyn SiteAdapter, reporter: &'a dyn Reporter) -> Self {
        Self { requestor, adapter, reporter, delay: Duration::ZERO, page_limit: None }
    }

    /// Pause between two page requests.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Maximum number of pages to request; `None` walks until exhaustion.
    pub fn with_page_limit(mut self, page_limit: Option<u32>) -> Self {
        self.page_limit = page_limit;
        self
    }

    /// Collects catalog slugs, optionally narrowed by a filter query string.
    ///
    /// Stops at the first empty page or at the page limit.
    pub async fn collect(&self, filters: Option<&str>) -> Result<Vec<String>> {
        let mut slugs = Vec::new();
        let mut page = 1;

        while self.within_limit(page) {
            self.pause(page).await;

            let url = self.adapter.catalog_url(page, filters);
            let response = get_ok(self.requestor, &url, self.reporter, "Unable to request catalog page.").await?;
            let entries = self.adapter.parse_catalog(&response.text)?;
            self.reporter.collect_progress_by_page(page);

            if entries.is_empty() {
                break;
            }

            for slug in entries {
                push_unique(&mut slugs, slug);
            }
            page += 1;
        }

        tracing::info!(count = slugs.len(), pages = page, "catalog collected");
        Ok(slugs)
    }

    /// Collects slugs updated within the last `hours`.
    pub async fn updates(&self, hours: u32) -> Result<Vec<String>> {
        self.updates_at(hours, OffsetDateTime::now_utc()).await
    }

    /// Collects slugs updated within `hours` before `now`.
    ///
    /// The feed is newest first, so the first entry older than the window
    /// ends the walk. Entries with unreadable timestamps are skipped.
    pub async fn updates_at(&self, hours: u32, now: OffsetDateTime) -> Result<Vec<String>> {
        let cutoff = now - time::Duration::hours(i64::from(hours));
        let mut slugs = Vec::new();
        let mut page = 1;

        'pages: while self.within_limit(page) {
            self.pause(page).await;

            let url = self.adapter.updates_url(page);
            let response = get_ok(self.requestor, &url, self.reporter, "Unable to request updates page.").await?;
            let entries = self.adapter.parse_updates(&response.text)?;
            self.reporter.collect_progress_by_page(page);

            if entries.is_empty() {
                break;
            }

            for entry in entries {
                let Some(published) = self.adapter.parse_timestamp(&entry.published) else {
                    self.reporter.warning(&format!("Unable to parse update time: \"{}\".", entry.published));
                    continue;
                };

                if published < cutoff {
                    break 'pages;
                }

                push_unique(&mut slugs, entry.slug);
            }
            page += 1;
        }

        tracing::info!(count = slugs.len(), hours, "updates collected");
        Ok(slugs)
    }

    fn within_limit(&self, page: u32) -> bool {
        self.page_limit.is_none_or(|limit| page <= limit)
    }

    async fn pause(&self, page: u32) {
        if page > 1 && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

fn push_unique(slugs: &mut Vec<String>, slug: String) {
    if !slugs.contains(&slug) {
        slugs.push(slug);
    }
}
