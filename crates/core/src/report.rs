//! Warning, error and progress reporting.
//!
//! Parsing degrades field by field: instead of failing, extractors tell a
//! [`Reporter`] what they could not find. [`TracingReporter`] forwards to
//! `tracing`; [`Recorder`] keeps messages in memory.

use std::sync::Mutex;

use crate::fetch::Response;
use crate::title::Chapter;

/// Sink for recoverable problems and progress events.
pub trait Reporter: Send + Sync {
    /// A field or structure could not be extracted.
    fn warning(&self, message: &str);

    /// A request returned a non-success status.
    fn request_error(&self, response: &Response, message: &str);

    /// The chapter page did not contain the chapter's content container.
    fn chapter_not_found(&self, chapter: &Chapter);

    /// The collector finished requesting page `page`.
    fn collect_progress_by_page(&self, page: u32);
}

/// Reporter that emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn warning(&self, message: &str) {
        tracing::warn!("{message}");
    }

    fn request_error(&self, response: &Response, message: &str) {
        tracing::error!(status = response.status, url = %response.url, "{message}");
    }

    fn chapter_not_found(&self, chapter: &Chapter) {
        tracing::warn!(chapter = chapter.id, slug = %chapter.slug, "chapter content not found");
    }

    fn collect_progress_by_page(&self, page: u32) {
        tracing::info!(page, "collected page");
    }
}

/// Reporter that records everything it receives.
#[derive(Debug, Default)]
pub struct Recorder {
    warnings: Mutex<Vec<String>>,
    request_errors: Mutex<Vec<(u16, String)>>,
    missing_chapters: Mutex<Vec<u64>>,
    pages: Mutex<Vec<u32>>,
}

impl Recorder {
    pub fn warnings(&self) -> Vec<String> {
        lock(&self.warnings).clone()
    }

    /// Status and message of every reported request error.
    pub fn request_errors(&self) -> Vec<(u16, String)> {
        lock(&self.request_errors).clone()
    }

    /// IDs of chapters reported as not found.
    pub fn missing_chapters(&self) -> Vec<u64> {
        lock(&self.missing_chapters).clone()
    }

    pub fn pages(&self) -> Vec<u32> {
        lock(&self.pages).clone()
    }
}

impl Reporter for Recorder {
    fn warning(&self, message: &str) {
        lock(&self.warnings).push(message.to_string());
    }

    fn request_error(&self, response: &Response, message: &str) {
        lock(&self.request_errors).push((response.status, message.to_string()));
    }

    fn chapter_not_found(&self, chapter: &Chapter) {
        lock(&self.missing_chapters).push(chapter.id);
    }

    fn collect_progress_by_page(&self, page: u32) {
        lock(&self.pages).push(page);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recorder_keeps_order() {
        let recorder = Recorder::default();
        recorder.warning("first");
        recorder.warning("second");
        recorder.collect_progress_by_page(1);
        recorder.collect_progress_by_page(2);

        assert_eq!(recorder.warnings(), vec!["first", "second"]);
        assert_eq!(recorder.pages(), vec![1, 2]);
    }

    #[test]
    fn test_recorder_request_errors_and_chapters() {
        let recorder = Recorder::default();
        let response = Response::new("https://example.com/x", 503, "");
        recorder.request_error(&response, "Unable to load title page.");
        recorder.chapter_not_found(&Chapter { id: 9, ..Default::default() });

        assert_eq!(recorder.request_errors(), vec![(503, "Unable to load title page.".to_string())]);
        assert_eq!(recorder.missing_chapters(), vec![9]);
    }
}
