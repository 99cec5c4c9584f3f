//! Chapter enumeration.

use crate::Result;
use crate::fetch::{Requestor, get_ok};
use crate::header::parse_chapter_header;
use crate::report::Reporter;
use crate::site::{ListingVolume, SiteAdapter};
use crate::title::{Branch, Chapter, Title};

/// Builds the branch of a title from its chapter listing.
///
/// Chapters keep listing order. A volume named in the chapter's display
/// name wins over the listing volume.
pub fn branch_from_listing(title_id: u64, volumes: Vec<ListingVolume>) -> Branch {
    let mut branch = Branch::new(title_id);

    for volume in volumes {
        for entry in volume.chapters {
            let header = parse_chapter_header(&entry.name);
            branch.add_chapter(Chapter {
                id: entry.id,
                slug: entry.slug,
                volume: header.volume.unwrap_or(volume.number),
                number: header.number,
                name: header.name,
                kind: header.kind,
                content: Vec::new(),
            });
        }
    }

    branch
}

/// Requests the listing of `title` and replaces its branches with the result.
pub async fn enumerate_chapters<R: Requestor>(
    requestor: &R, adapter: &dyn SiteAdapter, title: &mut Title, reporter: &dyn Reporter,
) -> Result<()> {
    let url = adapter.listing_url(title.id);
    let response = get_ok(requestor, &url, reporter, "Unable to request chapters list.").await?;
    let volumes = adapter.parse_listing(&response.text)?;

    let branch = branch_from_listing(title.id, volumes);
    tracing::debug!(title = title.id, chapters = branch.chapters.len(), "chapters enumerated");
    title.branches = vec![branch];

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RanobeError;
    use crate::fetch::MemoryRequestor;
    use crate::report::Recorder;
    use crate::site::{LegacyAdapter, ListingChapter};
    use crate::title::ChapterType;

    fn entry(id: u64, name: &str) -> ListingChapter {
        ListingChapter { id, slug: format!("c{id}"), name: name.to_string() }
    }

    #[test]
    fn test_branch_keeps_order_and_overrides_volume() {
        let volumes = vec![
            ListingVolume { number: 1, chapters: vec![entry(1, "Пролог"), entry(2, "Глава 1 - Начало")] },
            ListingVolume { number: 2, chapters: vec![entry(3, "Том 5 Глава 2"), entry(2, "Глава 1 - Начало")] },
        ];

        let branch = branch_from_listing(7, volumes);
        assert_eq!(branch.id, 7);
        let ids: Vec<u64> = branch.chapters.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 2]);
        assert_eq!(branch.chapters[0].kind, ChapterType::Prologue);
        assert_eq!(branch.chapters[1].name.as_deref(), Some("Начало"));
        assert_eq!(branch.chapters[2].volume, 5);
        assert_eq!(branch.chapters[3].volume, 2);
    }

    #[tokio::test]
    async fn test_enumerate_chapters() {
        let adapter = LegacyAdapter::new("ranobelib.me").unwrap();
        let requestor = MemoryRequestor::new().with(
            "https://ranobelib.me/api/ranobe/12/contents",
            r#"{"volumes": [{"number": 1, "chapters": [{"id": 40, "slug": "v1/c1", "title": "Глава 1"}]}]}"#,
        );
        let mut title = Title::from_slug("12-novel").unwrap();

        enumerate_chapters(&requestor, &adapter, &mut title, &Recorder::default()).await.unwrap();

        assert_eq!(title.branches.len(), 1);
        assert_eq!(title.chapters_count(), 1);
        assert_eq!(title.branches[0].chapters[0].number.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_enumerate_reports_transport_failure() {
        let adapter = LegacyAdapter::new("ranobelib.me").unwrap();
        let requestor = MemoryRequestor::new();
        let recorder = Recorder::default();
        let mut title = Title::from_slug("12-novel").unwrap();

        let result = enumerate_chapters(&requestor, &adapter, &mut title, &recorder).await;

        assert!(matches!(result, Err(RanobeError::Request { status: 404, .. })));
        assert_eq!(recorder.request_errors().len(), 1);
        assert!(title.branches.is_empty());
    }
}
