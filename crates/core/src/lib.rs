pub mod blocks;
pub mod builders;
pub mod chapters;
pub mod collect;
pub mod content;
pub mod convert;
pub mod error;
pub mod fetch;
pub mod footnotes;
pub mod formatters;
pub mod header;
pub mod metadata;
pub mod parse;
pub mod parser;
pub mod preprocess;
pub mod references;
pub mod report;
pub mod settings;
pub mod site;
pub mod title;

#[doc(hidden)]
pub use blocks::{Block, BlockKind, collect_blocks};
pub use builders::{build_blockquote, build_element, build_header, build_image, build_paragraph, parse_alignment};
pub use chapters::{branch_from_listing, enumerate_chapters};
pub use collect::Collector;
pub use content::{Alignment, Blockquote, ContentElement, Footnote, Header, Image, Paragraph};
pub use convert::convert_chapter;
pub use error::{RanobeError, Result};
#[cfg(feature = "fetch")]
pub use fetch::HttpRequestor;
pub use fetch::{FetchConfig, MemoryRequestor, Requestor, Response, fetch_file, fetch_stdin, get_ok};
pub use footnotes::FootnoteIndex;
pub use formatters::{
    MarkdownConfig, chapter_heading, chapter_to_markdown, content_to_json, content_to_markdown, title_from_json,
    title_to_json,
};
pub use header::{ChapterHeader, parse_chapter_header};
pub use metadata::{apply_age_rating, language_code, status_from_label};
pub use parse::Document;
pub use parser::TitleParser;
#[doc(hidden)]
pub use preprocess::{PreprocessConfig, preprocess_html};
pub use references::{Resolved, resolve_references, resolve_segment};
pub use report::{Recorder, Reporter, TracingReporter};
pub use settings::{Settings, SettingsBuilder};
pub use site::{FeedEntry, LegacyAdapter, ListingChapter, ListingVolume, ModernAdapter, SiteAdapter, SiteFormat, adapter_for};
pub use title::{Branch, Chapter, ChapterType, Status, Title, title_id_from_slug};
