pub mod json;
pub mod markdown;

pub use json::{content_to_json, title_from_json, title_to_json};
pub use markdown::{MarkdownConfig, chapter_heading, chapter_to_markdown, content_to_markdown};
