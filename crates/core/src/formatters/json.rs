use serde::Serialize;

use crate::Result;
use crate::content::ContentElement;
use crate::title::Title;

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    if pretty { Ok(serde_json::to_string_pretty(value)?) } else { Ok(serde_json::to_string(value)?) }
}

/// Serializes a parsed title with its branches and chapter content.
pub fn title_to_json(title: &Title, pretty: bool) -> Result<String> {
    to_json(title, pretty)
}

/// Reads a title previously written by [`title_to_json`].
pub fn title_from_json(json: &str) -> Result<Title> {
    Ok(serde_json::from_str(json)?)
}

/// Serializes converted chapter content.
pub fn content_to_json(elements: &[ContentElement], pretty: bool) -> Result<String> {
    to_json(elements, pretty)
}
