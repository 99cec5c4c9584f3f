use std::sync::LazyLock;

use regex::Regex;
use url::Url;

static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Configuration for chapter fragment preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to remove script, style, noscript and iframe tags
    pub remove_unwanted: bool,
    /// Whether to unwrap attribute-less div/span layout wrappers
    pub unwrap_layout: bool,
    /// Whether to collapse whitespace runs
    pub normalize_whitespace: bool,
    /// Base URL for converting relative image URLs
    pub base_url: Option<Url>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { remove_unwanted: true, unwrap_layout: true, normalize_whitespace: true, base_url: None }
    }
}

/// Clean a chapter fragment before it is parsed into blocks.
///
/// Layout wrappers carry no attributes and no meaning of their own; unwrapping
/// them lifts their children to the top level of the container where the
/// block classifier looks for content.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = COMMENT.replace_all(html, "").to_string();

    if config.remove_unwanted || config.unwrap_layout || config.base_url.is_some() {
        processed = rewrite_elements(&processed, config);
    }

    if config.normalize_whitespace {
        processed = WHITESPACE.replace_all(&processed, " ").to_string();
    }

    processed
}

fn rewrite_elements(html: &str, config: &PreprocessConfig) -> String {
    let remove_unwanted = config.remove_unwanted;
    let unwrap_layout = config.unwrap_layout;
    let base_url = config.base_url.as_ref();

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![
                lol_html::element!("script, style, noscript, iframe", move |el| {
                    if remove_unwanted {
                        el.remove();
                    }
                    Ok(())
                }),
                lol_html::element!("div, span", move |el| {
                    if unwrap_layout && el.attributes().is_empty() {
                        el.remove_and_keep_content();
                    }
                    Ok(())
                }),
                lol_html::element!("img", move |el| {
                    if let Some(base_url) = base_url {
                        for name in ["src", "data-src"] {
                            if let Some(value) = el.get_attribute(name)
                                && let Ok(absolute) = base_url.join(&value)
                            {
                                el.set_attribute(name, absolute.as_str()).ok();
                            }
                        }
                    }
                    Ok(())
                }),
            ],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    if rewriter.end().is_err() {
        return html.to_string();
    }

    if output.is_empty() { html.to_string() } else { output }
}
