//! Title metadata extraction.
//!
//! Both page generations describe a title with the same vocabulary (Russian
//! labels for countries, statuses and age ratings) but ship it differently:
//! the legacy page renders labelled `book-meta-row` blocks, the modern API
//! returns a JSON object with an embedded HTML summary. Extraction is best
//! effort per field; anything missing or unrecognized is reported as a
//! warning and left unset.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::Document;
use crate::parse::Element;
use crate::report::Reporter;
use crate::title::{Status, Title};

/// Language of every translation hosted on the site.
pub const CONTENT_LANGUAGE: &str = "rus";

/// Data block labels of the legacy title page.
pub const GENRES_LABEL: &str = "Жанр";
pub const COUNTRY_LABEL: &str = "Страна";
pub const YEAR_LABEL: &str = "Год выпуска";
pub const STATUS_LABEL: &str = "Статус перевода";

const AGE_RATINGS: [(&str, u8); 2] = [("R-15 (Японское возрастное ограничение)", 15), ("18+", 18)];

static REPEATED_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").expect("valid newline regex"));

/// Maps a country of origin to the language code of the original work.
pub fn language_code(country: &str) -> Option<&'static str> {
    match country.trim() {
        "Китай" => Some("zho"),
        "Корея" => Some("kor"),
        "Япония" => Some("jpn"),
        "США" => Some("eng"),
        _ => None,
    }
}

/// Maps a translation status label to a [`Status`].
pub fn status_from_label(label: &str) -> Option<Status> {
    match label.trim() {
        "В процессе" => Some(Status::Ongoing),
        "Заморожено" => Some(Status::Dropped),
        "Завершено" => Some(Status::Completed),
        _ => None,
    }
}

/// Derives the age limit from rating tags.
///
/// With `pretty` enabled the rating tag is removed from `tags`, since it is
/// carried by the age limit instead.
pub fn apply_age_rating(tags: &mut Vec<String>, pretty: bool) -> Option<u8> {
    let mut age_limit = None;

    for (rating, limit) in AGE_RATINGS {
        if tags.iter().any(|tag| tag == rating) {
            if pretty {
                tags.retain(|tag| tag != rating);
            }
            age_limit = Some(limit);
        }
    }

    age_limit
}

/// Parses a publication year made of digits only.
pub fn parse_year(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) { raw.parse().ok() } else { None }
}

/// Joins paragraph texts with newlines, collapsing blank lines.
fn join_paragraphs<I: IntoIterator<Item = String>>(paragraphs: I) -> Option<String> {
    let mut description = String::new();
    for paragraph in paragraphs {
        description.push_str(paragraph.trim());
        description.push('\n');
    }

    let description = REPEATED_NEWLINES.replace_all(&description, "\n");
    let description = description.trim_matches('\n');

    if description.is_empty() { None } else { Some(description.to_string()) }
}

/// Turns a description fragment into plain text, one paragraph per line.
pub fn description_from_html(html: &str) -> Option<String> {
    let doc = Document::parse_fragment(html).ok()?;
    let paragraphs = doc.select("p").ok()?;

    if paragraphs.is_empty() {
        return join_paragraphs([doc.text_content()]);
    }

    join_paragraphs(paragraphs.iter().map(Element::text))
}

fn set_year(title: &mut Title, raw: &str, reporter: &dyn Reporter) {
    match parse_year(raw) {
        Some(year) => title.publication_year = Some(year),
        None => reporter.warning("Failed to get publication year."),
    }
}

fn set_original_language(title: &mut Title, country: &str, reporter: &dyn Reporter) {
    match language_code(country) {
        Some(code) => title.original_language = Some(code.to_string()),
        None => reporter.warning(&format!("Unknown country: \"{}\".", country)),
    }
}

fn set_status(title: &mut Title, label: &str, reporter: &dyn Reporter) {
    match status_from_label(label) {
        Some(status) => title.status = Some(status),
        None => reporter.warning(&format!("Unknown status: \"{}\".", label)),
    }
}

fn set_tags(title: &mut Title, mut tags: Vec<String>, pretty: bool) {
    if let Some(age_limit) = apply_age_rating(&mut tags, pretty) {
        title.age_limit = Some(age_limit);
    }
    title.set_tags(tags);
}

impl Document {
    /// Content of the legacy data block whose markup contains `header`,
    /// with the label itself cut off.
    pub fn data_block(&self, header: &str, reporter: &dyn Reporter) -> Option<String> {
        let Ok(Some(container)) = self.select_first("div#section-common") else {
            reporter.warning("Data container not found.");
            return None;
        };

        let blocks = container.select("div.book-meta-row").unwrap_or_default();
        if blocks.is_empty() {
            reporter.warning(&format!("No data block for header: \"{}\".", header));
            return None;
        }

        blocks.iter().find(|block| block.outer_html().contains(header)).map(|block| {
            let text = block.text();
            let text = text.trim();
            text.strip_prefix(header).unwrap_or(text).trim().to_string()
        })
    }

    /// Fills `title` from a server-rendered legacy title page.
    pub fn extract_legacy_metadata(&self, title: &mut Title, pretty: bool, reporter: &dyn Reporter) {
        title.content_language = Some(CONTENT_LANGUAGE.to_string());

        self.extract_names(title, reporter);
        self.extract_covers(title, reporter);
        self.extract_author(title);

        if let Some(year) = self.data_block(YEAR_LABEL, reporter) {
            set_year(title, &year, reporter);
        }

        title.description = self
            .select("div.book-description p")
            .ok()
            .and_then(|paragraphs| join_paragraphs(paragraphs.iter().map(Element::text)));

        if let Some(country) = self.data_block(COUNTRY_LABEL, reporter) {
            set_original_language(title, &country, reporter);
        }

        if let Some(status) = self.data_block(STATUS_LABEL, reporter) {
            set_status(title, &status, reporter);
        }

        if let Some(genres) = self.data_block(GENRES_LABEL, reporter) {
            title.set_genres(genres.split([',', '\n']).map(str::trim));
        }

        self.extract_tags(title, pretty, reporter);
    }

    fn extract_names(&self, title: &mut Title, reporter: &dyn Reporter) {
        match self.select_first("h1") {
            Ok(Some(h1)) => title.localized_name = Some(h1.text().trim().to_string()),
            _ => reporter.warning("Localized name not found."),
        }

        if let Ok(Some(h2)) = self.select_first("h2") {
            let text = h2.text();
            let mut names = text.split(" / ").map(str::trim).filter(|name| !name.is_empty());
            title.eng_name = names.next().map(str::to_string);
            title.another_names = names.map(str::to_string).collect();
        }
    }

    fn extract_author(&self, title: &mut Title) {
        if let Ok(Some(container)) = self.select_first("div.book-author") {
            let text = container.text().replace("(Автор)", "");
            if let Some(author) = text.trim().lines().next() {
                title.add_author(author);
            }
        }
    }

    fn extract_covers(&self, title: &mut Title, reporter: &dyn Reporter) {
        let covers = self.select("div.sticky div.poster-slider img").unwrap_or_default();
        if covers.is_empty() {
            reporter.warning("Covers not found.");
            return;
        }

        for cover in covers {
            if let Some(link) = cover.attr("data-src")
                && !link.ends_with("default.jpg")
            {
                title.add_cover(link);
            }
        }
    }

    fn extract_tags(&self, title: &mut Title, pretty: bool, reporter: &dyn Reporter) {
        let containers = self.select("div.book-tags").unwrap_or_default();
        let Some(container) = containers.last() else {
            reporter.warning("Tags container not found.");
            return;
        };

        let links = match container.select_first("div.__spoiler_new.display-none") {
            Ok(Some(spoiler)) => spoiler.select("a"),
            _ => container.select("a"),
        }
        .unwrap_or_default();

        let tags = links.iter().map(|link| link.text().trim().to_string()).collect();
        set_tags(title, tags, pretty);
    }
}

/// Names listed under `key`, either plain strings or objects with `name`.
fn names(data: &Value, key: &str) -> Vec<String> {
    data.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().or_else(|| item.get("name").and_then(Value::as_str)))
                .map(|name| name.trim().to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn string<'v>(data: &'v Value, key: &str) -> Option<&'v str> {
    data.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

/// Fills `title` from the `data` object of the modern title endpoint.
pub fn extract_modern_metadata(data: &Value, title: &mut Title, pretty: bool, reporter: &dyn Reporter) {
    title.content_language = Some(CONTENT_LANGUAGE.to_string());

    match string(data, "name") {
        Some(name) => title.localized_name = Some(name.to_string()),
        None => reporter.warning("Localized name not found."),
    }
    title.eng_name = string(data, "eng_name").map(str::to_string);
    title.another_names = names(data, "other_names");

    for author in names(data, "authors") {
        title.add_author(&author);
    }

    if let Some(covers) = data.get("covers").and_then(Value::as_array) {
        for url in covers.iter().filter_map(|cover| cover.get("url").and_then(Value::as_str)) {
            if !url.ends_with("default.jpg") {
                title.add_cover(url);
            }
        }
    } else {
        reporter.warning("Covers not found.");
    }

    title.description = string(data, "summary").and_then(description_from_html);

    match data.get("release_year") {
        Some(Value::Number(year)) => match year.as_i64().and_then(|y| i32::try_from(y).ok()) {
            Some(year) => title.publication_year = Some(year),
            None => reporter.warning("Failed to get publication year."),
        },
        Some(Value::String(year)) => set_year(title, year, reporter),
        _ => {}
    }

    if let Some(country) = string(data, "country") {
        set_original_language(title, country, reporter);
    }

    match data.get("status").and_then(|status| status.get("label")).and_then(Value::as_str) {
        Some(label) => set_status(title, label, reporter),
        None => reporter.warning("Status not found."),
    }

    title.set_genres(names(data, "genres"));
    set_tags(title, names(data, "tags"), pretty);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Recorder;
    use rstest::rstest;
    use serde_json::json;

    const LEGACY_PAGE: &str = r#"
        <html><body>
            <div class="sticky"><div class="poster-slider">
                <img data-src="https://cdn.example.com/covers/1.jpg">
                <img data-src="https://cdn.example.com/covers/default.jpg">
            </div></div>
            <h1>Поднятие уровня в одиночку</h1>
            <h2>Solo Leveling / Na Honjaman Level Up / 나 혼자만 레벨업</h2>
            <div class="book-author">Чугон (Автор)
                Другая строка</div>
            <div class="book-description"><p>Первый абзац.</p><p></p><p>Второй абзац.</p></div>
            <div id="section-common">
                <div class="book-meta-row"><span>Страна</span> Корея</div>
                <div class="book-meta-row"><span>Год выпуска</span> 2016</div>
                <div class="book-meta-row"><span>Статус перевода</span> Завершено</div>
                <div class="book-meta-row"><span>Жанр</span> Боевик, Боевые искусства,
                    Фэнтези</div>
            </div>
            <div class="book-tags"><a>Old</a></div>
            <div class="book-tags">
                <a>Подземелья</a>
                <div class="__spoiler_new display-none"><a>Подземелья</a><a>18+</a><a>Система</a></div>
            </div>
        </body></html>
    "#;

    #[rstest]
    #[case("Китай", Some("zho"))]
    #[case("Корея", Some("kor"))]
    #[case("Япония", Some("jpn"))]
    #[case("США", Some("eng"))]
    #[case("Франция", None)]
    fn test_language_code(#[case] country: &str, #[case] expected: Option<&str>) {
        assert_eq!(language_code(country), expected);
    }

    #[rstest]
    #[case("В процессе", Some(Status::Ongoing))]
    #[case("Заморожено", Some(Status::Dropped))]
    #[case("Завершено", Some(Status::Completed))]
    #[case("Анонс", None)]
    fn test_status_from_label(#[case] label: &str, #[case] expected: Option<Status>) {
        assert_eq!(status_from_label(label), expected);
    }

    #[test]
    fn test_age_rating_pretty_removes_tag() {
        let mut tags = vec!["Магия".to_string(), "18+".to_string()];
        assert_eq!(apply_age_rating(&mut tags, true), Some(18));
        assert_eq!(tags, vec!["Магия"]);
    }

    #[test]
    fn test_age_rating_plain_keeps_tag() {
        let mut tags = vec!["Магия".to_string(), "18+".to_string()];
        assert_eq!(apply_age_rating(&mut tags, false), Some(18));
        assert_eq!(tags, vec!["Магия", "18+"]);
    }

    #[test]
    fn test_age_rating_r15() {
        let mut tags = vec!["R-15 (Японское возрастное ограничение)".to_string()];
        assert_eq!(apply_age_rating(&mut tags, true), Some(15));
        assert!(tags.is_empty());
        assert_eq!(apply_age_rating(&mut vec!["Драма".to_string()], true), None);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year(" 2016 "), Some(2016));
        assert_eq!(parse_year("2016 г."), None);
        assert_eq!(parse_year(""), None);
    }

    #[test]
    fn test_legacy_metadata() {
        let doc = Document::parse(LEGACY_PAGE).unwrap();
        let recorder = Recorder::default();
        let mut title = Title::from_slug("7045-solo-leveling").unwrap();

        doc.extract_legacy_metadata(&mut title, true, &recorder);

        assert_eq!(title.localized_name.as_deref(), Some("Поднятие уровня в одиночку"));
        assert_eq!(title.eng_name.as_deref(), Some("Solo Leveling"));
        assert_eq!(title.another_names, vec!["Na Honjaman Level Up", "나 혼자만 레벨업"]);
        assert_eq!(title.authors, vec!["Чугон"]);
        assert_eq!(title.covers, vec!["https://cdn.example.com/covers/1.jpg"]);
        assert_eq!(title.description.as_deref(), Some("Первый абзац.\nВторой абзац."));
        assert_eq!(title.original_language.as_deref(), Some("kor"));
        assert_eq!(title.publication_year, Some(2016));
        assert_eq!(title.status, Some(Status::Completed));
        assert_eq!(title.genres, vec!["Боевик", "Боевые искусства", "Фэнтези"]);
        assert_eq!(title.tags, vec!["Подземелья", "Система"]);
        assert_eq!(title.age_limit, Some(18));
        assert_eq!(title.content_language.as_deref(), Some("rus"));
        assert!(recorder.warnings().is_empty(), "{:?}", recorder.warnings());
    }

    #[test]
    fn test_legacy_unknown_fields_degrade() {
        let html = r#"<h1>T</h1><div id="section-common">
            <div class="book-meta-row">Страна Атлантида</div>
            <div class="book-meta-row">Год выпуска около 2000</div>
            <div class="book-meta-row">Статус перевода Анонс</div></div>"#;
        let doc = Document::parse(html).unwrap();
        let recorder = Recorder::default();
        let mut title = Title::default();

        doc.extract_legacy_metadata(&mut title, false, &recorder);

        assert!(title.original_language.is_none());
        assert!(title.publication_year.is_none());
        assert!(title.status.is_none());
        let warnings = recorder.warnings();
        assert!(warnings.iter().any(|w| w.contains("publication year")));
        assert!(warnings.iter().any(|w| w.contains("Анонс")));
        assert!(warnings.iter().any(|w| w.contains("Атлантида")));
    }

    #[test]
    fn test_missing_data_container_is_warned() {
        let doc = Document::parse("<h1>T</h1>").unwrap();
        let recorder = Recorder::default();
        assert!(doc.data_block(YEAR_LABEL, &recorder).is_none());
        assert_eq!(recorder.warnings(), vec!["Data container not found."]);
    }

    #[test]
    fn test_modern_metadata() {
        let data = json!({
            "name": "Реинкарнация безработного",
            "eng_name": "Mushoku Tensei",
            "other_names": ["無職転生"],
            "authors": [{"name": "Rifujin na Magonote"}],
            "summary": "<p>Первый.</p><p>Второй.</p>",
            "country": "Япония",
            "release_year": 2014,
            "status": {"label": "В процессе"},
            "genres": [{"name": "Исекай"}, {"name": "Фэнтези"}],
            "tags": [{"name": "Магия"}, {"name": "R-15 (Японское возрастное ограничение)"}],
            "covers": [{"url": "https://cdn.example.com/a.jpg"}]
        });
        let recorder = Recorder::default();
        let mut title = Title::default();

        extract_modern_metadata(&data, &mut title, false, &recorder);

        assert_eq!(title.localized_name.as_deref(), Some("Реинкарнация безработного"));
        assert_eq!(title.another_names, vec!["無職転生"]);
        assert_eq!(title.authors, vec!["Rifujin na Magonote"]);
        assert_eq!(title.description.as_deref(), Some("Первый.\nВторой."));
        assert_eq!(title.original_language.as_deref(), Some("jpn"));
        assert_eq!(title.publication_year, Some(2014));
        assert_eq!(title.status, Some(Status::Ongoing));
        assert_eq!(title.genres, vec!["Исекай", "Фэнтези"]);
        assert_eq!(title.tags.len(), 2);
        assert_eq!(title.age_limit, Some(15));
        assert!(recorder.warnings().is_empty(), "{:?}", recorder.warnings());
    }

    #[test]
    fn test_modern_unknown_status_degrades_like_legacy() {
        let data = json!({"name": "T", "covers": [], "status": {"label": "Лицензировано"}, "release_year": "скоро"});
        let recorder = Recorder::default();
        let mut title = Title::default();

        extract_modern_metadata(&data, &mut title, true, &recorder);

        assert!(title.status.is_none());
        assert!(title.publication_year.is_none());
        assert_eq!(recorder.warnings().len(), 2);
    }

    #[test]
    fn test_description_without_paragraphs() {
        assert_eq!(description_from_html("Просто текст"), Some("Просто текст".to_string()));
        assert_eq!(description_from_html("<p> </p>"), None);
    }
}
