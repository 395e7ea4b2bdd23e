use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use scraper::Html;

static DOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:date\s+of\s+birth|dob)\s*:?\s*(\d{1,2})/(\d{1,2})/(\d{4})").unwrap()
});
static YOB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\byear\s+of\s+birth\s*:?\s*(\d{4})\b").unwrap());

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Birth {
    pub year: Option<i32>,
    pub date: Option<NaiveDate>,
}

/// Visible text of a page, whitespace collapsed.
pub fn page_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut text = String::with_capacity(html.len() / 4);
    for chunk in doc.root_element().text().flat_map(str::split_whitespace) {
        if !text.is_empty() {
            text.push(' ');
        }
        text.push_str(chunk);
    }
    text
}

/// Birth data printed on a case summary, if any.
pub fn extract_birth(docket: &str) -> Birth {
    let text = page_text(docket);

    let date = DOB.captures(&text).and_then(|c| {
        let month = c.get(1)?.as_str().parse().ok()?;
        let day = c.get(2)?.as_str().parse().ok()?;
        let year = c.get(3)?.as_str().parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    });
    let year = date.map(|d| d.year()).or_else(|| {
        YOB.captures(&text)
            .and_then(|c| c.get(1)?.as_str().parse().ok())
    });

    if date.is_none() && year.is_none() {
        tracing::debug!(target: "extract", "no birth data in {} bytes", docket.len());
    }
    Birth { year, date }
}
