use std::{ffi::OsStr, sync::Arc, time::Duration};

use compact_str::CompactString;
use headless_chrome::{Browser, LaunchOptions, Tab, browser::tab::NoElementFound, util::Timeout};
use serde_json::Value;
use tokio::task::spawn_blocking;

use super::DocketFetcher;
use crate::{case::CaseIdentifier, config::CountyTable, error::FetchError};

pub fn puppeteer(headless: bool, idle: Duration) -> anyhow::Result<Browser> {
    Browser::new(LaunchOptions {
        args: vec![OsStr::new("--disable-blink-features=AutomationControlled")],
        headless,
        idle_browser_timeout: idle,
        ..LaunchOptions::default()
    })
}

/// A fresh tab, with every other tab of `browser` closed.
#[allow(clippy::significant_drop_tightening)]
pub fn first_tab(browser: &Browser) -> anyhow::Result<Arc<Tab>> {
    let tab = browser.new_tab()?;

    {
        let tabs_guard = browser
            .get_tabs()
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        for remain in &*tabs_guard {
            if !Arc::ptr_eq(&tab, remain) {
                remain.close(true)?;
            }
        }
    }

    Ok(tab)
}

/// Expression that sets a form control and fires the events the page listens to.
/// `<select>` options match on `value` or on their label being `label`.
fn set_control_js(selector: &str, value: &str, label: &str) -> String {
    let selector = Value::from(selector);
    let value = Value::from(value);
    let label = Value::from(label);
    format!(
        "(() => {{\
            const el = document.querySelector({selector});\
            if (!el) return false;\
            if (el.tagName === 'SELECT') {{\
                const opt = [...el.options].find(o => o.value === {value} || o.text.trim() === {label});\
                if (!opt) return false;\
                el.value = opt.value;\
            }} else {{\
                el.value = {value};\
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));\
            }}\
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));\
            return true;\
        }})()"
    )
}

fn set_control(tab: &Tab, selector: &str, value: &str, label: &str) -> anyhow::Result<()> {
    let ret = tab.evaluate(&set_control_js(selector, value, label), false)?;
    match ret.value {
        Some(Value::Bool(true)) => Ok(()),
        _ => anyhow::bail!("cannot set {selector} to {value:?}"),
    }
}

/// Fills the case search form for one identifier and returns the resulting page.
fn search(tab: &Tab, url: &str, form: &SearchForm) -> anyhow::Result<String> {
    tab.navigate_to(url)?.wait_until_navigated()?;

    set_control(tab, "#court_type", &form.court_type, &form.court_type)?;
    set_control(tab, "#county_num", &form.county_code, &form.county)?;
    set_control(tab, "#case_type", &form.case_type, &form.case_type)?;
    set_control(tab, "#case_year", &form.year, &form.year)?;
    set_control(tab, "#case_id", &form.number, &form.number)?;

    tab.find_element("#search")?.click()?;
    tab.wait_until_navigated()?;
    tab.get_content()
}

struct SearchForm {
    court_type: CompactString,
    county_code: CompactString,
    /// Label of the county option, e.g. `Douglas`.
    county: CompactString,
    case_type: CompactString,
    year: CompactString,
    number: CompactString,
}

impl SearchForm {
    fn new(id: &CaseIdentifier, counties: &CountyTable) -> Self {
        Self {
            court_type: id.court_type.token().into(),
            county_code: id.county_code.clone(),
            county: id.county(counties).into(),
            case_type: id.category.token().into(),
            year: id.year_suffix(),
            number: id.padded_number(),
        }
    }
}

fn classify(err: anyhow::Error) -> FetchError {
    if err.is::<Timeout>() {
        FetchError::Timeout
    } else if err.is::<NoElementFound>() {
        FetchError::Unavailable(format!("search form incomplete: {err}"))
    } else {
        FetchError::Unavailable(err.to_string())
    }
}

/// Case search through one browser session. Keep it to one fetch at a time:
/// the search page keeps state per session.
pub struct ChromeFetcher {
    _browser: Browser,
    tab: Arc<Tab>,
    url: Arc<str>,
    counties: CountyTable,
}

impl ChromeFetcher {
    pub fn new(browser: Browser, url: &str, counties: CountyTable, timeout: Duration) -> anyhow::Result<Self> {
        let tab = first_tab(&browser)?;
        tab.set_default_timeout(timeout);
        Ok(Self {
            _browser: browser,
            tab,
            url: url.into(),
            counties,
        })
    }
}

impl DocketFetcher for ChromeFetcher {
    async fn fetch(&mut self, id: &CaseIdentifier) -> Result<String, FetchError> {
        let tab = self.tab.clone();
        let url = self.url.clone();
        let form = SearchForm::new(id, &self.counties);

        spawn_blocking(move || search(&tab, &url, &form))
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?
            .map_err(classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_uses_identifier_tokens() {
        let form = SearchForm::new(&CaseIdentifier::juvenile("02", 2025, 314), &CountyTable::default());
        assert_eq!(form.court_type, "D");
        assert_eq!(form.county_code, "02");
        assert_eq!(form.county, "Lancaster");
        assert_eq!(form.case_type, "JV");
        assert_eq!(form.year, "25");
        assert_eq!(form.number, "0000314");
    }

    #[test]
    fn control_script_quotes_arguments() {
        let js = set_control_js("#case_id", "0000001\"); alert(1); (\"", "0000001");
        assert!(js.contains(r##"document.querySelector("#case_id")"##));
        assert!(js.contains(r#""0000001\"); alert(1); (\"""#));
    }

    #[test]
    fn county_option_matches_code_or_name() {
        let form = SearchForm::new(&CaseIdentifier::juvenile("01", 2025, 7), &CountyTable::default());
        let js = set_control_js("#county_num", &form.county_code, &form.county);
        assert!(js.contains(r##"document.querySelector("#county_num")"##));
        assert!(js.contains(r#"o.value === "01" || o.text.trim() === "Douglas""#));
    }

    #[test]
    fn unknown_county_code_is_labelled_unknown() {
        let form = SearchForm::new(&CaseIdentifier::juvenile("77", 2025, 7), &CountyTable::default());
        assert_eq!(form.county_code, "77");
        assert_eq!(form.county, crate::config::UNKNOWN_COUNTY);
    }

    #[test]
    fn timeouts_are_told_apart() {
        assert_eq!(classify(Timeout.into()), FetchError::Timeout);
        assert!(matches!(
            classify(anyhow::anyhow!("net::ERR_NAME_NOT_RESOLVED")),
            FetchError::Unavailable(_)
        ));
    }
}
