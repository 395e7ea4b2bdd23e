use core::time::Duration;

use chrono::Utc;
use rand::Rng;

use crate::{
    case::CaseIdentifier,
    config::ScrapeConfig,
    error::FetchError,
    record::CaseRecord,
    store::CaseStore,
    util::extract_birth,
};

mod puppeteer;

pub use puppeteer::{ChromeFetcher, first_tab, puppeteer};

/// One retrieval of the case search page per call.
pub trait DocketFetcher {
    fn fetch(
        &mut self,
        id: &CaseIdentifier,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Found,
    NotAvailable,
    Timeout,
    Unavailable,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FetchReport {
    pub found: usize,
    pub not_available: usize,
    pub timeouts: usize,
    pub unavailable: usize,
    /// Candidates whose id could not be parsed back; never fetched.
    pub skipped: usize,
    pub store_failures: usize,
}

impl FetchReport {
    fn count(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Found => self.found += 1,
            Outcome::NotAvailable => self.not_available += 1,
            Outcome::Timeout => self.timeouts += 1,
            Outcome::Unavailable => self.unavailable += 1,
        }
    }

    pub const fn attempted(&self) -> usize {
        self.found + self.not_available + self.timeouts + self.unavailable
    }
}

/// Fetch `candidates` one after another and persist every outcome.
///
/// Only a page carrying the success marker fills the docket; everything else is
/// stored with no docket and stays eligible for retry.
pub async fn fetch_all<F, S>(
    fetcher: &mut F,
    store: &S,
    candidates: Vec<CaseRecord>,
    config: &ScrapeConfig,
) -> FetchReport
where
    F: DocketFetcher,
    S: CaseStore,
{
    let mut report = FetchReport::default();
    let total = candidates.len();

    for (idx, mut record) in candidates.into_iter().enumerate() {
        let id = match record.case_id.parse::<CaseIdentifier>() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(target: "fetch", "{e}");
                report.skipped += 1;
                continue;
            }
        };
        tracing::info!(target: "fetch", "\x1b[33mscraping\x1b[0m [{}/{total}] {id} ...", idx + 1);

        record.stamp(config.stamp_policy, Utc::now());
        let outcome = match fetcher.fetch(&id).await {
            Ok(html) if html.contains(config.success_marker.as_str()) => {
                let birth = extract_birth(&html);
                record.year_of_birth = birth.year;
                record.date_of_birth = birth.date;
                record.docket = Some(html);
                tracing::info!(target: "fetch", "\x1b[36mfound\x1b[0m {id}");
                Outcome::Found
            }
            Ok(_) => {
                tracing::info!(target: "fetch", "Not Available for case: {id}");
                Outcome::NotAvailable
            }
            Err(FetchError::Timeout) => {
                tracing::warn!(target: "fetch", "\x1b[31mERROR\x1b[0m scraping case {id}: timed out");
                Outcome::Timeout
            }
            Err(e) => {
                tracing::warn!(target: "fetch", "\x1b[31mERROR\x1b[0m scraping case {id}: {e}");
                Outcome::Unavailable
            }
        };
        report.count(outcome);

        if let Err(e) = store.insert_record(&record).await {
            tracing::error!(target: "db", "\x1b[31m{id}: {e}\x1b[0m");
            report.store_failures += 1;
        }

        if !config.pause_ms.is_empty() && idx + 1 < total {
            let t = rand::rng().random_range(config.pause_ms.clone());
            tokio::time::sleep(Duration::from_millis(t)).await;
        }
    }

    tracing::info!(target: "fetch", "{report:?}");
    report
}
