//! The two scraping passes: extending every partition with a new batch, and
//! retrying everything that bounced.

use chrono::Utc;

use crate::{
    allocate::allocate_next_batch,
    config::ScrapeConfig,
    error::StoreError,
    record::materialize,
    retry::{requeue, select_pending},
    scrape::{DocketFetcher, FetchReport, fetch_all},
    store::CaseStore,
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PassReport {
    pub candidates: usize,
    /// Partitions or records that could not be turned into candidates.
    pub issues: usize,
    pub fetch: FetchReport,
}

pub async fn run_new_batch<S, F>(
    store: &S,
    fetcher: &mut F,
    config: &ScrapeConfig,
    current_year: i32,
) -> Result<PassReport, StoreError>
where
    S: CaseStore,
    F: DocketFetcher,
{
    let maxima = store.partition_maxima().await?;
    let allocation = allocate_next_batch(&maxima, config, current_year);
    for issue in &allocation.issues {
        tracing::warn!(target: "update", "{issue}");
    }

    let candidates = materialize(&allocation.ids, &config.counties, Utc::now());
    let inserted = store.insert_records(&candidates).await?;
    tracing::info!(
        target: "update",
        "{} new candidates, {}/{} recorded as pending",
        candidates.len(),
        inserted.written,
        inserted.total,
    );

    Ok(PassReport {
        candidates: candidates.len(),
        issues: allocation.issues.len(),
        fetch: fetch_all(fetcher, store, candidates, config).await,
    })
}

pub async fn run_retry<S, F>(
    store: &S,
    fetcher: &mut F,
    config: &ScrapeConfig,
) -> Result<PassReport, StoreError>
where
    S: CaseStore,
    F: DocketFetcher,
{
    let records = store.list_all_records().await?;
    let selection = select_pending(&records, &config.success_marker);
    let candidates = requeue(&records, &selection.pending, &config.counties, Utc::now());
    drop(records);

    Ok(PassReport {
        candidates: candidates.len(),
        issues: selection.skipped.len(),
        fetch: fetch_all(fetcher, store, candidates, config).await,
    })
}
