use chrono::{DateTime, Utc};
use compact_str::CompactString;
use hashbrown::HashMap;

use crate::{
    case::CaseIdentifier,
    config::CountyTable,
    error::CaseError,
    record::CaseRecord,
};

#[derive(Debug, Default)]
pub struct Selection {
    /// Bounced cases in storage order.
    pub pending: Vec<CaseIdentifier>,
    /// Records whose stored id could not be parsed.
    pub skipped: Vec<CaseError>,
}

/// Every record without `marker` in its docket, re-parsed from its stored id.
pub fn select_pending(records: &[CaseRecord], marker: &str) -> Selection {
    let mut selection = Selection::default();
    for record in records.iter().filter(|r| !r.is_scraped(marker)) {
        match record.case_id.parse() {
            Ok(id) => selection.pending.push(id),
            Err(e) => {
                tracing::warn!(target: "retry", "skipping stored record: {e}");
                selection.skipped.push(e);
            }
        }
    }
    tracing::info!(
        target: "retry",
        "{} bounced, {} skipped, {} records",
        selection.pending.len(),
        selection.skipped.len(),
        records.len(),
    );
    selection
}

/// Candidate records for `pending`, keeping the first `TimeScraped` stored
/// under the same canonical id. Ids with no stored record are stamped `now`.
pub fn requeue(
    records: &[CaseRecord],
    pending: &[CaseIdentifier],
    counties: &CountyTable,
    now: DateTime<Utc>,
) -> Vec<CaseRecord> {
    let mut first_seen = HashMap::<CompactString, DateTime<Utc>>::with_capacity(records.len());
    for record in records {
        let key = record
            .case_id
            .parse::<CaseIdentifier>()
            .map_or_else(|_| record.case_id.clone(), |id| id.canonical());
        first_seen
            .entry(key)
            .and_modify(|t| *t = (*t).min(record.time_scraped))
            .or_insert(record.time_scraped);
    }

    pending
        .iter()
        .map(|id| {
            let stamped = first_seen.get(&id.canonical()).copied().unwrap_or(now);
            CaseRecord::pending(id, counties, stamped)
        })
        .collect()
}
