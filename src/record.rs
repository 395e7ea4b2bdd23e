use chrono::{DateTime, NaiveDate, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

use crate::{
    case::CaseIdentifier,
    config::{CountyTable, StampPolicy},
};

/// One persisted case, keyed by its canonical `CaseID`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CaseRecord {
    #[serde(rename = "CaseID")]
    pub case_id: CompactString,
    pub case_year: i32,
    pub county: CompactString,
    pub case_number: CompactString,
    pub time_scraped: DateTime<Utc>,
    pub docket: Option<String>,
    pub year_of_birth: Option<i32>,
    pub date_of_birth: Option<NaiveDate>,
}

impl CaseRecord {
    /// A record that has not been fetched yet.
    pub fn pending(id: &CaseIdentifier, counties: &CountyTable, stamped: DateTime<Utc>) -> Self {
        Self {
            case_id: id.canonical(),
            case_year: id.year,
            county: id.county(counties).into(),
            case_number: id.padded_number(),
            time_scraped: stamped,
            docket: None,
            year_of_birth: None,
            date_of_birth: None,
        }
    }

    pub fn is_scraped(&self, marker: &str) -> bool {
        self.docket.as_deref().is_some_and(|d| d.contains(marker))
    }

    pub fn stamp(&mut self, policy: StampPolicy, now: DateTime<Utc>) {
        if policy == StampPolicy::AtAttempt {
            self.time_scraped = now;
        }
    }

    /// Apply `other` on top of `self` the way a store upsert does: a stored docket
    /// or birth date is never replaced by `None`.
    pub fn merge_from(&mut self, other: &Self) {
        self.case_year = other.case_year;
        self.county.clone_from(&other.county);
        self.case_number.clone_from(&other.case_number);
        self.time_scraped = other.time_scraped;
        if other.docket.is_some() {
            self.docket.clone_from(&other.docket);
        }
        self.year_of_birth = other.year_of_birth.or(self.year_of_birth);
        self.date_of_birth = other.date_of_birth.or(self.date_of_birth);
    }
}

/// Turn freshly allocated identifiers into pending records, all stamped with `now`.
pub fn materialize(
    ids: &[CaseIdentifier],
    counties: &CountyTable,
    now: DateTime<Utc>,
) -> Vec<CaseRecord> {
    ids.iter()
        .map(|id| CaseRecord::pending(id, counties, now))
        .collect()
}

/// The `n` most recently stamped records, newest first.
pub fn most_recent(records: &[CaseRecord], n: usize) -> Vec<&CaseRecord> {
    let mut sorted = records.iter().collect::<Vec<_>>();
    sorted.sort_by(|a, b| b.time_scraped.cmp(&a.time_scraped));
    sorted.truncate(n);
    sorted
}
