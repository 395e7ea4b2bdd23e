use core::{ops::Range, time::Duration};

use compact_str::CompactString;
use hashbrown::HashMap;

/// County name used for codes outside the table.
pub const UNKNOWN_COUNTY: &str = "Unknown";
/// County code used for names outside the table.
pub const UNKNOWN_CODE: &str = "00";

/// Substring of a retrieved page that marks a valid case summary.
pub const SUCCESS_MARKER: &str = "Case Summary";

/// Fixed code ↔ name mapping of the counties the search form knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountyTable {
    entries: Vec<(CompactString, CompactString)>,
}

impl CountyTable {
    pub fn new<I, C, N>(entries: I) -> Self
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<CompactString>,
        N: Into<CompactString>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(code, name)| (code.into(), name.into()))
                .collect(),
        }
    }

    /// Name for `code`, or [`UNKNOWN_COUNTY`].
    pub fn name_of(&self, code: &str) -> &str {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .map_or(UNKNOWN_COUNTY, |(_, name)| name.as_str())
    }

    pub fn code_of(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, n)| n == name)
            .map(|(code, _)| code.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, n)| (c.as_str(), n.as_str()))
    }
}

impl Default for CountyTable {
    fn default() -> Self {
        Self::new([("01", "Douglas"), ("02", "Lancaster"), ("59", "Sarpy")])
    }
}

/// When a record's `TimeScraped` is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StampPolicy {
    /// Once, when the identifier is first materialized. Retries keep it.
    #[default]
    AtGeneration,
    /// Right before every persisted attempt.
    AtAttempt,
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub counties: CountyTable,
    /// Counties missing here are not tracked by the allocator.
    pub batch_sizes: HashMap<CompactString, u32>,
    pub success_marker: CompactString,
    pub stamp_policy: StampPolicy,
    pub timeout: Duration,
    /// Pause between two fetches, in milliseconds. Empty disables it.
    pub pause_ms: Range<u64>,
}

impl ScrapeConfig {
    /// Ids allocated per current-year partition and run, by county name.
    pub const DEFAULT_BATCH_SIZES: [(&str, u32); 3] =
        [("Douglas", 30), ("Lancaster", 20), ("Sarpy", 10)];

    #[must_use]
    pub fn with_batch_size(mut self, county: &str, size: u32) -> Self {
        self.batch_sizes.insert(county.into(), size);
        self
    }

    #[must_use]
    pub fn with_stamp_policy(mut self, policy: StampPolicy) -> Self {
        self.stamp_policy = policy;
        self
    }

    #[must_use]
    pub fn without_pause(mut self) -> Self {
        self.pause_ms = 0..0;
        self
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            counties: CountyTable::default(),
            batch_sizes: Self::DEFAULT_BATCH_SIZES
                .iter()
                .map(|&(county, size)| (county.into(), size))
                .collect(),
            success_marker: SUCCESS_MARKER.into(),
            stamp_policy: StampPolicy::default(),
            timeout: const { Duration::from_secs(60) },
            pause_ms: 1200..2000,
        }
    }
}
