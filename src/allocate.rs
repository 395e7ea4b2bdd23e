use compact_str::CompactString;
use hashbrown::HashMap;

use crate::{
    case::CaseIdentifier,
    config::{ScrapeConfig, UNKNOWN_CODE},
    error::CaseError,
};

/// Independent numbering space for case ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Partition {
    pub county: CompactString,
    pub year: i32,
}

impl Partition {
    pub fn new(county: impl Into<CompactString>, year: i32) -> Self {
        Self {
            county: county.into(),
            year,
        }
    }
}

/// Highest case number observed in each partition.
pub type PartitionMaxima = HashMap<Partition, i64>;

#[derive(Debug, Default)]
pub struct Allocation {
    pub ids: Vec<CaseIdentifier>,
    /// Problems met along the way. Entries here may still have produced ids
    /// (a county without a code is allocated under [`UNKNOWN_CODE`]).
    pub issues: Vec<CaseError>,
}

/// Next block of ids after the highest observed number of every current-year
/// partition. Partitions are visited in (county, year) order.
///
/// A partition missing from `maxima` is never started, and a county without a
/// batch size is not tracked at all.
pub fn allocate_next_batch(
    maxima: &PartitionMaxima,
    config: &ScrapeConfig,
    current_year: i32,
) -> Allocation {
    let mut partitions = maxima
        .iter()
        .filter(|(p, _)| p.year == current_year)
        .collect::<Vec<_>>();
    partitions.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut allocation = Allocation::default();
    for (partition, &max) in partitions {
        let Some(&size) = config.batch_sizes.get(&partition.county) else {
            tracing::debug!(target: "allocate", "{} is not tracked", partition.county);
            continue;
        };

        let Some(start) = u32::try_from(max)
            .ok()
            .and_then(|m| m.checked_add(1))
            .filter(|s| s.checked_add(size).is_some())
        else {
            tracing::warn!(target: "allocate", "({}, {}) overflows at {max}", partition.county, partition.year);
            allocation.issues.push(CaseError::NumberOverflow {
                county: partition.county.clone(),
                year: partition.year,
                max,
            });
            continue;
        };

        let code = if let Some(code) = config.counties.code_of(&partition.county) {
            code
        } else {
            tracing::warn!(target: "allocate", "{} has no county code", partition.county);
            allocation.issues.push(CaseError::Configuration {
                county: partition.county.clone(),
                fallback: UNKNOWN_CODE,
            });
            UNKNOWN_CODE
        };

        allocation.ids.extend(
            (start..start + size).map(|number| CaseIdentifier::juvenile(code, partition.year, number)),
        );
        tracing::info!(target: "allocate", "({}, {}) -> {start}..{}", partition.county, partition.year, start + size);
    }
    allocation
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maxima(entries: &[(&str, i32, i64)]) -> PartitionMaxima {
        entries
            .iter()
            .map(|&(county, year, max)| (Partition::new(county, year), max))
            .collect()
    }

    fn canonical(allocation: &Allocation) -> Vec<String> {
        allocation.ids.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn extends_douglas_after_max() {
        let config = ScrapeConfig::default().with_batch_size("Douglas", 3);
        let allocation = allocate_next_batch(&maxima(&[("Douglas", 2025, 42)]), &config, 2025);
        assert_eq!(
            canonical(&allocation),
            ["D 01 JV 25 0000043", "D 01 JV 25 0000044", "D 01 JV 25 0000045"]
        );
        assert!(allocation.issues.is_empty());
    }

    #[test]
    fn batch_is_contiguous_and_increasing() {
        let config = ScrapeConfig::default().with_batch_size("Sarpy", 25);
        let allocation = allocate_next_batch(&maxima(&[("Sarpy", 2025, 999)]), &config, 2025);
        let numbers = allocation.ids.iter().map(|id| id.number).collect::<Vec<_>>();
        assert_eq!(numbers, (1000..1025).collect::<Vec<_>>());
        assert!(allocation.ids.iter().all(|id| id.padded_number().len() == 7));
    }

    #[test]
    fn historical_years_are_frozen() {
        let config = ScrapeConfig::default();
        let allocation = allocate_next_batch(
            &maxima(&[("Douglas", 2024, 900), ("Lancaster", 2023, 10)]),
            &config,
            2025,
        );
        assert!(allocation.ids.is_empty());
    }

    #[test]
    fn unseen_partitions_never_start() {
        let config = ScrapeConfig::default();
        let allocation = allocate_next_batch(&maxima(&[("Douglas", 2025, 5)]), &config, 2025);
        assert!(allocation.ids.iter().all(|id| id.county_code == "01"));
        assert!(allocation.ids.iter().all(|id| id.number > 5));
    }

    #[test]
    fn untracked_county_is_skipped() {
        let mut config = ScrapeConfig::default();
        config.batch_sizes.remove("Lancaster");
        let allocation = allocate_next_batch(
            &maxima(&[("Lancaster", 2025, 7), ("Sarpy", 2025, 7)]),
            &config,
            2025,
        );
        assert_eq!(allocation.ids.len(), 10);
        assert!(allocation.ids.iter().all(|id| id.county_code == "59"));
        assert!(allocation.issues.is_empty());
    }

    #[test]
    fn unmapped_county_falls_back_to_sentinel_code() {
        let config = ScrapeConfig::default().with_batch_size("Cass", 2);
        let allocation = allocate_next_batch(
            &maxima(&[("Cass", 2025, 0), ("Douglas", 2025, 0)]),
            &config,
            2025,
        );
        assert_eq!(canonical(&allocation)[..2], ["D 00 JV 25 0000001", "D 00 JV 25 0000002"]);
        assert_eq!(allocation.ids.len(), 32);
        assert_eq!(
            allocation.issues,
            [CaseError::Configuration {
                county: "Cass".into(),
                fallback: "00"
            }]
        );
    }

    #[test]
    fn overflowing_partition_is_reported() {
        let config = ScrapeConfig::default();
        let allocation = allocate_next_batch(
            &maxima(&[("Douglas", 2025, i64::from(u32::MAX)), ("Sarpy", 2025, -3)]),
            &config,
            2025,
        );
        assert!(allocation.ids.is_empty());
        assert_eq!(allocation.issues.len(), 2);
    }

    #[test]
    fn output_order_is_stable() {
        let config = ScrapeConfig::default()
            .with_batch_size("Douglas", 1)
            .with_batch_size("Lancaster", 1)
            .with_batch_size("Sarpy", 1);
        let allocation = allocate_next_batch(
            &maxima(&[("Sarpy", 2025, 1), ("Douglas", 2025, 1), ("Lancaster", 2025, 1)]),
            &config,
            2025,
        );
        assert_eq!(
            canonical(&allocation),
            ["D 01 JV 25 0000002", "D 02 JV 25 0000002", "D 59 JV 25 0000002"]
        );
    }
}
