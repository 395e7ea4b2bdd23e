use chrono::{TimeZone, Utc};
use hashbrown::HashSet;

use jvscr::{
    case::CaseIdentifier,
    config::{CountyTable, ScrapeConfig},
    error::FetchError,
    pipeline::{run_new_batch, run_retry},
    record::CaseRecord,
    scrape::DocketFetcher,
    store::{CaseStore, MemoryStore},
};

/// Serves a case summary for every id in `known`, a blank result page otherwise.
struct FakeCourt {
    known: HashSet<String>,
    asked: Vec<String>,
}

impl FakeCourt {
    fn new<'a>(known: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            known: known.into_iter().map(ToOwned::to_owned).collect(),
            asked: Vec::new(),
        }
    }

    fn closed() -> Self {
        Self::new(Vec::<&str>::new())
    }
}

impl DocketFetcher for FakeCourt {
    async fn fetch(&mut self, id: &CaseIdentifier) -> Result<String, FetchError> {
        let id = id.to_string();
        self.asked.push(id.clone());
        if self.known.contains(&id) {
            Ok(format!("<html><h2>Case Summary</h2><p>{id}</p><p>Date of Birth: 01/15/2010</p></html>"))
        } else {
            Ok("<html><p>No matching case</p></html>".to_owned())
        }
    }
}

fn seeded(code: &str, year: i32, number: u32, docket: Option<&str>) -> CaseRecord {
    let mut record = CaseRecord::pending(
        &CaseIdentifier::juvenile(code, year, number),
        &CountyTable::default(),
        Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap(),
    );
    record.docket = docket.map(ToOwned::to_owned);
    record
}

fn config() -> ScrapeConfig {
    ScrapeConfig::default()
        .without_pause()
        .with_batch_size("Douglas", 3)
        .with_batch_size("Lancaster", 2)
}

#[tokio::test]
async fn new_batch_extends_current_year_partitions() {
    let store = MemoryStore::new(vec![
        seeded("01", 2025, 42, Some("Case Summary")),
        seeded("02", 2024, 100, Some("Case Summary")),
    ]);
    let mut court = FakeCourt::new(["D 01 JV 25 0000043", "D 01 JV 25 0000045"]);

    let report = run_new_batch(&store, &mut court, &config(), 2025).await.unwrap();

    assert_eq!(court.asked, ["D 01 JV 25 0000043", "D 01 JV 25 0000044", "D 01 JV 25 0000045"]);
    assert_eq!(report.candidates, 3);
    assert_eq!(report.fetch.found, 2);
    assert_eq!(report.fetch.not_available, 1);

    let bounced = store.get("D 01 JV 25 0000044").unwrap();
    assert!(bounced.docket.is_none());
    let found = store.get("D 01 JV 25 0000045").unwrap();
    assert_eq!(found.year_of_birth, Some(2010));

    // Lancaster has no 2025 history and must not start on its own.
    assert!(store.snapshot().iter().all(|r| r.county != "Lancaster" || r.case_year == 2024));
}

#[tokio::test]
async fn next_batch_starts_after_bounced_numbers() {
    let store = MemoryStore::new(vec![seeded("01", 2025, 42, Some("Case Summary"))]);
    run_new_batch(&store, &mut FakeCourt::closed(), &config(), 2025)
        .await
        .unwrap();

    let mut court = FakeCourt::closed();
    run_new_batch(&store, &mut court, &config(), 2025).await.unwrap();
    assert_eq!(court.asked, ["D 01 JV 25 0000046", "D 01 JV 25 0000047", "D 01 JV 25 0000048"]);
}

#[tokio::test]
async fn retry_revisits_only_bounced_cases() {
    let store = MemoryStore::new(vec![
        seeded("01", 2025, 1, Some("...Case Summary...")),
        seeded("01", 2025, 2, None),
        seeded("59", 2024, 9, Some("Service unavailable")),
        CaseRecord {
            case_id: "not an id".into(),
            ..seeded("01", 2025, 3, None)
        },
    ]);
    let mut court = FakeCourt::new(["D 59 JV 24 0000009"]);

    let report = run_retry(&store, &mut court, &config()).await.unwrap();

    assert_eq!(court.asked, ["D 01 JV 25 0000002", "D 59 JV 24 0000009"]);
    assert_eq!(report.issues, 1);
    assert_eq!(report.fetch.found, 1);

    let fixed = store.get("D 59 JV 24 0000009").unwrap();
    assert!(fixed.is_scraped("Case Summary"));
    assert_eq!(fixed.time_scraped, Utc.with_ymd_and_hms(2025, 2, 1, 8, 0, 0).unwrap());

    let records = store.list_all_records().await.unwrap();
    assert_eq!(records.len(), 4);
}

#[tokio::test]
async fn failed_retry_keeps_earlier_docket() {
    struct Down;
    impl DocketFetcher for Down {
        async fn fetch(&mut self, _: &CaseIdentifier) -> Result<String, FetchError> {
            Err(FetchError::Timeout)
        }
    }

    let store = MemoryStore::new(vec![seeded("02", 2025, 5, None)]);
    let mut done = seeded("02", 2025, 5, Some("Case Summary"));
    done.year_of_birth = Some(2011);

    let report = run_retry(&store, &mut Down, &config()).await.unwrap();
    assert_eq!(report.fetch.timeouts, 1);
    assert!(store.get("D 02 JV 25 0000005").unwrap().docket.is_none());

    store.insert_record(&done).await.unwrap();
    let report = run_retry(&store, &mut Down, &config()).await.unwrap();
    assert_eq!(report.candidates, 0);
    assert_eq!(store.get("D 02 JV 25 0000005").unwrap().year_of_birth, Some(2011));
}
