use parking_lot::Mutex;

use crate::{
    allocate::{Partition, PartitionMaxima},
    error::StoreError,
    record::CaseRecord,
};

/// Counts of a bulk insert. Failed rows are logged and skipped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    pub written: usize,
    pub total: usize,
}

/// Where case records live between runs.
pub trait CaseStore: Sync {
    /// Highest `CaseNumber` per (county, year), as an integer.
    fn partition_maxima(&self) -> impl Future<Output = Result<PartitionMaxima, StoreError>> + Send;

    /// Every record, in storage order.
    fn list_all_records(&self) -> impl Future<Output = Result<Vec<CaseRecord>, StoreError>> + Send;

    /// Upsert keyed on `CaseID`. A stored docket or birth data is never cleared.
    fn insert_record(
        &self,
        record: &CaseRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn insert_records(
        &self,
        records: &[CaseRecord],
    ) -> impl Future<Output = Result<Inserted, StoreError>> + Send {
        async move {
            let mut n = Inserted {
                written: 0,
                total: records.len(),
            };
            for record in records {
                match self.insert_record(record).await {
                    Ok(()) => n.written += 1,
                    Err(e) => tracing::error!(target: "store", "{}: {e}", record.case_id),
                }
            }
            Ok(n)
        }
    }
}

/// Store kept in process memory, mostly for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<CaseRecord>>,
}

impl MemoryStore {
    pub fn new(records: Vec<CaseRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn snapshot(&self) -> Vec<CaseRecord> {
        self.records.lock().clone()
    }

    pub fn get(&self, case_id: &str) -> Option<CaseRecord> {
        self.records
            .lock()
            .iter()
            .find(|r| r.case_id == case_id)
            .cloned()
    }
}

impl CaseStore for MemoryStore {
    async fn partition_maxima(&self) -> Result<PartitionMaxima, StoreError> {
        let mut maxima = PartitionMaxima::new();
        for record in &*self.records.lock() {
            let Ok(number) = record.case_number.parse::<i64>() else {
                tracing::warn!(target: "store", "{}: bad case number {:?}", record.case_id, record.case_number);
                continue;
            };
            maxima
                .entry(Partition::new(record.county.clone(), record.case_year))
                .and_modify(|m| *m = (*m).max(number))
                .or_insert(number);
        }
        Ok(maxima)
    }

    async fn list_all_records(&self) -> Result<Vec<CaseRecord>, StoreError> {
        Ok(self.snapshot())
    }

    async fn insert_record(&self, record: &CaseRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock();
        if let Some(stored) = guard.iter_mut().find(|r| r.case_id == record.case_id) {
            stored.merge_from(record);
        } else {
            guard.push(record.clone());
        }
        Ok(())
    }
}
