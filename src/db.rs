use core::pin::pin;

use bb8_postgres::{PostgresConnectionManager, bb8};
use chrono::{DateTime, NaiveDate, Utc};
use futures_util::TryStreamExt;
use tokio_postgres::{NoTls, Row, types::ToSql};

use crate::{
    allocate::{Partition, PartitionMaxima},
    error::StoreError,
    record::CaseRecord,
    store::{CaseStore, Inserted},
};

pub type ConnectionManager = PostgresConnectionManager<NoTls>;
pub type Pool = bb8::Pool<ConnectionManager>;
pub type DBError = tokio_postgres::Error;
pub type BB8Error = bb8::RunError<DBError>;
pub type DBResult<T> = Result<T, DBError>;

mod constants {
    use core::time::Duration;

    pub const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);
}

const SQL_SCHEMA: &str = "\
create schema if not exists jv;
create table if not exists jv.cases (
    case_id text primary key,
    case_year integer not null,
    county text not null,
    case_number text not null,
    time_scraped timestamptz not null,
    docket text,
    year_of_birth integer,
    date_of_birth date
);
alter table jv.cases add column if not exists seq bigserial;
create index if not exists cases_partition on jv.cases (county, case_year);";

const SQL_MAXIMA: &str = "select county, case_year, max(case_number::bigint) from jv.cases where case_number ~ '^[0-9]+$' group by county, case_year";

const SQL_ALL: &str = "select case_id, case_year, county, case_number, time_scraped, docket, year_of_birth, date_of_birth from jv.cases order by seq";

const SQL_UPSERT: &str = "insert into jv.cases (case_id, case_year, county, case_number, time_scraped, docket, year_of_birth, date_of_birth) values ($1, $2, $3, $4, $5, $6, $7, $8) on conflict (case_id) do update set case_year = excluded.case_year, county = excluded.county, case_number = excluded.case_number, time_scraped = excluded.time_scraped, docket = coalesce(excluded.docket, jv.cases.docket), year_of_birth = coalesce(excluded.year_of_birth, jv.cases.year_of_birth), date_of_birth = coalesce(excluded.date_of_birth, jv.cases.date_of_birth)";

/// PostgreSQL-backed [`CaseStore`] over table `jv.cases`.
pub struct PgStore {
    pool: Pool,
}

impl PgStore {
    /// Connects with a `postgres://` URI or a key=value connection string and
    /// makes sure the table exists.
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        use constants::CONNECTION_TIMEOUT;

        let mut config = uri.parse::<tokio_postgres::Config>()?;
        config.connect_timeout(CONNECTION_TIMEOUT);

        let manager = PostgresConnectionManager::new(config, NoTls);
        let pool = Pool::builder()
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.pool.get().await?;
        conn.batch_execute(SQL_SCHEMA).await?;
        tracing::info!(target: "db", "schema ready");
        Ok(())
    }
}

fn from_row(row: &Row) -> DBResult<CaseRecord> {
    Ok(CaseRecord {
        case_id: row.try_get::<_, &str>(0)?.into(),
        case_year: row.try_get(1)?,
        county: row.try_get::<_, &str>(2)?.into(),
        case_number: row.try_get::<_, &str>(3)?.into(),
        time_scraped: row.try_get::<_, DateTime<Utc>>(4)?,
        docket: row.try_get(5)?,
        year_of_birth: row.try_get(6)?,
        date_of_birth: row.try_get::<_, Option<NaiveDate>>(7)?,
    })
}

struct UpsertRow<'a> {
    case_id: &'a str,
    county: &'a str,
    case_number: &'a str,
    record: &'a CaseRecord,
}

impl<'a> UpsertRow<'a> {
    fn new(record: &'a CaseRecord) -> Self {
        Self {
            case_id: &record.case_id,
            county: &record.county,
            case_number: &record.case_number,
            record,
        }
    }

    fn params(&self) -> [&(dyn ToSql + Sync); 8] {
        [
            &self.case_id,
            &self.record.case_year,
            &self.county,
            &self.case_number,
            &self.record.time_scraped,
            &self.record.docket,
            &self.record.year_of_birth,
            &self.record.date_of_birth,
        ]
    }
}

impl CaseStore for PgStore {
    async fn partition_maxima(&self) -> Result<PartitionMaxima, StoreError> {
        let conn = self.pool.get().await?;
        let stmt = conn.prepare(SQL_MAXIMA).await?;
        let rows = conn.query(&stmt, &[]).await?;

        let mut maxima = PartitionMaxima::with_capacity(rows.len());
        for row in rows {
            let county = row.try_get::<_, &str>(0)?;
            let year = row.try_get(1)?;
            let Some(max) = row.try_get::<_, Option<i64>>(2)? else {
                continue;
            };
            maxima.insert(Partition::new(county, year), max);
        }
        tracing::info!(target: "db", "{} partitions", maxima.len());
        Ok(maxima)
    }

    async fn list_all_records(&self) -> Result<Vec<CaseRecord>, StoreError> {
        let conn = self.pool.get().await?;
        let stmt = conn.prepare(SQL_ALL).await?;
        let stream = conn.query_raw(&stmt, core::iter::empty::<&(dyn ToSql + Sync)>()).await?;
        let mut stream = pin!(stream);

        let mut records = Vec::new();
        while let Some(row) = stream.try_next().await? {
            match from_row(&row) {
                Ok(record) => records.push(record),
                Err(e) => tracing::error!(target: "db", "unreadable row: {e}"),
            }
        }
        Ok(records)
    }

    async fn insert_record(&self, record: &CaseRecord) -> Result<(), StoreError> {
        let conn = self.pool.get().await?;
        let stmt = conn.prepare(SQL_UPSERT).await?;
        conn.execute(&stmt, &UpsertRow::new(record).params()).await?;
        Ok(())
    }

    async fn insert_records(&self, records: &[CaseRecord]) -> Result<Inserted, StoreError> {
        let mut conn = self.pool.get().await?;
        let stmt = conn.prepare(SQL_UPSERT).await?;
        let mut txn = conn.transaction().await?;

        let mut n = 0;
        let mut N = 0;
        for record in records {
            let row = UpsertRow::new(record);
            let savepoint = txn.savepoint("upsert").await?;
            let res = savepoint.execute(&stmt, &row.params()).await;
            match res {
                Ok(r) => {
                    savepoint.commit().await?;
                    n += r as usize;
                }
                Err(e) => {
                    tracing::error!(target: "db", "{}: {e}", record.case_id);
                    savepoint.rollback().await?;
                }
            }
            N += 1;
        }

        txn.commit().await?;

        tracing::info!(target: "db", "{n}/{N} records upserted.");
        Ok(Inserted {
            written: n,
            total: N,
        })
    }
}
