use jvscr::{config::ScrapeConfig, db::PgStore, record, retry, store::CaseStore};
use serde::Serialize;

#[derive(clap::Parser)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Cases whose docket lacks a case summary.
    Bounced {
        db_uri: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Most recently stamped cases.
    Recent {
        db_uri: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Line<'a> {
    #[serde(rename = "CaseID")]
    case_id: &'a str,
    county: &'a str,
    time_scraped: chrono::DateTime<chrono::Utc>,
    scraped: bool,
}

fn print_line(record: &record::CaseRecord, marker: &str) -> serde_json::Result<()> {
    let line = Line {
        case_id: &record.case_id,
        county: &record.county,
        time_scraped: record.time_scraped,
        scraped: record.is_scraped(marker),
    };
    println!("{}", serde_json::to_string(&line)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;

    pretty_env_logger::init_timed();

    let args = Args::parse();
    let config = ScrapeConfig::default();

    match args.command {
        Commands::Bounced { db_uri, limit } => {
            let store = PgStore::connect(&db_uri).await?;
            let records = store.list_all_records().await?;
            let selection = retry::select_pending(&records, &config.success_marker);

            if selection.pending.is_empty() {
                println!("No bounced cases: the scraper has nothing to process.");
            }
            for id in selection.pending.iter().take(limit) {
                println!("{id}");
            }
            println!(
                "Total bounced: {} ({} unparseable ids skipped)",
                selection.pending.len(),
                selection.skipped.len()
            );
        }
        Commands::Recent { db_uri, limit } => {
            let store = PgStore::connect(&db_uri).await?;
            let records = store.list_all_records().await?;
            println!("{} records", records.len());
            for record in record::most_recent(&records, limit) {
                print_line(record, &config.success_marker)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use jvscr::{case::CaseIdentifier, config::CountyTable};

    use super::*;

    #[test]
    fn recent_line_is_reported() {
        let mut record = record::CaseRecord::pending(
            &CaseIdentifier::juvenile("59", 2024, 9),
            &CountyTable::default(),
            Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap(),
        );
        record.docket = Some("Case Summary".into());
        assert!(print_line(&record, "Case Summary").is_ok());

        let line = serde_json::to_value(Line {
            case_id: &record.case_id,
            county: &record.county,
            time_scraped: record.time_scraped,
            scraped: record.is_scraped("Case Summary"),
        })
        .unwrap();
        assert_eq!(line["CaseID"], "D 59 JV 24 0000009");
        assert_eq!(line["County"], "Sarpy");
        assert_eq!(line["Scraped"], true);
    }
}
