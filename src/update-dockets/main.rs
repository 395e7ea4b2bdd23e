use chrono::Datelike;
use jvscr::{cli::ScrapeArgs, config::ScrapeConfig, db::PgStore, pipeline, scrape};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let args = ScrapeArgs::parse_or_usage();
    let config = ScrapeConfig::default();
    let current_year = chrono::Local::now().year();

    let store = PgStore::connect(&args.db_uri).await?;

    let browser = scrape::puppeteer(true, config.timeout * 10)?;
    let mut fetcher = scrape::ChromeFetcher::new(browser, &args.search_url, config.counties.clone(), config.timeout)?;

    let report = pipeline::run_new_batch(&store, &mut fetcher, &config, current_year).await?;
    tracing::info!(target: "update", "\x1b[36m{current_year}: {report:?}\x1b[0m");

    Ok(())
}
