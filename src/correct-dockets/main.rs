use jvscr::{cli::ScrapeArgs, config::ScrapeConfig, db::PgStore, pipeline, scrape};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();

    let args = ScrapeArgs::parse_or_usage();
    let config = ScrapeConfig::default();

    let store = PgStore::connect(&args.db_uri).await?;

    let browser = scrape::puppeteer(true, config.timeout * 10)?;
    let mut fetcher = scrape::ChromeFetcher::new(browser, &args.search_url, config.counties.clone(), config.timeout)?;

    let report = pipeline::run_retry(&store, &mut fetcher, &config).await?;
    if report.candidates == 0 {
        tracing::warn!(target: "correct", "no bounced cases, nothing to process");
    }
    tracing::info!(target: "correct", "\x1b[36m{report:?}\x1b[0m");

    Ok(())
}
