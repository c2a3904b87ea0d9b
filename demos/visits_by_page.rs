use anyhow::Result;
use metrika_reporting_ga::{Client, CsvOptions, ReportQuery, SamplingLevel};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Example program that calls the library API.
    // Configure authentication via env vars or a `.metrikarc` file.
    let counter_id = std::env::args().nth(1).unwrap_or_else(|| "12345".to_string());
    let query = ReportQuery::new()
        .with_counter_id(counter_id)
        .with_metrics(["ga:visits", "ga:pageviews"])
        .with_dimensions("ga:pagePath")
        .with_period(30u32, "yesterday")
        .with_sort("-ga:visits")
        .with_sampling_level(SamplingLevel::HigherPrecision);
    let client = Client::from_env()?.with_query(query);

    println!("total rows: {}", client.all_rows_count()?);

    let top = client.row()?;
    println!("top page: {}", serde_json::to_string(&top)?);

    let written = client.save_to_csv("visits_by_page.csv", &CsvOptions::default())?;
    println!("saved {} row(s) to visits_by_page.csv", written);
    Ok(())
}
