use chrono::NaiveDate;
use dbhydro::{DbHydro, DbHydroError, PortalConfig};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), DbHydroError> {
    configure_polars_display();
    let config = PortalConfig::builder()
        .concurrency(4)
        .max_retries(2)
        .batch_deadline(Duration::from_secs(300))
        .build();
    let client = DbHydro::with_config(config).await?;

    let day = NaiveDate::from_ymd_opt(2021, 9, 10).unwrap();
    let dataset = client
        .fetch_and_merge()
        .start(day)
        .end(day)
        .search_term("S331%")
        .call()
        .await?;

    println!("{}", dataset.to_dataframe()?);
    println!("Empty streams: {:?}", dataset.report.empty);
    for dropped in &dataset.report.dropped {
        println!("Dropped {} during {}: {}", dropped.dbkey, dropped.stage, dropped.reason);
    }

    dataset.write_csv("s331_2021-09-10.csv").await?;
    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
