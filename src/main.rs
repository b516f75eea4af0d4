use pagedriver::{Driver, DriverConfig, WaitUntil};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = DriverConfig::from_env()?;
    info!(browser_type = ?config.browser_type, "starting driver");

    let mut driver = Driver::create(config).await?;

    match driver
        .get_page("https://google.com/", None, 0, WaitUntil::Load, None)
        .await
    {
        Ok(markup) => info!(bytes = markup.len(), "page fetched"),
        Err(e) => info!(error = %e, "fetch failed"),
    }

    driver.close().await;
    Ok(())
}
