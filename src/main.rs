use anyhow::Context;
use brito_lib::settings::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    brito_lib::init_tracing();

    let config = AppConfig::load().context("failed to load configuration")?;
    let handles = brito_lib::build_environment(&config)?;
    brito_lib::run_http_service(handles).await
}
