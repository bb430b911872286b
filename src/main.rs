use clap::Parser;
use color_eyre::eyre::Result;
use roulette_table::config::{
    AppConfig,
    Args,
};

mod client;
mod ui;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let config = AppConfig::from_args(Args::parse())?;
    let _guard = client::init_tracing(&config.log_dir)?;
    tracing::info!(network = %config.network, api = %config.api_url, "starting table");
    client::run_app(config).await
}
