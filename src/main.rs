use anyhow::Result;
use clap::Parser;
use eod_assist::cli::Cli;
use eod_assist::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    cli.execute(Settings::from_env()).await
}
