use anyhow::Result;
use clap::Parser;
use supportctl::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    supportctl::init_logging(cli.verbose);
    supportctl::commands::run(cli).await
}
