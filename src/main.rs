use clap::Parser;

use league_web::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    cli::run(cli).await?;
    Ok(())
}
