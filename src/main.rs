use anyhow::Result;
use teachable::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
