use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    node_overlay_cli::cli::app::run().await
}
