#[tokio::main]
async fn main() -> anyhow::Result<()> {
    refgate_cli::cli::run().await
}
