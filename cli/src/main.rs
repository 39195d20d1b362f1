#[tokio::main]
async fn main() -> anyhow::Result<()> {
    signbridgectl::run().await
}
