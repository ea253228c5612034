#[tokio::main]
async fn main() -> anyhow::Result<()> {
    voidweaver::run().await
}
