#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wayfarer::cli::execute().await
}
