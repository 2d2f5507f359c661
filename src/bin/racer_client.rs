#[tokio::main]
async fn main() -> std::io::Result<()> {
    street_racer::frameworks::client::run_with_config().await
}
