#[tokio::main]
async fn main() -> std::io::Result<()> {
    street_racer::frameworks::server::run_with_config().await
}
