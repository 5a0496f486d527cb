use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging Setup
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .compact()
        .init();

    info!("Udevadm Query Bridge Initializing...");

    bridge_gateway::launch("udevadm").await
}
