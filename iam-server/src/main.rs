use anyhow::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = iam_server::config::load().snapshot();
    let ax = iam_server::build(&cfg)?;
    let addr = iam_server::bind_addr(&cfg);

    tracing::info!("[iam-server] listening on http://{addr}");

    ax.listen(addr).await?;

    Ok(())
}
