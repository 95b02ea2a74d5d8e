/**
 * LIGHTGATE KERNEL - Main entry point
 *
 * Loads config, installs logging, binds the HTTP port and hands over to
 * `bootstrap::run` until Ctrl-C.
 */

use anyhow::Context;
use lightgate_kernel::bootstrap;
use lightgate_kernel::config::load_config;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lightgate_kernel=info")),
        )
        .init();

    let cfg = load_config().await;

    let addr = cfg.http.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    bootstrap::run(cfg, listener, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    })
    .await
}
