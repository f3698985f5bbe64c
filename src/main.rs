use std::sync::Arc;
use tracing::{info, warn};

use tubegrab::downloader::tools;
use tubegrab::server::{router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tubegrab=info,tower_http=info".into()),
        )
        .init();

    let config = ServerConfig::from_env();

    let ytdlp = tools::ytdlp_status();
    if ytdlp.is_available {
        info!(
            path = ytdlp.path,
            version = ytdlp.version.as_deref().unwrap_or("?"),
            "yt-dlp found"
        );
    } else {
        warn!("yt-dlp not found; extraction and downloads will fail until it is installed");
    }
    info!(dir = %config.download_dir.display(), "download directory");

    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config));
    let app = router(state);

    info!("tubegrab listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
