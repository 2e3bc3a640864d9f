use std::net::SocketAddr;
use std::time::Duration;

use course_builder::{
    build_router,
    config::{get_config, init_config},
    telemetry::init_tracing,
    AppState,
};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

const PURGE_INTERVAL: Duration = Duration::from_secs(60);

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config();

    let app_state = AppState::new(config)?;

    {
        let state = app_state.clone();
        let ttl = chrono::Duration::minutes(config.session_ttl_minutes);
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(PURGE_INTERVAL).await;
                let purged = state.sessions.purge_idle(ttl).await;
                if purged.is_empty() {
                    continue;
                }
                for session in &purged {
                    if let Some(thumbnail) = &session.draft.thumbnail {
                        state.uploads.remove(thumbnail).await;
                    }
                }
                info!(count = purged.len(), "Purged idle wizard sessions");
            }
        });
    }

    let app = build_router(app_state, config);

    let addr: SocketAddr = config.server_address.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
