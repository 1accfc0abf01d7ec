use crate::book::repository::mongo::MongoBookRepository;
use crate::book::service::BookService;
use crate::config::AppConfig;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

pub mod book;
pub mod client;
pub mod config;
pub mod error;
pub mod routes;
pub mod upload;

/// 설정에 따라 저장소와 업로드 디렉토리를 준비하고 서버를 실행한다.
pub async fn start_server(config: &AppConfig) -> anyhow::Result<()> {
    let client = config::connect_to_mongo(config.db()).await?;
    let repository = MongoBookRepository::new(client, config.db().name(), config.db().collection());

    let uploads = config.upload().to_store();
    tokio::fs::create_dir_all(uploads.dir()).await?;

    let service = BookService::new(Arc::new(repository), uploads)
        .with_status_mode(config.http().status_mode())
        .with_cleanup_on_delete(config.upload().cleanup_on_delete());

    let app = routes::router(service);

    let address = format!("{}:{}", config.host(), config.port());
    let listener = TcpListener::bind(&address).await?;
    info!("App connected and running on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler => {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler => {}", e);
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
}
