use dotenvy::dotenv;
use std::sync::Arc;
use timesync_api::{
    cli::Args,
    server::{build, logging::setup_tracing},
    AppError,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();
    let config = Arc::new(Args::init()?);

    // Logging
    setup_tracing(config.log_level);

    info!(
        "Starting {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );
    info!(
        timezone = %config.timezone,
        ntp_server = config.ntp.server.as_deref().unwrap_or("none"),
        metrics_policy = %config.ntp.metrics_policy,
        "Clock configuration"
    );

    let app = build(config.clone()).await;

    let address = std::net::SocketAddr::new(config.server_address, config.server_port);
    let listener = tokio::net::TcpListener::bind(address).await?;
    let shutdown_signal = async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal");
    };

    let notify_server_ready = Arc::new(tokio::sync::Notify::new());

    // Spawn the server in its own task
    let spawn_task = tokio::spawn({
        let notify_server_ready = notify_server_ready.clone();
        async move {
            let server_future =
                axum::serve(listener, app.into_make_service()).with_graceful_shutdown(shutdown_signal);

            // Notify that the server has reached the listening stage
            notify_server_ready.notify_one();

            server_future.await
        }
    });

    notify_server_ready.notified().await;

    info!("Server is listening on http://{}", address);

    spawn_task
        .await
        .map_err(|err| AppError::Server(err.to_string()))??;

    Ok(())
}
