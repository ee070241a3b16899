use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::info;

use gymflow_api::infra::{
    app::create_app, entitlement_sweeper::run_entitlement_sweep_loop, setup::init_app_state,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let app_state = init_app_state().await?;

    let bind_addr = app_state.config.bind_addr;
    let sweep_interval = app_state.config.sweep_interval;

    let app = create_app(app_state.clone());

    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(run_entitlement_sweep_loop(
        app_state.subscription_use_cases.clone(),
        sweep_interval,
        shutdown.clone(),
    ));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Backend listening at {}", &listener.local_addr()?);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = server_shutdown.cancelled() => {}
            }
        })
        .await?;

    shutdown.cancel();
    sweeper.await?;

    Ok(())
}
