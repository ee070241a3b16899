use crate::{
    adapters::http::app_state::AppState,
    infra::{config::AppConfig, postgres_persistence},
    use_cases::{
        membership::{MembershipPlanRepo, MembershipUseCases},
        subscription::{SubscriptionStore, SubscriptionUseCases},
    },
};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();
    init_tracing(config.log_file.as_deref())?;

    let postgres_arc = Arc::new(
        postgres_persistence(&config.database_url, config.database_max_connections).await?,
    );

    let store_arc = postgres_arc.clone() as Arc<dyn SubscriptionStore>;
    let plan_repo_arc = postgres_arc.clone() as Arc<dyn MembershipPlanRepo>;

    Ok(AppState {
        config: Arc::new(config),
        subscription_use_cases: Arc::new(SubscriptionUseCases::new(store_arc)),
        membership_use_cases: Arc::new(MembershipUseCases::new(plan_repo_arc)),
    })
}

pub fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gymflow_api=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true) // show log level
        .pretty(); // human-friendly, with colors

    // File (structured JSON logs), only when LOG_FILE is set
    let json_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .map_err(|e| anyhow::anyhow!("cannot create log file {}: {e}", path.display()))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(file)
                    .with_current_span(true)
                    .with_span_list(true)
                    .boxed(),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();

    Ok(())
}
