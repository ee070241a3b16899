use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::use_cases::subscription::SubscriptionUseCases;

/// Periodically expire lapsed items and promote the next queued ones, so the
/// stored statuses stay current for members who never open the app.
///
/// Reads sweep on their own; this loop only keeps idle subscriptions honest.
pub async fn run_entitlement_sweep_loop(
    subscription_use_cases: Arc<SubscriptionUseCases>,
    period: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Entitlement sweeper started (every {}s)",
        period.as_secs()
    );

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Entitlement sweeper stopped");
                return;
            }
            _ = ticker.tick() => {}
        }

        match subscription_use_cases.sweep_all(Utc::now()).await {
            Ok(report) if report.transitions > 0 || report.failures > 0 => {
                info!(
                    subscriptions = report.subscriptions,
                    transitions = report.transitions,
                    failures = report.failures,
                    "Entitlement sweep finished"
                );
            }
            Ok(_) => {}
            Err(e) => {
                error!(error = ?e, "Failed to list subscriptions for sweep");
            }
        }
    }
}
