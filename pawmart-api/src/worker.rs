use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::state::AppState;

/// Moves paid orders along processing → shipped → delivered on a timer,
/// standing in for a warehouse and courier
pub async fn start_fulfillment_worker(state: AppState, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately
    ticker.tick().await;

    info!("Fulfillment worker started, advancing orders every {:?}", period);

    loop {
        ticker.tick().await;
        if run_once(&state).await > 0 {
            state.persist().await;
        }
    }
}

/// One sweep; returns how many orders changed
pub async fn run_once(state: &AppState) -> usize {
    let advanced = state.store.write().await.auto_advance();
    for order in &advanced {
        info!("Order {} is now {}", order.order_number, order.status);
    }
    advanced.len()
}

/// Periodically clears expired OTP challenges and stale guest sessions
pub async fn start_session_sweeper(state: AppState, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    info!("Session sweeper started, running every {:?}", period);

    loop {
        ticker.tick().await;
        if sweep_sessions(&state).await > 0 {
            state.persist().await;
        }
    }
}

/// Returns how many guest sessions were dropped
pub async fn sweep_sessions(state: &AppState) -> usize {
    let mut store = state.store.write().await;
    let purged = store.purge_expired_otps();
    if purged > 0 {
        debug!("Purged {} expired OTP sessions", purged);
    }

    let pruned = store.prune_guest_sessions();
    if pruned > 0 {
        info!("Pruned {} guest sessions", pruned);
    }
    pruned
}
