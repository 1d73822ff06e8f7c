//! Periodic removal of expired tokens.
//!
//! Listing already reaps expired tokens lazily; the sweep catches the ones
//! nobody lists.

use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::state::State;

/// Spawn the sweep loop. It stops once `shutdown` is cancelled.
pub(crate) fn spawn(
    state: Arc<State>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick fires immediately; start with a full interval wait.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("expired token sweep shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    sweep_once(&state, &shutdown).await;
                }
            }
        }
    })
}

async fn sweep_once(state: &State, shutdown: &CancellationToken) {
    let ctx = state
        .request_context()
        .with_cancellation(shutdown.child_token());

    if let Err(error) = state.app.api_tokens.sweep_expired_api_tokens(&ctx).await {
        warn!("expired token sweep failed: {error}");
    }
}
