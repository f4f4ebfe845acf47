//! Background sweep that persists `expired` on past-dated documents.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::db::DbPool;
use crate::services::expiry;

/// Configuration for the expiry sweep.
#[derive(Debug, Clone)]
pub struct ExpirySweepConfig {
    /// How often to run the sweep (in seconds)
    pub interval_secs: u64,
}

/// Start the expiry sweep background task.
///
/// Does nothing when the interval is zero.
pub fn start_expiry_sweep_task(pool: Arc<DbPool>, config: ExpirySweepConfig) {
    if config.interval_secs == 0 {
        info!("Expiry sweep disabled");
        return;
    }

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep (interval: {} seconds)",
            config.interval_secs
        );

        let mut ticker = interval(Duration::from_secs(config.interval_secs));

        loop {
            ticker.tick().await;

            if let Err(e) = expiry::mark_expired_documents(&pool, expiry::today()).await {
                error!("Expiry sweep error: {}", e);
            }
        }
    });
}
