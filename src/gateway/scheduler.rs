//! Hourly trigger for the fan-out.

use super::Gateway;
use chrono::{DateTime, Timelike, Utc};
use leetbot_core::context::Context;
use std::time::Duration;
use tracing::{error, info};

impl Gateway {
    /// Background task: run one sweep at the top of every UTC hour until
    /// `ctx` is cancelled.
    ///
    /// Each sweep gets a child context bounded by the sweep timeout, so a
    /// stuck sweep cannot run into the next hour.
    pub async fn hourly_loop(&self, ctx: &Context) {
        info!(
            "hourly delivery loop running | sweep timeout: {}s",
            self.sweep_timeout.as_secs()
        );
        loop {
            // Clock-aligned sleep: fire at :00 of the next hour.
            let wait = until_next_hour(self.clock.now());
            tokio::select! {
                _ = ctx.done() => break,
                _ = tokio::time::sleep(wait) => {}
            }

            let sweep_ctx = ctx.child(Some(self.sweep_timeout));
            match self.notify_subscribers(&sweep_ctx).await {
                Ok(report) if report.failed > 0 => error!(
                    "sweep {}:00 UTC: {} of {} deliveries failed",
                    report.hour, report.failed, report.recipients
                ),
                Ok(_) => {}
                Err(e) => error!("hourly sweep failed: {e}"),
            }
        }
        info!("hourly delivery loop stopped");
    }
}

/// Time left until the next full UTC hour.
pub(super) fn until_next_hour(now: DateTime<Utc>) -> Duration {
    let into_hour = Duration::from_secs(u64::from(now.minute()) * 60 + u64::from(now.second()))
        // Leap seconds report more than a second of nanos.
        + Duration::from_nanos(u64::from(now.nanosecond().min(999_999_999)));
    Duration::from_secs(3600).saturating_sub(into_hour)
}
