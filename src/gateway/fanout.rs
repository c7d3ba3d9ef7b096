//! Hourly notification fan-out.

use super::Gateway;
use chrono::Timelike;
use futures::future::join_all;
use leetbot_core::{
    context::Context, error::LeetbotError, message::OutgoingMessage, traits::Transport,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Transport calls per recipient before giving up.
pub const MAX_DELIVERY_ATTEMPTS: u32 = 3;

/// Outcome of one sweep. Informational; individual failures are only logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// UTC hour the sweep ran for.
    pub hour: u8,
    pub recipients: usize,
    pub delivered: usize,
    pub failed: usize,
}

impl Gateway {
    fn transport(&self) -> Result<&Arc<dyn Transport>, LeetbotError> {
        self.transport
            .as_ref()
            .ok_or_else(|| LeetbotError::Config("no delivery transport configured".into()))
    }

    /// Deliver today's task to everyone subscribed at the current UTC hour.
    ///
    /// Listing subscribers, resolving the task, or persisting a freshly
    /// fetched task failing aborts the sweep before anything is sent. Deliveries run concurrently and are all
    /// awaited; a failed delivery is logged and does not fail the sweep.
    pub async fn notify_subscribers(&self, ctx: &Context) -> Result<SweepReport, LeetbotError> {
        // Refuse before touching storage when there is nothing to send with.
        self.transport()?;
        let hour = self.clock.now().hour() as u8;

        let users = self.storage.get_subscribed_users(ctx, hour).await?;
        let resolution = self.resolve_todays_task(ctx).await?;
        if let Some(e) = resolution.persist_error {
            warn!(
                "sweep {hour}:00 UTC aborted, task {} could not be persisted",
                resolution.task.day_key
            );
            return Err(e);
        }

        let mut template = OutgoingMessage::new(0, resolution.task.text());
        template.parse_mode = self.parse_mode.clone();

        let deliveries = users.iter().map(|user| {
            let payload = template.for_recipient(user.chat_id);
            async move {
                let result = self.deliver(ctx, &payload).await;
                (user.id, result)
            }
        });
        let results = join_all(deliveries).await;

        let mut report = SweepReport {
            hour,
            recipients: results.len(),
            ..SweepReport::default()
        };
        for (user_id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    error!("failed to deliver task to user {user_id}: {e}");
                }
            }
        }

        info!(
            "sweep {hour}:00 UTC: {}/{} delivered",
            report.delivered, report.recipients
        );
        Ok(report)
    }

    /// Deliver one payload, retrying up to [`MAX_DELIVERY_ATTEMPTS`] times.
    ///
    /// An attempt fails when the transport errors or answers with a status
    /// of 400 or above. Retries are immediate. A cancelled context stops
    /// retrying.
    pub async fn deliver(&self, ctx: &Context, payload: &OutgoingMessage) -> Result<(), LeetbotError> {
        let transport = self.transport()?;
        let mut attempt = 1;
        loop {
            let failure = match transport.send(ctx, payload).await {
                Ok(status) if status < 400 => return Ok(()),
                Ok(status) => LeetbotError::DeliveryStatus(status),
                Err(e) => e,
            };
            if attempt >= MAX_DELIVERY_ATTEMPTS || failure.is_cancelled() {
                return Err(failure);
            }
            debug!(
                "{} delivery to chat {} failed (attempt {attempt}/{MAX_DELIVERY_ATTEMPTS}): {failure}",
                transport.name(),
                payload.chat_id
            );
            attempt += 1;
        }
    }
}
