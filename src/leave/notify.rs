//! Notification sink.
//!
//! Delivery is best effort: the workflow calls [`dispatch`] after the database
//! work has committed, and a failing sink only produces a warning in the log.

use async_trait::async_trait;
use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeaveEvent {
    LeaveRequested,
    LeaveApproved,
    LeaveRejected,
    LeaveCancelled,
    /// A pending request got new dates.
    LeaveUpdated,
    /// Sent to the delegate when approval authority is handed to them.
    DelegationAssigned,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        recipient_id: u64,
        event: LeaveEvent,
        payload: serde_json::Value,
    ) -> anyhow::Result<()>;
}

/// Email stand-in: records each message in the application log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        recipient_id: u64,
        event: LeaveEvent,
        payload: serde_json::Value,
    ) -> anyhow::Result<()> {
        info!(
            recipient_id,
            event = %event,
            payload = %payload,
            "Email notification sent"
        );
        Ok(())
    }
}

/// Sends and forgets; errors never reach the caller.
pub async fn dispatch(
    notifier: &dyn Notifier,
    recipient_id: u64,
    event: LeaveEvent,
    payload: serde_json::Value,
) {
    if let Err(e) = notifier.notify(recipient_id, event, payload).await {
        warn!(error = %e, recipient_id, event = %event, "Failed to send leave notification");
    }
}
