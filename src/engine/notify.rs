use uuid::Uuid;

use crate::error::AppError;
use crate::models::tracking::DeliveryStatus;

/// Best-effort outbound notifications. Callers log failures and carry on;
/// a sink error never fails the status transition that triggered it.
pub trait NotificationSink: Send + Sync {
    fn send(&self, order_id: Uuid, status: DeliveryStatus, message: &str)
        -> Result<(), AppError>;
}

/// Default sink: emits the notification as a structured log line.
pub struct LogNotifier;

impl NotificationSink for LogNotifier {
    fn send(
        &self,
        order_id: Uuid,
        status: DeliveryStatus,
        message: &str,
    ) -> Result<(), AppError> {
        tracing::info!(order_id = %order_id, status = %status, message, "delivery notification");
        Ok(())
    }
}
