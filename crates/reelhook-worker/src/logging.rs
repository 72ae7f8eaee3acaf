//! Per-job log lines for the handle-then-deliver cycle.

use tracing::{error, info, warn, Level, Span};

use reelhook_models::JobId;
use reelhook_webhook::DeliveryOutcome;

use crate::error::AdapterError;

/// Logs the lifecycle of one job: handler run, then webhook delivery.
///
/// Every line carries the job id and the stage it was emitted from.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: JobId,
}

impl JobLogger {
    pub fn new(job_id: &JobId) -> Self {
        Self {
            job_id: job_id.clone(),
        }
    }

    /// Span wrapping everything done for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("job", job_id = %self.job_id)
    }

    pub fn log_handler_start(&self) {
        info!(job_id = %self.job_id, stage = "handler", "Running job handler");
    }

    pub fn log_handler_finished(&self) {
        info!(job_id = %self.job_id, stage = "handler", "Handler finished, delivering result");
    }

    pub fn log_handler_failed(&self, err: &AdapterError) {
        error!(
            job_id = %self.job_id,
            stage = "handler",
            error = %err,
            "Handler failed, delivering failure"
        );
    }

    /// One line for the terminal state of the delivery attempt.
    pub fn log_delivery(&self, outcome: &DeliveryOutcome) {
        let (level, summary) = delivery_summary(outcome);
        if level == Level::WARN {
            warn!(job_id = %self.job_id, stage = "delivery", "{}", summary);
        } else {
            info!(job_id = %self.job_id, stage = "delivery", "{}", summary);
        }
    }
}

/// Severity and text for a delivery outcome. Only failures warn.
pub(crate) fn delivery_summary(outcome: &DeliveryOutcome) -> (Level, String) {
    match outcome {
        DeliveryOutcome::Skipped => (Level::INFO, "No callback configured".to_string()),
        DeliveryOutcome::Delivered {
            route,
            fallback_used: false,
        } => (
            Level::INFO,
            format!("Callback delivered via {}", route.as_str()),
        ),
        DeliveryOutcome::Delivered {
            route,
            fallback_used: true,
        } => (
            Level::INFO,
            format!("Callback delivered via {} after form retry", route.as_str()),
        ),
        DeliveryOutcome::Failed { route, reason } => (
            Level::WARN,
            format!("Callback delivery via {} failed: {}", route.as_str(), reason),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelhook_webhook::DeliveryRoute;

    #[test]
    fn test_delivered_summaries() {
        let (level, text) = delivery_summary(&DeliveryOutcome::Delivered {
            route: DeliveryRoute::FileDelivery,
            fallback_used: false,
        });
        assert_eq!(level, Level::INFO);
        assert_eq!(text, "Callback delivered via file");

        let (_, text) = delivery_summary(&DeliveryOutcome::Delivered {
            route: DeliveryRoute::InlineDelivery,
            fallback_used: true,
        });
        assert_eq!(text, "Callback delivered via inline after form retry");
    }

    #[test]
    fn test_failed_delivery_warns() {
        let (level, text) = delivery_summary(&DeliveryOutcome::Failed {
            route: DeliveryRoute::NoCallback,
            reason: "Invalid callback headers: bad".to_string(),
        });
        assert_eq!(level, Level::WARN);
        assert_eq!(
            text,
            "Callback delivery via no_callback failed: Invalid callback headers: bad"
        );
    }

    #[test]
    fn test_skipped_is_info() {
        let (level, text) = delivery_summary(&DeliveryOutcome::Skipped);
        assert_eq!(level, Level::INFO);
        assert_eq!(text, "No callback configured");
    }
}
