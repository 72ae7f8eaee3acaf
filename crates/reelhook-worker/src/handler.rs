//! Per-job handling: run the upstream handler, then deliver its outcome.

use serde_json::{json, Value};
use tracing::{debug, Instrument};

use reelhook_models::{Job, JobResult};
use reelhook_webhook::{JobOutcome, WebhookDispatcher};

use crate::adapter::JobAdapter;
use crate::logging::JobLogger;

/// Wraps a [`JobAdapter`] with webhook delivery.
///
/// The value returned to the execution framework never depends on whether
/// delivery worked.
pub struct CallbackHandler<A> {
    adapter: A,
    dispatcher: WebhookDispatcher,
}

impl<A: JobAdapter> CallbackHandler<A> {
    pub fn new(adapter: A, dispatcher: WebhookDispatcher) -> Self {
        Self {
            adapter,
            dispatcher,
        }
    }

    /// Process one job.
    ///
    /// Returns the adapter's value untouched on success, or
    /// `{"error": <message>, "status": "ERROR"}` when the adapter fails.
    pub async fn handle(&self, job: &Job) -> Value {
        let logger = JobLogger::new(&job.id);
        let span = logger.create_span();

        async {
            logger.log_handler_start();

            match self.adapter.run(job).await {
                Ok(value) => {
                    logger.log_handler_finished();
                    let result = JobResult::from_value(&value);
                    let delivery = self
                        .dispatcher
                        .dispatch(job, JobOutcome::Completed(&result))
                        .await;
                    logger.log_delivery(&delivery);
                    value
                }
                Err(e) => {
                    logger.log_handler_failed(&e);
                    debug!(error = ?e, "Handler failure detail");

                    let message = e.to_string();
                    let delivery = self
                        .dispatcher
                        .dispatch(job, JobOutcome::Failed(&message))
                        .await;
                    logger.log_delivery(&delivery);
                    error_result(&message)
                }
            }
        }
        .instrument(span)
        .await
    }
}

/// Job result reported when the handler fails.
pub fn error_result(message: &str) -> Value {
    json!({ "error": message, "status": "ERROR" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_result_shape() {
        assert_eq!(
            error_result("boom"),
            json!({"error": "boom", "status": "ERROR"})
        );
    }
}
