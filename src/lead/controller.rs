use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use super::{FallbackQueue, LeadId, LeadSubmission, LeadTransport};

/// Bounded linear backoff: the wait before retry `r` (1-based) is
/// `r * backoff_step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Saturates at `Duration::MAX` instead of overflowing.
    pub fn delay_before(&self, retry: u32) -> Duration {
        self.backoff_step
            .checked_mul(retry)
            .unwrap_or(Duration::MAX)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// `retries` is the zero-based index of the attempt that succeeded.
    Delivered {
        submission_id: Uuid,
        retries: u32,
        lead_id: Option<LeadId>,
        booking_url: Option<String>,
    },
    /// Every attempt failed and the submission went to the fallback queue.
    /// `persisted` is false only if the queue write itself failed.
    #[serde(rename = "queued")]
    SavedOffline { submission_id: Uuid, persisted: bool },
}

impl SubmissionOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, SubmissionOutcome::Delivered { .. })
    }
}

pub struct SubmissionController {
    transport: Arc<dyn LeadTransport>,
    queue: Arc<FallbackQueue>,
    policy: RetryPolicy,
}

impl SubmissionController {
    pub fn new(
        transport: Arc<dyn LeadTransport>,
        queue: Arc<FallbackQueue>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            queue,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Deliver with bounded retries; fall back to the queue once attempts run
    /// out. Attempts are strictly sequential.
    pub async fn submit(&self, submission: LeadSubmission) -> SubmissionOutcome {
        let attempts = self.policy.max_attempts.max(1);

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.policy.delay_before(attempt)).await;
            }

            match self.transport.deliver(&submission).await {
                Ok(receipt) => {
                    tracing::info!(
                        funnel = %submission.funnel(),
                        lead = %submission.id(),
                        retries = attempt,
                        "Lead delivered"
                    );
                    return SubmissionOutcome::Delivered {
                        submission_id: submission.id(),
                        retries: attempt,
                        lead_id: receipt.lead_id,
                        booking_url: receipt.booking_url,
                    };
                }
                Err(e) => {
                    tracing::warn!(
                        funnel = %submission.funnel(),
                        lead = %submission.id(),
                        attempt = attempt + 1,
                        max_attempts = attempts,
                        "Lead delivery attempt failed: {e}"
                    );
                }
            }
        }

        let persisted = match self.queue.append(&submission).await {
            Ok(len) => {
                tracing::info!(
                    queue = %self.queue.key(),
                    lead = %submission.id(),
                    queue_len = len,
                    "Lead saved to fallback queue"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    queue = %self.queue.key(),
                    lead = %submission.id(),
                    payload = %serde_json::to_string(&submission).unwrap_or_default(),
                    "Failed to queue undelivered lead: {e}"
                );
                false
            }
        };

        SubmissionOutcome::SavedOffline {
            submission_id: submission.id(),
            persisted,
        }
    }
}
