use std::sync::Arc;

use super::{
    Attribution, DrainReport, FallbackQueue, FunnelKind, KeyValueStore, LeadFields,
    LeadSubmission, LeadTransport, RetryPolicy, StoreError, SubmissionController,
    SubmissionOutcome,
};

/// Everything needed to deliver one funnel's leads: its transport, its
/// fallback queue and the controller tying them together.
pub struct LeadChannel {
    funnel: FunnelKind,
    transport: Arc<dyn LeadTransport>,
    queue: Arc<FallbackQueue>,
    controller: SubmissionController,
}

impl LeadChannel {
    pub fn new(
        funnel: FunnelKind,
        transport: Arc<dyn LeadTransport>,
        store: Arc<dyn KeyValueStore>,
        policy: RetryPolicy,
    ) -> Self {
        let queue = Arc::new(FallbackQueue::new(store, funnel.queue_key()));
        let controller = SubmissionController::new(transport.clone(), queue.clone(), policy);
        Self {
            funnel,
            transport,
            queue,
            controller,
        }
    }

    pub fn funnel(&self) -> FunnelKind {
        self.funnel
    }

    pub fn queue(&self) -> &FallbackQueue {
        &self.queue
    }

    /// Attach attribution to validated fields and hand them to the controller.
    pub async fn submit(&self, fields: LeadFields, attribution: Attribution) -> SubmissionOutcome {
        let submission = LeadSubmission::new(self.funnel, fields, attribution);
        self.controller.submit(submission).await
    }

    pub async fn drain(&self) -> Result<DrainReport, StoreError> {
        self.queue.drain(self.transport.as_ref()).await
    }
}

#[derive(Clone)]
pub struct LeadChannels {
    consultation: Arc<LeadChannel>,
    ebook: Arc<LeadChannel>,
}

impl LeadChannels {
    pub fn new(consultation: LeadChannel, ebook: LeadChannel) -> Self {
        Self {
            consultation: Arc::new(consultation),
            ebook: Arc::new(ebook),
        }
    }

    pub fn get(&self, funnel: FunnelKind) -> &Arc<LeadChannel> {
        match funnel {
            FunnelKind::Consultation => &self.consultation,
            FunnelKind::Ebook => &self.ebook,
        }
    }

    /// Resend every funnel's queued leads in the background. Called once per
    /// funnel page load; the page never waits on it.
    pub fn spawn_drain(&self) -> tokio::task::JoinHandle<()> {
        let channels = [self.consultation.clone(), self.ebook.clone()];
        tokio::spawn(async move {
            for channel in channels {
                match channel.drain().await {
                    Ok(report) if report.attempted > 0 => {
                        tracing::debug!(funnel = %channel.funnel(), ?report, "Fallback drain finished");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!(funnel = %channel.funnel(), "Fallback drain failed: {e}");
                    }
                }
            }
        })
    }
}
