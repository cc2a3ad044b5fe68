pub mod attribution;
pub mod channel;
pub mod controller;
pub mod queue;
pub mod store;
pub mod submission;
pub mod transport;

use serde::{Deserialize, Serialize};

pub use attribution::Attribution;
pub use channel::{LeadChannel, LeadChannels};
pub use controller::{RetryPolicy, SubmissionController, SubmissionOutcome};
pub use queue::{DrainReport, FallbackQueue};
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use submission::{FieldValue, LeadFields, LeadSubmission};
pub use transport::{DeliveryError, DeliveryReceipt, HttpLeadTransport, LeadId, LeadTransport};

/// The lead funnels the site collects submissions for. Each funnel has its
/// own lead endpoint and its own fallback queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunnelKind {
    Consultation,
    Ebook,
}

impl FunnelKind {
    pub const ALL: [FunnelKind; 2] = [FunnelKind::Consultation, FunnelKind::Ebook];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "consultation" => Some(FunnelKind::Consultation),
            "ebook" => Some(FunnelKind::Ebook),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FunnelKind::Consultation => "consultation",
            FunnelKind::Ebook => "ebook",
        }
    }

    /// Storage key holding this funnel's fallback queue.
    pub fn queue_key(&self) -> &'static str {
        match self {
            FunnelKind::Consultation => "consultationLeadFallbackQueue",
            FunnelKind::Ebook => "ebookLeadFallbackQueue",
        }
    }
}

impl std::fmt::Display for FunnelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
