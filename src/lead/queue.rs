use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{KeyValueStore, LeadSubmission, LeadTransport, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    pub attempted: usize,
    pub delivered: usize,
    pub remaining: usize,
    /// Stored entries that no longer decode as a submission. They are kept
    /// as-is and never attempted.
    pub unreadable: usize,
    /// Another drain of the same queue was already running.
    pub skipped: bool,
}

/// Submissions that failed immediate delivery, stored as one JSON array under
/// a single key.
///
/// Entries that fail to decode are carried along untouched so one bad entry
/// never blocks the rest of the queue. A value that is not a JSON array at all
/// is moved aside under a `-corrupt-<millis>` key and the queue starts over.
///
/// Every read-modify-write happens under `lock`, so appends and drains in this
/// process never lose each other's updates. Separate processes pointed at the
/// same store can still overwrite each other.
pub struct FallbackQueue {
    store: Arc<dyn KeyValueStore>,
    key: String,
    lock: Mutex<()>,
    draining: AtomicBool,
}

impl FallbackQueue {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
            lock: Mutex::new(()),
            draining: AtomicBool::new(false),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn load(&self) -> Result<Vec<LeadSubmission>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(leads(self.read().await?))
    }

    pub async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.load().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }

    /// Append one submission; returns the number of queued submissions.
    pub async fn append(&self, submission: &LeadSubmission) -> Result<usize, StoreError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read().await?;
        entries.push(QueueEntry::Lead(submission.clone()));
        self.write(&entries).await?;
        Ok(entries.iter().filter(|e| e.lead().is_some()).count())
    }

    /// Try every queued submission exactly once. Delivered items are removed,
    /// failed ones stay. An empty or absent queue is left untouched.
    ///
    /// Delivery runs without holding the lock; items appended meanwhile are
    /// kept when the result is written back.
    pub async fn drain(&self, transport: &dyn LeadTransport) -> Result<DrainReport, StoreError> {
        if self.draining.swap(true, Ordering::AcqRel) {
            return Ok(DrainReport {
                skipped: true,
                ..DrainReport::default()
            });
        }
        // Cleared on drop, so a cancelled drain does not block later ones.
        let _draining = DrainGuard(&self.draining);
        self.drain_inner(transport).await
    }

    async fn drain_inner(&self, transport: &dyn LeadTransport) -> Result<DrainReport, StoreError> {
        let items = {
            let _guard = self.lock.lock().await;
            leads(self.read().await?)
        };

        if items.is_empty() {
            return Ok(DrainReport::default());
        }

        tracing::info!(queue = %self.key, items = items.len(), "Draining fallback queue");

        let mut delivered: HashSet<Uuid> = HashSet::new();
        for item in &items {
            match transport.deliver(item).await {
                Ok(receipt) => {
                    tracing::debug!(
                        lead = %item.id(),
                        lead_id = ?receipt.lead_id,
                        "Queued lead delivered"
                    );
                    delivered.insert(item.id());
                }
                Err(e) => {
                    tracing::warn!(lead = %item.id(), "Queued lead still failing: {e}");
                }
            }
        }

        let _guard = self.lock.lock().await;
        let remaining: Vec<QueueEntry> = self
            .read()
            .await?
            .into_iter()
            .filter(|entry| !entry.lead().is_some_and(|lead| delivered.contains(&lead.id())))
            .collect();
        let unreadable = remaining.iter().filter(|e| e.lead().is_none()).count();

        if remaining.is_empty() {
            self.store.remove(&self.key).await?;
            tracing::info!(queue = %self.key, "Fallback queue fully delivered");
        } else {
            self.write(&remaining).await?;
            tracing::info!(queue = %self.key, remaining = remaining.len(), "Leads kept for retry");
        }

        Ok(DrainReport {
            attempted: items.len(),
            delivered: delivered.len(),
            remaining: remaining.len() - unreadable,
            unreadable,
            skipped: false,
        })
    }

    async fn read(&self) -> Result<Vec<QueueEntry>, StoreError> {
        let raw = match self.store.get(&self.key).await? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Vec::new()),
        };

        match serde_json::from_slice::<Vec<QueueEntry>>(&raw) {
            Ok(entries) => {
                let unreadable = entries.iter().filter(|e| e.lead().is_none()).count();
                if unreadable > 0 {
                    tracing::warn!(queue = %self.key, unreadable, "Skipping unreadable queue entries");
                }
                Ok(entries)
            }
            Err(e) => {
                let aside = format!("{}-corrupt-{}", self.key, chrono::Utc::now().timestamp_millis());
                self.store.set(&aside, raw).await?;
                self.store.remove(&self.key).await?;
                tracing::error!(queue = %self.key, moved_to = %aside, "Corrupt fallback queue moved aside: {e}");
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, entries: &[QueueEntry]) -> Result<(), StoreError> {
        let raw = serde_json::to_vec(entries)?;
        self.store.set(&self.key, Bytes::from(raw)).await
    }
}

/// One stored queue element. Anything that does not decode as a submission is
/// kept verbatim.
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum QueueEntry {
    Lead(LeadSubmission),
    Unreadable(Value),
}

impl QueueEntry {
    fn lead(&self) -> Option<&LeadSubmission> {
        match self {
            QueueEntry::Lead(lead) => Some(lead),
            QueueEntry::Unreadable(_) => None,
        }
    }
}

fn leads(entries: Vec<QueueEntry>) -> Vec<LeadSubmission> {
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            QueueEntry::Lead(lead) => Some(lead),
            QueueEntry::Unreadable(_) => None,
        })
        .collect()
}

struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
