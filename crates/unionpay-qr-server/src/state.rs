use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use unionpay::{UnionPayClient, UnionPayError};

use crate::config::ServerConfig;

/// Map size at which stale records are swept on insert.
const PRUNE_THRESHOLD: usize = 10_000;

/// Age after which a record is dropped by a sweep.
const RETENTION_DAYS: i64 = 30;

/// Last status reported by the gateway for a bill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillRecord {
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// Shared application state
pub struct AppState {
    pub client: UnionPayClient,
    /// In memory only; durable storage belongs to whatever consumes the
    /// notifications. Records older than 30 days are swept once the map
    /// holds 10 000 entries, so growth is bounded by notification volume
    /// over that window.
    pub bills: DashMap<String, BillRecord>,
}

impl AppState {
    pub fn new(client: UnionPayClient) -> Self {
        Self {
            client,
            bills: DashMap::new(),
        }
    }

    pub fn from_config(config: &ServerConfig) -> Result<Self, UnionPayError> {
        Ok(Self::new(UnionPayClient::new(config.unionpay.clone())?))
    }

    /// Record a verified status change.
    pub fn record(&self, bill_no: &str, status: &str) {
        let previous = self.bills.insert(
            bill_no.to_string(),
            BillRecord {
                status: status.to_string(),
                updated_at: Utc::now(),
            },
        );

        match previous {
            Some(prev) if prev.status != status => tracing::info!(
                bill_no = %bill_no,
                from = %prev.status,
                to = %status,
                "bill status changed"
            ),
            Some(_) => tracing::debug!(bill_no = %bill_no, "duplicate notification"),
            None => tracing::info!(bill_no = %bill_no, status = %status, "bill status recorded"),
        }

        if self.bills.len() > PRUNE_THRESHOLD {
            self.prune_older_than(Duration::days(RETENTION_DAYS));
        }
    }

    /// Drop records last updated more than `max_age` ago. Returns how many
    /// were removed.
    pub fn prune_older_than(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let before = self.bills.len();
        self.bills.retain(|_, record| record.updated_at >= cutoff);
        let removed = before.saturating_sub(self.bills.len());
        if removed > 0 {
            tracing::info!(removed, remaining = self.bills.len(), "pruned stale bill records");
        }
        removed
    }

    pub fn status_of(&self, bill_no: &str) -> Option<BillRecord> {
        self.bills.get(bill_no).map(|r| r.value().clone())
    }
}
