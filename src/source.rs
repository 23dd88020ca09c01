//! Activity feed client
//!
//! Wraps the single HTTP GET a dashboard load issues against the activity
//! aggregation endpoint. The feed hands out a monotonic ticket per request
//! and applies last-write-wins at resolution time: a response that arrives
//! after a newer request has already resolved is reported stale and must be
//! discarded by the caller. Cancellation is advisory only - the underlying
//! request is never aborted.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};

use crate::error::MetricsError;
use crate::schema::{ActivityAdapter, AdapterOutcome};

/// Outcome of one feed refresh
#[derive(Debug)]
pub enum FetchOutcome {
    /// This response is the newest resolved one; render it
    Fresh(AdapterOutcome),
    /// A newer request resolved first; discard this response
    Stale,
}

/// Client for the activity aggregation endpoint.
///
/// One feed per dashboard mount; the two counters are the only shared
/// state, so concurrent `refresh` calls need no locking.
pub struct ActivityFeed {
    client: reqwest::Client,
    endpoint: String,
    /// Tickets handed to issued requests
    issued: AtomicU64,
    /// Highest ticket that has resolved so far
    resolved: AtomicU64,
}

impl ActivityFeed {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            issued: AtomicU64::new(0),
            resolved: AtomicU64::new(0),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetch the activity list once.
    ///
    /// Errors surface as "no data available" to the caller; a stale result
    /// means a newer refresh already resolved and this one must be dropped.
    pub async fn refresh(&self) -> Result<FetchOutcome, MetricsError> {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(ticket, endpoint = %self.endpoint, "issuing feed request");

        let response = self.client.get(&self.endpoint).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MetricsError::FeedStatus(status.as_u16()));
        }

        let body = response.text().await?;
        let events = ActivityAdapter::parse_array(&body)?;
        let outcome = ActivityAdapter::to_canonical(&events);

        info!(
            ticket,
            records = outcome.records.len(),
            skipped = outcome.skipped,
            "feed refresh resolved"
        );
        Ok(self.settle(ticket, outcome))
    }

    /// Resolve a ticket: last writer wins by resolution order, not issue
    /// order
    fn settle(&self, ticket: u64, outcome: AdapterOutcome) -> FetchOutcome {
        let newest = self.resolved.fetch_max(ticket, Ordering::SeqCst);
        if newest > ticket {
            debug!(ticket, newest, "discarding stale feed response");
            FetchOutcome::Stale
        } else {
            FetchOutcome::Fresh(outcome)
        }
    }
}
