//! Runs one submission through the sync pipeline and reports the outcome.
//!
//! Every run ends in exactly one terminal state and emits exactly one
//! [`SyncReport`] through the configured [`ResultSink`].

use crate::api::{ContactApi, ContactApiClient};
use crate::credentials::CredentialContext;
use crate::feed::{FeedConfig, SubmissionRecord};
use crate::gateway::HttpGateway;
use crate::mapping::{assemble, lookup_existing, resolve_email};
use crate::metrics_defs::SYNC_RESULT;
use crate::settings::IntegrationSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::counter;
use std::sync::Arc;
use url::Url;

pub const SKIPPED_NO_EMAIL: &str = "API call has been skipped because no valid email available";
pub const SKIPPED_DISABLED: &str = "API call has been skipped because the feed is disabled";
pub const SYNCED: &str = "BrightDoor has been successfully initialized and synced contact data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    ValidatingEmail,
    LookingUpExisting,
    Updating,
    Creating,
    Submitting,
    Skipped,
    Succeeded,
    Failed,
}

impl SyncState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SyncState::Skipped | SyncState::Succeeded | SyncState::Failed
        )
    }

    pub fn can_transition_to(&self, next: SyncState) -> bool {
        use SyncState::*;
        matches!(
            (self, next),
            // Disabled feed or unusable credentials end the run before validation.
            (Idle, ValidatingEmail | Skipped | Failed)
                | (ValidatingEmail, Skipped | LookingUpExisting | Creating)
                | (LookingUpExisting, Updating | Creating)
                | (Updating | Creating, Submitting)
                | (Submitting, Succeeded | Failed)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Failed,
    Skipped,
}

impl SyncStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Success => "success",
            SyncStatus::Failed => "failed",
            SyncStatus::Skipped => "skipped",
        }
    }
}

/// The single notification emitted for a sync attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub status: SyncStatus,
    pub message: String,
}

/// Receives the result of every sync attempt.
pub trait ResultSink: Send + Sync {
    fn report(&self, feed: &FeedConfig, report: &SyncReport);
}

/// Writes results to the log.
pub struct LogSink;

impl ResultSink for LogSink {
    fn report(&self, feed: &FeedConfig, report: &SyncReport) {
        match report.status {
            SyncStatus::Failed => tracing::warn!(
                feed = %feed.name,
                status = report.status.as_str(),
                message = %report.message,
                "BrightDoor sync finished"
            ),
            _ => tracing::info!(
                feed = %feed.name,
                status = report.status.as_str(),
                message = %report.message,
                "BrightDoor sync finished"
            ),
        }
    }
}

/// Last chance for the host to rewrite the pruned payload before it is sent.
pub trait PayloadFilter: Send + Sync {
    fn filter(&self, payload: Value, feed: &FeedConfig, submission: &SubmissionRecord) -> Value;
}

pub struct NoopFilter;

impl PayloadFilter for NoopFilter {
    fn filter(&self, payload: Value, _feed: &FeedConfig, _submission: &SubmissionRecord) -> Value {
        payload
    }
}

/// Final state, the states visited on the way, and the emitted report.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub path: Vec<SyncState>,
    pub report: SyncReport,
}

impl SyncOutcome {
    pub fn final_state(&self) -> SyncState {
        self.path.last().copied().unwrap_or(SyncState::Idle)
    }
}

struct SyncRun {
    path: Vec<SyncState>,
}

impl SyncRun {
    fn new() -> Self {
        SyncRun {
            path: vec![SyncState::Idle],
        }
    }

    fn state(&self) -> SyncState {
        self.path.last().copied().unwrap_or(SyncState::Idle)
    }

    fn advance(&mut self, next: SyncState) {
        let current = self.state();
        debug_assert!(
            current.can_transition_to(next),
            "invalid sync transition {current:?} -> {next:?}"
        );
        tracing::debug!(from = ?current, to = ?next, "Sync state transition");
        self.path.push(next);
    }
}

pub struct SyncOrchestrator {
    client: reqwest::Client,
    base_url: Url,
    sink: Arc<dyn ResultSink>,
    filter: Arc<dyn PayloadFilter>,
}

impl SyncOrchestrator {
    pub fn new(base_url: Url, sink: Arc<dyn ResultSink>) -> Self {
        SyncOrchestrator {
            client: reqwest::Client::new(),
            base_url,
            sink,
            filter: Arc::new(NoopFilter),
        }
    }

    pub fn with_filter(mut self, filter: Arc<dyn PayloadFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Entry point for the host: syncs one submission with the given settings snapshot.
    pub async fn notify(
        &self,
        settings: &IntegrationSettings,
        feed: &FeedConfig,
        submission: &SubmissionRecord,
    ) -> SyncOutcome {
        let mut run = SyncRun::new();

        if !feed.enabled {
            return self.finish(feed, run, SyncState::Skipped, SKIPPED_DISABLED.to_string());
        }

        let credentials = match CredentialContext::from_settings(settings) {
            Ok(credentials) => credentials,
            Err(e) => return self.finish(feed, run, SyncState::Failed, e.to_string()),
        };

        let api = ContactApiClient::new(HttpGateway::with_client(
            self.client.clone(),
            self.base_url.clone(),
            credentials,
        ));

        run.advance(SyncState::ValidatingEmail);
        self.run_validated(run, &api, feed, submission).await
    }

    /// Runs the pipeline against any [`ContactApi`] implementation.
    pub async fn run(
        &self,
        api: &dyn ContactApi,
        feed: &FeedConfig,
        submission: &SubmissionRecord,
    ) -> SyncOutcome {
        let mut run = SyncRun::new();
        if !feed.enabled {
            return self.finish(feed, run, SyncState::Skipped, SKIPPED_DISABLED.to_string());
        }
        run.advance(SyncState::ValidatingEmail);
        self.run_validated(run, api, feed, submission).await
    }

    async fn run_validated(
        &self,
        mut run: SyncRun,
        api: &dyn ContactApi,
        feed: &FeedConfig,
        submission: &SubmissionRecord,
    ) -> SyncOutcome {
        let Some(email) = resolve_email(feed, submission) else {
            tracing::debug!("Skipping BrightDoor sync, no valid email");
            return self.finish(feed, run, SyncState::Skipped, SKIPPED_NO_EMAIL.to_string());
        };

        let mut payload = assemble(feed, &email);
        if feed.check_existing_email {
            run.advance(SyncState::LookingUpExisting);
            if let Some(id) = lookup_existing(&email, api).await {
                payload.mark_existing(id);
            }
        }
        if payload.is_update() {
            run.advance(SyncState::Updating);
        } else {
            run.advance(SyncState::Creating);
        }

        let wire = match payload.to_wire() {
            Ok(wire) => self.filter.filter(wire, feed, submission),
            Err(e) => {
                run.advance(SyncState::Submitting);
                return self.finish(feed, run, SyncState::Failed, e.to_string());
            }
        };

        run.advance(SyncState::Submitting);
        match api.sync_contact(&wire).await {
            Ok(result) => {
                if let Some(id) = &result.id {
                    tracing::debug!(contact_id = %id, "BrightDoor contact synced");
                }
                self.finish(feed, run, SyncState::Succeeded, SYNCED.to_string())
            }
            Err(e) => self.finish(feed, run, SyncState::Failed, e.to_string()),
        }
    }

    fn finish(
        &self,
        feed: &FeedConfig,
        mut run: SyncRun,
        terminal: SyncState,
        message: String,
    ) -> SyncOutcome {
        run.advance(terminal);

        let status = match terminal {
            SyncState::Succeeded => SyncStatus::Success,
            SyncState::Skipped => SyncStatus::Skipped,
            _ => SyncStatus::Failed,
        };
        let report = SyncReport { status, message };

        counter!(SYNC_RESULT, "status" => status.as_str()).increment(1);
        self.sink.report(feed, &report);

        SyncOutcome {
            path: run.path,
            report,
        }
    }
}
