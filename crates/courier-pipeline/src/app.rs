//! Concrete wiring: config + SQLite + collaborators → a shared
//! [`EventContext`] the host hands events to.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use courier_core::{config::LimitsConfig, CourierConfig, CourierError, InboundEvent};
use courier_format::FeedbackPolicy;
use courier_store::{DbHandle, EventGate, MappingStore, SharedWorkspaceCache};

use crate::collaborators::{LlmBackend, Messenger};
use crate::process::{process_event, EventContext, EventOutcome};
use crate::resolver::{ContextResolver, WorkspaceCache};

/// The assembled relay. One instance serves all channels and threads;
/// every inbound event gets its own task.
pub struct Courier {
    gate: EventGate,
    resolver: ContextResolver,
    backend: Arc<dyn LlmBackend>,
    messenger: Arc<dyn Messenger>,
    limits: LimitsConfig,
    feedback: FeedbackPolicy,
}

impl Courier {
    /// Open (or create) the database at the configured path and wire up
    /// the pipeline.
    pub fn new(
        config: &CourierConfig,
        backend: Arc<dyn LlmBackend>,
        messenger: Arc<dyn Messenger>,
    ) -> Result<Arc<Self>, CourierError> {
        let db = courier_store::open(&config.store.path)
            .map_err(|e| CourierError::StoreUnavailable(e.to_string()))?;
        info!(path = %config.store.path, "courier store opened");
        Ok(Self::with_db(config, db, backend, messenger))
    }

    /// Wire the pipeline onto an already-open database handle. Used by
    /// tests with in-memory SQLite.
    pub fn with_db(
        config: &CourierConfig,
        db: DbHandle,
        backend: Arc<dyn LlmBackend>,
        messenger: Arc<dyn Messenger>,
    ) -> Arc<Self> {
        let request_timeout = config.limits.request_timeout();
        let cache = WorkspaceCache::new(
            SharedWorkspaceCache::new(db.clone()),
            Duration::from_secs(config.workspaces.local_ttl_secs),
            config.workspaces.shared_ttl_secs,
            config.workspaces.fallback.clone(),
            request_timeout,
        );
        let resolver = ContextResolver::new(
            MappingStore::new(db.clone()),
            cache,
            config.workspaces.default.clone(),
            request_timeout,
        );
        Arc::new(Self {
            gate: EventGate::new(db, config.dedup.ttl_secs),
            resolver,
            backend,
            messenger,
            limits: config.limits.clone(),
            feedback: FeedbackPolicy::new(
                config.feedback.min_substantive_len,
                config.feedback.enabled,
            ),
        })
    }

    /// Handle one event to completion on the current task.
    pub async fn handle(self: &Arc<Self>, event: InboundEvent) -> EventOutcome {
        let ctx: Arc<dyn EventContext> = self.clone();
        process_event(&ctx, event).await
    }

    /// Spawn one event as an independent task; events never block each
    /// other and run to completion once admitted.
    pub fn spawn(self: &Arc<Self>, event: InboundEvent) -> JoinHandle<EventOutcome> {
        let courier = self.clone();
        tokio::spawn(async move { courier.handle(event).await })
    }
}

impl EventContext for Courier {
    fn gate(&self) -> &EventGate {
        &self.gate
    }
    fn resolver(&self) -> &ContextResolver {
        &self.resolver
    }
    fn backend(&self) -> &Arc<dyn LlmBackend> {
        &self.backend
    }
    fn messenger(&self) -> &Arc<dyn Messenger> {
        &self.messenger
    }
    fn limits(&self) -> &LimitsConfig {
        &self.limits
    }
    fn feedback(&self) -> &FeedbackPolicy {
        &self.feedback
    }
}
