//! Filter supervisor - per-node coordination
//!
//! One supervisor per node: it owns the extractor map, finds or starts
//! filter workers per event type, brokers subscription refreshes, reloads
//! configuration atomically, and observes worker exits. It is the sole
//! writer of the shared `WorkerRegistry`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use sift_config::{check_filter_config, ExtractorMap};
use sift_protocol::{EventType, SubscriberHandle, Subscription};

use crate::error::{FilterError, Result};
use crate::group::{LocalGroup, ProcessGroup};
use crate::handle::WorkerHandle;
use crate::metrics::{SupervisorMetrics, SupervisorMetricsSnapshot};
use crate::worker;
use crate::WorkerRegistry;

/// Tunables for the filter subsystem
#[derive(Debug, Clone)]
pub struct FilterSettings {
    /// Supervisor mailbox capacity
    pub supervisor_mailbox: usize,

    /// Worker mailbox capacity (events and control messages)
    pub worker_mailbox: usize,

    /// Terminate a worker after this long without subscriptions
    pub worker_idle_ttl: Duration,

    /// Per-worker deadline for config reload acks
    pub reload_timeout: Duration,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            supervisor_mailbox: 64,
            worker_mailbox: 256,
            worker_idle_ttl: Duration::from_secs(300),
            reload_timeout: Duration::from_secs(5),
        }
    }
}

/// Messages processed by the supervisor
pub(crate) enum SupervisorMsg {
    /// Replace a subscriber's subscription set across event types
    Refresh {
        subscriber: SubscriberHandle,
        new_subs: Vec<Subscription>,
        prev_subs: Vec<Subscription>,
        done: Option<oneshot::Sender<()>>,
    },

    /// Reload the extractor map from the configured source
    ReloadConfig {
        reply: oneshot::Sender<Result<()>>,
    },

    /// A worker task finished
    WorkerExited { event_type: EventType },

    /// Stop the supervisor
    Shutdown,
}

/// Barrier handed back by `refresh_subscriptions`
///
/// Resolves once every involved worker has applied its part of the refresh
/// (or the refresh was abandoned because the supervisor shut down). Callers
/// that do not need the barrier just drop the ticket.
pub struct RefreshTicket {
    done: oneshot::Receiver<()>,
}

impl RefreshTicket {
    /// Wait for the refresh to be applied by every involved worker
    pub async fn completed(self) {
        let _ = self.done.await;
    }
}

/// Clonable handle to the supervisor - the public contract of the subsystem
#[derive(Clone)]
pub struct SupervisorHandle {
    sender: mpsc::Sender<SupervisorMsg>,
    registry: Arc<WorkerRegistry>,
    group: Arc<dyn ProcessGroup>,
    metrics: Arc<SupervisorMetrics>,
}

impl SupervisorHandle {
    /// Replace `subscriber`'s subscription set
    ///
    /// `new_subs` is the full new set across event types; `prev_subs` is
    /// the set being replaced. Event types present in `prev_subs` but
    /// absent from `new_subs` are cleared on their workers. Asynchronous:
    /// the returned ticket is the rendezvous barrier for callers that need
    /// to know all types have been processed.
    ///
    /// # Errors
    ///
    /// Returns `SupervisorClosed` when the supervisor has shut down.
    pub async fn refresh_subscriptions(
        &self,
        subscriber: SubscriberHandle,
        new_subs: Vec<Subscription>,
        prev_subs: Vec<Subscription>,
    ) -> Result<RefreshTicket> {
        let (done_tx, done_rx) = oneshot::channel();
        self.sender
            .send(SupervisorMsg::Refresh {
                subscriber,
                new_subs,
                prev_subs,
                done: Some(done_tx),
            })
            .await
            .map_err(|_| FilterError::SupervisorClosed)?;
        Ok(RefreshTicket { done: done_rx })
    }

    /// Reload the extractor map from the configured source
    ///
    /// Synchronous: resolves once every live worker holds its new field map
    /// snapshot and the map has been swapped. On any failure the previous
    /// map stays in effect and the error is returned.
    pub async fn reload_config(&self) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(SupervisorMsg::ReloadConfig { reply: reply_tx })
            .await
            .map_err(|_| FilterError::SupervisorClosed)?;
        reply_rx.await.map_err(|_| FilterError::SupervisorClosed)?
    }

    /// Enumerate the supervisors registered in the process group
    ///
    /// On a single node this is just the local handle.
    pub fn processes(&self) -> Vec<SupervisorHandle> {
        self.group.members()
    }

    /// The shared worker registry, for the ingress path
    #[inline]
    pub fn registry(&self) -> &Arc<WorkerRegistry> {
        &self.registry
    }

    /// Get a point-in-time snapshot of the supervisor's metrics
    #[inline]
    pub fn metrics_snapshot(&self) -> SupervisorMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Ask the supervisor to stop
    ///
    /// Live workers are told to shut down as well; in-flight deliveries are
    /// not awaited.
    pub async fn shutdown(&self) {
        let _ = self.sender.send(SupervisorMsg::Shutdown).await;
    }

    /// Check if the supervisor has shut down
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for SupervisorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisorHandle")
            .field("workers", &self.registry.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Per-node coordinator for the filter subsystem
pub struct Supervisor {
    /// Config source: filesystem path or inline JSON; `None` starts empty
    config_source: Option<String>,

    /// Current extractor map, replaced atomically on reload
    extractor_map: ExtractorMap,

    /// Shared with ingress; written only here
    registry: Arc<WorkerRegistry>,

    receiver: mpsc::Receiver<SupervisorMsg>,

    /// Cloned into worker-exit watcher tasks
    self_sender: mpsc::Sender<SupervisorMsg>,

    settings: FilterSettings,

    metrics: Arc<SupervisorMetrics>,
}

impl Supervisor {
    /// Start a supervisor with explicit settings and process group
    ///
    /// Loads the extractor map from `config_source` (a filesystem path or
    /// an inline JSON string; `None` or blank starts with an empty map),
    /// registers the handle in `group`, and spawns the supervisor task.
    ///
    /// # Errors
    ///
    /// Returns the config error when the initial load fails.
    pub fn spawn(
        config_source: Option<String>,
        settings: FilterSettings,
        group: Arc<dyn ProcessGroup>,
    ) -> Result<(SupervisorHandle, JoinHandle<()>)> {
        let extractor_map = match &config_source {
            Some(source) => ExtractorMap::load(source)?,
            None => ExtractorMap::new(),
        };

        let (tx, rx) = mpsc::channel(settings.supervisor_mailbox);
        let registry = Arc::new(WorkerRegistry::new());
        let metrics = Arc::new(SupervisorMetrics::new());

        let handle = SupervisorHandle {
            sender: tx.clone(),
            registry: Arc::clone(&registry),
            group: Arc::clone(&group),
            metrics: Arc::clone(&metrics),
        };
        group.register(handle.clone());

        let supervisor = Supervisor {
            config_source,
            extractor_map,
            registry,
            receiver: rx,
            self_sender: tx,
            settings,
            metrics,
        };
        let join = tokio::spawn(supervisor.run());

        Ok((handle, join))
    }

    /// Start a supervisor with default settings in a fresh local group
    pub fn spawn_local(config_source: Option<String>) -> Result<(SupervisorHandle, JoinHandle<()>)> {
        Self::spawn(
            config_source,
            FilterSettings::default(),
            Arc::new(LocalGroup::new()),
        )
    }

    async fn run(mut self) {
        tracing::info!(
            types = self.extractor_map.len(),
            "filter supervisor starting"
        );

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                SupervisorMsg::Refresh {
                    subscriber,
                    new_subs,
                    prev_subs,
                    done,
                } => self.handle_refresh(subscriber, new_subs, prev_subs, done).await,
                SupervisorMsg::ReloadConfig { reply } => {
                    let result = self.handle_reload().await;
                    let _ = reply.send(result);
                }
                SupervisorMsg::WorkerExited { event_type } => {
                    self.handle_worker_exited(&event_type);
                }
                SupervisorMsg::Shutdown => break,
            }
        }

        for event_type in self.registry.event_types() {
            if let Some(handle) = self.registry.unregister(&event_type) {
                handle.try_shutdown();
            }
        }

        let s = self.metrics.snapshot();
        tracing::info!(
            refreshes = s.refreshes,
            workers_started = s.workers_started,
            "filter supervisor shutting down"
        );
    }

    /// Fan a refresh out to the workers of every involved event type
    ///
    /// Types in `prev_subs` that the new set no longer mentions get an
    /// empty refresh (the canonical clear) if a worker is live; otherwise
    /// there is no state to clear. The per-worker acks are aggregated by a
    /// detached task so this loop never waits on workers.
    async fn handle_refresh(
        &mut self,
        subscriber: SubscriberHandle,
        new_subs: Vec<Subscription>,
        prev_subs: Vec<Subscription>,
        done: Option<oneshot::Sender<()>>,
    ) {
        self.metrics.record_refresh();

        let mut new_by_type: HashMap<EventType, Vec<Subscription>> = HashMap::new();
        for sub in new_subs {
            new_by_type
                .entry(sub.event_type().clone())
                .or_default()
                .push(sub);
        }

        let removed_types: HashSet<EventType> = prev_subs
            .iter()
            .map(Subscription::event_type)
            .filter(|t| !new_by_type.contains_key(*t))
            .cloned()
            .collect();

        let mut acks: Vec<oneshot::Receiver<()>> = Vec::new();

        for (event_type, subs) in new_by_type {
            let handle = self.find_or_start(&event_type);
            let (ack_tx, ack_rx) = oneshot::channel();
            match handle.refresh(subscriber.clone(), subs, Some(ack_tx)).await {
                Ok(()) => acks.push(ack_rx),
                Err(e) => {
                    tracing::warn!(
                        event_type = %event_type,
                        subscriber = %subscriber.id(),
                        error = %e,
                        "refresh skipped for event type"
                    );
                }
            }
        }

        for event_type in removed_types {
            let Some(handle) = self.registry.lookup(&event_type) else {
                continue;
            };
            let (ack_tx, ack_rx) = oneshot::channel();
            if handle
                .refresh(subscriber.clone(), Vec::new(), Some(ack_tx))
                .await
                .is_ok()
            {
                acks.push(ack_rx);
            }
        }

        if let Some(done) = done {
            tokio::spawn(async move {
                for ack in acks {
                    let _ = ack.await;
                }
                let _ = done.send(());
            });
        }
    }

    /// Reload the extractor map and push per-type snapshots to live workers
    ///
    /// Atomic: on any failure the previous map stays current and workers
    /// that already accepted the next snapshot are rolled back best-effort.
    async fn handle_reload(&mut self) -> Result<()> {
        let next = match &self.config_source {
            Some(source) => match ExtractorMap::load(source) {
                Ok(next) => next,
                Err(e) => {
                    self.metrics.record_reload_failure();
                    tracing::error!(error = %e, "config reload failed, keeping previous map");
                    return Err(e.into());
                }
            },
            None => ExtractorMap::new(),
        };

        let union_types: HashSet<EventType> = self
            .extractor_map
            .event_types()
            .chain(next.event_types())
            .cloned()
            .collect();

        for event_type in &union_types {
            if let Err(e) =
                check_filter_config(event_type.as_str(), &next.for_event_type(event_type))
            {
                self.metrics.record_reload_failure();
                tracing::error!(
                    event_type = %event_type,
                    error = %e,
                    "config reload failed validation, keeping previous map"
                );
                return Err(e.into());
            }
        }

        let mut updated: Vec<(EventType, WorkerHandle)> = Vec::new();
        for event_type in &union_types {
            let Some(handle) = self.registry.lookup(event_type) else {
                continue;
            };
            match handle
                .reload_field_map(next.for_event_type(event_type), self.settings.reload_timeout)
                .await
            {
                Ok(()) => updated.push((event_type.clone(), handle)),
                Err(e) => {
                    tracing::error!(
                        event_type = %event_type,
                        error = %e,
                        "config reload aborted, restoring previous snapshots"
                    );
                    for (t, h) in updated {
                        let _ = h
                            .reload_field_map(
                                self.extractor_map.for_event_type(&t),
                                self.settings.reload_timeout,
                            )
                            .await;
                    }
                    self.metrics.record_reload_failure();
                    return Err(e);
                }
            }
        }

        self.extractor_map = next;
        self.metrics.record_reload_success();
        tracing::info!(
            types = self.extractor_map.len(),
            workers_updated = updated.len(),
            "extractor configuration reloaded"
        );
        Ok(())
    }

    /// Look up the worker for an event type, starting one if needed
    ///
    /// A registered handle whose worker already exited (the exit notice is
    /// still in flight) counts as absent and gets replaced.
    fn find_or_start(&mut self, event_type: &EventType) -> WorkerHandle {
        if let Some(handle) = self.registry.lookup(event_type) {
            if !handle.is_closed() {
                return handle;
            }
            self.registry.remove_if(event_type, WorkerHandle::is_closed);
        }

        let field_map = self.extractor_map.for_event_type(event_type);
        let (handle, join) = worker::spawn(
            event_type.clone(),
            field_map,
            self.settings.worker_mailbox,
            self.settings.worker_idle_ttl,
        );

        self.registry.register(event_type.clone(), handle.clone());
        self.metrics.record_worker_started();
        tracing::info!(event_type = %event_type, "filter worker started");

        let notifier = self.self_sender.clone();
        let exited_type = event_type.clone();
        tokio::spawn(async move {
            let _ = join.await;
            let _ = notifier
                .send(SupervisorMsg::WorkerExited {
                    event_type: exited_type,
                })
                .await;
        });

        handle
    }

    /// Clean up after a worker exit; no restart - the next refresh or
    /// reload starts a fresh worker
    fn handle_worker_exited(&mut self, event_type: &EventType) {
        self.metrics.record_worker_exited();
        if self.registry.remove_if(event_type, WorkerHandle::is_closed) {
            tracing::info!(event_type = %event_type, "filter worker exited, unregistered");
        }
    }
}
