//! Filter worker - per-event-type subscription matching
//!
//! Each worker owns the subscription state for one event type: a map from
//! subscriber to its current subscription set, plus an inverted index that
//! accelerates matching. Events arrive through the mailbox, get matched,
//! and are delivered to subscriber endpoints at most once each.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use sift_config::FieldMap;
use sift_protocol::{Event, EventType, FieldValue, SubscriberHandle, SubscriberId, Subscription};

use crate::handle::{WorkerHandle, WorkerMsg};
use crate::metrics::WorkerMetrics;

/// Key of one stored subscription: owner plus position in its set
type SubKey = (SubscriberId, u32);

/// Per-subscriber state: the delivery endpoint, its current subscription
/// set (ground truth), and the liveness watch task
struct SubscriberEntry {
    handle: SubscriberHandle,
    subs: Vec<Subscription>,
    watch: JoinHandle<()>,
}

/// Start a filter worker for one event type
///
/// Returns the handle used by the supervisor and ingress, and the join
/// handle the supervisor watches for exit notices.
pub(crate) fn spawn(
    event_type: EventType,
    field_map: FieldMap,
    mailbox: usize,
    idle_ttl: Duration,
) -> (WorkerHandle, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(mailbox);
    let metrics = Arc::new(WorkerMetrics::new());

    let worker = FilterWorker {
        event_type: event_type.clone(),
        field_map,
        receiver: rx,
        self_sender: tx.clone(),
        by_subscriber: HashMap::new(),
        unconstrained: HashSet::new(),
        index: HashMap::new(),
        idle_ttl,
        metrics: Arc::clone(&metrics),
    };

    let join = tokio::spawn(worker.run());
    (WorkerHandle::new(event_type, tx, metrics), join)
}

/// Per-event-type actor holding subscriptions and performing matching
///
/// # State invariant
///
/// `by_subscriber` is the ground truth; `unconstrained` and `index` are a
/// deterministic function of it. The index is keyed on subscription-side
/// `(field, expected)` pairs only, so a field-map reload cannot invalidate
/// it - subscriptions referencing removed fields simply stop matching until
/// the field reappears.
pub(crate) struct FilterWorker {
    /// Event type this worker owns
    event_type: EventType,

    /// Current field map snapshot, replaced whole on reload
    field_map: FieldMap,

    /// Mailbox
    receiver: mpsc::Receiver<WorkerMsg>,

    /// Sender into the own mailbox, cloned into liveness watch tasks
    self_sender: mpsc::Sender<WorkerMsg>,

    /// Ground-truth subscription state per subscriber
    by_subscriber: HashMap<SubscriberId, SubscriberEntry>,

    /// Subscriptions with no constraints; they match every event
    unconstrained: HashSet<SubKey>,

    /// Inverted index: first constraint's field and value to subscriptions
    index: HashMap<String, HashMap<FieldValue, HashSet<SubKey>>>,

    /// Terminate after this long without any subscriptions
    idle_ttl: Duration,

    /// Shared with the worker handle
    metrics: Arc<WorkerMetrics>,
}

impl FilterWorker {
    /// Run the worker until shutdown, channel close, or idle TTL expiry
    ///
    /// The idle timer is relative and resets on every message; it is only
    /// armed while the worker holds no subscriptions.
    pub(crate) async fn run(mut self) {
        tracing::info!(
            event_type = %self.event_type,
            fields = self.field_map.len(),
            "filter worker starting"
        );

        loop {
            let idle = tokio::time::sleep(self.idle_ttl);

            tokio::select! {
                msg = self.receiver.recv() => {
                    match msg {
                        Some(WorkerMsg::Shutdown) | None => break,
                        Some(msg) => self.handle_message(msg),
                    }
                }
                _ = idle, if self.by_subscriber.is_empty() => {
                    tracing::info!(
                        event_type = %self.event_type,
                        ttl = ?self.idle_ttl,
                        "filter worker idle, terminating"
                    );
                    break;
                }
            }
        }

        for (_, entry) in self.by_subscriber.drain() {
            entry.watch.abort();
        }

        let s = self.metrics.snapshot();
        tracing::info!(
            event_type = %self.event_type,
            events = s.events_received,
            deliveries = s.deliveries,
            drops = s.delivery_drops,
            "filter worker stopping"
        );
    }

    fn handle_message(&mut self, msg: WorkerMsg) {
        match msg {
            WorkerMsg::Refresh {
                subscriber,
                subs,
                done,
            } => {
                self.apply_refresh(subscriber, subs);
                if let Some(done) = done {
                    let _ = done.send(());
                }
            }
            WorkerMsg::ReloadFieldMap { field_map, ack } => {
                tracing::debug!(
                    event_type = %self.event_type,
                    fields = field_map.len(),
                    "field map replaced"
                );
                self.field_map = field_map;
                let _ = ack.send(());
            }
            WorkerMsg::Event(event) => self.handle_event(&event),
            WorkerMsg::SubscriberClosed(id) => self.purge_subscriber(id),
            // Intercepted by the run loop
            WorkerMsg::Shutdown => {}
        }
    }

    /// Replace a subscriber's whole subscription set
    ///
    /// Subscriptions referencing fields unknown to the current field map
    /// are rejected individually; an empty resulting set clears the
    /// subscriber and cancels its liveness watch.
    fn apply_refresh(&mut self, subscriber: SubscriberHandle, subs: Vec<Subscription>) {
        let id = subscriber.id();
        self.metrics.record_refresh();

        let accepted: Vec<Subscription> = subs
            .into_iter()
            .filter(|sub| {
                if sub.event_type() != &self.event_type {
                    tracing::warn!(
                        event_type = %self.event_type,
                        subscription_type = %sub.event_type(),
                        subscriber = %id,
                        "subscription for foreign event type, rejected"
                    );
                    self.metrics.record_subscription_rejected();
                    return false;
                }
                match sub
                    .constraints()
                    .iter()
                    .find(|c| !self.field_map.contains_field(&c.field))
                {
                    None => true,
                    Some(unknown) => {
                        tracing::warn!(
                            event_type = %self.event_type,
                            subscriber = %id,
                            field = %unknown.field,
                            "subscription references unknown field, rejected"
                        );
                        self.metrics.record_subscription_rejected();
                        false
                    }
                }
            })
            .collect();

        let prev = self.by_subscriber.remove(&id);
        if let Some(prev) = &prev {
            self.unindex(id, &prev.subs);
        }

        if accepted.is_empty() {
            if let Some(prev) = prev {
                prev.watch.abort();
                tracing::debug!(event_type = %self.event_type, subscriber = %id, "subscriber cleared");
            }
            return;
        }

        for (i, sub) in accepted.iter().enumerate() {
            self.index_sub((id, i as u32), sub);
        }

        // Keep the existing watch across a replacement; start one otherwise
        let watch = match prev {
            Some(prev) => prev.watch,
            None => self.spawn_watch(&subscriber),
        };

        tracing::debug!(
            event_type = %self.event_type,
            subscriber = %id,
            subscriptions = accepted.len(),
            "subscriptions refreshed"
        );

        self.by_subscriber.insert(
            id,
            SubscriberEntry {
                handle: subscriber,
                subs: accepted,
                watch,
            },
        );
    }

    /// Match an event and deliver it to each matching subscriber once
    fn handle_event(&self, event: &Arc<Event>) {
        self.metrics.record_event();

        // Extract every indexable field; failures count as absent
        let mut extracted: HashMap<&str, FieldValue> =
            HashMap::with_capacity(self.field_map.len());
        for (field, spec) in self.field_map.iter() {
            match spec.extract(event.payload()) {
                Ok(Some(value)) => {
                    extracted.insert(field.as_str(), value);
                }
                Ok(None) => {}
                Err(e) => {
                    self.metrics.record_extraction_error();
                    tracing::debug!(
                        event_type = %self.event_type,
                        field = %field,
                        error = %e,
                        "extraction failed, treating field as absent"
                    );
                }
            }
        }

        // Candidates: match-all subscriptions plus index hits on any
        // extracted (field, value) pair
        let mut candidates: HashSet<SubKey> = self.unconstrained.iter().copied().collect();
        for (field, value) in &extracted {
            if let Some(by_value) = self.index.get(*field)
                && let Some(keys) = by_value.get(value)
            {
                candidates.extend(keys.iter().copied());
            }
        }

        // Verify candidates fully; each subscriber receives the event at
        // most once however many of its subscriptions match
        let mut recipients: HashSet<SubscriberId> = HashSet::new();
        for (id, idx) in candidates {
            if recipients.contains(&id) {
                continue;
            }
            let Some(entry) = self.by_subscriber.get(&id) else {
                continue;
            };
            let Some(sub) = entry.subs.get(idx as usize) else {
                continue;
            };
            if self.constraints_satisfied(sub, &extracted) {
                recipients.insert(id);
            }
        }

        if recipients.is_empty() {
            return;
        }
        self.metrics.record_matched();

        for id in &recipients {
            let Some(entry) = self.by_subscriber.get(id) else {
                continue;
            };
            match entry.handle.try_deliver(Arc::clone(event)) {
                Ok(()) => self.metrics.record_delivery(),
                Err(e) => {
                    self.metrics.record_delivery_drop();
                    tracing::debug!(
                        event_type = %self.event_type,
                        subscriber = %id,
                        error = %e,
                        "delivery dropped"
                    );
                }
            }
        }
    }

    /// Every constraint must name a field of the current field map whose
    /// extracted value equals the expected one. Duplicate constraints with
    /// conflicting values on the same field can never both hold.
    fn constraints_satisfied(
        &self,
        sub: &Subscription,
        extracted: &HashMap<&str, FieldValue>,
    ) -> bool {
        sub.constraints().iter().all(|c| {
            self.field_map.contains_field(&c.field)
                && extracted.get(c.field.as_str()) == Some(&c.expected)
        })
    }

    /// Remove all state for a subscriber whose endpoint died
    fn purge_subscriber(&mut self, id: SubscriberId) {
        if let Some(entry) = self.by_subscriber.remove(&id) {
            self.unindex(id, &entry.subs);
            entry.watch.abort();
            self.metrics.record_subscriber_purged();
            tracing::debug!(
                event_type = %self.event_type,
                subscriber = %id,
                "subscriber endpoint closed, purged"
            );
        }
    }

    /// Watch a subscriber endpoint and post a close notice to the mailbox
    fn spawn_watch(&self, subscriber: &SubscriberHandle) -> JoinHandle<()> {
        let notifier = self.self_sender.clone();
        let handle = subscriber.clone();
        tokio::spawn(async move {
            handle.closed().await;
            let _ = notifier.send(WorkerMsg::SubscriberClosed(handle.id())).await;
        })
    }

    /// Add one subscription to the accelerator structures
    fn index_sub(&mut self, key: SubKey, sub: &Subscription) {
        match sub.constraints().first() {
            None => {
                self.unconstrained.insert(key);
            }
            Some(first) => {
                self.index
                    .entry(first.field.clone())
                    .or_default()
                    .entry(first.expected.clone())
                    .or_default()
                    .insert(key);
            }
        }
    }

    /// Remove a subscriber's subscriptions from the accelerator structures
    fn unindex(&mut self, id: SubscriberId, subs: &[Subscription]) {
        for (i, sub) in subs.iter().enumerate() {
            let key = (id, i as u32);
            match sub.constraints().first() {
                None => {
                    self.unconstrained.remove(&key);
                }
                Some(first) => {
                    if let Some(by_value) = self.index.get_mut(&first.field) {
                        if let Some(keys) = by_value.get_mut(&first.expected) {
                            keys.remove(&key);
                            if keys.is_empty() {
                                by_value.remove(&first.expected);
                            }
                        }
                        if by_value.is_empty() {
                            self.index.remove(&first.field);
                        }
                    }
                }
            }
        }
    }
}
