use std::{fmt::Debug, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use tokio::{
    sync::{
        Mutex,
        mpsc::{self, error::TrySendError},
    },
    task::JoinHandle,
};
use tracing::{debug, warn};

use super::{
    change_feed::{ChangeEvent, ChangeFeed, ChangeSubscription, ChannelSpec, Notification},
    event_log::{EventLog, Keyed},
};

/// What a single notification does to the view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate<T: Keyed> {
    Upsert(T),
    Remove(T::Key),
    /// Refetch the whole collection.
    Reload,
    Ignore,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewDelta<T: Keyed> {
    Reset(Vec<T>),
    Upsert(T),
    Remove(T::Key),
}

/// Supplies a scoped collection and interprets its change notifications.
#[async_trait]
pub trait ScopeSource: Send + Sync + 'static {
    type Scope: Clone + Debug + PartialEq + Send + Sync + 'static;
    type Item: Keyed + Clone + Send + Sync + 'static;

    async fn load(&self, scope: &Self::Scope) -> Result<Vec<Self::Item>>;

    fn channel(&self, scope: &Self::Scope) -> ChannelSpec;

    /// Point lookups for fields the payload lacks happen here.
    async fn on_change(
        &self,
        scope: &Self::Scope,
        event: &ChangeEvent,
    ) -> Result<ViewUpdate<Self::Item>>;

    fn new_log(&self) -> EventLog<Self::Item> {
        EventLog::new()
    }
}

struct ViewState<S: ScopeSource> {
    generation: u64,
    scope: Option<S::Scope>,
    log: EventLog<S::Item>,
}

/// Collection view bound to one scope at a time.
///
/// Deltas go to `sink` in the order they are applied. Only the pump of the current
/// generation may touch the state, so a notification that was in flight while the scope
/// switched is dropped. The state lock is never held across a send, so `scope()` and
/// `items()` answer even while the sink is full.
pub struct ScopedView<S: ScopeSource> {
    source: Arc<S>,
    feed: Arc<dyn ChangeFeed>,
    sink: mpsc::Sender<ViewDelta<S::Item>>,
    state: Arc<Mutex<ViewState<S>>>,
    pump: Option<JoinHandle<()>>,
}

impl<S: ScopeSource> ScopedView<S> {
    pub fn new(
        source: Arc<S>,
        feed: Arc<dyn ChangeFeed>,
        sink: mpsc::Sender<ViewDelta<S::Item>>,
    ) -> Self {
        let log = source.new_log();
        Self {
            source,
            feed,
            sink,
            state: Arc::new(Mutex::new(ViewState {
                generation: 0,
                scope: None,
                log,
            })),
            pump: None,
        }
    }

    pub async fn scope(&self) -> Option<S::Scope> {
        self.state.lock().await.scope.clone()
    }

    pub async fn items(&self) -> Vec<S::Item> {
        self.state.lock().await.log.snapshot()
    }

    /// Never waits on the sink: a reset that does not fit is handed to the pump, so the
    /// task draining the sink may call this freely.
    pub async fn switch_scope(&mut self, scope: S::Scope) -> Result<()> {
        self.stop_pump().await;

        let generation = {
            let mut state = self.state.lock().await;
            state.generation += 1;
            state.scope = Some(scope.clone());
            state.log = self.source.new_log();
            state.generation
        };

        // Subscribe before the bulk load so nothing committed in between is missed.
        let subscription = self.feed.subscribe(self.source.channel(&scope));
        debug!(channel = %subscription.channel(), generation, "scoped_view: switched scope");

        let items = self.source.load(&scope).await?;
        let pending = match reset(&self.state, generation, items).await {
            Some(delta) => match self.sink.try_send(delta) {
                Ok(()) | Err(TrySendError::Closed(_)) => None,
                Err(TrySendError::Full(delta)) => {
                    debug!(generation, "scoped_view: sink full, deferring reset");
                    Some(delta)
                }
            },
            None => None,
        };

        self.pump = Some(tokio::spawn(pump(
            Arc::clone(&self.source),
            Arc::clone(&self.state),
            self.sink.clone(),
            subscription,
            scope,
            generation,
            pending,
        )));

        Ok(())
    }

    /// Tears down the subscription and forgets the scope.
    pub async fn close(&mut self) {
        self.stop_pump().await;
        let mut state = self.state.lock().await;
        state.generation += 1;
        state.scope = None;
    }

    async fn stop_pump(&mut self) {
        if let Some(handle) = self.pump.take() {
            handle.abort();
            // Resolves once the task, and the subscription it owns, has been dropped.
            let _ = handle.await;
        }
    }
}

impl<S: ScopeSource> Drop for ScopedView<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.pump.take() {
            handle.abort();
        }
    }
}

/// Replaces the log and returns the delta to deliver. The state lock is released before
/// anything is sent.
async fn reset<S: ScopeSource>(
    state: &Mutex<ViewState<S>>,
    generation: u64,
    items: Vec<S::Item>,
) -> Option<ViewDelta<S::Item>> {
    let mut state = state.lock().await;
    if state.generation != generation {
        return None;
    }
    state.log.replace_all(items);
    Some(ViewDelta::Reset(state.log.snapshot()))
}

async fn pump<S: ScopeSource>(
    source: Arc<S>,
    state: Arc<Mutex<ViewState<S>>>,
    sink: mpsc::Sender<ViewDelta<S::Item>>,
    mut subscription: ChangeSubscription,
    scope: S::Scope,
    generation: u64,
    pending: Option<ViewDelta<S::Item>>,
) {
    if let Some(delta) = pending {
        if sink.send(delta).await.is_err() {
            return;
        }
    }

    while let Some(notification) = subscription.recv().await {
        let update = match notification {
            Notification::Change(event) => match source.on_change(&scope, &event).await {
                Ok(update) => update,
                Err(err) => {
                    warn!(
                        error = ?err,
                        table = %event.table,
                        commit_id = event.commit_id,
                        "scoped_view: failed to interpret change"
                    );
                    continue;
                }
            },
            Notification::Missed(_) => ViewUpdate::Reload,
        };

        let delta = match update {
            ViewUpdate::Ignore => None,
            ViewUpdate::Reload => match source.load(&scope).await {
                Ok(items) => match reset(&state, generation, items).await {
                    Some(delta) => Some(delta),
                    None => break,
                },
                Err(err) => {
                    warn!(error = ?err, ?scope, "scoped_view: reload failed");
                    None
                }
            },
            ViewUpdate::Upsert(item) => {
                let mut state = state.lock().await;
                if state.generation != generation {
                    break;
                }
                state.log.upsert(item.clone());
                Some(ViewDelta::Upsert(item))
            }
            ViewUpdate::Remove(key) => {
                let mut state = state.lock().await;
                if state.generation != generation {
                    break;
                }
                state.log.remove(&key).map(|_| ViewDelta::Remove(key))
            }
        };

        // Only this task sends for its generation, so deltas keep the order they were applied in.
        if let Some(delta) = delta {
            if sink.send(delta).await.is_err() {
                debug!(?scope, "scoped_view: sink closed, stopping");
                break;
            }
        }
    }
}
