//! The subject: a clock that owns an observer registry and drives the tick loop.

use crate::common::{ObserverId, TimeSample, Topic};
use crate::components::registry::Registry;
use crate::config::ClockConfig;
use crate::events::ClockEvent;
use crate::observer::{TimeObserver, TopicObserver};
use crate::time::{SystemTimeSource, TickEvent, Ticker, TimeSource};
use anyhow::Context;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};

/// How a clock fans a tick out to its observers.
///
/// A strategy fixes the registry key, the observer capability, which keys a
/// tick reaches, and how a single update is delivered.
pub trait Dispatch: Send + Sync + 'static {
    type Key: Copy + Eq + Hash + Debug + Send + Sync + 'static;
    type Observer: ?Sized + Send + Sync + 'static;

    /// The keys notified for `sample`, in notification order.
    fn keys_for(sample: TimeSample) -> Vec<Self::Key>;

    fn deliver(
        observer: &Self::Observer,
        key: Self::Key,
        sample: TimeSample,
    ) -> anyhow::Result<()>;
}

/// Observers subscribe per topic; ticks cascade second -> minute -> punctually.
#[derive(Debug, Clone, Copy, Default)]
pub struct Topics;

impl Dispatch for Topics {
    type Key = Topic;
    type Observer = dyn TopicObserver;

    fn keys_for(sample: TimeSample) -> Vec<Topic> {
        Topic::cascade(sample)
    }

    fn deliver(observer: &Self::Observer, key: Topic, sample: TimeSample) -> anyhow::Result<()> {
        observer.update(key, sample)
    }
}

/// A single collection; every tick reaches every observer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Flat;

impl Dispatch for Flat {
    type Key = ();
    type Observer = dyn TimeObserver;

    fn keys_for(_sample: TimeSample) -> Vec<()> {
        vec![()]
    }

    fn deliver(observer: &Self::Observer, _key: (), sample: TimeSample) -> anyhow::Result<()> {
        observer.update(sample)
    }
}

/// A clock whose observers subscribe to topics.
pub type TopicClock = Clock<Topics>;

/// A clock that notifies every observer on every tick.
pub type SimpleClock = Clock<Flat>;

/// The subject.
///
/// Holds the observer registry, samples time on every tick and notifies the
/// observers the tick fans out to, synchronously and in registration order.
/// `Clock` is a cheap handle: clones share the same registry and event streams.
pub struct Clock<D: Dispatch> {
    ticker: Ticker,
    time_source: Arc<dyn TimeSource>,
    registry: Arc<RwLock<Registry<D::Key, D::Observer>>>,
    tick_count: Arc<AtomicU64>,
    tick_sender: broadcast::Sender<TickEvent>,
    event_sender: broadcast::Sender<ClockEvent<D::Key>>,
}

impl<D: Dispatch> Clone for Clock<D> {
    fn clone(&self) -> Self {
        Self {
            ticker: self.ticker,
            time_source: self.time_source.clone(),
            registry: self.registry.clone(),
            tick_count: self.tick_count.clone(),
            tick_sender: self.tick_sender.clone(),
            event_sender: self.event_sender.clone(),
        }
    }
}

/// Controls a tick loop started with [`Clock::spawn`].
///
/// Dropping the handle without calling [`ClockHandle::shutdown`] also stops the
/// loop, at its next suspension point.
#[must_use = "dropping the handle stops the clock"]
pub struct ClockHandle {
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl ClockHandle {
    /// Signals the loop to stop and waits until it has.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        self.shutdown_tx.send(()).ok();
        self.task.await.context("clock task did not finish cleanly")
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

// Core implementation block for internal logic.
impl<D: Dispatch> Clock<D> {
    /// Creates a clock reading the system time as configured.
    pub fn new(config: &ClockConfig) -> Self {
        const CHANNEL_CAPACITY: usize = 64;
        let (tick_sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (event_sender, _) = broadcast::channel(CHANNEL_CAPACITY);

        Self {
            ticker: Ticker::from_config(config),
            time_source: Arc::new(SystemTimeSource::from_config(config)),
            registry: Arc::new(RwLock::new(Registry::new())),
            tick_count: Arc::new(AtomicU64::new(0)),
            tick_sender,
            event_sender,
        }
    }

    /// Replaces where tick samples come from.
    pub fn with_time_source(mut self, source: impl TimeSource + 'static) -> Self {
        self.time_source = Arc::new(source);
        self
    }

    /// Replaces the tick pacing.
    pub fn with_ticker(mut self, ticker: Ticker) -> Self {
        self.ticker = ticker;
        self
    }

    /// Runs the tick loop until `shutdown_rx` yields or every sender is dropped.
    ///
    /// Each iteration waits one tick period, samples the time source and
    /// notifies. Shutdown is only observed while waiting, so a round in
    /// progress always completes.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut ticker = self.ticker.start();
        info!(period = ?self.ticker.period(), "clock started");
        self.event_sender
            .send(ClockEvent::Started {
                timestamp: tokio::time::Instant::now(),
            })
            .ok();

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        self.event_sender.send(ClockEvent::Shutdown).ok();
        info!("clock stopped");
    }

    /// Starts the tick loop on its own task and returns immediately.
    pub fn spawn(&self) -> ClockHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let clock = self.clone();
        let task = tokio::spawn(async move { clock.run(shutdown_rx).await });
        ClockHandle { shutdown_tx, task }
    }

    /// Runs the clock until Ctrl+C, then shuts it down gracefully.
    pub async fn run_until_ctrl_c(&self) -> anyhow::Result<()> {
        let handle = self.spawn();
        info!("Clock running. Press Ctrl+C to shut down.");
        tokio::signal::ctrl_c()
            .await
            .context("failed to listen for Ctrl+C")?;
        info!("Shutdown signal received.");
        handle.shutdown().await
    }

    /// Samples the time source and notifies for it.
    pub async fn tick(&self) -> Vec<D::Key> {
        let sample = self.time_source.now();
        self.on_tick(sample).await
    }

    /// Notifies every observer `sample` fans out to and returns the keys
    /// notified, in order.
    ///
    /// The registry stays read-locked for the whole round, so a concurrent
    /// register or deregister takes effect either before or after it.
    pub async fn on_tick(&self, sample: TimeSample) -> Vec<D::Key> {
        let keys = D::keys_for(sample);
        {
            let registry = self.registry.read().await;
            for key in &keys {
                self.notify(&registry, *key, sample);
            }
        }
        let tick_count = self.tick_count.fetch_add(1, Ordering::Relaxed) + 1;
        trace!(tick_count, %sample, ?keys, "tick dispatched");
        self.tick_sender.send(TickEvent { tick_count, sample }).ok();
        keys
    }

    fn notify(&self, registry: &Registry<D::Key, D::Observer>, key: D::Key, sample: TimeSample) {
        for (id, observer) in registry.subscribers(key) {
            if let Err(err) = D::deliver(observer, key, sample) {
                error!(?id, ?key, "observer update failed: {err:#}");
                self.event_sender
                    .send(ClockEvent::ObserverFailed {
                        id,
                        key,
                        error: format!("{err:#}"),
                    })
                    .ok();
            }
        }
    }
}

// Public API implementation block.
impl<D: Dispatch> Clock<D> {
    /// Subscribes `observer` under `key`. Registering it again is a no-op.
    ///
    /// Returns the observer's id, which is the same for every key it is
    /// registered under.
    pub async fn register_under(&self, key: D::Key, observer: Arc<D::Observer>) -> ObserverId {
        let (id, added) = self.registry.write().await.insert(key, observer);
        if added {
            debug!(?id, ?key, "observer registered");
            self.event_sender
                .send(ClockEvent::ObserverAdded { id, key })
                .ok();
        }
        id
    }

    /// Unsubscribes `id` from `key`.
    ///
    /// Returns `true` if it was subscribed. Once this returns, no further update
    /// for `key` reaches the observer.
    pub async fn deregister_under(&self, key: D::Key, id: ObserverId) -> bool {
        let removed = self.registry.write().await.remove(key, id);
        if removed {
            debug!(?id, ?key, "observer deregistered");
            self.event_sender
                .send(ClockEvent::ObserverRemoved { id, key })
                .ok();
        }
        removed
    }

    /// Unsubscribes `id` from every key. Returns `true` if anything was removed.
    pub async fn deregister_everywhere(&self, id: ObserverId) -> bool {
        let keys = self.registry.write().await.remove_everywhere(id);
        for key in &keys {
            debug!(?id, ?key, "observer deregistered");
            self.event_sender
                .send(ClockEvent::ObserverRemoved { id, key: *key })
                .ok();
        }
        !keys.is_empty()
    }

    /// The id `observer` was registered with, if it is registered at all.
    pub async fn find(&self, observer: &Arc<D::Observer>) -> Option<ObserverId> {
        self.registry.read().await.find(observer)
    }

    pub async fn is_registered(&self, key: D::Key, id: ObserverId) -> bool {
        self.registry.read().await.contains(key, id)
    }

    /// Number of observers subscribed under `key`.
    pub async fn subscriber_count(&self, key: D::Key) -> usize {
        self.registry.read().await.count(key)
    }

    /// Number of completed notification rounds.
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    /// Subscribes to the `ClockEvent` stream.
    pub fn subscribe_events(&self) -> broadcast::Receiver<ClockEvent<D::Key>> {
        self.event_sender.subscribe()
    }

    /// Subscribes to the `TickEvent` stream.
    pub fn subscribe_ticks(&self) -> broadcast::Receiver<TickEvent> {
        self.tick_sender.subscribe()
    }
}

impl Clock<Topics> {
    /// Subscribes `observer` to `topic`.
    pub async fn register(&self, topic: Topic, observer: Arc<dyn TopicObserver>) -> ObserverId {
        self.register_under(topic, observer).await
    }

    /// Unsubscribes `id` from `topic`. Unknown ids are ignored.
    pub async fn deregister(&self, topic: Topic, id: ObserverId) -> bool {
        self.deregister_under(topic, id).await
    }
}

impl Clock<Flat> {
    /// Adds `observer` to the clock.
    pub async fn register(&self, observer: Arc<dyn TimeObserver>) -> ObserverId {
        self.register_under((), observer).await
    }

    /// Removes `id` from the clock. Unknown ids are ignored.
    pub async fn deregister(&self, id: ObserverId) -> bool {
        self.deregister_under((), id).await
    }
}
