use super::dispatcher::{Command, Dispatcher, Shared};
use super::options::{Options, Overflow, StoreConfig};
use crate::error::StoreError;
use crate::reducer::{Action, Reducer};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// A single-writer state container driven by a reducer.
///
/// Every mutation, whether queued with [`submit`](Store::submit) or awaited
/// with [`dispatch`](Store::dispatch), goes through one background
/// dispatcher task, so all state transitions happen in one global order.
/// After each transition the new state is sent to every subscriber.
///
/// `Store` is a cheap handle: clone it to share it between tasks.
///
/// # Examples
///
/// ```
/// use tindux::{Action, Reduction, Store};
///
/// #[derive(Clone, Debug, PartialEq)]
/// enum Counter {
///     Inc,
///     Dec,
/// }
///
/// impl Action for Counter {
///     fn kind(&self) -> &str {
///         match self {
///             Counter::Inc => "INC",
///             Counter::Dec => "DEC",
///         }
///     }
/// }
///
/// fn reducer(count: &i32, action: &Counter) -> Reduction<i32> {
///     match action {
///         Counter::Inc => Reduction::ok(count + 1),
///         Counter::Dec => Reduction::ok(count - 1),
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), tindux::StoreError> {
/// let store = Store::new(0, reducer)?;
/// let mut updates = store.subscription();
///
/// store.dispatch(Counter::Inc).await?;
/// assert_eq!(updates.recv().await, Some(1));
/// assert_eq!(store.get_state(), 1);
/// # Ok(())
/// # }
/// ```
pub struct Store<S, A> {
    shared: Arc<Shared<S, A>>,
    tx: mpsc::Sender<Command<A>>,
    /// Set once any stop is requested; new work is refused from then on.
    stopping: CancellationToken,
    /// Makes the dispatcher exit at its next await point.
    shutdown_token: CancellationToken,
    /// Fires after the dispatcher task has exited and dropped its state.
    exited: CancellationToken,
    config: StoreConfig,
}

impl<S, A> Clone for Store<S, A> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            tx: self.tx.clone(),
            stopping: self.stopping.clone(),
            shutdown_token: self.shutdown_token.clone(),
            exited: self.exited.clone(),
            config: self.config,
        }
    }
}

impl<S, A> std::fmt::Debug for Store<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.config)
            .field("stopping", &self.stopping.is_cancelled())
            .field("exited", &self.exited.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<S, A> Store<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    /// Create a store with the default [`StoreConfig`] and start its dispatcher.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<R>(initial: S, reducer: R) -> Result<Self, StoreError>
    where
        R: Reducer<S, A>,
    {
        Self::builder().state(initial).reducer(reducer).build()
    }

    /// Start a [`StoreBuilder`] for stores that need options or config.
    pub fn builder() -> StoreBuilder<S, A> {
        StoreBuilder::default()
    }

    fn start(
        initial: S,
        reducer: Box<dyn Reducer<S, A>>,
        options: Options,
        config: StoreConfig,
    ) -> Result<Self, StoreError> {
        let runtime = Handle::try_current().map_err(|_| StoreError::NoRuntime)?;

        let shared = Arc::new(Shared::new(initial, options));
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let shutdown_token = CancellationToken::new();
        let exited = CancellationToken::new();

        let dispatcher = Dispatcher::new(Arc::clone(&shared), reducer, rx, exited.clone());
        runtime.spawn(
            dispatcher
                .run(shutdown_token.clone())
                .instrument(tracing::debug_span!("store_dispatcher")),
        );

        Ok(Self {
            shared,
            tx,
            stopping: CancellationToken::new(),
            shutdown_token,
            exited,
            config,
        })
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.stopping.is_cancelled() || self.shutdown_token.is_cancelled() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    /// Replace the options. Applies from the next dispatch on.
    pub fn with_options(&self, options: Options) {
        *self.shared.options.write() = options;
    }

    /// Current options.
    pub fn options(&self) -> Options {
        *self.shared.options.read()
    }

    /// The config this store was built with.
    pub fn config(&self) -> StoreConfig {
        self.config
    }

    /// Get a clone of the current state.
    pub fn get_state(&self) -> S {
        self.shared.cell.read_recursive().state.clone()
    }

    /// Read state without cloning it.
    ///
    /// The dispatcher cannot commit while `f` runs, so keep it short. `f`
    /// may call the other read methods; they never wait behind a queued
    /// writer.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        let cell = self.shared.cell.read_recursive();
        f(&cell.state)
    }

    /// Recorded actions, oldest first. Empty unless recording is enabled.
    pub fn history(&self) -> Vec<A> {
        self.shared.cell.read_recursive().history.to_vec()
    }

    /// Queue an action, waiting only if the queue is full.
    ///
    /// Returns once the action is queued. A reducer error for it is logged,
    /// since there is no caller left to hand it to.
    pub async fn submit(&self, action: A) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.tx
            .send(Command::Apply {
                action,
                reply: None,
            })
            .await
            .map_err(|_| StoreError::Closed)
    }

    /// Queue an action without waiting.
    pub fn try_submit(&self, action: A) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.tx
            .try_send(Command::Apply {
                action,
                reply: None,
            })
            .map_err(|e| match e {
                TrySendError::Full(_) => StoreError::QueueFull,
                TrySendError::Closed(_) => StoreError::Closed,
            })
    }

    /// Apply an action and wait until every subscriber has been notified.
    ///
    /// A reducer error comes back as [`StoreError::Reducer`], but by then
    /// the state the reducer returned has already been adopted (unless
    /// [`Options::rollback_on_error`] is set) and subscribers notified.
    pub async fn dispatch(&self, action: A) -> Result<(), StoreError> {
        self.ensure_open()?;
        let (reply, outcome) = oneshot::channel();
        self.tx
            .send(Command::Apply {
                action,
                reply: Some(reply),
            })
            .await
            .map_err(|_| StoreError::Closed)?;

        match outcome.await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Closed),
        }
    }

    /// Register a channel to receive every new state, using the store's
    /// default overflow policy.
    ///
    /// There is no unsubscribe; drop the receiver and the sink goes inactive
    /// on the next notification.
    pub fn subscribe(&self, sink: mpsc::Sender<S>) {
        self.subscribe_with(sink, self.config.overflow);
    }

    /// Register a channel with an explicit overflow policy.
    pub fn subscribe_with(&self, sink: mpsc::Sender<S>, overflow: Overflow) {
        self.shared.subscribers.register_queue(sink, overflow);
    }

    /// Create, register and return a buffered subscription channel.
    pub fn subscription(&self) -> mpsc::Receiver<S> {
        let (tx, rx) = mpsc::channel(self.config.subscriber_capacity);
        self.subscribe(tx);
        rx
    }

    /// Subscribe to the latest state only. Never blocks the dispatcher;
    /// states the receiver hasn't looked at yet are overwritten.
    pub fn watch(&self) -> watch::Receiver<S> {
        // Seed and register under the read lock so no commit slips between.
        let cell = self.shared.cell.read_recursive();
        let (tx, rx) = watch::channel(cell.state.clone());
        self.shared.subscribers.register_latest(tx);
        rx
    }

    /// Send the current state to every subscriber now.
    ///
    /// Ordered with dispatches: it runs on the dispatcher after anything
    /// already queued.
    pub async fn notify_now(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        let (reply, done) = oneshot::channel();
        self.tx
            .send(Command::Notify { reply })
            .await
            .map_err(|_| StoreError::Closed)?;
        done.await.map_err(|_| StoreError::Closed)
    }

    /// Number of registered subscribers, including inactive ones.
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.len()
    }

    /// Number of subscribers whose receiver is still alive, as of the last
    /// notification.
    pub fn active_subscribers(&self) -> usize {
        self.shared.subscribers.active()
    }

    /// Request dispatcher shutdown without waiting.
    ///
    /// New work is refused at once. Queues a stop request so actions already
    /// accepted still apply. If the queue is full, cancels instead and
    /// pending actions are discarded.
    pub fn shutdown(&self) {
        self.stopping.cancel();
        match self.tx.try_send(Command::Shutdown) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => self.shutdown_token.cancel(),
            Err(TrySendError::Closed(_)) => {}
        }
    }

    /// Refuse new work, apply everything already accepted, then wait for
    /// the dispatcher to exit.
    pub async fn close(&self) {
        self.stopping.cancel();
        // An error here means it has already stopped.
        let _ = self.tx.send(Command::Shutdown).await;
        self.exited.cancelled().await;
    }

    /// Stop the dispatcher at its next await point, discarding queued actions.
    ///
    /// Pending `dispatch` calls fail with [`StoreError::Closed`].
    pub fn cancel(&self) {
        self.stopping.cancel();
        self.shutdown_token.cancel();
    }

    /// Wait until the dispatcher has exited and released the reducer.
    pub async fn closed(&self) {
        self.exited.cancelled().await;
    }

    /// Whether the store refuses new work, either because a stop was
    /// requested or the dispatcher is gone.
    pub fn is_closed(&self) -> bool {
        self.stopping.is_cancelled() || self.tx.is_closed() || self.exited.is_cancelled()
    }
}

/// Step-by-step construction of a [`Store`].
///
/// ```
/// use tindux::{Options, Reduction, Store, StoreConfig, StoreError};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), StoreError> {
/// let store = Store::builder()
///     .state(0u32)
///     .reducer(|n: &u32, _: &&'static str| Reduction::ok(n + 1))
///     .options(Options::recording_last(10))
///     .config(StoreConfig::default().with_queue_capacity(8))
///     .build()?;
///
/// store.dispatch("TICK").await?;
/// assert_eq!(store.history(), vec!["TICK"]);
/// # Ok(())
/// # }
/// ```
pub struct StoreBuilder<S, A> {
    state: Option<S>,
    reducer: Option<Box<dyn Reducer<S, A>>>,
    options: Options,
    config: StoreConfig,
}

impl<S, A> Default for StoreBuilder<S, A> {
    fn default() -> Self {
        Self {
            state: None,
            reducer: None,
            options: Options::default(),
            config: StoreConfig::default(),
        }
    }
}

impl<S, A> StoreBuilder<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    /// Initial state. Required.
    pub fn state(mut self, initial: S) -> Self {
        self.state = Some(initial);
        self
    }

    /// Reducer applied to every action. Required.
    pub fn reducer<R>(mut self, reducer: R) -> Self
    where
        R: Reducer<S, A>,
    {
        self.reducer = Some(Box::new(reducer));
        self
    }

    /// Initial options; defaults to no recording.
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Capacities and default overflow; defaults to [`StoreConfig::default`].
    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate and start the store. Nothing is spawned on error.
    pub fn build(self) -> Result<Store<S, A>, StoreError> {
        let (Some(state), Some(reducer)) = (self.state, self.reducer) else {
            return Err(StoreError::Construction("missing initial state or reducer"));
        };
        self.config.validate()?;
        Store::start(state, reducer, self.options, self.config)
    }
}
