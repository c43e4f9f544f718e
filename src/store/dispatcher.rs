//! The single task that applies actions and fans out the results.

use super::history::ActionHistory;
use super::options::Options;
use super::subscribers::{fan_out, SubscriberRegistry};
use crate::error::ReducerError;
use crate::reducer::{Action, Reducer, Reduction};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, warn};

/// Current state plus the actions that produced it.
pub(crate) struct StateCell<S, A> {
    pub(crate) state: S,
    pub(crate) history: ActionHistory<A>,
}

/// Everything the store handle and the dispatcher both touch.
pub(crate) struct Shared<S, A> {
    pub(crate) cell: RwLock<StateCell<S, A>>,
    pub(crate) options: RwLock<Options>,
    pub(crate) subscribers: SubscriberRegistry<S>,
}

impl<S: Clone + Send + Sync + 'static, A: Action> Shared<S, A> {
    pub(crate) fn new(initial: S, options: Options) -> Self {
        Self {
            cell: RwLock::new(StateCell {
                state: initial,
                history: ActionHistory::new(),
            }),
            options: RwLock::new(options),
            subscribers: SubscriberRegistry::new(),
        }
    }
}

pub(crate) type Reply = oneshot::Sender<Result<(), ReducerError>>;

/// Messages accepted on the action queue.
pub(crate) enum Command<A> {
    /// Apply an action. `reply` is set for `dispatch`, empty for `submit`.
    Apply { action: A, reply: Option<Reply> },
    /// Re-send the current state to every subscriber.
    Notify { reply: oneshot::Sender<()> },
    /// Stop accepting commands, apply what is already queued, then exit.
    Shutdown,
}

pub(crate) struct Dispatcher<S, A> {
    shared: Arc<Shared<S, A>>,
    reducer: Box<dyn Reducer<S, A>>,
    rx: mpsc::Receiver<Command<A>>,
    // Last field, so it fires after everything above has been dropped.
    _exited: DropGuard,
}

impl<S, A> Dispatcher<S, A>
where
    S: Clone + Send + Sync + 'static,
    A: Action,
{
    pub(crate) fn new(
        shared: Arc<Shared<S, A>>,
        reducer: Box<dyn Reducer<S, A>>,
        rx: mpsc::Receiver<Command<A>>,
        exited: CancellationToken,
    ) -> Self {
        Self {
            shared,
            reducer,
            rx,
            _exited: exited.drop_guard(),
        }
    }

    /// Process commands until the queue is closed and empty, every sender
    /// is gone, or the token is cancelled.
    pub(crate) async fn run(mut self, token: CancellationToken) {
        debug!("dispatcher started");
        loop {
            tokio::select! {
                biased;

                _ = token.cancelled() => break,

                cmd = self.rx.recv() => match cmd {
                    // Closing keeps what is buffered; recv yields it, then None.
                    Some(Command::Shutdown) => {
                        debug!("shutdown requested, draining queue");
                        self.rx.close();
                    }
                    Some(cmd) => self.handle(cmd, &token).await,
                    None => break,
                },
            }
        }

        // Anything still buffered was cut off by cancellation. Dropping an
        // Apply drops its reply, so waiting `dispatch` callers see Closed.
        self.rx.close();
        let mut discarded = 0usize;
        while let Ok(cmd) = self.rx.try_recv() {
            if matches!(cmd, Command::Apply { .. }) {
                discarded += 1;
            }
        }
        if discarded > 0 {
            warn!(discarded, "dispatcher stopped with queued actions, discarding them");
        } else {
            debug!("dispatcher stopped");
        }
    }

    async fn handle(&mut self, cmd: Command<A>, token: &CancellationToken) {
        match cmd {
            Command::Apply { action, reply } => {
                let outcome = self.apply(action, token).await;
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            }
            Command::Notify { reply } => {
                self.notify(token).await;
                let _ = reply.send(());
            }
            Command::Shutdown => {}
        }
    }

    /// Reduce under the write lock, then notify with the lock released.
    async fn apply(&self, action: A, token: &CancellationToken) -> Result<(), ReducerError> {
        let options = *self.shared.options.read();

        let (state, subscribers, error, recorded) = {
            let mut cell = self.shared.cell.write();
            let Reduction { state, error } = self.reducer.reduce(&cell.state, &action);
            match &error {
                Some(e) if options.rollback_on_error => {
                    warn!(action = action.kind(), error = %e, "reducer failed, keeping previous state");
                }
                Some(e) => {
                    warn!(action = action.kind(), error = %e, "reducer failed, adopting returned state");
                    cell.state = state;
                }
                None => cell.state = state,
            }
            cell.history.record(&action, &options);
            // Taken before the lock drops: anyone registered by now is
            // owed this state.
            (
                cell.state.clone(),
                self.shared.subscribers.snapshot(),
                error,
                cell.history.len(),
            )
        };

        let tally = fan_out(&subscribers, &state, token).await;
        debug!(
            action = action.kind(),
            delivered = tally.delivered,
            dropped = tally.dropped,
            closed = tally.closed,
            recorded,
            "applied action"
        );

        match error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn notify(&self, token: &CancellationToken) {
        let (state, subscribers) = {
            let cell = self.shared.cell.read();
            (cell.state.clone(), self.shared.subscribers.snapshot())
        };
        let tally = fan_out(&subscribers, &state, token).await;
        debug!(delivered = tally.delivered, "notified subscribers");
    }
}
