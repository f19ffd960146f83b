//! Controller actor: a Tokio task that owns the [`SessionController`].
//!
//! Every transition (start, manual end, scan resolution, tick) arrives
//! as a message on one channel or as the ticker firing inside the same
//! `select!` loop, so transitions are processed strictly one at a time.
//! Outside code holds a [`ControllerHandle`] and reads state through
//! snapshots: either by asking, or by subscribing to a `watch` channel
//! that is refreshed after every transition.

use tagkey_protocol::Profile;
use tagkey_tick::ElapsedTicker;
use tokio::sync::{mpsc, oneshot, watch};

use crate::{
    ControllerConfig, HistorySink, ProfileLookup, ScanOutcome, SessionController, SessionError,
    SessionSnapshot,
};

/// Commands sent to the controller actor.
///
/// Variants carrying a `oneshot::Sender` expect an answer on it.
pub(crate) enum ControllerCommand {
    /// Start a session under a copy of the profile.
    Start {
        profile: Profile,
        reply: oneshot::Sender<bool>,
    },

    /// The in-app "End Session" button.
    EndManually { reply: oneshot::Sender<bool> },

    /// A tag was read; resolve its identifier.
    ResolveScan {
        identifier: String,
        reply: oneshot::Sender<ScanOutcome>,
    },

    /// Request the current state.
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },

    /// Stop the actor.
    Shutdown,
}

/// Handle to a running controller actor.
///
/// Cheap to clone. All clones talk to the same controller.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    sender: mpsc::Sender<ControllerCommand>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl ControllerHandle {
    /// Starts a session. `Ok(false)` if one is already running.
    pub async fn start_session(&self, profile: &Profile) -> Result<bool, SessionError> {
        let profile = profile.clone();
        self.request(|reply| ControllerCommand::Start { profile, reply })
            .await
    }

    /// Ends the session from the app. `Ok(false)` if it is locked or
    /// nothing is running.
    pub async fn end_session_manually(&self) -> Result<bool, SessionError> {
        self.request(|reply| ControllerCommand::EndManually { reply })
            .await
    }

    /// Hands a scanned identifier to the controller.
    pub async fn resolve_scan(
        &self,
        identifier: impl Into<String>,
    ) -> Result<ScanOutcome, SessionError> {
        let identifier = identifier.into();
        self.request(|reply| ControllerCommand::ResolveScan { identifier, reply })
            .await
    }

    /// Asks the actor for its current state.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| ControllerCommand::Snapshot { reply })
            .await
    }

    /// The most recently published state, without a round trip.
    pub fn current(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver that sees every published state change, including
    /// each elapsed-second tick.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    /// Tells the actor to stop. A running session is not recorded.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        self.sender
            .send(ControllerCommand::Shutdown)
            .await
            .map_err(|_| SessionError::ControllerUnavailable)
    }

    /// Whether the actor is still accepting commands.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Resolves once the actor has stopped.
    pub async fn closed(&self) {
        self.sender.closed().await;
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> ControllerCommand,
    ) -> Result<T, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| SessionError::ControllerUnavailable)?;
        reply_rx
            .await
            .map_err(|_| SessionError::ControllerUnavailable)
    }
}

/// The actor's private state. Runs inside a Tokio task.
struct ControllerActor<H: HistorySink, L> {
    controller: SessionController<H>,
    lookup: L,
    ticker: ElapsedTicker,
    receiver: mpsc::Receiver<ControllerCommand>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl<H, L> ControllerActor<H, L>
where
    H: HistorySink,
    L: ProfileLookup + Send + Sync + 'static,
{
    async fn run(mut self) {
        tracing::info!(interval = ?self.ticker.interval(), "controller actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else {
                        tracing::debug!("all controller handles dropped");
                        break;
                    };
                    if !self.handle(cmd) {
                        break;
                    }
                }
                info = self.ticker.wait_for_tick() => {
                    if info.overrun {
                        tracing::debug!(tick = info.tick, skipped = info.ticks_skipped, "late tick");
                    }
                    self.controller.tick();
                    self.settle();
                }
            }
        }

        if let Some(id) = self.controller.active_profile_id() {
            tracing::warn!(
                profile_id = %id,
                elapsed_secs = self.controller.current_elapsed_seconds(),
                "controller stopped with a session still active, not recorded"
            );
        }
        tracing::info!("controller actor stopped");
    }

    /// Applies one command. Returns `false` to stop the loop.
    ///
    /// State is settled (ticker synced, snapshot published) before the
    /// reply goes out, so a caller reading [`ControllerHandle::current`]
    /// right after a command sees its effect.
    fn handle(&mut self, cmd: ControllerCommand) -> bool {
        match cmd {
            ControllerCommand::Start { profile, reply } => {
                let started = self.controller.start_session(&profile);
                self.settle();
                let _ = reply.send(started);
            }
            ControllerCommand::EndManually { reply } => {
                let ended = self.controller.end_session_manually();
                self.settle();
                let _ = reply.send(ended);
            }
            ControllerCommand::ResolveScan { identifier, reply } => {
                let outcome = self.controller.resolve_scan(&identifier, &self.lookup);
                self.settle();
                let _ = reply.send(outcome);
            }
            ControllerCommand::Snapshot { reply } => {
                let _ = reply.send(self.controller.snapshot());
            }
            ControllerCommand::Shutdown => {
                tracing::info!("controller shutting down");
                return false;
            }
        }
        true
    }

    fn settle(&mut self) {
        self.sync_ticker();
        self.publish();
    }

    /// Runs the ticker exactly while a session is active.
    ///
    /// Called after every transition, so the ticker starts on the
    /// Idle→Active edge and stops on the Active→Idle edge.
    fn sync_ticker(&mut self) {
        match (self.controller.is_active(), self.ticker.is_running()) {
            (true, false) => self.ticker.start(),
            (false, true) => self.ticker.stop(),
            _ => {}
        }
    }

    fn publish(&self) {
        let snapshot = self.controller.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}

/// Spawns a controller actor and returns a handle to it.
///
/// `lookup` is consulted on every scan; pass a shared
/// [`ProfileRegistry`](crate::ProfileRegistry) clone so profile edits are
/// visible without restarting the actor. Must be called from within a
/// Tokio runtime.
pub fn spawn_controller<H, L>(config: ControllerConfig, history: H, lookup: L) -> ControllerHandle
where
    H: HistorySink,
    L: ProfileLookup + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));
    let (snap_tx, snap_rx) = watch::channel(SessionSnapshot::Idle);

    let actor = ControllerActor {
        controller: SessionController::new(history),
        lookup,
        ticker: ElapsedTicker::new(config.tick),
        receiver: rx,
        snapshots: snap_tx,
    };

    tokio::spawn(actor.run());

    ControllerHandle {
        sender: tx,
        snapshots: snap_rx,
    }
}
