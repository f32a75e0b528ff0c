//! Identity actor: an isolated Tokio task that owns one username's record.
//!
//! Each identity runs in its own task, communicating with the outside world
//! through an mpsc channel. The task processes one command at a time, so the
//! register-or-verify sequence in a login never interleaves with another
//! login for the same username, and no lock guards the record.

use std::sync::Arc;
use std::time::Duration;

use gatehouse_protocol::{IdentityRecord, SessionToken, Username};
use gatehouse_session::{
    Credential, CredentialHasher, HashError, SessionIssuer, constant_time_eq,
};
use gatehouse_store::StateStore;
use tokio::sync::{mpsc, oneshot};
use tokio::task::{self, JoinHandle};

use crate::{IdentityError, IdentityState};

type Reply<T> = oneshot::Sender<Result<T, IdentityError>>;

/// Commands sent to an identity actor through its channel.
pub(crate) enum IdentityCommand {
    /// Register on first contact, verify afterwards, then issue a token.
    Login {
        username: Username,
        password: String,
        reply: Reply<SessionToken>,
    },

    /// Return a copy of the current record (loading it if needed).
    Snapshot { reply: Reply<IdentityRecord> },

    /// Report the lifecycle state without loading anything.
    GetState {
        reply: oneshot::Sender<IdentityState>,
    },

    /// Stop the actor.
    Shutdown,
}

/// The dependencies every identity actor is built with, shared by all
/// actors a registry spawns.
pub struct Capabilities<S, H, I> {
    pub store: Arc<S>,
    pub hasher: Arc<H>,
    pub issuer: Arc<I>,
}

impl<S, H, I> Capabilities<S, H, I> {
    /// Wraps the three capabilities.
    pub fn new(store: S, hasher: H, issuer: I) -> Self {
        Self {
            store: Arc::new(store),
            hasher: Arc::new(hasher),
            issuer: Arc::new(issuer),
        }
    }
}

// Manual impl: deriving would require `S: Clone`, `H: Clone`, `I: Clone`.
impl<S, H, I> Clone for Capabilities<S, H, I> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            hasher: Arc::clone(&self.hasher),
            issuer: Arc::clone(&self.issuer),
        }
    }
}

// ---------------------------------------------------------------------------
// IdentityHandle
// ---------------------------------------------------------------------------

/// Handle to a running identity actor. Used to send commands to it.
///
/// Cheap to clone: it's an `mpsc::Sender` plus the username. The
/// `IdentityRegistry` holds one of these per active username.
#[derive(Debug, Clone)]
pub struct IdentityHandle {
    username: Username,
    sender: mpsc::Sender<IdentityCommand>,
}

impl IdentityHandle {
    /// The username this actor owns.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Returns `true` once the actor has stopped accepting commands
    /// (shut down, evicted, or crashed).
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Waits until the actor has stopped accepting commands. From then on
    /// it no longer touches its record.
    pub async fn closed(&self) {
        self.sender.closed().await;
    }

    /// Returns `true` if both handles talk to the same actor instance.
    pub fn same_actor(&self, other: &IdentityHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Logs in: registers `username` with `password` if the identity has
    /// never been seen, otherwise verifies `password` against the stored
    /// credential. Returns a fresh session token on success.
    ///
    /// `username` is recorded in the identity record at registration. It is
    /// expected to equal [`Self::username`]; the registry guarantees that.
    ///
    /// # Errors
    /// - [`IdentityError::InvalidCredential`] — wrong password
    /// - [`IdentityError::Persistence`] — load or commit failed
    /// - [`IdentityError::Hashing`] — the hasher failed
    /// - [`IdentityError::Issuance`] — the token couldn't be minted
    /// - [`IdentityError::Unavailable`] / [`IdentityError::Evicted`] — the
    ///   actor is gone; resend through the registry
    pub async fn login(
        &self,
        username: Username,
        password: impl Into<String>,
    ) -> Result<SessionToken, IdentityError> {
        let password = password.into();
        self.request(|reply| IdentityCommand::Login {
            username,
            password,
            reply,
        })
        .await?
    }

    /// Returns a copy of the identity's current record.
    pub async fn snapshot(&self) -> Result<IdentityRecord, IdentityError> {
        self.request(|reply| IdentityCommand::Snapshot { reply }).await?
    }

    /// Returns the actor's lifecycle state.
    pub async fn state(&self) -> Result<IdentityState, IdentityError> {
        self.request(|reply| IdentityCommand::GetState { reply }).await
    }

    /// Tells the actor to stop after the command it is running, if any.
    pub async fn shutdown(&self) -> Result<(), IdentityError> {
        self.sender
            .send(IdentityCommand::Shutdown)
            .await
            .map_err(|_| IdentityError::Unavailable(self.username.clone()))
    }

    /// Sends a command carrying a reply channel and waits for the answer.
    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> IdentityCommand,
    ) -> Result<T, IdentityError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| IdentityError::Unavailable(self.username.clone()))?;
        reply_rx
            .await
            .map_err(|_| IdentityError::Interrupted(self.username.clone()))
    }
}

// ---------------------------------------------------------------------------
// IdentityActor
// ---------------------------------------------------------------------------

/// The internal actor state. Runs inside a Tokio task.
struct IdentityActor<S, H, I> {
    username: Username,
    /// `None` until the record has been loaded (the `Unloaded` state).
    record: Option<IdentityRecord>,
    caps: Capabilities<S, H, I>,
    idle_timeout: Option<Duration>,
    receiver: mpsc::Receiver<IdentityCommand>,
}

/// Why the command loop ended.
enum Exit {
    /// Every handle was dropped.
    Orphaned,
    /// A `Shutdown` command arrived.
    Shutdown,
    /// No command arrived within the idle timeout.
    Idle,
}

impl<S, H, I> IdentityActor<S, H, I>
where
    S: StateStore,
    H: CredentialHasher,
    I: SessionIssuer,
{
    /// Runs the actor loop, processing commands until shutdown or eviction.
    async fn run(mut self) {
        tracing::info!(username = %self.username, "identity actor started");

        let exit = loop {
            let Some(cmd) = self.next_command().await else {
                break Exit::Idle;
            };
            let Some(cmd) = cmd else {
                break Exit::Orphaned;
            };

            match cmd {
                IdentityCommand::Login {
                    username,
                    password,
                    reply,
                } => {
                    let result = self.handle_login(username, password).await;
                    let _ = reply.send(result);
                }
                IdentityCommand::Snapshot { reply } => {
                    let result = self.ensure_loaded().await.cloned();
                    let _ = reply.send(result);
                }
                IdentityCommand::GetState { reply } => {
                    let _ = reply.send(self.state());
                }
                IdentityCommand::Shutdown => break Exit::Shutdown,
            }
        };

        match exit {
            Exit::Orphaned => {}
            Exit::Shutdown => {
                tracing::info!(username = %self.username, "identity shutting down");
                self.reject_pending().await;
            }
            Exit::Idle => {
                tracing::info!(
                    username = %self.username,
                    state = %self.state(),
                    "identity idle, evicting"
                );
                self.reject_pending().await;
            }
        }

        tracing::info!(username = %self.username, "identity actor stopped");
    }

    /// Waits for the next command.
    ///
    /// Returns `None` if the idle timeout elapsed first, `Some(None)` if
    /// every sender is gone.
    async fn next_command(&mut self) -> Option<Option<IdentityCommand>> {
        match self.idle_timeout {
            Some(timeout) => {
                tokio::time::timeout(timeout, self.receiver.recv()).await.ok()
            }
            None => Some(self.receiver.recv().await),
        }
    }

    /// Closes the inbox and answers everything still buffered in it with
    /// [`IdentityError::Evicted`], without touching state.
    ///
    /// Once `close` returns, `IdentityHandle::is_closed` is true and new
    /// sends fail, so the registry starts a fresh activation. This actor
    /// performs no further loads or commits, so the two never overlap on
    /// the record.
    async fn reject_pending(&mut self) {
        self.receiver.close();
        let mut rejected = 0usize;
        while let Some(cmd) = self.receiver.recv().await {
            let evicted = || IdentityError::Evicted(self.username.clone());
            match cmd {
                IdentityCommand::Login { reply, .. } => {
                    let _ = reply.send(Err(evicted()));
                }
                IdentityCommand::Snapshot { reply } => {
                    let _ = reply.send(Err(evicted()));
                }
                // Answer state queries truthfully; they read nothing.
                IdentityCommand::GetState { reply } => {
                    let _ = reply.send(self.state());
                }
                IdentityCommand::Shutdown => {}
            }
            rejected += 1;
        }
        if rejected > 0 {
            tracing::debug!(
                username = %self.username,
                rejected,
                "rejected requests queued behind eviction"
            );
        }
    }

    fn state(&self) -> IdentityState {
        match &self.record {
            None => IdentityState::Unloaded,
            Some(r) if r.is_registered() => IdentityState::Registered,
            Some(_) => IdentityState::NotRegistered,
        }
    }

    /// Loads the record on first use. A missing record becomes the zero
    /// value. A failed load leaves the actor `Unloaded` so the next
    /// request tries again.
    async fn ensure_loaded(&mut self) -> Result<&IdentityRecord, IdentityError> {
        if self.record.is_none() {
            let loaded = self
                .caps
                .store
                .load(&self.username)
                .await
                .inspect_err(|e| {
                    tracing::warn!(username = %self.username, error = %e, "load failed");
                })?
                .unwrap_or_default();
            tracing::debug!(
                username = %self.username,
                registered = loaded.is_registered(),
                "record loaded"
            );
            self.record = Some(loaded);
        }
        Ok(self.record.get_or_insert_with(IdentityRecord::default))
    }

    async fn handle_login(
        &mut self,
        username: Username,
        password: String,
    ) -> Result<SessionToken, IdentityError> {
        let record = self.ensure_loaded().await?;

        if record.is_registered() {
            let salt = record.password_salt.clone();
            let expected = record.password_hash.clone();
            self.verify(password, salt, &expected).await?;
            tracing::debug!(username = %self.username, "credential verified");
        } else {
            self.register(username.clone(), password).await?;
        }

        let token = self.caps.issuer.issue_token(&username).await?;
        Ok(SessionToken { username, token })
    }

    /// First contact: hash with a fresh salt, commit, and only then adopt
    /// the new record. If the commit fails the actor stays
    /// `NotRegistered`.
    async fn register(
        &mut self,
        username: Username,
        password: String,
    ) -> Result<(), IdentityError> {
        let credential = self.derive(password, None).await?;
        let record = IdentityRecord::registered(
            username,
            credential.salt,
            credential.hash,
        );

        if let Err(e) = self.caps.store.commit(&self.username, &record).await {
            tracing::warn!(
                username = %self.username,
                error = %e,
                "registration commit failed"
            );
            return Err(e.into());
        }

        self.record = Some(record);
        tracing::info!(username = %self.username, "identity registered");
        Ok(())
    }

    async fn verify(
        &self,
        password: String,
        salt: String,
        expected_hash: &str,
    ) -> Result<(), IdentityError> {
        let candidate = self.derive(password, Some(salt)).await?;
        if constant_time_eq(candidate.hash.as_bytes(), expected_hash.as_bytes())
        {
            Ok(())
        } else {
            tracing::warn!(username = %self.username, "credential rejected");
            Err(IdentityError::InvalidCredential)
        }
    }

    /// Runs the hasher on the blocking pool.
    async fn derive(
        &self,
        password: String,
        salt: Option<String>,
    ) -> Result<Credential, IdentityError> {
        let hasher = Arc::clone(&self.caps.hasher);
        let credential =
            task::spawn_blocking(move || hasher.hash(&password, salt.as_deref()))
                .await
                .map_err(|e| HashError::Worker(e.to_string()))??;
        Ok(credential)
    }
}

/// Spawns a new identity actor task and returns a handle to it, plus the
/// task's `JoinHandle` for callers that need to await its exit.
///
/// The actor starts `Unloaded`; its record is read on the first request.
/// `channel_size` bounds the inbox. When it fills up, senders wait.
pub fn spawn_identity<S, H, I>(
    username: Username,
    caps: Capabilities<S, H, I>,
    channel_size: usize,
    idle_timeout: Option<Duration>,
) -> (IdentityHandle, JoinHandle<()>)
where
    S: StateStore,
    H: CredentialHasher,
    I: SessionIssuer,
{
    let (tx, rx) = mpsc::channel(channel_size.max(1));

    let actor = IdentityActor {
        username: username.clone(),
        record: None,
        caps,
        idle_timeout,
        receiver: rx,
    };

    let task = tokio::spawn(actor.run());

    (
        IdentityHandle {
            username,
            sender: tx,
        },
        task,
    )
}
