//! Identity registry: addresses identity actors by username, activating
//! them on demand.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use gatehouse_protocol::{IdentityRecord, SessionToken, Username};
use gatehouse_session::{CredentialHasher, SessionIssuer};
use gatehouse_store::StateStore;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::actor::{Capabilities, IdentityHandle, spawn_identity};
use crate::{IdentityConfig, IdentityError, IdentityState};

type ActorMap = Mutex<HashMap<Username, Activation>>;

/// One running actor. `id` tells activations of the same username apart.
struct Activation {
    id: u64,
    handle: IdentityHandle,
}

/// Keeps at most one live actor per username.
///
/// Callers never create actors themselves: every operation names a
/// username, and the registry routes it to the actor that owns it,
/// spawning one if none is running. An actor that has stopped (idle
/// eviction, shutdown) is dropped from the registry as soon as its task
/// ends, and replaced on the next request for its username.
///
/// All methods take `&self`, so the registry can be shared behind an `Arc`.
pub struct IdentityRegistry<S, H, I> {
    actors: Arc<ActorMap>,
    next_id: AtomicU64,
    caps: Capabilities<S, H, I>,
    config: IdentityConfig,
}

impl<S, H, I> IdentityRegistry<S, H, I>
where
    S: StateStore,
    H: CredentialHasher,
    I: SessionIssuer,
{
    /// Creates an empty registry whose actors share `store`, `hasher` and
    /// `issuer`.
    pub fn new(store: S, hasher: H, issuer: I, config: IdentityConfig) -> Self {
        Self::with_capabilities(Capabilities::new(store, hasher, issuer), config)
    }

    /// Creates an empty registry from already shared capabilities.
    pub fn with_capabilities(
        caps: Capabilities<S, H, I>,
        config: IdentityConfig,
    ) -> Self {
        Self {
            actors: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(1),
            caps,
            config,
        }
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    /// The store, hasher and issuer shared by this registry's actors.
    pub fn capabilities(&self) -> &Capabilities<S, H, I> {
        &self.caps
    }

    /// Returns a handle to the live actor for `username`, spawning one if
    /// there is none or the previous one has stopped.
    ///
    /// A stopped actor closes its inbox before it answers anything it
    /// rejects, and touches no state afterwards. Replacing only closed
    /// handles therefore never leaves two actors working on one record.
    pub async fn handle(&self, username: &Username) -> IdentityHandle {
        let mut actors = self.actors.lock().await;

        if let Some(active) = actors.get(username) {
            if !active.handle.is_closed() {
                return active.handle.clone();
            }
        }

        let (handle, task) = spawn_identity(
            username.clone(),
            self.caps.clone(),
            self.config.channel_size,
            self.config.idle_timeout(),
        );
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tokio::spawn(forget_on_exit(
            Arc::downgrade(&self.actors),
            username.clone(),
            id,
            task,
        ));

        let replaced = actors
            .insert(
                username.clone(),
                Activation {
                    id,
                    handle: handle.clone(),
                },
            )
            .is_some();
        tracing::info!(%username, id, replaced, "identity activated");
        handle
    }

    /// Logs `username` in with `password`, registering it on first contact.
    ///
    /// See [`IdentityHandle::login`] for the errors. Requests that reach an
    /// actor as it stops are resent to a fresh one, up to
    /// `max_attempts` times in total.
    pub async fn login(
        &self,
        username: &Username,
        password: &str,
    ) -> Result<SessionToken, IdentityError> {
        self.call(username, |handle| async move {
            handle.login(username.clone(), password).await
        })
        .await
    }

    /// Returns the current record for `username`, loading it if needed.
    pub async fn snapshot(
        &self,
        username: &Username,
    ) -> Result<IdentityRecord, IdentityError> {
        self.call(username, |handle| async move { handle.snapshot().await })
            .await
    }

    /// Reports the state of the actor for `username` without activating one.
    /// A username with no live actor is `Unloaded`.
    pub async fn state(&self, username: &Username) -> IdentityState {
        let handle = {
            let actors = self.actors.lock().await;
            match actors.get(username) {
                Some(active) if !active.handle.is_closed() => {
                    active.handle.clone()
                }
                _ => return IdentityState::Unloaded,
            }
        };
        handle.state().await.unwrap_or(IdentityState::Unloaded)
    }

    /// Asks the actor for `username` to stop once its current request is
    /// done. Returns `false` if no live actor was registered.
    ///
    /// The next request for `username` activates a new actor, which loads
    /// the record again.
    pub async fn evict(&self, username: &Username) -> bool {
        let handle = {
            let actors = self.actors.lock().await;
            match actors.get(username) {
                Some(active) if !active.handle.is_closed() => {
                    active.handle.clone()
                }
                _ => return false,
            }
        };
        let sent = handle.shutdown().await.is_ok();
        if sent {
            tracing::info!(%username, "identity eviction requested");
        }
        sent
    }

    /// Number of usernames with a live actor.
    pub async fn active_count(&self) -> usize {
        self.actors
            .lock()
            .await
            .values()
            .filter(|active| !active.handle.is_closed())
            .count()
    }

    /// Number of usernames the registry is tracking, including actors that
    /// are stopping but whose task hasn't ended yet.
    pub async fn len(&self) -> usize {
        self.actors.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.actors.lock().await.is_empty()
    }

    /// Stops every actor and waits for each to finish its current request
    /// and close its inbox. Returns how many actors were running.
    ///
    /// The registry lock is held throughout, so no new actor starts until
    /// the old ones have stopped touching their records. The registry stays
    /// usable afterwards.
    pub async fn shutdown_all(&self) -> usize {
        let mut actors = self.actors.lock().await;
        let mut stopped = 0;

        for (_, active) in actors.drain() {
            if active.handle.shutdown().await.is_ok() {
                stopped += 1;
            }
            active.handle.closed().await;
        }

        tracing::info!(stopped, "all identities shut down");
        stopped
    }

    /// Runs `op` against the actor for `username`, resending it to a fresh
    /// activation while it comes back with a retryable error.
    async fn call<T, F, Fut>(
        &self,
        username: &Username,
        op: F,
    ) -> Result<T, IdentityError>
    where
        F: Fn(IdentityHandle) -> Fut,
        Fut: Future<Output = Result<T, IdentityError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let handle = self.handle(username).await;
            match op(handle).await {
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::debug!(%username, attempt, error = %e, "resending request");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// Waits for an actor's task to end, then drops its registry entry unless
/// a newer activation has already taken the username over.
async fn forget_on_exit(
    actors: Weak<ActorMap>,
    username: Username,
    id: u64,
    task: JoinHandle<()>,
) {
    if let Err(e) = task.await {
        tracing::warn!(%username, error = %e, "identity task failed");
    }
    let Some(actors) = actors.upgrade() else {
        return;
    };
    let mut actors = actors.lock().await;
    if actors.get(&username).is_some_and(|active| active.id == id) {
        actors.remove(&username);
        tracing::debug!(%username, id, "stopped identity forgotten");
    }
}
