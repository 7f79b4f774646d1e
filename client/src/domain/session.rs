//! Session and role state.
//!
//! [`SessionManager`] derives the current [`Identity`] from the auth
//! gateway's session plus the matching `users` row, and republishes it on a
//! `tokio::sync::watch` channel. It owns exactly one subscription to the
//! gateway's session-change stream, held by a single listener task.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::gateway_errors::map_auth_error;
use crate::domain::ports::{
    AuthEventKind, AuthGateway, DataGateway, DataGatewayError, Query, SessionSubscription, Table,
    decode_rows,
};
use crate::domain::{AuthSession, Credentials, Error, Identity, UserId};

/// Where the session lifecycle currently stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// The first session check has not completed.
    #[default]
    Initializing,
    /// A session exists and its profile row was loaded.
    Authenticated(Identity),
    /// No usable session.
    Unauthenticated,
}

impl SessionState {
    /// Identity when authenticated.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::Authenticated(identity) => Some(identity),
            Self::Initializing | Self::Unauthenticated => None,
        }
    }

    /// True iff the identity's role is admin.
    pub fn is_admin(&self) -> bool {
        self.identity().is_some_and(Identity::is_admin)
    }

    /// True until the first session check completes.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Initializing)
    }
}

/// Tracks sign-in generations so the listener never resurrects an identity
/// after a local sign-out.
///
/// Every `sign_in` and `sign_out` starts a new generation. While signed out,
/// only sign-out events are applied; results resolved under an older
/// generation are discarded.
#[derive(Debug, Default)]
struct SignInGate {
    generation: AtomicU64,
    signed_out: AtomicBool,
}

impl SignInGate {
    fn open(&self) {
        self.signed_out.store(false, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn close(&self) {
        self.signed_out.store(true, Ordering::Release);
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    fn is_closed(&self) -> bool {
        self.signed_out.load(Ordering::Acquire)
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}

/// Publish `next` unless the generation moved on since `generation` was read.
///
/// The check runs under the watch lock, so a concurrent sign-out either
/// lands before it (and the result is dropped) or overwrites it afterwards.
fn publish_if_current(
    state: &watch::Sender<SessionState>,
    gate: &SignInGate,
    generation: u64,
    next: SessionState,
) -> bool {
    state.send_if_modified(|current| {
        if gate.generation() != generation {
            return false;
        }
        *current = next;
        true
    })
}

/// Owner of the current identity.
///
/// Construct it once at the composition point with [`SessionManager::start`]
/// and pass it down by reference. Call [`SessionManager::shutdown`] to stop
/// the listener and release the gateway subscription; dropping the manager
/// aborts the listener as well.
pub struct SessionManager {
    auth: Arc<dyn AuthGateway>,
    data: Arc<dyn DataGateway>,
    state: Arc<watch::Sender<SessionState>>,
    gate: Arc<SignInGate>,
    listener: Option<JoinHandle<()>>,
}

impl SessionManager {
    /// Subscribe to session changes and run the initial session check in
    /// the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(auth: Arc<dyn AuthGateway>, data: Arc<dyn DataGateway>) -> Self {
        let (sender, _) = watch::channel(SessionState::Initializing);
        let state = Arc::new(sender);
        let gate = Arc::new(SignInGate::default());
        let subscription = auth.subscribe();
        let listener = tokio::spawn(listen(
            Arc::clone(&auth),
            Arc::clone(&data),
            Arc::clone(&state),
            Arc::clone(&gate),
            subscription,
        ));
        debug!("session listener started");
        Self {
            auth,
            data,
            state,
            gate,
            listener: Some(listener),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Current identity, if authenticated.
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    /// True iff the current identity is an admin.
    pub fn is_admin(&self) -> bool {
        self.state.borrow().is_admin()
    }

    /// True until the first session check completes.
    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Wait for the first settled state.
    pub async fn wait_until_ready(&self) -> SessionState {
        let mut receiver = self.state.subscribe();
        match receiver.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        }
    }

    /// Re-run the session check now and publish the result.
    ///
    /// After a local sign-out this stays `Unauthenticated` until the next
    /// `sign_in`.
    pub async fn refresh(&self) -> SessionState {
        let generation = self.gate.generation();
        if self.gate.is_closed() {
            return self.state();
        }
        let session = read_session(self.auth.as_ref()).await;
        let next = resolve(self.data.as_ref(), session).await;
        if publish_if_current(&self.state, &self.gate, generation, next.clone()) {
            next
        } else {
            self.state()
        }
    }

    /// Ask the auth gateway for a session.
    ///
    /// Local state changes only when the gateway's sign-in event arrives.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), Error> {
        let credentials = Credentials::try_from_parts(email, password)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let was_signed_out = self.gate.is_closed();
        self.gate.open();
        match self.auth.sign_in_with_password(&credentials).await {
            Ok(session) => {
                info!(user_id = %session.user_id(), "signed in");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "sign-in failed");
                if was_signed_out {
                    self.gate.close();
                    self.state.send_replace(SessionState::Unauthenticated);
                }
                Err(map_auth_error(err))
            }
        }
    }

    /// End the session. Local state is cleared even when the gateway call
    /// fails; the gateway error is still returned.
    pub async fn sign_out(&self) -> Result<(), Error> {
        self.gate.close();
        let result = self.auth.sign_out().await;
        self.state.send_replace(SessionState::Unauthenticated);
        match result {
            Ok(()) => {
                info!("signed out");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "remote sign-out failed; local session cleared");
                Err(map_auth_error(err))
            }
        }
    }

    /// Stop the listener and release the gateway subscription.
    pub async fn shutdown(mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            match listener.await {
                Err(err) if !err.is_cancelled() => {
                    warn!(error = %err, "session listener ended abnormally");
                }
                Ok(()) | Err(_) => {}
            }
        }
        debug!("session listener stopped");
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

async fn listen(
    auth: Arc<dyn AuthGateway>,
    data: Arc<dyn DataGateway>,
    state: Arc<watch::Sender<SessionState>>,
    gate: Arc<SignInGate>,
    mut subscription: SessionSubscription,
) {
    let session = read_session(auth.as_ref()).await;
    let initial = resolve(data.as_ref(), session).await;
    state.send_modify(|current| {
        *current = if gate.is_closed() {
            SessionState::Unauthenticated
        } else {
            initial
        };
    });

    while let Some(event) = subscription.next().await {
        debug!(kind = ?event.kind, "session change received");
        let generation = gate.generation();
        if gate.is_closed() && event.kind != AuthEventKind::SignedOut {
            debug!(kind = ?event.kind, "ignored after local sign-out");
            continue;
        }
        let session = match event.kind {
            AuthEventKind::Resync => read_session(auth.as_ref()).await,
            AuthEventKind::SignedIn
            | AuthEventKind::SignedOut
            | AuthEventKind::TokenRefreshed
            | AuthEventKind::UserUpdated => event.session,
        };
        let next = resolve(data.as_ref(), session).await;
        if !publish_if_current(&state, &gate, generation, next) {
            debug!(kind = ?event.kind, "stale session result discarded");
        }
    }
    debug!("session change stream closed");
}

async fn read_session(auth: &dyn AuthGateway) -> Option<AuthSession> {
    match auth.get_session().await {
        Ok(session) => session,
        Err(err) => {
            warn!(error = %err, "session lookup failed");
            None
        }
    }
}

async fn resolve(data: &dyn DataGateway, session: Option<AuthSession>) -> SessionState {
    let Some(session) = session else {
        return SessionState::Unauthenticated;
    };
    match fetch_identity(data, session.user_id()).await {
        Ok(Some(identity)) => {
            debug!(user_id = %identity.id(), admin = identity.is_admin(), "identity loaded");
            SessionState::Authenticated(identity)
        }
        Ok(None) => {
            warn!(user_id = %session.user_id(), "no profile row for session user");
            SessionState::Unauthenticated
        }
        Err(err) => {
            warn!(user_id = %session.user_id(), error = %err, "identity fetch failed");
            SessionState::Unauthenticated
        }
    }
}

async fn fetch_identity(
    data: &dyn DataGateway,
    user_id: &UserId,
) -> Result<Option<Identity>, DataGatewayError> {
    let rows = data
        .select(Table::Users, &Query::new().eq("id", user_id.as_ref()))
        .await?;
    let identities = decode_rows::<Identity>(rows)?;
    Ok(identities.into_iter().next())
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
