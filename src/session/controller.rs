use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::session::error::{ProfileUpdateError, SignOutError};
use crate::session::ports::{ProfileStore, SessionStore};
use crate::types::{DisplayName, Session};

/// Where the client stands with respect to authentication
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Loading,
    Unauthenticated,
    /// Signed in, but no display name recorded yet
    Incomplete(Session),
    Ready { session: Session, display_name: String },
}

impl AuthState {
    pub fn is_loading(&self) -> bool {
        matches!(self, AuthState::Loading)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Incomplete(session) | AuthState::Ready { session, .. } => Some(session),
            AuthState::Loading | AuthState::Unauthenticated => None,
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            AuthState::Ready { display_name, .. } => Some(display_name),
            _ => None,
        }
    }
}

/// Flat read model of `AuthState`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthSnapshot {
    pub loading: bool,
    pub session: Option<Session>,
    pub has_display_name: bool,
    pub display_name: Option<String>,
}

impl From<&AuthState> for AuthSnapshot {
    fn from(state: &AuthState) -> Self {
        Self {
            loading: state.is_loading(),
            session: state.session().cloned(),
            has_display_name: state.display_name().is_some(),
            display_name: state.display_name().map(str::to_string),
        }
    }
}

/// Clears the in-flight flag when the update finishes or is dropped
struct PendingGuard<'a>(&'a AtomicBool);

impl<'a> PendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the client's authentication state.
///
/// Created once per client run in `Loading`. Every transition is published
/// through a `watch` channel. Async results are applied only if the lifecycle
/// generation they started under is still current, so a sign-out or re-check
/// makes older in-flight results stale. `teardown` cancels in-flight calls.
pub struct AuthController {
    sessions: Arc<dyn SessionStore>,
    profiles: Arc<dyn ProfileStore>,
    state: watch::Sender<AuthState>,
    generation: AtomicU64,
    update_pending: AtomicBool,
    cancel: CancellationToken,
}

impl AuthController {
    pub fn new(sessions: Arc<dyn SessionStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self {
            sessions,
            profiles,
            state,
            generation: AtomicU64::new(0),
            update_pending: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        AuthSnapshot::from(&*self.state.borrow())
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Token tied to this controller's lifetime
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the session check. Only acts from `Loading`; otherwise returns the
    /// current state untouched.
    pub async fn resolve(&self) -> AuthState {
        if !self.state.borrow().is_loading() {
            return self.state();
        }
        let generation = self.generation.load(Ordering::Acquire);

        let resolved = tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!("Session check abandoned: controller torn down");
                return self.state();
            }
            resolved = self.check_session() => resolved,
        };

        self.apply(generation, AuthState::is_loading, resolved);
        self.state()
    }

    /// Explicit full re-check; the only way back into `Loading`
    pub async fn recheck(&self) -> AuthState {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.state.send_replace(AuthState::Loading);
        self.resolve().await
    }

    /// Persist a display name and move `Incomplete → Ready`. All-or-nothing:
    /// on any error the state is left as it was.
    pub async fn update_display_name(&self, name: &str) -> Result<(), ProfileUpdateError> {
        let name = DisplayName::parse(name)?;

        let session = match &*self.state.borrow() {
            AuthState::Incomplete(session) => session.clone(),
            _ => return Err(ProfileUpdateError::NotAwaitingName),
        };

        let _pending = PendingGuard::acquire(&self.update_pending).ok_or(ProfileUpdateError::InFlight)?;
        let generation = self.generation.load(Ordering::Acquire);

        let saved = tokio::select! {
            _ = self.cancel.cancelled() => return Err(ProfileUpdateError::Superseded),
            saved = self.profiles.set_display_name(session.id, &name) => saved,
        };
        if let Err(e) = saved {
            tracing::warn!(user_id = %session.id, "Display name not saved: {}", e);
            return Err(ProfileUpdateError::Persistence(e));
        }

        let user_id = session.id;
        let applied = self.apply(
            generation,
            |current| matches!(current, AuthState::Incomplete(s) if s.id == user_id),
            AuthState::Ready {
                session,
                display_name: name.into_inner(),
            },
        );

        if applied {
            tracing::info!(user_id = %user_id, "Profile complete");
            Ok(())
        } else {
            Err(ProfileUpdateError::Superseded)
        }
    }

    /// Clear local state, then ask the session store to revoke. Local state is
    /// cleared even when the remote call fails.
    pub async fn sign_out(&self) -> Result<(), SignOutError> {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.state.send_replace(AuthState::Unauthenticated);

        self.sessions.sign_out().await.map_err(|e| {
            tracing::warn!("Remote sign-out failed: {}", e);
            SignOutError(e)
        })
    }

    /// Cancel in-flight calls; their results are discarded
    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    async fn check_session(&self) -> AuthState {
        let session = match self.sessions.current_user().await {
            Ok(Some(session)) => session,
            Ok(None) => return AuthState::Unauthenticated,
            Err(e) => {
                tracing::warn!("Session check failed, treating as signed out: {}", e);
                return AuthState::Unauthenticated;
            }
        };

        match self.profiles.display_name(session.id).await {
            Ok(Some(display_name)) => AuthState::Ready { session, display_name },
            Ok(None) => AuthState::Incomplete(session),
            Err(e) => {
                tracing::warn!(user_id = %session.id, "Profile lookup failed, asking for a name: {}", e);
                AuthState::Incomplete(session)
            }
        }
    }

    /// Publish `next` if the generation is unchanged, the controller is alive
    /// and `precondition` holds for the current state
    fn apply(&self, generation: u64, precondition: impl FnOnce(&AuthState) -> bool, next: AuthState) -> bool {
        self.state.send_if_modified(|current| {
            if self.cancel.is_cancelled()
                || self.generation.load(Ordering::Acquire) != generation
                || !precondition(current)
            {
                return false;
            }
            *current = next;
            true
        })
    }
}

impl Drop for AuthController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::ports::ServiceError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::Notify;
    use uuid::Uuid;

    #[derive(Default)]
    pub(crate) struct FakeSessions {
        pub user: Mutex<Option<Session>>,
        pub fail_check: bool,
        pub fail_sign_out: bool,
        /// When set, `current_user` waits for a notification
        pub hold: Option<Arc<Notify>>,
        pub checks: AtomicUsize,
        pub sign_outs: AtomicUsize,
    }

    #[async_trait]
    impl SessionStore for FakeSessions {
        async fn current_user(&self) -> Result<Option<Session>, ServiceError> {
            self.checks.fetch_add(1, Ordering::SeqCst);
            if let Some(hold) = &self.hold {
                hold.notified().await;
            }
            if self.fail_check {
                return Err(ServiceError::Unavailable("connection refused".to_string()));
            }
            Ok(self.user.lock().unwrap().clone())
        }

        async fn sign_out(&self) -> Result<(), ServiceError> {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            if self.fail_sign_out {
                return Err(ServiceError::Rejected { status: 502, message: "auth service down".to_string() });
            }
            *self.user.lock().unwrap() = None;
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeProfiles {
        pub names: Mutex<HashMap<Uuid, String>>,
        pub fail_reads: bool,
        pub fail_writes: AtomicBool,
        /// When set, `set_display_name` waits for a notification
        pub hold: Option<Arc<Notify>>,
        pub calls: AtomicUsize,
    }

    #[async_trait]
    impl ProfileStore for FakeProfiles {
        async fn display_name(&self, user: Uuid) -> Result<Option<String>, ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_reads {
                return Err(ServiceError::Unavailable("timeout".to_string()));
            }
            Ok(self.names.lock().unwrap().get(&user).cloned())
        }

        async fn set_display_name(&self, user: Uuid, name: &DisplayName) -> Result<(), ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(hold) = &self.hold {
                hold.notified().await;
            }
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(ServiceError::Rejected { status: 500, message: "write failed".to_string() });
            }
            self.names.lock().unwrap().insert(user, name.as_str().to_string());
            Ok(())
        }
    }

    pub(crate) fn alice() -> Session {
        Session {
            id: Uuid::new_v4(),
            email: Some("a@b.com".to_string()),
        }
    }

    pub(crate) fn signed_in(session: &Session) -> FakeSessions {
        FakeSessions {
            user: Mutex::new(Some(session.clone())),
            ..Default::default()
        }
    }

    fn controller(sessions: FakeSessions, profiles: FakeProfiles) -> (AuthController, Arc<FakeSessions>, Arc<FakeProfiles>) {
        let sessions = Arc::new(sessions);
        let profiles = Arc::new(profiles);
        let controller = AuthController::new(sessions.clone(), profiles.clone());
        (controller, sessions, profiles)
    }

    #[tokio::test]
    async fn starts_loading_and_resolves_once() {
        let session = alice();
        let (controller, sessions, _) = controller(signed_in(&session), FakeProfiles::default());

        assert!(controller.snapshot().loading);
        let state = controller.resolve().await;
        assert_eq!(state, AuthState::Incomplete(session));
        assert!(!controller.snapshot().loading);

        // Resolving again is a no-op and never re-enters Loading
        controller.resolve().await;
        assert!(!controller.snapshot().loading);
        assert_eq!(sessions.checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn no_session_is_unauthenticated_without_profile_calls() {
        let (controller, _, profiles) = controller(FakeSessions::default(), FakeProfiles::default());

        assert_eq!(controller.resolve().await, AuthState::Unauthenticated);
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.session, None);
        assert!(!snapshot.has_display_name);
        assert_eq!(profiles.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_session_check_resolves_unauthenticated() {
        let sessions = FakeSessions { fail_check: true, ..Default::default() };
        let (controller, _, _) = controller(sessions, FakeProfiles::default());
        assert_eq!(controller.resolve().await, AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn existing_display_name_resolves_ready() {
        let session = alice();
        let profiles = FakeProfiles::default();
        profiles.names.lock().unwrap().insert(session.id, "Alice".to_string());
        let (controller, _, _) = controller(signed_in(&session), profiles);

        controller.resolve().await;
        let snapshot = controller.snapshot();
        assert!(snapshot.has_display_name);
        assert_eq!(snapshot.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn failed_profile_lookup_resolves_incomplete() {
        let session = alice();
        let profiles = FakeProfiles { fail_reads: true, ..Default::default() };
        let (controller, _, _) = controller(signed_in(&session), profiles);
        assert_eq!(controller.resolve().await, AuthState::Incomplete(session));
    }

    #[tokio::test]
    async fn update_display_name_completes_the_profile() {
        let session = alice();
        let (controller, _, profiles) = controller(signed_in(&session), FakeProfiles::default());
        controller.resolve().await;

        controller.update_display_name("Alice").await.unwrap();

        assert_eq!(
            controller.state(),
            AuthState::Ready { session: session.clone(), display_name: "Alice".to_string() }
        );
        assert_eq!(profiles.names.lock().unwrap().get(&session.id).map(String::as_str), Some("Alice"));
    }

    #[tokio::test]
    async fn empty_or_failing_names_leave_state_unchanged() {
        let session = alice();
        let (controller, _, profiles) = controller(signed_in(&session), FakeProfiles::default());
        controller.resolve().await;

        assert!(matches!(
            controller.update_display_name("   ").await,
            Err(ProfileUpdateError::Invalid(_))
        ));
        assert_eq!(controller.state(), AuthState::Incomplete(session.clone()));

        profiles.fail_writes.store(true, Ordering::SeqCst);
        let err = controller.update_display_name("Alice").await.unwrap_err();
        assert!(matches!(err, ProfileUpdateError::Persistence(_)));
        assert!(err.is_retryable());
        assert!(!controller.snapshot().has_display_name);
        assert_eq!(controller.state(), AuthState::Incomplete(session));
    }

    #[tokio::test]
    async fn update_outside_incomplete_is_rejected() {
        let (controller, _, profiles) = controller(FakeSessions::default(), FakeProfiles::default());

        // Still loading
        assert!(matches!(
            controller.update_display_name("Alice").await,
            Err(ProfileUpdateError::NotAwaitingName)
        ));
        controller.resolve().await;
        assert!(matches!(
            controller.update_display_name("Alice").await,
            Err(ProfileUpdateError::NotAwaitingName)
        ));
        assert_eq!(profiles.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn concurrent_updates_are_rejected() {
        let session = alice();
        let release = Arc::new(Notify::new());
        let profiles = FakeProfiles { hold: Some(release.clone()), ..Default::default() };
        let (controller, _, _) = controller(signed_in(&session), profiles);
        controller.resolve().await;

        let (first, second) = tokio::join!(controller.update_display_name("Alice"), async {
            let second = controller.update_display_name("Bob").await;
            release.notify_one();
            second
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(ProfileUpdateError::InFlight)));
        assert_eq!(controller.state().display_name(), Some("Alice"));
    }

    #[tokio::test]
    async fn sign_out_clears_locally_even_when_remote_fails() {
        let session = alice();
        let sessions = FakeSessions { fail_sign_out: true, ..signed_in(&session) };
        let profiles = FakeProfiles::default();
        profiles.names.lock().unwrap().insert(session.id, "Alice".to_string());
        let (controller, sessions, _) = controller(sessions, profiles);
        controller.resolve().await;

        let err = controller.sign_out().await.unwrap_err();
        assert!(err.0.is_retryable());
        let snapshot = controller.snapshot();
        assert_eq!(snapshot.session, None);
        assert_eq!(snapshot.display_name, None);
        assert_eq!(controller.state(), AuthState::Unauthenticated);
        assert_eq!(sessions.sign_outs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn update_finishing_after_sign_out_is_discarded() {
        let session = alice();
        let release = Arc::new(Notify::new());
        let profiles = FakeProfiles { hold: Some(release.clone()), ..Default::default() };
        let (controller, _, _) = controller(signed_in(&session), profiles);
        controller.resolve().await;

        let (update, signed_out) = tokio::join!(controller.update_display_name("Alice"), async {
            let result = controller.sign_out().await;
            release.notify_one();
            result
        });

        assert!(signed_out.is_ok());
        assert!(matches!(update, Err(ProfileUpdateError::Superseded)));
        assert_eq!(controller.state(), AuthState::Unauthenticated);
    }

    #[tokio::test]
    async fn teardown_discards_pending_session_check() {
        let session = alice();
        let hold = Arc::new(Notify::new());
        let sessions = FakeSessions { hold: Some(hold.clone()), ..signed_in(&session) };
        let (controller, _, _) = controller(sessions, FakeProfiles::default());

        let (state, _) = tokio::join!(controller.resolve(), async {
            controller.teardown();
            hold.notify_one();
        });

        assert_eq!(state, AuthState::Loading);
        assert!(controller.cancellation_token().is_cancelled());
    }

    #[tokio::test]
    async fn teardown_discards_pending_display_name_update() {
        let session = alice();
        let release = Arc::new(Notify::new());
        let profiles = FakeProfiles { hold: Some(release.clone()), ..Default::default() };
        let (controller, _, _) = controller(signed_in(&session), profiles);
        controller.resolve().await;

        let (update, _) = tokio::join!(controller.update_display_name("Alice"), async {
            controller.teardown();
            release.notify_one();
        });

        assert!(matches!(update, Err(ProfileUpdateError::Superseded)));
        assert_eq!(controller.state(), AuthState::Incomplete(session));
        assert!(!controller.snapshot().has_display_name);
    }

    #[tokio::test]
    async fn recheck_reenters_loading_then_resolves() {
        let session = alice();
        let (controller, sessions, _) = controller(signed_in(&session), FakeProfiles::default());
        let mut changes = controller.subscribe();

        controller.resolve().await;
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        *sessions.user.lock().unwrap() = None;
        assert_eq!(controller.recheck().await, AuthState::Unauthenticated);
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), AuthState::Unauthenticated);
        assert_eq!(sessions.checks.load(Ordering::SeqCst), 2);
    }
}
