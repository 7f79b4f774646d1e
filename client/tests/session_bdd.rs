//! Behaviour tests for the session manager and the route guard.
//!
//! These scenarios drive the session manager against the in-memory gateway
//! and check which screen the guard renders for each kind of identity.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use academy_client::domain::ports::AuthGatewayError;
use academy_client::domain::routing::resolve;
use academy_client::domain::{ErrorCode, Navigation, Role, Route, SessionManager, SessionState, UserId};
use academy_client::test_support::{InMemoryGateway, Operation, identity};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use tokio::runtime::Runtime;

const LEARNER_ID: &str = "9b2f7f3c-1d7e-4e0a-9c55-6d0f1a2b3c4d";
const ORPHAN_ID: &str = "0c8e5c4a-8f0b-4c52-9a7e-2f9d6b1e3a77";

/// Wrapper for the non-Clone runtime.
#[derive(Clone)]
struct RuntimeHandle(Arc<Runtime>);

/// Session manager shared between steps; emptied on shutdown.
#[derive(Clone)]
struct SessionHandle(Arc<Mutex<Option<SessionManager>>>);

#[derive(Default, ScenarioState)]
struct SessionWorld {
    runtime: Slot<RuntimeHandle>,
    gateway: Slot<Arc<InMemoryGateway>>,
    learner_email: Slot<String>,
    session: Slot<SessionHandle>,
    sign_in_error: Slot<String>,
    sign_out_error: Slot<ErrorCode>,
    state: Slot<SessionState>,
    navigation: Slot<Navigation>,
}

impl SessionWorld {
    fn runtime(&self) -> Arc<Runtime> {
        if let Some(handle) = self.runtime.get() {
            return handle.0;
        }
        let runtime = Arc::new(Runtime::new().expect("create runtime"));
        self.runtime.set(RuntimeHandle(Arc::clone(&runtime)));
        runtime
    }

    fn gateway(&self) -> Arc<InMemoryGateway> {
        if let Some(gateway) = self.gateway.get() {
            return gateway;
        }
        let gateway = Arc::new(InMemoryGateway::new());
        self.gateway.set(Arc::clone(&gateway));
        gateway
    }

    fn with_session<T>(&self, run: impl FnOnce(&Runtime, &SessionManager) -> T) -> T {
        let handle = self.session.get().expect("session manager should be running");
        let guard = handle.0.lock().expect("session mutex");
        let session = guard.as_ref().expect("session manager already shut down");
        run(&self.runtime(), session)
    }

    fn wait_for_settled_change(&self, previous: &SessionState) -> SessionState {
        self.with_session(|runtime, session| {
            let mut receiver = session.watch();
            runtime.block_on(async move {
                let changed = tokio::time::timeout(
                    Duration::from_secs(1),
                    receiver.wait_for(|state| state != previous && !state.is_loading()),
                )
                .await;
                match changed {
                    Ok(Ok(state)) => Some(state.clone()),
                    Ok(Err(_)) | Err(_) => None,
                }
            })
            .unwrap_or_else(|| session.state())
        })
    }

    fn sign_in(&self, password: &str) {
        let email = self.learner_email.get().expect("learner account seeded");
        let before = self.with_session(|_, session| session.state());
        let outcome =
            self.with_session(|runtime, session| runtime.block_on(session.sign_in(&email, password)));
        match outcome {
            Ok(()) => self.state.set(self.wait_for_settled_change(&before)),
            Err(err) => {
                self.sign_in_error.set(err.message().to_owned());
                self.state.set(self.with_session(|_, session| session.state()));
            }
        }
    }
}

fn unquote(raw: &str) -> &str {
    raw.trim().trim_matches('"')
}

#[fixture]
fn world() -> SessionWorld {
    SessionWorld::default()
}

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("a learner account {email} named {name}")]
fn a_learner_account(world: &SessionWorld, email: String, name: String) {
    let email = unquote(&email).to_owned();
    world.gateway().seed_user(
        &identity(LEARNER_ID, unquote(&name), &email, Some(Role::User)),
        "learner-pw",
    );
    world.learner_email.set(email);
}

#[given("a session for an account without a profile row")]
fn a_session_without_profile_row(world: &SessionWorld) {
    world
        .gateway()
        .restore_session(&UserId::new(ORPHAN_ID).expect("valid id"));
}

#[given("a running session manager")]
fn a_running_session_manager(world: &SessionWorld) {
    let gateway = world.gateway();
    let session = world.runtime().block_on(async move {
        let session = SessionManager::start(gateway.clone(), gateway);
        session.wait_until_ready().await;
        session
    });
    world.state.set(session.state());
    world
        .session
        .set(SessionHandle(Arc::new(Mutex::new(Some(session)))));
}

#[given("the auth gateway rejects sign-out")]
fn the_auth_gateway_rejects_sign_out(world: &SessionWorld) {
    world
        .gateway()
        .fail_auth(Operation::SignOut, AuthGatewayError::transport("offline"));
}

#[given("a signed-in identity with role {role}")]
fn a_signed_in_identity_with_role(world: &SessionWorld, role: String) {
    let role = Role::parse(unquote(&role));
    world.state.set(SessionState::Authenticated(identity(
        LEARNER_ID,
        "Bob",
        "bob@example.com",
        role,
    )));
}

#[given("nobody is signed in")]
fn nobody_is_signed_in(world: &SessionWorld) {
    world.state.set(SessionState::Unauthenticated);
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[given("the learner has signed in with password {password}")]
fn the_learner_has_signed_in(world: &SessionWorld, password: String) {
    world.sign_in(unquote(&password));
}

#[when("the learner signs in with password {password}")]
fn the_learner_signs_in(world: &SessionWorld, password: String) {
    world.sign_in(unquote(&password));
}

#[when("the learner signs out")]
fn the_learner_signs_out(world: &SessionWorld) {
    let outcome = world.with_session(|runtime, session| runtime.block_on(session.sign_out()));
    if let Err(err) = outcome {
        world.sign_out_error.set(err.code());
    }
    world.state.set(world.with_session(|_, session| session.state()));
}

#[when("the session manager shuts down")]
fn the_session_manager_shuts_down(world: &SessionWorld) {
    let handle = world.session.get().expect("session manager should be running");
    let session = handle
        .0
        .lock()
        .expect("session mutex")
        .take()
        .expect("session manager already shut down");
    world.runtime().block_on(session.shutdown());
}

#[when("{path} is opened")]
fn path_is_opened(world: &SessionWorld, path: String) {
    let state = world.state.get().expect("session state prepared");
    world.navigation.set(resolve(unquote(&path), &state));
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("the session is authenticated as {name}")]
fn the_session_is_authenticated_as(world: &SessionWorld, name: String) {
    let state = world.state.get().expect("state recorded");
    let identity = state.identity().expect("authenticated");
    assert_eq!(identity.name().as_ref(), unquote(&name));
}

#[then("the session is unauthenticated")]
fn the_session_is_unauthenticated(world: &SessionWorld) {
    let state = world.state.get().expect("state recorded");
    assert_eq!(state, SessionState::Unauthenticated);
}

#[then("the sign-in error is {message}")]
fn the_sign_in_error_is(world: &SessionWorld, message: String) {
    assert_eq!(
        world.sign_in_error.get().as_deref(),
        Some(unquote(&message))
    );
}

#[then("the sign-out reported an error")]
fn the_sign_out_reported_an_error(world: &SessionWorld) {
    assert_eq!(world.sign_out_error.get(), Some(ErrorCode::ServiceUnavailable));
}

#[then("exactly one session subscription is open")]
fn exactly_one_session_subscription_is_open(world: &SessionWorld) {
    assert_eq!(world.gateway().subscriber_count(), 1);
}

#[then("no session subscription remains")]
fn no_session_subscription_remains(world: &SessionWorld) {
    assert_eq!(world.gateway().subscriber_count(), 0);
}

#[then("the user is redirected to {path}")]
fn the_user_is_redirected_to(world: &SessionWorld, path: String) {
    let expected = Route::parse(unquote(&path));
    assert_eq!(world.navigation.get(), Some(Navigation::Redirect(expected)));
}

#[then("{path} is rendered")]
fn path_is_rendered(world: &SessionWorld, path: String) {
    let expected = Route::parse(unquote(&path));
    assert_eq!(world.navigation.get(), Some(Navigation::Render(expected)));
}

// -----------------------------------------------------------------------------
// Scenario Bindings
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Signing in publishes the learner identity"
)]
fn signing_in_publishes_the_learner_identity(world: SessionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Wrong password leaves the session unauthenticated"
)]
fn wrong_password_leaves_the_session_unauthenticated(world: SessionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Sign-out clears the identity even when the gateway fails"
)]
fn sign_out_clears_the_identity_even_when_the_gateway_fails(world: SessionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Missing profile row means unauthenticated"
)]
fn missing_profile_row_means_unauthenticated(world: SessionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/session_lifecycle.feature",
    name = "Shutdown releases the subscription"
)]
fn shutdown_releases_the_subscription(world: SessionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "Learner is redirected from course management"
)]
fn learner_is_redirected_from_course_management(world: SessionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "Identity without a role is redirected from user management"
)]
fn identity_without_a_role_is_redirected(world: SessionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "Identity with an unrecognised role is redirected"
)]
fn identity_with_an_unrecognised_role_is_redirected(world: SessionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "Admin reaches user management"
)]
fn admin_reaches_user_management(world: SessionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "Signed-out visitor is sent to login"
)]
fn signed_out_visitor_is_sent_to_login(world: SessionWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/route_guards.feature",
    name = "Unknown dashboard path falls back to learn"
)]
fn unknown_dashboard_path_falls_back_to_learn(world: SessionWorld) {
    let _ = world;
}
