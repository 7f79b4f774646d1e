//! In-memory gateway implementing both the auth and data ports.
//!
//! Tables are plain vectors of JSON rows, accounts are email/password pairs
//! and the session-change stream is a real broadcast channel, so the
//! session manager and screens run against it exactly as they would against
//! the HTTP adapters.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::domain::ports::{
    AuthEvent, AuthEventKind, AuthGateway, AuthGatewayError, DataGateway, DataGatewayError,
    Filter, Query, Record, SessionSubscription, Table, encode_record,
};
use crate::domain::{AccountUpdate, AuthSession, Credentials, Email, Identity, Password, UserId};

/// Gateway operation, used for call recording and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `DataGateway::select`
    Select,
    /// `DataGateway::insert`
    Insert,
    /// `DataGateway::update`
    Update,
    /// `DataGateway::delete`
    Delete,
    /// `AuthGateway::get_session`
    GetSession,
    /// `AuthGateway::sign_in_with_password`
    SignIn,
    /// `AuthGateway::sign_up`
    SignUp,
    /// `AuthGateway::sign_out`
    SignOut,
    /// `AuthGateway::update_user`
    UpdateUser,
}

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCall {
    /// Operation invoked.
    pub operation: Operation,
    /// Table touched; `None` for auth operations.
    pub table: Option<Table>,
}

#[derive(Debug, Clone)]
enum Failure {
    Data(DataGatewayError),
    Auth(AuthGatewayError),
}

struct Account {
    id: UserId,
    email: String,
    password: String,
}

#[derive(Default)]
struct Store {
    tables: HashMap<Table, Vec<Record>>,
    accounts: Vec<Account>,
    session: Option<AuthSession>,
    calls: Vec<GatewayCall>,
    failures: HashMap<(Operation, Option<Table>), Failure>,
    issued: u64,
}

/// Auth plus data gateway held entirely in memory.
pub struct InMemoryGateway {
    store: Mutex<Store>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for InMemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryGateway {
    /// Empty gateway with no accounts and no session.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            store: Mutex::new(Store::default()),
            events,
        }
    }

    fn lock_store(&self) -> MutexGuard<'_, Store> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("in-memory gateway mutex"),
        }
    }

    /// Add an auth account plus its `users` row.
    pub fn seed_user(&self, identity: &Identity, password: &str) {
        let row = match encode_record(identity) {
            Ok(row) => row,
            Err(err) => panic!("identity must encode as a row: {err}"),
        };
        let mut store = self.lock_store();
        store.accounts.push(Account {
            id: identity.id().clone(),
            email: identity.email().as_ref().to_owned(),
            password: password.to_owned(),
        });
        store.tables.entry(Table::Users).or_default().push(row);
    }

    /// Append a raw row to `table`.
    pub fn seed_row(&self, table: Table, row: Record) {
        self.lock_store().tables.entry(table).or_default().push(row);
    }

    /// Current rows of `table` in insertion order.
    pub fn rows(&self, table: Table) -> Vec<Record> {
        self.lock_store()
            .tables
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    /// Establish a session for `user_id` without emitting an event, as if it
    /// had been restored from storage.
    pub fn restore_session(&self, user_id: &UserId) -> AuthSession {
        let mut store = self.lock_store();
        let session = issue_session(&mut store, user_id.clone());
        store.session = Some(session.clone());
        session
    }

    /// Current session.
    pub fn session(&self) -> Option<AuthSession> {
        self.lock_store().session.clone()
    }

    /// True when an auth account exists for `email`.
    pub fn has_account(&self, email: &str) -> bool {
        self.lock_store()
            .accounts
            .iter()
            .any(|account| account.email == email)
    }

    /// Stored password for `email`.
    pub fn password_of(&self, email: &str) -> Option<String> {
        self.lock_store()
            .accounts
            .iter()
            .find(|account| account.email == email)
            .map(|account| account.password.clone())
    }

    /// Every call in order.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.lock_store().calls.clone()
    }

    /// Calls of one operation.
    pub fn calls_of(&self, operation: Operation) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation == operation)
            .collect()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock_store().calls.clear();
    }

    /// Make every `operation` on `table` fail with `error` until cleared.
    pub fn fail_data(&self, operation: Operation, table: Table, error: DataGatewayError) {
        self.lock_store()
            .failures
            .insert((operation, Some(table)), Failure::Data(error));
    }

    /// Make every auth `operation` fail with `error` until cleared.
    pub fn fail_auth(&self, operation: Operation, error: AuthGatewayError) {
        self.lock_store()
            .failures
            .insert((operation, None), Failure::Auth(error));
    }

    /// Remove injected failures.
    pub fn clear_failures(&self) {
        self.lock_store().failures.clear();
    }

    /// Number of live session subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Push an event to subscribers, returning how many received it.
    pub fn emit(&self, event: AuthEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    fn record(&self, operation: Operation, table: Option<Table>) -> Option<Failure> {
        let mut store = self.lock_store();
        store.calls.push(GatewayCall { operation, table });
        store.failures.get(&(operation, table)).cloned()
    }

    fn data_call(&self, operation: Operation, table: Table) -> Result<(), DataGatewayError> {
        match self.record(operation, Some(table)) {
            Some(Failure::Data(err)) => Err(err),
            Some(Failure::Auth(_)) | None => Ok(()),
        }
    }

    fn auth_call(&self, operation: Operation) -> Result<(), AuthGatewayError> {
        match self.record(operation, None) {
            Some(Failure::Auth(err)) => Err(err),
            Some(Failure::Data(_)) | None => Ok(()),
        }
    }
}

fn issue_session(store: &mut Store, user_id: UserId) -> AuthSession {
    store.issued += 1;
    AuthSession::new(user_id, format!("access-{}", store.issued))
        .with_refresh_token(format!("refresh-{}", store.issued))
}

fn sort_key(record: &Record, column: &str) -> String {
    match record.get(column) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn matches_all(record: &Record, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| filter.matches(record))
}

#[async_trait]
impl DataGateway for InMemoryGateway {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<Record>, DataGatewayError> {
        self.data_call(Operation::Select, table)?;
        let mut rows: Vec<Record> = self
            .rows(table)
            .into_iter()
            .filter(|row| matches_all(row, query.filters()))
            .collect();
        if let Some(order) = query.order() {
            rows.sort_by_key(|row| {
                let key = sort_key(row, &order.column);
                (key.to_lowercase(), key)
            });
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, mut record: Record) -> Result<Record, DataGatewayError> {
        self.data_call(Operation::Insert, table)?;
        let mut store = self.lock_store();
        let id = match record.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => {
                store.issued += 1;
                let id = format!("{}-{}", table.as_str(), store.issued);
                record.insert("id".to_owned(), Value::String(id.clone()));
                id
            }
        };
        let rows = store.tables.entry(table).or_default();
        if rows.iter().any(|row| Filter::eq("id", id.as_str()).matches(row)) {
            return Err(DataGatewayError::conflict(format!(
                "duplicate key value violates unique constraint on {table}.id"
            )));
        }
        rows.push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        table: Table,
        patch: Record,
        filter: &Filter,
    ) -> Result<(), DataGatewayError> {
        self.data_call(Operation::Update, table)?;
        let mut store = self.lock_store();
        for row in store.tables.entry(table).or_default().iter_mut() {
            if filter.matches(row) {
                row.extend(patch.clone());
            }
        }
        Ok(())
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<(), DataGatewayError> {
        self.data_call(Operation::Delete, table)?;
        self.lock_store()
            .tables
            .entry(table)
            .or_default()
            .retain(|row| !filter.matches(row));
        Ok(())
    }
}

#[async_trait]
impl AuthGateway for InMemoryGateway {
    async fn get_session(&self) -> Result<Option<AuthSession>, AuthGatewayError> {
        self.auth_call(Operation::GetSession)?;
        Ok(self.session())
    }

    fn subscribe(&self) -> SessionSubscription {
        SessionSubscription::new(self.events.subscribe())
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, AuthGatewayError> {
        self.auth_call(Operation::SignIn)?;
        let session = {
            let mut store = self.lock_store();
            let user_id = store
                .accounts
                .iter()
                .find(|account| {
                    account.email == credentials.email().as_ref()
                        && account.password == credentials.password().expose()
                })
                .map(|account| account.id.clone())
                .ok_or(AuthGatewayError::InvalidCredentials)?;
            let session = issue_session(&mut store, user_id);
            store.session = Some(session.clone());
            session
        };
        self.emit(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &Email, password: &Password) -> Result<UserId, AuthGatewayError> {
        self.auth_call(Operation::SignUp)?;
        let mut store = self.lock_store();
        if store
            .accounts
            .iter()
            .any(|account| account.email == email.as_ref())
        {
            return Err(AuthGatewayError::rejected("User already registered"));
        }
        let id = UserId::random();
        store.accounts.push(Account {
            id: id.clone(),
            email: email.as_ref().to_owned(),
            password: password.expose().to_owned(),
        });
        Ok(id)
    }

    async fn sign_out(&self) -> Result<(), AuthGatewayError> {
        self.auth_call(Operation::SignOut)?;
        self.lock_store().session = None;
        self.emit(AuthEvent::signed_out());
        Ok(())
    }

    async fn update_user(&self, update: &AccountUpdate) -> Result<(), AuthGatewayError> {
        self.auth_call(Operation::UpdateUser)?;
        let session = {
            let mut store = self.lock_store();
            let session = store.session.clone().ok_or(AuthGatewayError::NoSession)?;
            let account = store
                .accounts
                .iter_mut()
                .find(|account| &account.id == session.user_id())
                .ok_or(AuthGatewayError::NoSession)?;
            if let Some(email) = &update.email {
                account.email = email.as_ref().to_owned();
            }
            if let Some(password) = &update.password {
                account.password = password.expose().to_owned();
            }
            session
        };
        self.emit(AuthEvent {
            kind: AuthEventKind::UserUpdated,
            session: Some(session),
        });
        Ok(())
    }
}
