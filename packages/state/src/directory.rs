//! # Directory: the dashboard's cached user list
//!
//! [`DirectoryState`] holds the last fetched list together with its loading
//! and error flags. Each fetch takes a [`RequestTicket`] from
//! [`DirectoryState::begin`]; only the most recently issued ticket may write
//! its result back, so a slow response to an old search can never overwrite
//! the result of a newer one.
//!
//! [`Directory`] drives the state through an [`ApiClient`]:
//!
//! | Method | Effect |
//! |--------|--------|
//! | [`load`](Directory::load) | Fetch with a new search term |
//! | [`search`](Directory::search) | Debounced `load` for keystroke input |
//! | [`refresh`](Directory::refresh) | Refetch with the current term |
//! | [`create_user`](Directory::create_user), [`update_user`](Directory::update_user), [`delete_user`](Directory::delete_user) | Mutate, then refresh |
//!
//! Filtering happens on the server only.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use api::{ApiClient, ApiError, Transport, User, UserFormData};
use store::KeyValueStore;
use tracing::debug;

use crate::debounce::Debouncer;

/// Identity of one list fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryState {
    pub users: Vec<User>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub search_term: String,
    latest: u64,
}

impl DirectoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch for `search_term` and hand out its ticket.
    pub fn begin(&mut self, search_term: &str) -> RequestTicket {
        self.latest += 1;
        self.search_term = search_term.to_string();
        self.is_loading = true;
        self.error = None;
        RequestTicket(self.latest)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.latest
    }

    /// Apply the outcome of the fetch behind `ticket`.
    ///
    /// Returns `false`, leaving the state untouched, when a newer fetch has
    /// been started since. On error the previous list is kept.
    pub fn complete(&mut self, ticket: RequestTicket, result: Result<Vec<User>, ApiError>) -> bool {
        if !self.is_current(ticket) {
            debug!(
                "discarding superseded user list response (ticket {}, latest {})",
                ticket.0, self.latest
            );
            return false;
        }
        match result {
            Ok(users) => {
                self.users = users;
                self.error = None;
            }
            Err(e) => self.error = Some(e.message().to_string()),
        }
        self.is_loading = false;
        true
    }
}

/// Controller tying a shared [`DirectoryState`] to an [`ApiClient`].
pub struct Directory<T, S> {
    client: ApiClient<T, S>,
    state: Arc<Mutex<DirectoryState>>,
    debouncer: Debouncer,
}

impl<T: Transport, S: KeyValueStore> Directory<T, S> {
    pub fn new(client: ApiClient<T, S>) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(DirectoryState::new())),
            debouncer: Debouncer::default(),
        }
    }

    /// Builder method to replace the search debouncer.
    pub fn with_debouncer(mut self, debouncer: Debouncer) -> Self {
        self.debouncer = debouncer;
        self
    }

    pub fn client(&self) -> &ApiClient<T, S> {
        &self.client
    }

    /// Shared handle to the live state, for observers.
    pub fn state(&self) -> Arc<Mutex<DirectoryState>> {
        Arc::clone(&self.state)
    }

    pub fn snapshot(&self) -> DirectoryState {
        self.lock().clone()
    }

    /// Fetch the list for `search`.
    ///
    /// The returned result is this fetch's own outcome, even if a newer fetch
    /// has superseded it in the state.
    pub async fn load(&self, search: &str) -> Result<(), ApiError> {
        let ticket = self.lock().begin(search);
        let result = self
            .client
            .get_users(Some(search))
            .await
            .map(|response| response.users);
        let outcome = result.as_ref().map(|_| ()).map_err(Clone::clone);
        self.lock().complete(ticket, result);
        outcome
    }

    /// Debounced [`load`](Self::load). A call overtaken by a newer one within
    /// the debounce delay does nothing.
    pub async fn search(&self, search: &str) -> Result<(), ApiError> {
        if !self.debouncer.settle().await {
            return Ok(());
        }
        self.load(search).await
    }

    pub async fn refresh(&self) -> Result<(), ApiError> {
        let term = self.lock().search_term.clone();
        self.load(&term).await
    }

    pub async fn create_user(&self, data: &UserFormData) -> Result<User, ApiError> {
        let user = self.client.create_user(data).await?.user;
        self.refresh_after_mutation().await;
        Ok(user)
    }

    pub async fn update_user(&self, id: &str, data: &UserFormData) -> Result<User, ApiError> {
        let user = self.client.update_user(id, data).await?.user;
        self.refresh_after_mutation().await;
        Ok(user)
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete_user(id).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }

    // A failed refetch is already recorded in the state.
    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.refresh().await {
            debug!("refetch after mutation failed: {e}");
        }
    }

    fn lock(&self) -> MutexGuard<'_, DirectoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use api::testing::ScriptedTransport;
    use api::{ApiRequest, ApiResponse, SessionStore, TransportError, UserStatus};
    use serde_json::{json, Value};
    use store::MemoryStore;
    use tokio::sync::Notify;

    use super::*;

    fn user(id: &str, first_name: &str) -> Value {
        json!({
            "id": id,
            "firstName": first_name,
            "email": format!("{}@example.com", first_name.to_lowercase()),
            "status": "ACTIVE",
            "dateOfBirth": "1990-01-01"
        })
    }

    fn directory(transport: ScriptedTransport) -> Directory<ScriptedTransport, MemoryStore> {
        let session = SessionStore::new(MemoryStore::new());
        session.login("tok1");
        Directory::new(ApiClient::new(transport, session).with_read_retries(0))
    }

    fn form(first_name: &str) -> UserFormData {
        UserFormData {
            first_name: first_name.to_string(),
            last_name: None,
            email: "new@example.com".to_string(),
            status: UserStatus::Active,
            date_of_birth: "2000-02-29".to_string(),
        }
    }

    #[test]
    fn test_begin_and_complete() {
        let mut state = DirectoryState::new();
        let ticket = state.begin("ann");
        assert!(state.is_loading);
        assert_eq!(state.search_term, "ann");

        assert!(state.complete(ticket, Ok(Vec::new())));
        assert!(!state.is_loading);
        assert_eq!(state.error, None);
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let mut state = DirectoryState::new();
        let old = state.begin("a");
        let new = state.begin("ab");

        assert!(!state.complete(old, Err(ApiError::Fetch("late".into()))));
        assert!(state.is_loading);
        assert_eq!(state.error, None);

        assert!(state.complete(new, Err(ApiError::Fetch("Failed to fetch users".into()))));
        assert_eq!(state.error.as_deref(), Some("Failed to fetch users"));
        assert!(!state.is_loading);
    }

    #[tokio::test]
    async fn test_load_fills_state() {
        let transport = ScriptedTransport::new();
        transport.respond(200, json!({"users": [user("1", "Ann"), user("2", "Bob")]}));
        let directory = directory(transport.clone());

        directory.load("").await.unwrap();
        let state = directory.snapshot();
        assert_eq!(state.users.len(), 2);
        assert_eq!(state.users[1].first_name, "Bob");
        assert_eq!(transport.last_request().unwrap().path, "/api/users");
    }

    #[tokio::test]
    async fn test_load_error_keeps_previous_users() {
        let transport = ScriptedTransport::new();
        transport
            .respond(200, json!({"users": [user("1", "Ann")]}))
            .respond(401, json!({"message": "Unauthorized"}));
        let directory = directory(transport);

        directory.load("").await.unwrap();
        let err = directory.load("x").await.unwrap_err();
        assert_eq!(err, ApiError::Authentication("Unauthorized".into()));

        let state = directory.snapshot();
        assert_eq!(state.users.len(), 1);
        assert_eq!(state.error.as_deref(), Some("Unauthorized"));
        assert_eq!(state.search_term, "x");
    }

    #[tokio::test]
    async fn test_mutations_refetch_with_current_term() {
        let transport = ScriptedTransport::new();
        transport
            .respond(200, json!({"users": []}))
            .respond(201, json!({"user": user("9", "Cy")}))
            .respond(200, json!({"users": [user("9", "Cy")]}))
            .respond_raw(204, "")
            .respond(200, json!({"users": []}));
        let directory = directory(transport.clone());

        directory.load("cy").await.unwrap();
        let created = directory.create_user(&form("Cy")).await.unwrap();
        assert_eq!(created.id, "9");
        assert_eq!(directory.snapshot().users.len(), 1);

        directory.delete_user("9").await.unwrap();
        assert!(directory.snapshot().users.is_empty());

        let paths: Vec<String> = transport.requests().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            [
                "/api/users?search=cy",
                "/api/users",
                "/api/users?search=cy",
                "/api/users/9",
                "/api/users?search=cy",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_mutation_skips_refetch() {
        let transport = ScriptedTransport::new();
        transport.respond(404, json!({"message": "not found"}));
        let directory = directory(transport.clone());

        let err = directory.update_user("42", &form("Zed")).await.unwrap_err();
        assert_eq!(err, ApiError::NotFound("not found".into()));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_debounced_search_only_loads_last_term() {
        let transport = ScriptedTransport::new();
        transport.respond(200, json!({"users": [user("1", "Abby")]}));
        let directory = directory(transport.clone()).with_debouncer(Debouncer::from_millis(40));

        let (first, second) = tokio::join!(directory.search("a"), async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            directory.search("ab").await
        });
        first.unwrap();
        second.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/api/users?search=ab");
        assert_eq!(directory.snapshot().search_term, "ab");
    }

    /// Holds each response until the test releases it.
    struct Gate {
        arrived: Notify,
        release: Notify,
        body: Value,
    }

    #[derive(Default)]
    struct GatedTransport {
        gates: HashMap<String, Arc<Gate>>,
    }

    impl GatedTransport {
        fn gate(&mut self, path: &str, body: Value) -> Arc<Gate> {
            let gate = Arc::new(Gate {
                arrived: Notify::new(),
                release: Notify::new(),
                body,
            });
            self.gates.insert(path.to_string(), Arc::clone(&gate));
            gate
        }
    }

    impl Transport for GatedTransport {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
            let gate = self
                .gates
                .get(&request.path)
                .cloned()
                .ok_or_else(|| TransportError::new("no gate for path"))?;
            gate.arrived.notify_one();
            gate.release.notified().await;
            Ok(ApiResponse::new(200, gate.body.to_string().into_bytes()))
        }
    }

    #[tokio::test]
    async fn test_out_of_order_responses_keep_latest_request() {
        let mut transport = GatedTransport::default();
        let slow = transport.gate("/api/users?search=a", json!({"users": [user("1", "Alice")]}));
        let fast = transport.gate("/api/users?search=ab", json!({"users": [user("2", "Abby")]}));

        let session = SessionStore::new(MemoryStore::new());
        session.login("tok1");
        let directory = Directory::new(ApiClient::new(transport, session).with_read_retries(0));

        let (first, second) = tokio::join!(directory.load("a"), async {
            slow.arrived.notified().await;
            fast.release.notify_one();
            let result = directory.load("ab").await;
            slow.release.notify_one();
            result
        });
        first.unwrap();
        second.unwrap();

        let state = directory.snapshot();
        assert_eq!(state.search_term, "ab");
        assert_eq!(state.users.len(), 1);
        assert_eq!(state.users[0].first_name, "Abby");
        assert!(!state.is_loading);
    }
}
