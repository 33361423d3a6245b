//! # API client: the only component that talks to the server
//!
//! [`ApiClient`] turns typed operations into HTTP requests and HTTP responses
//! back into typed results. It owns three conventions so that callers never deal
//! with them:
//!
//! 1. **Auth header**: [`build_headers`](ApiClient::build_headers) always sets
//!    `Content-Type: application/json` and adds `Authorization: Bearer <token>`
//!    when the [`SessionStore`] holds a token. Login sends no token.
//! 2. **Envelope unwrapping**: success bodies go through
//!    [`envelope::decode`], which accepts the canonical `{result: {data: ...}}`
//!    wrapper and the legacy flat body alike.
//! 3. **Error normalization**: unsuccessful responses become one [`ApiError`]
//!    variant carrying the server's message or the operation's fallback text.
//!    Every failure is logged with its operation before it is returned.
//!
//! ## Operations
//!
//! | Method | Request | Success |
//! |--------|---------|---------|
//! | [`login`](ApiClient::login) | `POST /api/login` | [`LoginResult`] |
//! | [`sign_in`](ApiClient::sign_in) | `login` + [`SessionStore::login`] | [`LoginResult`] |
//! | [`get_users`](ApiClient::get_users) | `GET /api/users[?search=..]` | [`UsersResponse`] |
//! | [`get_user_by_id`](ApiClient::get_user_by_id) | `GET /api/users/{id}` | [`UserResponse`] |
//! | [`create_user`](ApiClient::create_user) | `POST /api/users` | [`UserResponse`] |
//! | [`update_user`](ApiClient::update_user) | `PUT /api/users/{id}` | [`UserResponse`] |
//! | [`delete_user`](ApiClient::delete_user) | `DELETE /api/users/{id}` | `()` |
//!
//! ## Retries
//!
//! The two reads are retried up to `read_retries` times (default 1) when the
//! transport fails or the server answers 5xx. Login and the mutations are sent
//! exactly once.

use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use store::KeyValueStore;
use tracing::{debug, error, warn};

use crate::auth::SessionStore;
use crate::config::ApiConfig;
use crate::envelope;
use crate::error::{ApiError, Operation};
use crate::models::{LoginCredentials, LoginResult, UserFormData, UserResponse, UsersResponse};
use crate::transport::{
    ApiRequest, ApiResponse, HeaderMap, Method, ReqwestTransport, Transport, TransportError,
};

const LOGIN_PATH: &str = "/api/login";
const USERS_PATH: &str = "/api/users";

const DEFAULT_READ_RETRIES: u32 = 1;

/// Typed client for the user-management REST API.
pub struct ApiClient<T, S> {
    transport: T,
    session: SessionStore<S>,
    read_retries: u32,
}

impl<S: KeyValueStore> ApiClient<ReqwestTransport, S> {
    /// Client over HTTP for `config`, authenticating with `session`.
    pub fn from_config(config: &ApiConfig, session: SessionStore<S>) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(transport, session).with_read_retries(config.read_retries))
    }
}

impl<T: Transport, S: KeyValueStore> ApiClient<T, S> {
    pub fn new(transport: T, session: SessionStore<S>) -> Self {
        Self {
            transport,
            session,
            read_retries: DEFAULT_READ_RETRIES,
        }
    }

    /// Builder method to set how often failed reads are retried.
    pub fn with_read_retries(mut self, retries: u32) -> Self {
        self.read_retries = retries;
        self
    }

    pub fn session(&self) -> &SessionStore<S> {
        &self.session
    }

    /// Headers for an API request: JSON content type plus the bearer token when
    /// signed in.
    pub fn build_headers(&self) -> HeaderMap {
        let mut headers = json_headers();
        if let Some(token) = self.session.token() {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("session token is not a valid header value; sending without it"),
            }
        }
        headers
    }

    /// Exchange credentials for a token. Does not touch the session.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResult, ApiError> {
        let operation = Operation::Login;
        let request = ApiRequest {
            method: Method::POST,
            path: LOGIN_PATH.to_string(),
            headers: json_headers(),
            body: Some(encode_body(operation, credentials)?),
        };
        let body = self.execute(operation, request).await?;
        decode(operation, &body)
    }

    /// Log in and store the issued token in the session.
    pub async fn sign_in(&self, credentials: &LoginCredentials) -> Result<LoginResult, ApiError> {
        let result = self.login(credentials).await?;
        if result.access_token.is_empty() {
            error!(operation = Operation::Login.label(), "login response carried an empty token");
            return Err(ApiError::Authentication(
                Operation::Login.fallback_message().to_string(),
            ));
        }
        self.session.login(&result.access_token);
        Ok(result)
    }

    /// Forget the session token.
    pub fn sign_out(&self) {
        self.session.logout();
    }

    /// List users, filtered server-side when `search` is non-empty.
    pub async fn get_users(&self, search: Option<&str>) -> Result<UsersResponse, ApiError> {
        let operation = Operation::ListUsers;
        let path = match search.filter(|term| !term.is_empty()) {
            Some(term) => format!("{USERS_PATH}?search={}", urlencoding::encode(term)),
            None => USERS_PATH.to_string(),
        };
        let body = self
            .execute(operation, self.request(Method::GET, path, None))
            .await?;
        decode(operation, &body)
    }

    pub async fn get_user_by_id(&self, id: &str) -> Result<UserResponse, ApiError> {
        let operation = Operation::GetUser;
        let body = self
            .execute(operation, self.request(Method::GET, user_path(id), None))
            .await?;
        decode(operation, &body)
    }

    /// Create a user; the form data is the raw request body.
    pub async fn create_user(&self, data: &UserFormData) -> Result<UserResponse, ApiError> {
        let operation = Operation::CreateUser;
        let body = encode_body(operation, data)?;
        let request = self.request(Method::POST, USERS_PATH.to_string(), Some(body));
        let body = self.execute(operation, request).await?;
        decode(operation, &body)
    }

    pub async fn update_user(&self, id: &str, data: &UserFormData) -> Result<UserResponse, ApiError> {
        let operation = Operation::UpdateUser;
        let body = encode_body(operation, data)?;
        let request = self.request(Method::PUT, user_path(id), Some(body));
        let body = self.execute(operation, request).await?;
        decode(operation, &body)
    }

    /// Delete a user. Any success body is ignored.
    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        let request = self.request(Method::DELETE, user_path(id), None);
        self.execute(Operation::DeleteUser, request).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: String, body: Option<Vec<u8>>) -> ApiRequest {
        ApiRequest {
            method,
            path,
            headers: self.build_headers(),
            body,
        }
    }

    /// Send `request`, retrying reads, and return the success body.
    async fn execute(&self, operation: Operation, request: ApiRequest) -> Result<Vec<u8>, ApiError> {
        let attempts = if operation.is_read() {
            self.read_retries.saturating_add(1)
        } else {
            1
        };

        let mut attempt = 1;
        loop {
            debug!(method = %request.method, path = %request.path, attempt, "sending request");
            let outcome = self.transport.send(request.clone()).await;

            let retryable = match &outcome {
                Ok(response) => response.is_server_error(),
                Err(_) => true,
            };
            if retryable && attempt < attempts {
                warn!(operation = operation.label(), attempt, "request failed, retrying");
                attempt += 1;
                continue;
            }

            return settle(operation, outcome);
        }
    }
}

fn settle(
    operation: Operation,
    outcome: Result<ApiResponse, TransportError>,
) -> Result<Vec<u8>, ApiError> {
    let err = match outcome {
        Ok(response) if response.is_success() => return Ok(response.body),
        Ok(response) => {
            let message = envelope::error_message(&response.body);
            let err = ApiError::from_status(operation, response.status, message);
            error!(operation = operation.label(), status = response.status, error = %err, "request rejected");
            err
        }
        Err(transport) => {
            error!(operation = operation.label(), error = %transport, "request failed");
            ApiError::transport(operation)
        }
    };
    Err(err)
}

fn decode<R: DeserializeOwned>(operation: Operation, body: &[u8]) -> Result<R, ApiError> {
    envelope::decode(body).map_err(|e| {
        error!(operation = operation.label(), error = %e, "undecodable response body");
        ApiError::decode(operation, &e)
    })
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

fn encode_body<B: Serialize>(operation: Operation, body: &B) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(body).map_err(|e| {
        error!(operation = operation.label(), error = %e, "unserializable request body");
        ApiError::encode(operation, &e)
    })
}

fn user_path(id: &str) -> String {
    format!("{USERS_PATH}/{}", urlencoding::encode(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::{User, UserStatus};
    use crate::testing::ScriptedTransport;
    use serde_json::{json, Value};
    use store::{MemoryStore, AUTH_TOKEN_KEY};

    fn client() -> (ApiClient<ScriptedTransport, MemoryStore>, ScriptedTransport) {
        let transport = ScriptedTransport::new();
        let sessions = SessionStore::new(MemoryStore::new());
        (ApiClient::new(transport.clone(), sessions), transport)
    }

    fn signed_in_client() -> (ApiClient<ScriptedTransport, MemoryStore>, ScriptedTransport) {
        let (client, transport) = client();
        client.session().login("tok1");
        (client, transport)
    }

    fn form() -> UserFormData {
        UserFormData {
            first_name: "Ada".to_string(),
            last_name: Some("Lovelace".to_string()),
            email: "ada@example.com".to_string(),
            status: UserStatus::Active,
            date_of_birth: "1815-12-10".to_string(),
        }
    }

    fn user_json(id: &str) -> Value {
        json!({
            "id": id,
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "status": "ACTIVE",
            "dateOfBirth": "1815-12-10"
        })
    }

    fn body_json(request: &ApiRequest) -> Value {
        serde_json::from_slice(request.body.as_deref().unwrap()).unwrap()
    }

    #[test]
    fn test_headers_without_token() {
        let (client, _) = client();
        let headers = client.build_headers();
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert!(headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_headers_with_token() {
        let (client, _) = signed_in_client();
        let headers = client.build_headers();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer tok1");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_unencodable_token_is_omitted() {
        let (client, _) = client();
        client.session().login("bad\ntoken");
        assert!(client.build_headers().get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_sign_in_with_nested_envelope() {
        let (client, transport) = client();
        transport.respond(
            200,
            json!({"result": {"data": {"accessToken": "tok1", "expiresIn": 3600}}}),
        );

        let result = client
            .sign_in(&LoginCredentials::new("a@b.com", "x"))
            .await
            .unwrap();

        assert_eq!(result.access_token, "tok1");
        assert_eq!(result.expires_in, 3600);
        assert!(client.session().is_authenticated());
        assert_eq!(client.session().token().as_deref(), Some("tok1"));
        assert_eq!(
            client.session().storage().get(AUTH_TOKEN_KEY).unwrap().as_deref(),
            Some("tok1")
        );

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/api/login");
        assert_eq!(body_json(&request), json!({"email": "a@b.com", "password": "x"}));
        assert!(request.headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_login_accepts_flat_body() {
        let (client, transport) = client();
        transport.respond(200, json!({"accessToken": "flat", "expiresIn": "60"}));

        let result = client.login(&LoginCredentials::new("a@b.com", "x")).await.unwrap();
        assert_eq!(result.access_token, "flat");
        assert_eq!(result.expires_in, 60);
        // login alone leaves the session alone
        assert!(!client.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_sign_in_rejects_empty_token() {
        let (client, transport) = client();
        transport.respond(
            200,
            json!({"result": {"data": {"accessToken": "", "expiresIn": 3600}}}),
        );

        let err = client
            .sign_in(&LoginCredentials::new("a@b.com", "x"))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Authentication("Failed to login".to_string()));
        assert!(!client.session().is_authenticated());
        assert!(client.build_headers().get(AUTHORIZATION).is_none());
        assert_eq!(client.session().storage().get(AUTH_TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_login_rejected() {
        let (client, transport) = client();
        transport.respond(401, json!({"message": "Invalid email or password"}));
        transport.respond(500, json!({}));

        let err = client
            .sign_in(&LoginCredentials::new("a@b.com", "wrong"))
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Authentication("Invalid email or password".to_string()));
        assert!(!client.session().is_authenticated());

        let err = client.login(&LoginCredentials::new("a@b.com", "x")).await.unwrap_err();
        assert_eq!(err, ApiError::Authentication("Failed to login".to_string()));

        // Login is never retried
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_get_users_omits_empty_search() {
        let (client, transport) = signed_in_client();
        transport.respond(200, json!({"users": []}));
        transport.respond(200, json!({"users": []}));

        client.get_users(None).await.unwrap();
        client.get_users(Some("")).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].path, "/api/users");
        assert_eq!(requests[1].path, "/api/users");
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(requests[0].headers.get(AUTHORIZATION).unwrap(), "Bearer tok1");
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn test_get_users_encodes_search() {
        let (client, transport) = signed_in_client();
        transport.respond(200, json!({"users": [user_json("1")]}));

        let response = client.get_users(Some("al smith&co")).await.unwrap();

        assert_eq!(response.users.len(), 1);
        assert_eq!(
            transport.last_request().unwrap().path,
            "/api/users?search=al%20smith%26co"
        );
    }

    #[tokio::test]
    async fn test_get_users_error_message_and_fallback() {
        let (client, transport) = signed_in_client();
        let client = client.with_read_retries(0);
        transport.respond(500, json!({"message": "database down"}));
        transport.respond_raw(502, "<html>Bad Gateway</html>");

        let err = client.get_users(None).await.unwrap_err();
        assert_eq!(err, ApiError::Fetch("database down".to_string()));

        let err = client.get_users(None).await.unwrap_err();
        assert_eq!(err, ApiError::Fetch("Failed to fetch users".to_string()));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_read_retried_once_on_server_error() {
        let (client, transport) = signed_in_client();
        transport.respond(503, json!({"message": "busy"}));
        transport.respond(200, json!({"users": [user_json("1"), user_json("2")]}));

        let response = client.get_users(Some("al")).await.unwrap();
        assert_eq!(response.users.len(), 2);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_read_retry_exhausted() {
        let (client, transport) = signed_in_client();
        transport.fail("connection refused");
        transport.fail("connection refused");

        let err = client.get_users(None).await.unwrap_err();
        assert_eq!(err, ApiError::Fetch("Failed to fetch users".to_string()));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let (client, transport) = signed_in_client();
        transport.respond(401, json!({"error": "token expired"}));

        let err = client.get_users(None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.message(), "token expired");
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let (client, transport) = signed_in_client();
        transport.respond(200, json!({"user": user_json("42")}));
        transport.respond(404, json!({"result": {"message": "no such user"}}));

        let response = client.get_user_by_id("42").await.unwrap();
        assert_eq!(response.user.id, "42");
        assert_eq!(transport.last_request().unwrap().path, "/api/users/42");

        let err = client.get_user_by_id("43").await.unwrap_err();
        assert_eq!(err, ApiError::NotFound("no such user".to_string()));
        // 404 is not retried
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_ids_are_encoded_as_one_segment() {
        let (client, transport) = signed_in_client();
        transport.respond_raw(204, "");
        client.delete_user("a/b c").await.unwrap();
        assert_eq!(transport.last_request().unwrap().path, "/api/users/a%2Fb%20c");
    }

    #[tokio::test]
    async fn test_create_user_round_trip() {
        let (client, transport) = signed_in_client();
        transport.respond(201, json!({"user": user_json("new-1")}));

        let data = form();
        let created = client.create_user(&data).await.unwrap().user;

        assert_eq!(
            created,
            User {
                id: "new-1".to_string(),
                first_name: data.first_name.clone(),
                last_name: data.last_name.clone(),
                email: data.email.clone(),
                status: data.status,
                date_of_birth: data.date_of_birth.clone(),
            }
        );
        assert_eq!(created.to_form_data(), data);

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/api/users");
        // raw form payload, not wrapped
        assert_eq!(body_json(&request), serde_json::to_value(&data).unwrap());
    }

    #[tokio::test]
    async fn test_mutation_error_precedence() {
        let (client, transport) = signed_in_client();
        transport.respond(400, json!({"message": "email taken", "error": "Bad Request"}));
        transport.respond(422, json!({"error": "dateOfBirth invalid"}));
        transport.respond(400, json!({}));
        transport.respond_raw(400, "not json");

        let data = form();
        let first = client.create_user(&data).await.unwrap_err();
        let second = client.update_user("1", &data).await.unwrap_err();
        let third = client.create_user(&data).await.unwrap_err();
        let fourth = client.update_user("1", &data).await.unwrap_err();

        assert_eq!(first, ApiError::Validation("email taken".to_string()));
        assert_eq!(second, ApiError::Validation("dateOfBirth invalid".to_string()));
        assert_eq!(third, ApiError::Validation("Failed to create user".to_string()));
        assert_eq!(fourth, ApiError::Validation("Failed to update user".to_string()));
    }

    #[tokio::test]
    async fn test_update_user() {
        let (client, transport) = signed_in_client();
        transport.respond(200, json!({"result": {"data": {"user": user_json("9")}}}));

        let updated = client.update_user("9", &form()).await.unwrap().user;
        assert_eq!(updated.id, "9");

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.path, "/api/users/9");
        assert_eq!(body_json(&request), serde_json::to_value(form()).unwrap());
    }

    #[tokio::test]
    async fn test_mutations_are_not_retried() {
        let (client, transport) = signed_in_client();
        transport.fail("connection reset");

        let err = client.create_user(&form()).await.unwrap_err();
        assert_eq!(err, ApiError::Fetch("Failed to create user".to_string()));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_mutation_server_error_is_not_retried() {
        let (client, transport) = signed_in_client();
        transport
            .respond(503, json!({"message": "maintenance"}))
            .respond(201, json!({"user": user_json("1")}));

        let err = client.create_user(&form()).await.unwrap_err();
        assert_eq!(err, ApiError::Fetch("maintenance".to_string()));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_unserializable_body_is_fetch_error() {
        // JSON object keys must be strings
        let body: std::collections::HashMap<(u8, u8), u8> = [((1, 2), 3)].into_iter().collect();
        let err = encode_body(Operation::CreateUser, &body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert!(err.message().starts_with("Failed to create user: invalid request body"));
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let (client, transport) = signed_in_client();
        transport.respond(404, json!({"message": "not found"}));

        let err = client.delete_user("42").await.unwrap_err();
        assert_eq!(err, ApiError::NotFound("not found".to_string()));
        assert_eq!(err.to_string(), "not found");

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, Method::DELETE);
        assert_eq!(request.path, "/api/users/42");
    }

    #[tokio::test]
    async fn test_delete_ignores_success_body() {
        let (client, transport) = signed_in_client();
        transport.respond_raw(204, "");
        transport.respond(200, json!({"deleted": true}));

        client.delete_user("1").await.unwrap();
        client.delete_user("2").await.unwrap();
    }

    #[tokio::test]
    async fn test_undecodable_success_body() {
        let (client, transport) = signed_in_client();
        transport.respond(200, json!([user_json("1")]));

        let err = client.get_users(None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert!(err.message().starts_with("Failed to fetch users"));
    }

    #[tokio::test]
    async fn test_signed_out_calls_send_no_token() {
        let (client, transport) = client();
        transport.respond(401, json!({"message": "Unauthorized"}));

        let err = client.get_users(None).await.unwrap_err();
        assert_eq!(err, ApiError::Authentication("Unauthorized".to_string()));
        assert!(transport.last_request().unwrap().headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_sign_out() {
        let (client, _) = signed_in_client();
        client.sign_out();
        assert!(!client.session().is_authenticated());
        assert!(client.build_headers().get(AUTHORIZATION).is_none());
    }
}
