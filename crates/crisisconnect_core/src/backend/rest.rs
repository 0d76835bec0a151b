//! Hosted backend client (Supabase auth + PostgREST data API).
//!
//! # Responsibility
//! - Map `AuthBackend` onto the `/auth/v1` endpoints.
//! - Map `DataBackend` onto `/rest/v1/{table}` with PostgREST filter syntax.
//! - Keep the session in memory and fan auth changes out to listeners.
//!
//! # Invariants
//! - Error messages reported by the service are surfaced unchanged.
//! - Requests carry the project key; data requests carry the user's bearer
//!   token when signed in so row-level policies apply server-side.
//! - An expired token is refreshed before the next data request. A failed
//!   refresh ends the session and emits `SignedOut`.

use crate::backend::{
    now_epoch_secs, AuthBackend, AuthEventBus, AuthListener, BackendError, BackendErrorKind,
    BackendResult, Credentials, DataBackend, Filter, Row, SignUpRequest, SignUpResult,
    SubscriptionId, Table, TableQuery,
};
use crate::model::identity::{AuthEvent, AuthSession, UserIdentity};
use log::{info, warn};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use uuid::Uuid;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;
const REFRESH_TOKEN_MISSING: &str = "Refresh Token Not Found";

/// Blocking client for a hosted project.
pub struct RestBackend {
    client: Client,
    base_url: String,
    anon_key: String,
    session: Mutex<Option<AuthSession>>,
    events: AuthEventBus,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Value,
    #[serde(default)]
    identities: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

/// Sign-up answers with a session when confirmation is disabled, or with the
/// bare user when an email confirmation is pending.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GoTrueSignUp {
    Session(GoTrueSession),
    User(GoTrueUser),
}

impl GoTrueUser {
    fn into_identity(self) -> UserIdentity {
        let full_name = self
            .user_metadata
            .get("full_name")
            .and_then(Value::as_str)
            .map(str::to_string);
        UserIdentity {
            id: self.id,
            email: self.email.unwrap_or_default(),
            full_name,
        }
    }
}

impl GoTrueSession {
    fn into_session(self) -> AuthSession {
        AuthSession {
            identity: self.user.into_identity(),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_at,
        }
    }
}

impl RestBackend {
    /// Builds a client for `base_url` (e.g. `https://xyz.supabase.co`).
    pub fn new(base_url: &str, anon_key: &str) -> BackendResult<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(transport_error)?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.trim().to_string(),
            session: Mutex::new(None),
            events: AuthEventBus::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn bearer(&self) -> String {
        self.lock_session()
            .as_ref()
            .map(|session| session.access_token.clone())
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    /// Exchanges the refresh token for a new session.
    ///
    /// Emits `TokenRefreshed` on success. Any failure clears the session and
    /// emits `SignedOut`.
    pub fn refresh_session(&self) -> BackendResult<AuthSession> {
        let refresh_token = self
            .lock_session()
            .as_ref()
            .and_then(|session| session.refresh_token.clone());
        let outcome = match refresh_token {
            Some(token) => self.exchange_refresh_token(&token),
            None => Err(BackendError::new(
                BackendErrorKind::Auth,
                REFRESH_TOKEN_MISSING,
            )),
        };
        match outcome {
            Ok(session) => {
                *self.lock_session() = Some(session.clone());
                self.events.emit(&AuthEvent::TokenRefreshed(session.clone()));
                info!("event=auth_refresh module=backend backend=rest status=ok");
                Ok(session)
            }
            Err(err) => {
                warn!(
                    "event=auth_refresh module=backend backend=rest status=error kind={}",
                    err.kind.as_str()
                );
                self.end_session();
                Err(err)
            }
        }
    }

    fn exchange_refresh_token(&self, refresh_token: &str) -> BackendResult<AuthSession> {
        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .map_err(transport_error)?;
        let session: GoTrueSession = decode(read_json(response)?)?;
        Ok(session.into_session())
    }

    /// Refreshes the session first when its token is about to expire.
    fn ensure_fresh_session(&self) -> BackendResult<()> {
        let expiring = self
            .lock_session()
            .as_ref()
            .is_some_and(|session| needs_refresh(session, now_epoch_secs()));
        if expiring {
            self.refresh_session()?;
        }
        Ok(())
    }

    fn end_session(&self) {
        let had_session = self.lock_session().take().is_some();
        if had_session {
            self.events.emit(&AuthEvent::SignedOut);
        }
    }

    fn start_session(&self, session: AuthSession) {
        *self.lock_session() = Some(session.clone());
        self.events.emit(&AuthEvent::SignedIn(session));
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<AuthSession>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn send_rows(&self, request: RequestBuilder) -> BackendResult<Vec<Row>> {
        self.ensure_fresh_session()?;
        let response = self
            .authorize(request)
            .header("Accept", "application/json")
            .send()
            .map_err(transport_error)?;
        let body = read_json(response)?;
        match body {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Object(row) => Ok(row),
                    other => Err(BackendError::new(
                        BackendErrorKind::InvalidData,
                        format!("expected row object, got {other}"),
                    )),
                })
                .collect(),
            Value::Object(row) => Ok(vec![row]),
            Value::Null => Ok(Vec::new()),
            other => Err(BackendError::new(
                BackendErrorKind::InvalidData,
                format!("expected row array, got {other}"),
            )),
        }
    }
}

impl AuthBackend for RestBackend {
    fn sign_in(&self, credentials: &Credentials) -> BackendResult<AuthSession> {
        let response = self
            .client
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": credentials.email.trim(),
                "password": credentials.password,
            }))
            .send()
            .map_err(transport_error)?;
        let session: GoTrueSession = decode(read_json(response)?)?;
        let session = session.into_session();
        self.start_session(session.clone());
        info!("event=auth_sign_in module=backend backend=rest status=ok");
        Ok(session)
    }

    fn sign_up(&self, request: &SignUpRequest) -> BackendResult<SignUpResult> {
        let response = self
            .client
            .post(self.auth_url("signup"))
            .header("apikey", &self.anon_key)
            .json(&json!({
                "email": request.credentials.email.trim(),
                "password": request.credentials.password,
                "data": { "full_name": request.full_name },
            }))
            .send()
            .map_err(transport_error)?;
        let result = match decode::<GoTrueSignUp>(read_json(response)?)? {
            GoTrueSignUp::Session(session) => {
                let already_registered = is_already_registered(&session.user);
                let session = session.into_session();
                self.start_session(session.clone());
                SignUpResult {
                    identity: session.identity.clone(),
                    session: Some(session),
                    already_registered,
                }
            }
            GoTrueSignUp::User(user) => SignUpResult {
                already_registered: is_already_registered(&user),
                identity: user.into_identity(),
                session: None,
            },
        };
        info!(
            "event=auth_sign_up module=backend backend=rest status=ok already_registered={}",
            result.already_registered
        );
        Ok(result)
    }

    fn sign_out(&self) -> BackendResult<()> {
        let token = self
            .lock_session()
            .as_ref()
            .map(|session| session.access_token.clone());
        if let Some(token) = token {
            let outcome = self
                .client
                .post(self.auth_url("logout"))
                .header("apikey", &self.anon_key)
                .bearer_auth(token)
                .send();
            // Local sign-out proceeds even when the server call fails.
            if let Err(err) = outcome {
                warn!("event=auth_sign_out module=backend backend=rest status=error error={err}");
            }
        }
        self.lock_session().take();
        self.events.emit(&AuthEvent::SignedOut);
        Ok(())
    }

    fn request_password_reset(&self, email: &str) -> BackendResult<()> {
        let response = self
            .client
            .post(self.auth_url("recover"))
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email.trim() }))
            .send()
            .map_err(transport_error)?;
        read_json(response)?;
        Ok(())
    }

    fn current_session(&self) -> BackendResult<Option<AuthSession>> {
        Ok(self.lock_session().clone())
    }

    fn subscribe(&self, listener: AuthListener) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.events.unsubscribe(id);
    }
}

impl DataBackend for RestBackend {
    fn select(&self, query: &TableQuery) -> BackendResult<Vec<Row>> {
        let mut pairs = vec![("select".to_string(), "*".to_string())];
        pairs.extend(query_pairs(query));
        self.send_rows(self.client.get(self.table_url(query.table)).query(&pairs))
    }

    fn insert(&self, table: Table, row: Row) -> BackendResult<Row> {
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&Value::Object(row));
        single_row(table, self.send_rows(request)?)
    }

    fn update(&self, query: &TableQuery, patch: Row) -> BackendResult<Vec<Row>> {
        let request = self
            .client
            .patch(self.table_url(query.table))
            .query(&query_pairs(query))
            .header("Prefer", "return=representation")
            .json(&Value::Object(patch));
        self.send_rows(request)
    }

    fn upsert(&self, table: Table, row: Row) -> BackendResult<Row> {
        let request = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&Value::Object(row));
        single_row(table, self.send_rows(request)?)
    }

    fn delete(&self, query: &TableQuery) -> BackendResult<usize> {
        let request = self
            .client
            .delete(self.table_url(query.table))
            .query(&query_pairs(query))
            .header("Prefer", "return=representation");
        Ok(self.send_rows(request)?.len())
    }
}

/// Encodes filters, ordering and limit as PostgREST query pairs.
pub fn query_pairs(query: &TableQuery) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for filter in &query.filters {
        match filter {
            Filter::Eq(column, Value::Null) | Filter::IsNull(column) => {
                pairs.push(((*column).to_string(), "is.null".to_string()));
            }
            Filter::Eq(column, Value::String(text)) => {
                pairs.push(((*column).to_string(), format!("eq.{text}")));
            }
            Filter::Eq(column, other) => {
                pairs.push(((*column).to_string(), format!("eq.{other}")));
            }
        }
    }
    if !query.order.is_empty() {
        let order = query
            .order
            .iter()
            .map(|order| {
                format!(
                    "{}.{}",
                    order.column,
                    if order.ascending { "asc" } else { "desc" }
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(("order".to_string(), order));
    }
    if let Some(limit) = query.limit {
        pairs.push(("limit".to_string(), limit.to_string()));
    }
    pairs
}

fn needs_refresh(session: &AuthSession, now: i64) -> bool {
    session
        .expires_at
        .is_some_and(|expires_at| now + REFRESH_MARGIN_SECS >= expires_at)
}

fn is_already_registered(user: &GoTrueUser) -> bool {
    matches!(&user.identities, Some(identities) if identities.is_empty())
}

fn single_row(table: Table, rows: Vec<Row>) -> BackendResult<Row> {
    rows.into_iter().next().ok_or_else(|| {
        BackendError::new(
            BackendErrorKind::NotFound,
            format!("no row returned from {table}"),
        )
    })
}

fn read_json(response: Response) -> BackendResult<Value> {
    let status = response.status();
    let text = response.text().map_err(transport_error)?;
    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    if status.is_success() {
        return Ok(body);
    }
    Err(BackendError::new(
        status_kind(status),
        error_message(&body, status),
    ))
}

fn decode<T: serde::de::DeserializeOwned>(body: Value) -> BackendResult<T> {
    serde_json::from_value(body)
        .map_err(|err| BackendError::new(BackendErrorKind::InvalidData, err.to_string()))
}

fn status_kind(status: StatusCode) -> BackendErrorKind {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => BackendErrorKind::Auth,
        StatusCode::FORBIDDEN => BackendErrorKind::Forbidden,
        StatusCode::NOT_FOUND | StatusCode::NOT_ACCEPTABLE => BackendErrorKind::NotFound,
        StatusCode::CONFLICT => BackendErrorKind::Conflict,
        status if status.is_server_error() => BackendErrorKind::Transport,
        _ => BackendErrorKind::Rejected,
    }
}

/// Picks the service's own wording out of an error body.
pub fn error_message(body: &Value, status: StatusCode) -> String {
    for key in ["error_description", "msg", "message", "error"] {
        if let Some(message) = body.get(key).and_then(Value::as_str) {
            return message.to_string();
        }
    }
    match body {
        Value::String(text) if !text.is_empty() => text.clone(),
        _ => format!("request failed with status {status}"),
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    BackendError::new(BackendErrorKind::Transport, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{error_message, needs_refresh, query_pairs, GoTrueSignUp, RestBackend};
    use crate::backend::{
        now_epoch_secs, AuthBackend, AuthListener, BackendErrorKind, DataBackend, Table,
        TableQuery,
    };
    use crate::model::identity::{AuthEvent, AuthSession, UserIdentity};
    use reqwest::StatusCode;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    /// Port 9 (discard) on loopback refuses connections, so requests fail fast.
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn session_expiring_at(expires_at: Option<i64>) -> AuthSession {
        AuthSession {
            identity: UserIdentity::new(Uuid::new_v4(), "rudo@example.com"),
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at,
        }
    }

    fn record_events(backend: &RestBackend) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let listener: AuthListener = Arc::new(move |event: &AuthEvent| {
            let name = match event {
                AuthEvent::SignedIn(_) => "signed_in",
                AuthEvent::SignedOut => "signed_out",
                AuthEvent::TokenRefreshed(_) => "token_refreshed",
                AuthEvent::UserUpdated(_) => "user_updated",
            };
            sink.lock().expect("events").push(name.to_string());
        });
        backend.subscribe(listener);
        seen
    }

    #[test]
    fn tokens_near_expiry_need_refresh() {
        let now = 1_700_000_000;
        assert!(needs_refresh(&session_expiring_at(Some(now - 1)), now));
        assert!(needs_refresh(&session_expiring_at(Some(now + 30)), now));
        assert!(!needs_refresh(&session_expiring_at(Some(now + 3600)), now));
        assert!(!needs_refresh(&session_expiring_at(None), now));
    }

    #[test]
    fn failed_refresh_before_data_call_signs_out() {
        let backend = RestBackend::new(UNREACHABLE, "anon").expect("client");
        *backend.lock_session() = Some(session_expiring_at(Some(now_epoch_secs() - 10)));
        let events = record_events(&backend);

        let err = backend
            .select(&TableQuery::new(Table::Contacts))
            .expect_err("refresh cannot reach the server");
        assert_eq!(err.kind, BackendErrorKind::Transport);
        assert!(backend.current_session().expect("session").is_none());
        assert_eq!(*events.lock().expect("events"), vec!["signed_out".to_string()]);
    }

    #[test]
    fn refresh_without_refresh_token_signs_out() {
        let backend = RestBackend::new(UNREACHABLE, "anon").expect("client");
        let mut session = session_expiring_at(Some(now_epoch_secs() - 10));
        session.refresh_token = None;
        *backend.lock_session() = Some(session);
        let events = record_events(&backend);

        let err = backend.refresh_session().expect_err("no refresh token");
        assert_eq!(err.kind, BackendErrorKind::Auth);
        assert_eq!(err.message, "Refresh Token Not Found");
        assert!(backend.current_session().expect("session").is_none());
        assert_eq!(*events.lock().expect("events"), vec!["signed_out".to_string()]);
    }

    #[test]
    fn live_token_is_not_refreshed() {
        let backend = RestBackend::new(UNREACHABLE, "anon").expect("client");
        *backend.lock_session() = Some(session_expiring_at(Some(now_epoch_secs() + 3600)));
        let events = record_events(&backend);

        let err = backend
            .select(&TableQuery::new(Table::Contacts))
            .expect_err("data call cannot reach the server");
        assert_eq!(err.kind, BackendErrorKind::Transport);
        assert!(backend.current_session().expect("session").is_some());
        assert!(events.lock().expect("events").is_empty());
    }

    #[test]
    fn query_pairs_use_postgrest_operators() {
        let query = TableQuery::new(Table::Contacts)
            .eq("user_id", "u-1")
            .eq("is_favorite", true)
            .is_null("email")
            .order("is_favorite", false)
            .order("created_at", false)
            .limit(3);
        let pairs = query_pairs(&query);
        assert_eq!(
            pairs,
            vec![
                ("user_id".to_string(), "eq.u-1".to_string()),
                ("is_favorite".to_string(), "eq.true".to_string()),
                ("email".to_string(), "is.null".to_string()),
                (
                    "order".to_string(),
                    "is_favorite.desc,created_at.desc".to_string()
                ),
                ("limit".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn error_message_prefers_service_wording() {
        let body = json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" });
        assert_eq!(
            error_message(&body, StatusCode::BAD_REQUEST),
            "Invalid login credentials"
        );
        let body = json!({ "code": "42501", "message": "new row violates row-level security policy" });
        assert_eq!(
            error_message(&body, StatusCode::FORBIDDEN),
            "new row violates row-level security policy"
        );
        assert!(error_message(&json!(null), StatusCode::BAD_GATEWAY).contains("502"));
    }

    #[test]
    fn sign_up_without_identities_means_already_registered() {
        let body = json!({
            "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
            "email": "rudo@example.com",
            "identities": []
        });
        match serde_json::from_value::<GoTrueSignUp>(body).expect("decode sign-up") {
            GoTrueSignUp::User(user) => assert!(super::is_already_registered(&user)),
            GoTrueSignUp::Session(_) => panic!("expected a bare user"),
        }
    }

    #[test]
    fn base_url_is_normalized() {
        let backend = RestBackend::new(" https://demo.supabase.co/ ", "anon").expect("client");
        assert_eq!(backend.base_url(), "https://demo.supabase.co");
        assert_eq!(
            backend.table_url(Table::SavedResources),
            "https://demo.supabase.co/rest/v1/saved_resources"
        );
    }
}
