//! SQLite stand-in for the managed auth + relational backend.
//!
//! # Responsibility
//! - Implement `AuthBackend` and `DataBackend` over one SQLite connection.
//! - Emulate the hosted service's row-level policies so client-side checks
//!   can be exercised against a backend that also rejects.
//!
//! # Invariants
//! - Only columns declared in the table schema are accepted.
//! - Inserted/upserted rows must be owned by the signed-in user.
//! - Shared rows (`user_id IS NULL`) are visible to reads but never matched
//!   by updates or deletes.
//! - Listeners are notified after the connection lock is released.

use crate::backend::{
    now_epoch_secs, AuthBackend, AuthEventBus, AuthListener, BackendError, BackendErrorKind,
    BackendResult, Credentials, DataBackend, Filter, Row, SignUpRequest, SignUpResult,
    SubscriptionId, Table, TableQuery,
};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::identity::{AuthEvent, AuthSession, UserIdentity};
use crate::model::profile::split_full_name;
use crate::model::validation::MIN_PASSWORD_CHARS;
use argon2::{Algorithm, Argon2, Params, PasswordHasher, PasswordVerifier, Version};
use log::{info, warn};
use password_hash::{PasswordHash, SaltString};
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const SESSION_TTL_SECS: i64 = 3600;
const HASH_MEMORY_KIB: u32 = 1024;
const INVALID_CREDENTIALS: &str = "Invalid login credentials";
const SESSION_MISSING: &str = "Auth session missing!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Text,
    Bool,
}

type ColumnSpec = (&'static str, ColumnKind);

const PROFILE_COLUMNS: &[ColumnSpec] = &[
    ("id", ColumnKind::Text),
    ("first_name", ColumnKind::Text),
    ("last_name", ColumnKind::Text),
    ("avatar_url", ColumnKind::Text),
    ("phone", ColumnKind::Text),
    ("city", ColumnKind::Text),
    ("state", ColumnKind::Text),
    ("address", ColumnKind::Text),
    ("allergies", ColumnKind::Text),
    ("blood_type", ColumnKind::Text),
    ("medications", ColumnKind::Text),
    ("medical_conditions", ColumnKind::Text),
    ("emergency_contact_name", ColumnKind::Text),
    ("emergency_contact_phone", ColumnKind::Text),
    ("emergency_contact_email", ColumnKind::Text),
    ("date_of_birth", ColumnKind::Text),
    ("onboarding_completed", ColumnKind::Bool),
    ("updated_at", ColumnKind::Text),
];

const CONTACT_COLUMNS: &[ColumnSpec] = &[
    ("id", ColumnKind::Text),
    ("name", ColumnKind::Text),
    ("phone", ColumnKind::Text),
    ("email", ColumnKind::Text),
    ("relationship", ColumnKind::Text),
    ("type", ColumnKind::Text),
    ("is_favorite", ColumnKind::Bool),
    ("is_emergency_contact", ColumnKind::Bool),
    ("user_id", ColumnKind::Text),
    ("created_at", ColumnKind::Text),
];

const RESOURCE_COLUMNS: &[ColumnSpec] = &[
    ("id", ColumnKind::Text),
    ("name", ColumnKind::Text),
    ("description", ColumnKind::Text),
    ("category", ColumnKind::Text),
    ("location", ColumnKind::Text),
    ("contact_info", ColumnKind::Text),
    ("website", ColumnKind::Text),
    ("image_url", ColumnKind::Text),
    ("created_at", ColumnKind::Text),
];

const SAVED_RESOURCE_COLUMNS: &[ColumnSpec] = &[
    ("id", ColumnKind::Text),
    ("user_id", ColumnKind::Text),
    ("resource_id", ColumnKind::Text),
    ("created_at", ColumnKind::Text),
];

fn table_columns(table: Table) -> &'static [ColumnSpec] {
    match table {
        Table::Profiles => PROFILE_COLUMNS,
        Table::Contacts => CONTACT_COLUMNS,
        Table::Resources => RESOURCE_COLUMNS,
        Table::SavedResources => SAVED_RESOURCE_COLUMNS,
    }
}

/// Column holding the owning user id; `None` for read-only tables.
fn owner_column(table: Table) -> Option<&'static str> {
    match table {
        Table::Profiles => Some("id"),
        Table::Contacts | Table::SavedResources => Some("user_id"),
        Table::Resources => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// Local backend over a migrated SQLite database.
pub struct LocalBackend {
    conn: Mutex<Connection>,
    session: Mutex<Option<AuthSession>>,
    events: AuthEventBus,
}

impl LocalBackend {
    /// Wraps an already-migrated connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            session: Mutex::new(None),
            events: AuthEventBus::new(),
        }
    }

    /// Opens (and migrates) a database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        Ok(Self::new(open_db(path)?))
    }

    /// Opens an isolated in-memory database seeded with default records.
    pub fn open_in_memory() -> Result<Self, DbError> {
        Ok(Self::new(open_db_in_memory()?))
    }

    /// Issues a fresh token for the current session.
    ///
    /// Emits `TokenRefreshed`; fails when nobody is signed in.
    pub fn refresh_session(&self) -> BackendResult<AuthSession> {
        let refreshed = {
            let mut current = self.lock_session();
            let identity = match current.as_ref() {
                Some(session) => session.identity.clone(),
                None => return Err(BackendError::new(BackendErrorKind::Auth, SESSION_MISSING)),
            };
            let session = new_session(identity);
            *current = Some(session.clone());
            session
        };
        self.events.emit(&AuthEvent::TokenRefreshed(refreshed.clone()));
        Ok(refreshed)
    }

    /// Returns recorded password-reset requests for `email`.
    pub fn password_reset_requests(&self, email: &str) -> BackendResult<usize> {
        let conn = self.lock_conn();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM password_reset_requests WHERE email = ?1 COLLATE NOCASE;",
                [email.trim()],
                |row| row.get(0),
            )
            .map_err(map_sqlite_error)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn current_user_id(&self) -> Option<String> {
        self.lock_session()
            .as_ref()
            .map(|session| session.identity.id.to_string())
    }

    fn start_session(&self, session: AuthSession) {
        *self.lock_session() = Some(session.clone());
        self.events.emit(&AuthEvent::SignedIn(session));
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<AuthSession>> {
        self.session
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AuthBackend for LocalBackend {
    fn sign_in(&self, credentials: &Credentials) -> BackendResult<AuthSession> {
        let email = credentials.email.trim();
        let found = {
            let conn = self.lock_conn();
            conn.query_row(
                "SELECT id, email, password_hash, full_name
                 FROM auth_users
                 WHERE email = ?1 COLLATE NOCASE;",
                [email],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()
            .map_err(map_sqlite_error)?
        };

        let Some((id, stored_email, password_hash, full_name)) = found else {
            info!("event=auth_sign_in module=backend status=rejected reason=unknown_user");
            return Err(BackendError::new(
                BackendErrorKind::Auth,
                INVALID_CREDENTIALS,
            ));
        };
        if !verify_password(&password_hash, &credentials.password) {
            info!("event=auth_sign_in module=backend status=rejected reason=bad_password");
            return Err(BackendError::new(
                BackendErrorKind::Auth,
                INVALID_CREDENTIALS,
            ));
        }

        let mut identity = UserIdentity::new(parse_uuid("auth_users.id", &id)?, stored_email);
        identity.full_name = full_name;
        let session = new_session(identity);
        self.start_session(session.clone());
        info!("event=auth_sign_in module=backend status=ok");
        Ok(session)
    }

    fn sign_up(&self, request: &SignUpRequest) -> BackendResult<SignUpResult> {
        let email = request.credentials.email.trim();
        if email.is_empty() {
            return Err(BackendError::new(
                BackendErrorKind::Rejected,
                "Signup requires a valid email",
            ));
        }
        if request.credentials.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(BackendError::new(
                BackendErrorKind::Rejected,
                format!("Password should be at least {MIN_PASSWORD_CHARS} characters."),
            ));
        }
        let full_name = request
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let identity = {
            let mut conn = self.lock_conn();
            let existing = conn
                .query_row(
                    "SELECT id, email, full_name FROM auth_users WHERE email = ?1 COLLATE NOCASE;",
                    [email],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                        ))
                    },
                )
                .optional()
                .map_err(map_sqlite_error)?;
            if let Some((id, stored_email, stored_name)) = existing {
                let mut identity =
                    UserIdentity::new(parse_uuid("auth_users.id", &id)?, stored_email);
                identity.full_name = stored_name;
                info!("event=auth_sign_up module=backend status=ok already_registered=true");
                return Ok(SignUpResult {
                    identity,
                    session: None,
                    already_registered: true,
                });
            }

            let password_hash = hash_password(&request.credentials.password)?;
            let id = Uuid::new_v4();
            let (first_name, last_name) = full_name
                .as_deref()
                .map(split_full_name)
                .unwrap_or((None, None));

            let tx = conn.transaction().map_err(map_sqlite_error)?;
            tx.execute(
                "INSERT INTO auth_users (id, email, password_hash, full_name)
                 VALUES (?1, ?2, ?3, ?4);",
                params![id.to_string(), email, password_hash, full_name.as_deref()],
            )
            .map_err(map_sqlite_error)?;
            tx.execute(
                "INSERT INTO profiles (id, first_name, last_name) VALUES (?1, ?2, ?3);",
                params![id.to_string(), first_name, last_name],
            )
            .map_err(map_sqlite_error)?;
            tx.commit().map_err(map_sqlite_error)?;

            let mut identity = UserIdentity::new(id, email);
            identity.full_name = full_name;
            identity
        };

        let session = new_session(identity.clone());
        self.start_session(session.clone());
        info!("event=auth_sign_up module=backend status=ok already_registered=false");
        Ok(SignUpResult {
            identity,
            session: Some(session),
            already_registered: false,
        })
    }

    fn sign_out(&self) -> BackendResult<()> {
        self.lock_session().take();
        self.events.emit(&AuthEvent::SignedOut);
        info!("event=auth_sign_out module=backend status=ok");
        Ok(())
    }

    fn request_password_reset(&self, email: &str) -> BackendResult<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(BackendError::new(
                BackendErrorKind::Rejected,
                "Password recovery requires an email",
            ));
        }
        // Recorded regardless of whether an account exists.
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO password_reset_requests (id, email) VALUES (?1, ?2);",
            params![Uuid::new_v4().to_string(), email],
        )
        .map_err(map_sqlite_error)?;
        info!("event=auth_password_reset module=backend status=ok");
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

impl DataBackend for LocalBackend {
    fn select(&self, query: &TableQuery) -> BackendResult<Vec<Row>> {
        let uid = self.current_user_id();
        let (clause, binds) = build_where(query.table, &query.filters, Access::Read, uid.as_deref())?;

        let mut order_sql = Vec::new();
        for order in &query.order {
            column_kind(query.table, order.column)?;
            order_sql.push(format!(
                "{} {}",
                order.column,
                if order.ascending { "ASC" } else { "DESC" }
            ));
        }
        let tie_break = match query.order.last() {
            Some(order) if !order.ascending => "rowid DESC",
            _ => "rowid ASC",
        };
        order_sql.push(tie_break.to_string());

        let mut sql = format!(
            "SELECT {} FROM {} WHERE {clause} ORDER BY {}",
            column_list(query.table),
            query.table,
            order_sql.join(", ")
        );
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let conn = self.lock_conn();
        query_rows(&conn, query.table, &sql, binds)
    }

    fn insert(&self, table: Table, mut row: Row) -> BackendResult<Row> {
        let uid = self.current_user_id();
        check_insert_policy(table, &row, uid.as_deref())?;
        if !row.contains_key("id") {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        let id = row_id(table, &row)?;

        let conn = self.lock_conn();
        insert_row(&conn, table, &row)?;
        fetch_by_ids(&conn, table, &[id])?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::new(BackendErrorKind::NotFound, "inserted row not found"))
    }

    fn update(&self, query: &TableQuery, patch: Row) -> BackendResult<Vec<Row>> {
        let uid = self.current_user_id();
        check_patch_policy(query.table, &patch, uid.as_deref())?;
        let (clause, binds) =
            build_where(query.table, &query.filters, Access::Write, uid.as_deref())?;

        let mut conn = self.lock_conn();
        let tx = conn.transaction().map_err(map_sqlite_error)?;
        let ids = matching_ids(&tx, query.table, &clause, binds)?;
        for id in &ids {
            update_row_by_id(&tx, query.table, id, &patch)?;
        }
        let rows = fetch_by_ids(&tx, query.table, &ids)?;
        tx.commit().map_err(map_sqlite_error)?;
        Ok(rows)
    }

    fn upsert(&self, table: Table, mut row: Row) -> BackendResult<Row> {
        let uid = self.current_user_id();
        check_insert_policy(table, &row, uid.as_deref())?;
        if !row.contains_key("id") {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        let id = row_id(table, &row)?;

        let conn = self.lock_conn();
        let exists = !fetch_by_ids(&conn, table, &[id.clone()])?.is_empty();
        if exists {
            let mut patch = row;
            patch.remove("id");
            update_row_by_id(&conn, table, &id, &patch)?;
        } else {
            insert_row(&conn, table, &row)?;
        }
        fetch_by_ids(&conn, table, &[id])?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::new(BackendErrorKind::NotFound, "upserted row not found"))
    }

    fn delete(&self, query: &TableQuery) -> BackendResult<usize> {
        let uid = self.current_user_id();
        let (clause, binds) =
            build_where(query.table, &query.filters, Access::Write, uid.as_deref())?;
        let conn = self.lock_conn();
        conn.execute(
            &format!("DELETE FROM {} WHERE {clause};", query.table),
            params_from_iter(binds),
        )
        .map_err(map_sqlite_error)
    }
}

fn column_kind(table: Table, column: &str) -> BackendResult<ColumnKind> {
    table_columns(table)
        .iter()
        .find(|(name, _)| *name == column)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| {
            BackendError::new(
                BackendErrorKind::Rejected,
                format!("column {table}.{column} does not exist"),
            )
        })
}

fn column_list(table: Table) -> String {
    table_columns(table)
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

fn build_where(
    table: Table,
    filters: &[Filter],
    access: Access,
    uid: Option<&str>,
) -> BackendResult<(String, Vec<SqlValue>)> {
    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    match (owner_column(table), access) {
        (None, Access::Read) => {}
        (None, Access::Write) => return Err(permission_denied(table)),
        (Some(owner), _) => match uid {
            Some(uid) if table == Table::Contacts && access == Access::Read => {
                clauses.push(format!("({owner} = ? OR {owner} IS NULL)"));
                binds.push(SqlValue::Text(uid.to_string()));
            }
            Some(uid) => {
                clauses.push(format!("{owner} = ?"));
                binds.push(SqlValue::Text(uid.to_string()));
            }
            None if table == Table::Contacts && access == Access::Read => {
                clauses.push(format!("{owner} IS NULL"));
            }
            None => clauses.push("0".to_string()),
        },
    }

    for filter in filters {
        let kind = column_kind(table, filter.column())?;
        match filter {
            Filter::Eq(column, value) => {
                clauses.push(format!("{column} = ?"));
                binds.push(to_sql_value(table, column, kind, value)?);
            }
            Filter::IsNull(column) => clauses.push(format!("{column} IS NULL")),
        }
    }

    if clauses.is_empty() {
        clauses.push("1".to_string());
    }
    Ok((clauses.join(" AND "), binds))
}

fn check_insert_policy(table: Table, row: &Row, uid: Option<&str>) -> BackendResult<()> {
    let Some(owner) = owner_column(table) else {
        return Err(permission_denied(table));
    };
    let owned = match (row.get(owner), uid) {
        (Some(Value::String(value)), Some(uid)) => value == uid,
        _ => false,
    };
    if !owned {
        warn!(
            "event=backend_policy_reject module=backend table={table} op=insert reason=owner_mismatch"
        );
        return Err(rls_violation(table));
    }
    Ok(())
}

fn check_patch_policy(table: Table, patch: &Row, uid: Option<&str>) -> BackendResult<()> {
    let Some(owner) = owner_column(table) else {
        return Err(permission_denied(table));
    };
    match (patch.get(owner), uid) {
        (None, _) => Ok(()),
        (Some(Value::String(value)), Some(uid)) if value == uid => Ok(()),
        _ => Err(rls_violation(table)),
    }
}

fn rls_violation(table: Table) -> BackendError {
    BackendError::new(
        BackendErrorKind::Forbidden,
        format!("new row violates row-level security policy for table \"{table}\""),
    )
}

fn permission_denied(table: Table) -> BackendError {
    BackendError::new(
        BackendErrorKind::Forbidden,
        format!("permission denied for table {table}"),
    )
}

fn row_id(table: Table, row: &Row) -> BackendResult<String> {
    match row.get("id") {
        Some(Value::String(id)) => Ok(id.clone()),
        _ => Err(BackendError::new(
            BackendErrorKind::Rejected,
            format!("invalid input for column \"id\" of table \"{table}\""),
        )),
    }
}

fn insert_row(conn: &Connection, table: Table, row: &Row) -> BackendResult<()> {
    let mut columns = Vec::with_capacity(row.len());
    let mut binds = Vec::with_capacity(row.len());
    for (column, value) in row {
        let kind = column_kind(table, column)?;
        columns.push(column.as_str());
        binds.push(to_sql_value(table, column, kind, value)?);
    }
    let placeholders = vec!["?"; columns.len()].join(", ");
    conn.execute(
        &format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders});",
            columns.join(", ")
        ),
        params_from_iter(binds),
    )
    .map_err(map_sqlite_error)?;
    Ok(())
}

fn update_row_by_id(conn: &Connection, table: Table, id: &str, patch: &Row) -> BackendResult<()> {
    let mut assignments = Vec::with_capacity(patch.len() + 1);
    let mut binds = Vec::with_capacity(patch.len() + 1);
    for (column, value) in patch {
        let kind = column_kind(table, column)?;
        assignments.push(format!("{column} = ?"));
        binds.push(to_sql_value(table, column, kind, value)?);
    }
    if table == Table::Profiles && !patch.contains_key("updated_at") {
        assignments.push("updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')".to_string());
    }
    if assignments.is_empty() {
        return Ok(());
    }
    binds.push(SqlValue::Text(id.to_string()));
    conn.execute(
        &format!("UPDATE {table} SET {} WHERE id = ?;", assignments.join(", ")),
        params_from_iter(binds),
    )
    .map_err(map_sqlite_error)?;
    Ok(())
}

fn matching_ids(
    conn: &Connection,
    table: Table,
    clause: &str,
    binds: Vec<SqlValue>,
) -> BackendResult<Vec<String>> {
    let mut stmt = conn
        .prepare(&format!("SELECT id FROM {table} WHERE {clause} ORDER BY rowid;"))
        .map_err(map_sqlite_error)?;
    let ids = stmt
        .query_map(params_from_iter(binds), |row| row.get::<_, String>(0))
        .map_err(map_sqlite_error)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_sqlite_error)?;
    Ok(ids)
}

fn fetch_by_ids(conn: &Connection, table: Table, ids: &[String]) -> BackendResult<Vec<Row>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM {table} WHERE id IN ({placeholders}) ORDER BY rowid;",
        column_list(table)
    );
    let binds = ids.iter().cloned().map(SqlValue::Text).collect();
    query_rows(conn, table, &sql, binds)
}

fn query_rows(
    conn: &Connection,
    table: Table,
    sql: &str,
    binds: Vec<SqlValue>,
) -> BackendResult<Vec<Row>> {
    let columns = table_columns(table);
    let mut stmt = conn.prepare(sql).map_err(map_sqlite_error)?;
    let mut rows = stmt
        .query(params_from_iter(binds))
        .map_err(map_sqlite_error)?;

    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(map_sqlite_error)? {
        let mut record = Row::new();
        for (index, (name, kind)) in columns.iter().enumerate() {
            let value: SqlValue = row.get(index).map_err(map_sqlite_error)?;
            record.insert((*name).to_string(), to_json_value(*kind, value));
        }
        out.push(record);
    }
    Ok(out)
}

fn to_sql_value(
    table: Table,
    column: &str,
    kind: ColumnKind,
    value: &Value,
) -> BackendResult<SqlValue> {
    match (kind, value) {
        (_, Value::Null) => Ok(SqlValue::Null),
        (ColumnKind::Text, Value::String(text)) => Ok(SqlValue::Text(text.clone())),
        (ColumnKind::Bool, Value::Bool(flag)) => Ok(SqlValue::Integer(i64::from(*flag))),
        _ => Err(BackendError::new(
            BackendErrorKind::Rejected,
            format!("invalid input for column \"{column}\" of table \"{table}\": {value}"),
        )),
    }
}

fn to_json_value(kind: ColumnKind, value: SqlValue) -> Value {
    match (kind, value) {
        (_, SqlValue::Null) => Value::Null,
        (ColumnKind::Bool, SqlValue::Integer(flag)) => Value::Bool(flag != 0),
        (_, SqlValue::Integer(number)) => Value::from(number),
        (_, SqlValue::Real(number)) => Value::from(number),
        (_, SqlValue::Text(text)) => Value::String(text),
        (_, SqlValue::Blob(_)) => Value::Null,
    }
}

fn map_sqlite_error(err: rusqlite::Error) -> BackendError {
    let kind = match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => BackendErrorKind::Conflict,
        _ => BackendErrorKind::Transport,
    };
    BackendError::new(kind, err.to_string())
}

fn parse_uuid(column: &str, value: &str) -> BackendResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        BackendError::new(
            BackendErrorKind::InvalidData,
            format!("invalid uuid value `{value}` in {column}"),
        )
    })
}

fn new_session(identity: UserIdentity) -> AuthSession {
    AuthSession {
        identity,
        access_token: Uuid::new_v4().simple().to_string(),
        refresh_token: Some(Uuid::new_v4().simple().to_string()),
        expires_at: Some(now_epoch_secs() + SESSION_TTL_SECS),
    }
}

fn password_hasher() -> BackendResult<Argon2<'static>> {
    let params = Params::new(HASH_MEMORY_KIB, 1, 1, None)
        .map_err(|err| BackendError::new(BackendErrorKind::Transport, err.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn hash_password(password: &str) -> BackendResult<String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes)
        .map_err(|err| BackendError::new(BackendErrorKind::Transport, err.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|err| BackendError::new(BackendErrorKind::Transport, err.to_string()))?;
    let phc = password_hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| BackendError::new(BackendErrorKind::Transport, err.to_string()))?
        .to_string();
    Ok(phc)
}

fn verify_password(hash: &str, password: &str) -> bool {
    match (PasswordHash::new(hash), password_hasher()) {
        (Ok(parsed), Ok(hasher)) => hasher.verify_password(password.as_bytes(), &parsed).is_ok(),
        _ => false,
    }
}
