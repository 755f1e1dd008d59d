#![cfg(not(tarpaulin_include))]

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// A registered account
///
/// Only the Argon2 hash of the password is kept; the plaintext exists in
/// transit only.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Account {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Credential form data for the signup and login endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,

    /// Required for signup, ignored on login
    #[serde(default)]
    pub email: String,

    pub password: String,
}

/// One live session, keyed by the cookie value.
#[derive(Debug, Clone)]
pub struct Session {
    /// Owner identifier: a username, or `guest-<uuid>` for guests
    pub owner_id: String,

    pub expires_at: SystemTime,
}

lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, Session>> = RwLock::new(HashMap::new());
}

const DATA_DIR: &str = "database";
const ACCOUNTS_FILE: &str = "database/accounts.json";
const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const SESSION_COOKIE: &str = "session";

/// Owner id used when a request carries no session at all.
pub const ANONYMOUS_OWNER: &str = "guest";

/// Prepare the on-disk layout the account storage expects
///
/// Creates the data directory and an empty accounts file when they are
/// missing. Call once before serving requests.
pub fn init_storage() -> std::io::Result<()> {
    fs::create_dir_all(DATA_DIR)?;
    if !Path::new(ACCOUNTS_FILE).exists() {
        fs::write(ACCOUNTS_FILE, "{}")?;
    }
    Ok(())
}

fn read_accounts() -> Result<HashMap<String, Account>, String> {
    let contents =
        fs::read_to_string(ACCOUNTS_FILE).map_err(|_| "Account storage is unreadable".to_string())?;
    serde_json::from_str(&contents).map_err(|_| "Account storage is corrupted".to_string())
}

fn write_accounts(accounts: &HashMap<String, Account>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(accounts)
        .map_err(|_| "Account data could not be serialized".to_string())?;
    fs::write(ACCOUNTS_FILE, json).map_err(|_| "Account storage is unwritable".to_string())
}

/// Create a new account
///
/// Usernames and email addresses must be unique across the storage. The
/// password is hashed before it is written and a snapshot directory is
/// prepared for the account.
///
/// # Returns
/// * `Result<(), String>` - Ok, or a message naming the first problem
pub fn create_account(username: &str, email: &str, password: &str) -> Result<(), String> {
    if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err("Username, email and password are all required".to_string());
    }

    let mut accounts = read_accounts()?;
    if accounts.contains_key(username) {
        return Err("That username is taken".to_string());
    }
    if accounts.values().any(|a| a.email == email) {
        return Err("That email address is already registered".to_string());
    }

    let password_hash = hash_password(password)?;

    fs::create_dir_all(Path::new(DATA_DIR).join(username))
        .map_err(|_| "Snapshot directory could not be created".to_string())?;

    accounts.insert(
        username.to_string(),
        Account {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        },
    );
    write_accounts(&accounts)
}

/// Check a username/password pair against the stored hash
///
/// # Returns
/// * `Result<bool, String>` - Whether the credentials match; Err only on
///   storage problems
pub fn check_credentials(username: &str, password: &str) -> Result<bool, String> {
    let accounts = read_accounts()?;
    match accounts.get(username) {
        Some(account) => verify_password(password, &account.password_hash),
        None => Ok(false),
    }
}

fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| "Password could not be hashed".to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed =
        PasswordHash::new(hash).map_err(|_| "Stored password hash is malformed".to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Open a session for an owner and return its id.
pub fn create_session(owner_id: &str) -> String {
    let session_id = Uuid::new_v4().to_string();
    let session = Session {
        owner_id: owner_id.to_string(),
        expires_at: SystemTime::now() + SESSION_TTL,
    };

    SESSIONS.write().unwrap().insert(session_id.clone(), session);
    session_id
}

/// Open an anonymous guest session
///
/// Issues a fresh `guest-<uuid>` owner id so the tracker is usable
/// without an account.
///
/// # Returns
/// * `(String, String)` - Session id and the generated owner id
pub fn create_guest_session() -> (String, String) {
    let owner_id = format!("guest-{}", Uuid::new_v4());
    let session_id = create_session(&owner_id);
    (session_id, owner_id)
}

/// Resolve a session id to its owner, if the session is still live.
pub fn session_owner(session_id: &str) -> Option<String> {
    let sessions = SESSIONS.read().unwrap();
    sessions
        .get(session_id)
        .filter(|s| s.expires_at > SystemTime::now())
        .map(|s| s.owner_id.clone())
}

fn drop_session(session_id: &str) {
    SESSIONS.write().unwrap().remove(session_id);
}

/// Resolve the effective owner id for a request
///
/// A live session cookie yields its owner; everything else falls back to
/// the shared anonymous owner.
pub fn resolve_owner(jar: &CookieJar) -> String {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| session_owner(cookie.value()))
        .unwrap_or_else(|| ANONYMOUS_OWNER.to_string())
}

/// Snapshot file path for an owner's collection.
pub fn snapshot_path(owner_id: &str) -> PathBuf {
    Path::new(DATA_DIR).join(owner_id).join("airdrops.bin.gz")
}

// Web handler functions below

/// Handle a signup form submission.
pub async fn handle_signup(Form(credentials): Form<Credentials>) -> Response {
    match create_account(&credentials.username, &credentials.email, &credentials.password) {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "status": "ok" })),
        )
            .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e).into_response(),
    }
}

/// Handle a login form submission
///
/// Valid credentials open a session and set the session cookie; anything
/// else is rejected without detail about which part was wrong.
#[axum::debug_handler]
pub async fn handle_login(jar: CookieJar, Form(credentials): Form<Credentials>) -> Response {
    match check_credentials(&credentials.username, &credentials.password) {
        Ok(true) => {
            let session_id = create_session(&credentials.username);
            let jar = jar.add(Cookie::new(SESSION_COOKIE, session_id));
            (
                jar,
                Json(serde_json::json!({
                    "status": "ok",
                    "owner": credentials.username,
                })),
            )
                .into_response()
        }
        Ok(false) => (StatusCode::UNAUTHORIZED, "Invalid username or password").into_response(),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error").into_response(),
    }
}

/// Close the session named by the cookie and clear it.
pub async fn handle_logout(jar: CookieJar) -> impl IntoResponse {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        drop_session(cookie.value());
    }

    let jar = jar.add(Cookie::new(SESSION_COOKIE, ""));
    (jar, Json(serde_json::json!({ "status": "ok" })))
}

/// Open an anonymous guest session and set its cookie.
pub async fn handle_guest_session(jar: CookieJar) -> impl IntoResponse {
    let (session_id, owner_id) = create_guest_session();
    let jar = jar.add(Cookie::new(SESSION_COOKIE, session_id));
    (
        jar,
        Json(serde_json::json!({
            "status": "ok",
            "owner": owner_id,
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_resolve_until_dropped() {
        let (session_id, owner_id) = create_guest_session();
        assert!(owner_id.starts_with("guest-"));
        assert_eq!(session_owner(&session_id), Some(owner_id));

        drop_session(&session_id);
        assert_eq!(session_owner(&session_id), None);
    }

    #[test]
    fn unknown_session_ids_resolve_to_nothing() {
        assert_eq!(session_owner("not-a-session"), None);
    }

    #[test]
    fn password_hashes_verify_and_reject() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash).unwrap());
        assert!(!verify_password("hunter3", &hash).unwrap());
        assert!(verify_password("hunter2", "not a hash").is_err());
    }

    #[test]
    fn snapshot_paths_are_scoped_per_owner() {
        let path = snapshot_path("alice");
        assert!(path.ends_with("alice/airdrops.bin.gz"));
    }
}
