use crate::app::{AppState, DataResponse};
use crate::error::PixelError;
use crate::roster::{Applicant, Profile, parse_applicants};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path as UrlPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use lazy_static::lazy_static;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use tempfile::NamedTempFile;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

/// User data structure representing a registered application user
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    /// Username (unique identifier for the user)
    pub username: String,

    /// Argon2 hash of the user's password
    pub password_hash: String,

    /// Contact details; empty for self-registered accounts
    #[serde(default)]
    pub profile: Profile,
}

/// Credential data for login and registration
#[derive(Debug, Serialize, Deserialize)]
pub struct UserCredentials {
    pub username: String,
    pub password: String,
}

/// Authenticated user session
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub expires_at: SystemTime,
}

/// Username of the caller, inserted into request extensions by [`require_auth`].
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, Session>> = RwLock::new(HashMap::new());
    /// Held across every read-modify-write of the users file
    static ref USERS_LOCK: Mutex<()> = Mutex::new(());
}

const USERS_FILE: &str = "users.json";
const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds
pub const SESSION_COOKIE: &str = "session";

fn users_path(database_dir: &Path) -> PathBuf {
    database_dir.join(USERS_FILE)
}

/// Creates the database directory and an empty users file if missing.
pub fn init_database(database_dir: &Path) -> std::io::Result<()> {
    create_dir_all(database_dir)?;
    let users = users_path(database_dir);
    if !users.exists() {
        fs::write(users, b"{}")?;
    }
    Ok(())
}

pub fn get_users(database_dir: &Path) -> Result<HashMap<String, User>, String> {
    let contents = fs::read_to_string(users_path(database_dir))
        .map_err(|_| "Failed to read users file".to_string())?;
    serde_json::from_str(&contents).map_err(|_| "Failed to parse users data".to_string())
}

/// Replaces the users file through a temporary file and a rename.
pub fn save_users(database_dir: &Path, users: &HashMap<String, User>) -> Result<(), String> {
    let json = serde_json::to_string_pretty(users)
        .map_err(|_| "Failed to serialize users data".to_string())?;
    let write = || -> std::io::Result<()> {
        let mut file = NamedTempFile::new_in(database_dir)?;
        file.write_all(json.as_bytes())?;
        file.persist(users_path(database_dir)).map_err(|e| e.error)?;
        Ok(())
    };
    write().map_err(|_| "Failed to write users data".to_string())
}

/// Looks up one account.
pub fn get_user(database_dir: &Path, username: &str) -> Result<Option<User>, String> {
    Ok(get_users(database_dir)?.remove(username))
}

/// Registers a new user with an argon2-hashed password.
///
/// # Errors
/// * Empty username or password
/// * Username already taken
pub fn register_user(database_dir: &Path, username: &str, password: &str) -> Result<(), String> {
    if username.trim().is_empty() || password.is_empty() {
        return Err("Username and password cannot be empty".to_string());
    }

    let password_hash = hash_password(password)?;

    let _guard = USERS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let mut users = get_users(database_dir)?;
    if users.contains_key(username) {
        return Err("Username already exists".to_string());
    }
    users.insert(
        username.to_string(),
        User {
            username: username.to_string(),
            password_hash,
            profile: Profile::default(),
        },
    );
    save_users(database_dir, &users)
}

/// Creates accounts for a bulk applicant list, skipping ids already taken.
///
/// Returns how many accounts were created.
pub fn import_applicants(database_dir: &Path, applicants: &[Applicant]) -> Result<usize, String> {
    let known = get_users(database_dir)?;
    let mut hashed = Vec::new();
    for applicant in applicants {
        if !known.contains_key(&applicant.user_id) {
            hashed.push((applicant, hash_password(&applicant.password)?));
        }
    }

    let _guard = USERS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let mut users = get_users(database_dir)?;
    let mut created = 0;
    for (applicant, password_hash) in hashed {
        if users.contains_key(&applicant.user_id) {
            continue;
        }
        users.insert(
            applicant.user_id.clone(),
            User {
                username: applicant.user_id.clone(),
                password_hash,
                profile: applicant.profile.clone(),
            },
        );
        created += 1;
    }
    save_users(database_dir, &users)?;
    Ok(created)
}

/// Checks a username/password pair; unknown users are simply `Ok(false)`.
pub fn verify_user(database_dir: &Path, username: &str, password: &str) -> Result<bool, String> {
    let users = get_users(database_dir)?;
    match users.get(username) {
        Some(user) => verify_password(password, &user.password_hash),
        None => Ok(false),
    }
}

fn hash_password(password: &str) -> Result<String, String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| "Password hashing failed".to_string())
}

fn verify_password(password: &str, hash: &str) -> Result<bool, String> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| "Invalid password hash format".to_string())?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_session(username: &str) -> String {
    let session_id = Uuid::new_v4().to_string();
    let session = Session {
        user_id: username.to_string(),
        expires_at: SystemTime::now() + Duration::from_secs(SESSION_DURATION),
    };

    let mut sessions = SESSIONS.write().unwrap_or_else(|e| e.into_inner());
    sessions.insert(session_id.clone(), session);
    session_id
}

/// Username for a live session, `None` if unknown or expired.
pub fn validate_session(session_id: &str) -> Option<String> {
    let sessions = SESSIONS.read().unwrap_or_else(|e| e.into_inner());
    sessions
        .get(session_id)
        .filter(|session| session.expires_at > SystemTime::now())
        .map(|session| session.user_id.clone())
}

pub fn invalidate_session(session_id: &str) {
    let mut sessions = SESSIONS.write().unwrap_or_else(|e| e.into_inner());
    sessions.remove(session_id);
}

#[derive(Serialize)]
struct AuthResponse {
    status: String,
    message: Option<String>,
    token: Option<String>,
}

impl AuthResponse {
    fn error(message: impl Into<String>) -> Json<Self> {
        Json(AuthResponse {
            status: "error".to_string(),
            message: Some(message.into()),
            token: None,
        })
    }
}

pub async fn handle_signup(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<UserCredentials>,
) -> Response {
    match register_user(
        &state.config.database_dir,
        &credentials.username,
        &credentials.password,
    ) {
        Ok(()) => {
            info!("registered user {}", credentials.username);
            (
                StatusCode::CREATED,
                Json(AuthResponse {
                    status: "ok".to_string(),
                    message: None,
                    token: None,
                }),
            )
                .into_response()
        }
        Err(e) if e == "Username already exists" => {
            (StatusCode::CONFLICT, AuthResponse::error(e)).into_response()
        }
        Err(e) => (StatusCode::BAD_REQUEST, AuthResponse::error(e)).into_response(),
    }
}

/// Verifies credentials and hands out a session cookie (also returned as `token`).
pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(credentials): Json<UserCredentials>,
) -> Response {
    match verify_user(
        &state.config.database_dir,
        &credentials.username,
        &credentials.password,
    ) {
        Ok(true) => {
            let session_id = create_session(&credentials.username);
            let cookie = Cookie::build((SESSION_COOKIE, session_id.clone()))
                .path("/")
                .http_only(true);
            (
                jar.add(cookie),
                Json(AuthResponse {
                    status: "ok".to_string(),
                    message: None,
                    token: Some(session_id),
                }),
            )
                .into_response()
        }
        Ok(false) => {
            warn!("failed login for {}", credentials.username);
            (
                StatusCode::UNAUTHORIZED,
                AuthResponse::error("Invalid username or password"),
            )
                .into_response()
        }
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, AuthResponse::error(e)).into_response(),
    }
}

pub async fn handle_logout(jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        invalidate_session(cookie.value());
    }
    (
        jar.remove(Cookie::from(SESSION_COOKIE)),
        StatusCode::NO_CONTENT,
    )
        .into_response()
}

/// Public part of an account: everything but the password hash.
#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub user_id: String,
    #[serde(flatten)]
    pub profile: Profile,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            user_id: user.username,
            profile: user.profile,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BulkUploadResponse {
    pub status: String,
    pub message: String,
    pub imported: usize,
}

/// Every account sorted by id.
pub async fn handle_list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<Vec<UserProfile>>>, PixelError> {
    let users = get_users(&state.config.database_dir).map_err(PixelError::store)?;
    let mut profiles: Vec<UserProfile> = users.into_values().map(UserProfile::from).collect();
    profiles.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    Ok(DataResponse::success(profiles))
}

pub async fn handle_get_user(
    State(state): State<Arc<AppState>>,
    UrlPath(user_id): UrlPath<String>,
) -> Result<Json<DataResponse<UserProfile>>, PixelError> {
    match get_user(&state.config.database_dir, &user_id).map_err(PixelError::store)? {
        Some(user) => Ok(DataResponse::success(UserProfile::from(user))),
        None => Err(PixelError::UserNotFound { id: user_id }),
    }
}

/// Imports a `<solicitantes>` document; invalid or already known entries are skipped.
pub async fn handle_bulk_upload(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<BulkUploadResponse>, PixelError> {
    let xml = std::str::from_utf8(&body)
        .map_err(|_| PixelError::roster("Document is not valid UTF-8"))?;
    if xml.trim().is_empty() {
        return Err(PixelError::roster("No file provided"));
    }

    let applicants = parse_applicants(xml)?;
    let imported =
        import_applicants(&state.config.database_dir, &applicants).map_err(PixelError::store)?;
    info!(
        "bulk upload: {} of {} valid applicants imported",
        imported,
        applicants.len()
    );

    Ok(Json(BulkUploadResponse {
        status: "success".to_string(),
        message: "Users uploaded successfully".to_string(),
        imported,
    }))
}

/// Rejects requests without a live session; otherwise stores the caller as
/// [`CurrentUser`] in the request extensions.
pub async fn require_auth(jar: CookieJar, mut request: Request, next: Next) -> Response {
    let session = jar
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            request
                .headers()
                .get("x-session")
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        });

    match session.as_deref().and_then(validate_session) {
        Some(username) => {
            request.extensions_mut().insert(CurrentUser(username));
            next.run(request).await
        }
        None => (
            StatusCode::UNAUTHORIZED,
            AuthResponse::error("Login required"),
        )
            .into_response(),
    }
}
