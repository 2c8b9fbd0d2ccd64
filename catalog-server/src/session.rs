//! Cookie-backed server-side sessions
//!
//! `session_middleware` loads the session named by the `sessionid` cookie
//! (or starts an empty one), exposes it as a request extension, and after
//! the handler persists it if anything changed. A new session key is only
//! issued once there is something to store.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;
use uuid::Uuid;

use crate::db::sessions;
use crate::db::visits::SessionMarks;
use crate::error::ApiError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "sessionid";

/// Session key holding the logged-in user's id
pub const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Default)]
struct SessionState {
    /// Key the session was loaded under, if it was found in storage
    loaded_key: Option<String>,
    /// Key to persist under; `None` until one is needed
    key: Option<String>,
    data: Map<String, Value>,
    modified: bool,
}

/// Handle to the current request's session
///
/// Cheap to clone; all clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

/// What the middleware must do once the handler has run
#[derive(Debug, PartialEq)]
pub(crate) enum Persist {
    Nothing,
    Save {
        stale_key: Option<String>,
        key: String,
        data: Map<String, Value>,
        new_key: bool,
    },
    Discard {
        stale_key: String,
    },
}

impl Session {
    /// Fresh, empty session
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn loaded(key: String, data: Map<String, Value>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                loaded_key: Some(key.clone()),
                key: Some(key),
                data,
                modified: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // No code panics while holding the lock; recover the data if it ever does
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let state = self.lock();
        state
            .data
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }

    pub fn insert<T: Serialize>(&self, key: &str, value: T) {
        match serde_json::to_value(value) {
            Ok(value) => {
                let mut state = self.lock();
                state.data.insert(key.to_string(), value);
                state.modified = true;
            }
            Err(e) => warn!("Unserializable session value for '{}': {}", key, e),
        }
    }

    pub fn remove(&self, key: &str) {
        let mut state = self.lock();
        if state.data.remove(key).is_some() {
            state.modified = true;
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.get(USER_ID_KEY)
    }

    /// Log in: store the user and move the data to a new key
    pub fn set_user_id(&self, user_id: i64) {
        self.cycle_key();
        self.insert(USER_ID_KEY, user_id);
    }

    /// Log out: drop all data and the key
    pub fn flush(&self) {
        let mut state = self.lock();
        state.data.clear();
        state.key = None;
        state.modified = true;
    }

    /// Keep the data under a new key
    pub fn cycle_key(&self) {
        let mut state = self.lock();
        state.key = None;
        state.modified = true;
    }

    pub(crate) fn persist_plan(&self) -> Persist {
        let state = self.lock();
        if !state.modified {
            return Persist::Nothing;
        }

        let stale_key = match (&state.loaded_key, &state.key) {
            (Some(loaded), Some(current)) if loaded == current => None,
            (loaded, _) => loaded.clone(),
        };

        if state.data.is_empty() && state.key.is_none() {
            return match stale_key {
                Some(stale_key) => Persist::Discard { stale_key },
                None => Persist::Nothing,
            };
        }

        let (key, new_key) = match &state.key {
            Some(key) => (key.clone(), false),
            None => (new_session_key(), true),
        };

        Persist::Save {
            stale_key,
            key,
            data: state.data.clone(),
            new_key,
        }
    }
}

impl SessionMarks for Session {
    fn has_mark(&self, key: &str) -> bool {
        self.get::<bool>(key).unwrap_or(false)
    }

    fn set_mark(&mut self, key: &str) {
        self.insert(key, true);
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("Session layer is not installed".to_string()))
    }
}

fn new_session_key() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Value of the `sessionid` cookie, if present
pub fn session_key(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

fn session_cookie(key: String, max_age: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, key))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::seconds(max_age.max(0)))
        .build()
}

fn expired_cookie() -> Cookie<'static> {
    let mut cookie = session_cookie(String::new(), 0);
    cookie.make_removal();
    cookie
}

/// Load the session before the handler and store it afterwards
///
/// A storage failure while persisting replaces the handler's response with
/// the error.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = match session_key(&jar) {
        Some(key) => match sessions::load_session(&state.db, &key).await? {
            Some(data) => Session::loaded(key, data),
            None => Session::new(),
        },
        None => Session::new(),
    };

    request.extensions_mut().insert(session.clone());
    let response = next.run(request).await;

    let timeout = state.settings.session_timeout_seconds;
    let jar = match session.persist_plan() {
        Persist::Nothing => jar,
        Persist::Save {
            stale_key,
            key,
            data,
            new_key,
        } => {
            if let Some(stale_key) = stale_key {
                sessions::delete_session(&state.db, &stale_key).await?;
            }
            sessions::save_session(&state.db, &key, &data, timeout).await?;
            if new_key {
                jar.add(session_cookie(key, timeout))
            } else {
                jar
            }
        }
        Persist::Discard { stale_key } => {
            sessions::delete_session(&state.db, &stale_key).await?;
            jar.add(expired_cookie())
        }
    };

    Ok((jar, response).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    fn jar_with_cookie(cookie: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn test_cookie_parsing() {
        let jar = jar_with_cookie("theme=dark; sessionid=abc123; other=1");
        assert_eq!(session_key(&jar), Some("abc123".to_string()));

        assert_eq!(session_key(&jar_with_cookie("sessionid=")), None);
        assert_eq!(session_key(&jar_with_cookie("mysessionid=zzz")), None);
        assert_eq!(session_key(&CookieJar::new()), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("abc".to_string(), 3600);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));

        let expired = expired_cookie();
        assert_eq!(expired.name(), SESSION_COOKIE);
        assert_eq!(expired.value(), "");
        assert_eq!(expired.max_age(), Some(time::Duration::ZERO));
        assert_eq!(expired.path(), Some("/"));
    }

    #[test]
    fn test_untouched_session_not_saved() {
        let session = Session::new();
        assert_eq!(session.persist_plan(), Persist::Nothing);

        let loaded = Session::loaded("k".to_string(), Map::new());
        let _ = loaded.get::<i64>("anything");
        assert_eq!(loaded.persist_plan(), Persist::Nothing);
    }

    #[test]
    fn test_new_session_gets_key_when_written() {
        let session = Session::new();
        session.insert("visited_day_2024-05-01", true);

        match session.persist_plan() {
            Persist::Save { stale_key, key, data, new_key } => {
                assert!(stale_key.is_none());
                assert!(new_key);
                assert_eq!(key.len(), 32);
                assert_eq!(data.get("visited_day_2024-05-01"), Some(&Value::Bool(true)));
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_existing_session_keeps_key() {
        let session = Session::loaded("abc".to_string(), Map::new());
        session.insert("x", 1);

        match session.persist_plan() {
            Persist::Save { stale_key, key, new_key, .. } => {
                assert_eq!(key, "abc");
                assert!(!new_key);
                assert!(stale_key.is_none());
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_login_cycles_key() {
        let session = Session::loaded("abc".to_string(), Map::new());
        session.set_user_id(7);

        assert_eq!(session.user_id(), Some(7));
        match session.persist_plan() {
            Persist::Save { stale_key, key, new_key, .. } => {
                assert_eq!(stale_key.as_deref(), Some("abc"));
                assert_ne!(key, "abc");
                assert!(new_key);
            }
            other => panic!("unexpected plan {:?}", other),
        }
    }

    #[test]
    fn test_flush_discards() {
        let mut data = Map::new();
        data.insert(USER_ID_KEY.to_string(), Value::from(7));
        let session = Session::loaded("abc".to_string(), data);

        session.flush();

        assert_eq!(session.user_id(), None);
        assert_eq!(
            session.persist_plan(),
            Persist::Discard { stale_key: "abc".to_string() }
        );
    }

    #[test]
    fn test_session_marks() {
        let mut session = Session::new();
        assert!(!session.has_mark("visited_day_2024-05-01"));
        session.set_mark("visited_day_2024-05-01");
        assert!(session.has_mark("visited_day_2024-05-01"));
        assert!(!session.has_mark("visited_day_2024-05-02"));
    }
}
