use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::SessionKeys;
use crate::database::Store;

/// Request-scoped session context, resolved from the session cookie.
///
/// Inserted into the request extensions for every request; handlers take it
/// with `Extension<Session>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Stored session id, present only for a live session
    pub id: Option<String>,
    pub user_id: Option<i64>,
    pub logged_in: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(id: impl Into<String>, user_id: i64) -> Self {
        Self {
            id: Some(id.into()),
            user_id: Some(user_id),
            logged_in: true,
        }
    }

    /// The session's user, only when the session is logged in
    pub fn current_user(&self) -> Option<i64> {
        if self.logged_in {
            self.user_id
        } else {
            None
        }
    }
}

pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let session = resolve_session(request.headers(), &state.sessions, state.store.as_ref()).await;
    request.extensions_mut().insert(session);
    next.run(request).await
}

/// A cookie counts only when its signature verifies and its session is still stored
async fn resolve_session(headers: &HeaderMap, keys: &SessionKeys, store: &dyn Store) -> Session {
    let Some(token) = cookie_value(headers, keys.cookie_name()) else {
        return Session::anonymous();
    };

    let claims = match keys.verify(token) {
        Ok(claims) if claims.logged_in => claims,
        Ok(_) => return Session::anonymous(),
        Err(e) => {
            tracing::warn!("Ignoring session cookie: {}", e);
            return Session::anonymous();
        }
    };

    match store.find_session_user(&claims.jti).await {
        Ok(Some(user_id)) if user_id == claims.user_id => {
            tracing::debug!("Session resolved for user {}", user_id);
            Session::authenticated(claims.jti, user_id)
        }
        Ok(_) => {
            tracing::debug!("Session {} is no longer active", claims.jti);
            Session::anonymous()
        }
        Err(e) => {
            tracing::error!("Session lookup failed: {}", e);
            Session::anonymous()
        }
    }
}

/// Find a cookie by name across all `Cookie` headers
fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::MemoryStore;
    use axum::http::HeaderValue;

    fn keys() -> SessionKeys {
        SessionKeys::from_config(&AppConfig::development().session).unwrap()
    }

    fn cookie_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("sid={}", token)).unwrap(),
        );
        headers
    }

    async fn store_with_user() -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let user = store.create_user("Ada", "ada@example.com", "x").await.unwrap();
        (store, user.id)
    }

    #[test]
    fn finds_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; sid=abc.def; lang=en"));
        assert_eq!(cookie_value(&headers, "sid"), Some("abc.def"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[tokio::test]
    async fn stored_session_yields_logged_in_session() {
        let keys = keys();
        let (store, user_id) = store_with_user().await;
        let issued = keys.issue(user_id).unwrap();
        store
            .create_session(&issued.id, user_id, issued.expires_at)
            .await
            .unwrap();

        let session = resolve_session(&cookie_headers(&issued.token), &keys, &store).await;
        assert_eq!(session, Session::authenticated(issued.id.clone(), user_id));
        assert_eq!(session.current_user(), Some(user_id));
    }

    #[tokio::test]
    async fn destroyed_session_is_anonymous_even_with_valid_signature() {
        let keys = keys();
        let (store, user_id) = store_with_user().await;
        let issued = keys.issue(user_id).unwrap();
        store
            .create_session(&issued.id, user_id, issued.expires_at)
            .await
            .unwrap();
        store.destroy_session(&issued.id).await.unwrap();

        let session = resolve_session(&cookie_headers(&issued.token), &keys, &store).await;
        assert_eq!(session, Session::anonymous());
    }

    #[tokio::test]
    async fn unstored_token_is_anonymous() {
        let keys = keys();
        let (store, user_id) = store_with_user().await;
        let issued = keys.issue(user_id).unwrap();

        let session = resolve_session(&cookie_headers(&issued.token), &keys, &store).await;
        assert_eq!(session.current_user(), None);
    }

    #[tokio::test]
    async fn tampered_or_missing_cookie_is_anonymous() {
        let keys = keys();
        let store = MemoryStore::new();
        assert_eq!(
            resolve_session(&HeaderMap::new(), &keys, &store).await,
            Session::anonymous()
        );

        let session = resolve_session(&cookie_headers("not-a-token"), &keys, &store).await;
        assert!(!session.logged_in);
        assert_eq!(session.current_user(), None);
    }
}
