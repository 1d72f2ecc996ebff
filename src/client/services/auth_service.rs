use std::sync::Arc;

use log::{info, warn};
use serde_json::json;

use crate::client::models::session::Session;
use crate::client::services::transport::Transport;
use crate::common::error::{ClientError, Result};
use crate::common::models::{AuthGrant, CurrentUser};

/// Talks to the auth service and is the only writer of the session
pub struct AuthService {
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
}

impl AuthService {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<Session>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Verifies a persisted token at startup. `None` means signed out.
    pub async fn restore(&self) -> Option<CurrentUser> {
        if !self.session.has_token() {
            info!("[AUTH] no stored session");
            return None;
        }
        match self.refresh().await {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("[AUTH] stored session rejected: {}", e);
                None
            }
        }
    }

    /// Re-reads the current user. Any failure, including an unreachable
    /// service, ends the session.
    pub async fn refresh(&self) -> Result<CurrentUser> {
        if !self.session.has_token() {
            return Err(ClientError::Unauthenticated);
        }
        let fetched = async {
            let value = self.transport.get(&[("action", "me")]).await?;
            Ok::<CurrentUser, ClientError>(serde_json::from_value(value)?)
        }
        .await;

        match fetched {
            Ok(user) => {
                self.session.establish(user.clone());
                Ok(user)
            }
            Err(e) => {
                warn!("[AUTH] me failed, clearing session: {}", e);
                self.session.clear();
                Err(e)
            }
        }
    }

    /// Fails with `ClientError::Blocked` for blocked accounts
    pub async fn login(&self, email: &str, password: &str) -> Result<CurrentUser> {
        let body = json!({ "action": "login", "email": email.trim(), "password": password });
        self.grant(body).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<CurrentUser> {
        let body = json!({
            "action": "register",
            "username": username.trim(),
            "email": email.trim(),
            "password": password
        });
        self.grant(body).await
    }

    async fn grant(&self, body: serde_json::Value) -> Result<CurrentUser> {
        let value = self.transport.post(body).await?;
        let grant: AuthGrant = serde_json::from_value(value)?;
        info!("[AUTH] token granted for {}", grant.user.username);
        self.session.begin(&grant.token)?;
        self.refresh().await
    }

    /// Ends the session locally even if the server call fails
    pub async fn logout(&self) {
        if self.session.has_token() {
            if let Err(e) = self.transport.post(json!({ "action": "logout" })).await {
                warn!("[AUTH] server logout failed: {}", e);
            }
        }
        self.session.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::models::session::SessionReader;
    use crate::client::testing::FakeTransport;
    use crate::client::utils::session_store::{KeyValueStore, MemoryStore, TOKEN_KEY};

    fn me() -> serde_json::Value {
        json!({"id": "u1", "username": "alice", "email": "a@x", "is_admin": false, "theme": "dark-blue"})
    }

    fn service(store: Arc<MemoryStore>) -> (Arc<FakeTransport>, AuthService) {
        let fake = FakeTransport::new();
        let session = Arc::new(Session::load(store));
        (fake.clone(), AuthService::new(fake, session))
    }

    #[tokio::test]
    async fn login_stores_token_then_loads_user() {
        let store = Arc::new(MemoryStore::new());
        let (fake, auth) = service(store.clone());
        fake.respond("login", json!({"token": "tok", "user": {"id": "u1", "username": "alice"}}));
        fake.respond("me", me());

        let user = auth.login(" a@x ", "pw").await.unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("tok"));
        assert_eq!(auth.session().current_user_id().as_deref(), Some("u1"));
        assert_eq!(fake.actions(), vec!["login", "me"]);
        assert_eq!(fake.calls()[0].payload["email"], "a@x");
    }

    #[tokio::test]
    async fn blocked_login_is_distinguished_and_stores_nothing() {
        let store = Arc::new(MemoryStore::new());
        let (fake, auth) = service(store.clone());
        fake.fail("login", 403, json!({"error": "blocked", "block_count": 2}));

        let err = auth.login("a@x", "pw").await.unwrap_err();
        assert!(matches!(err, ClientError::Blocked { block_count: 2 }));
        assert!(store.get(TOKEN_KEY).is_none());
        assert!(!auth.session().is_authenticated());
    }

    #[tokio::test]
    async fn rejected_token_is_cleared_on_restore() {
        let store = Arc::new(MemoryStore::with(TOKEN_KEY, "stale"));
        let (fake, auth) = service(store.clone());
        fake.fail("me", 401, json!({"error": "Invalid token"}));

        assert!(auth.restore().await.is_none());
        assert!(store.get(TOKEN_KEY).is_none());
        assert!(!auth.session().has_token());
    }

    #[tokio::test]
    async fn server_error_on_me_also_clears_the_token() {
        let store = Arc::new(MemoryStore::with(TOKEN_KEY, "tok"));
        let (fake, auth) = service(store.clone());
        fake.fail("me", 500, json!({"error": "boom"}));

        assert!(auth.refresh().await.is_err());
        assert!(store.get(TOKEN_KEY).is_none());
        assert!(!auth.session().has_token());
    }

    #[tokio::test]
    async fn restore_without_token_makes_no_call() {
        let (fake, auth) = service(Arc::new(MemoryStore::new()));
        assert!(auth.restore().await.is_none());
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn logout_clears_locally_even_when_server_fails() {
        let store = Arc::new(MemoryStore::with(TOKEN_KEY, "tok"));
        let (fake, auth) = service(store.clone());
        fake.respond("me", me());
        auth.restore().await.unwrap();
        fake.fail("logout", 500, json!({"error": "down"}));

        auth.logout().await;

        assert!(store.get(TOKEN_KEY).is_none());
        assert!(!auth.session().is_authenticated());
        assert_eq!(fake.count("logout"), 1);
    }
}
