use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{info, warn};
use tokio::sync::watch;

use crate::client::utils::session_store::{KeyValueStore, THEME_KEY, TOKEN_KEY};
use crate::common::error::{ClientError, Result};
use crate::common::models::CurrentUser;

/// Color scheme keys shared with the web client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    DarkGreen,
    DarkBlue,
    Crystal,
    WhiteYellow,
}

impl Theme {
    pub const ALL: [Theme; 4] = [
        Theme::DarkGreen,
        Theme::DarkBlue,
        Theme::Crystal,
        Theme::WhiteYellow,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Theme::DarkGreen => "dark-green",
            Theme::DarkBlue => "dark-blue",
            Theme::Crystal => "crystal",
            Theme::WhiteYellow => "white-yellow",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == key.trim())
    }
}

/// Narrow view of the session handed to components that only need identity
pub trait SessionReader: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
    fn is_admin(&self) -> bool;

    fn is_authenticated(&self) -> bool {
        self.current_user_id().is_some()
    }
}

#[derive(Default)]
struct SessionState {
    token: Option<String>,
    user: Option<CurrentUser>,
    theme: Theme,
}

/// Process-wide session: token, current user and theme.
///
/// Written only by the auth flow; everything else reads. Subscribers are
/// told when the signed-in state flips so they can tear down.
pub struct Session {
    store: Arc<dyn KeyValueStore>,
    state: RwLock<SessionState>,
    signed_in: watch::Sender<bool>,
}

impl Session {
    /// Loads any persisted token and theme; the user stays unknown until verified
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let token = store.get(TOKEN_KEY);
        let theme = store
            .get(THEME_KEY)
            .and_then(|key| Theme::from_key(&key))
            .unwrap_or_default();
        let (signed_in, _) = watch::channel(false);
        Self {
            store,
            state: RwLock::new(SessionState {
                token,
                user: None,
                theme,
            }),
            signed_in,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn has_token(&self) -> bool {
        self.read().token.is_some()
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.read().user.clone()
    }

    pub fn theme(&self) -> Theme {
        self.read().theme
    }

    pub fn set_theme(&self, theme: Theme) {
        self.write().theme = theme;
        if let Err(e) = self.store.set(THEME_KEY, theme.key()) {
            warn!("[SESSION] could not persist theme: {}", e);
        }
    }

    /// Watch that flips to `false` on logout or token invalidation
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.signed_in.subscribe()
    }

    /// Stores a freshly granted token; the user is filled in by `establish`
    pub fn begin(&self, token: &str) -> Result<()> {
        self.write().token = Some(token.to_string());
        self.store
            .set(TOKEN_KEY, token)
            .map_err(|e| ClientError::Store(e.to_string()))
    }

    /// Records the verified user and adopts their server-side theme
    pub fn establish(&self, user: CurrentUser) {
        let theme = user.theme.as_deref().and_then(Theme::from_key);
        info!("[SESSION] signed in as {}", user.username);
        self.write().user = Some(user);
        if let Some(theme) = theme {
            self.set_theme(theme);
        }
        self.signed_in.send_replace(true);
    }

    /// Drops the token and user; the theme survives
    pub fn clear(&self) {
        {
            let mut state = self.write();
            state.token = None;
            state.user = None;
        }
        if let Err(e) = self.store.remove(TOKEN_KEY) {
            warn!("[SESSION] could not clear persisted token: {}", e);
        }
        self.signed_in.send_replace(false);
        info!("[SESSION] session cleared");
    }
}

impl SessionReader for Session {
    fn current_user_id(&self) -> Option<String> {
        self.read().user.as_ref().map(|u| u.id.clone())
    }

    fn is_admin(&self) -> bool {
        self.read().user.as_ref().is_some_and(|u| u.is_admin)
    }
}
