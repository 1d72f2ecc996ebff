use crate::common::error::ClientError;

/// Lifecycle of a screen backed by one lookup
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    NotFound,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Loading
    }
}

impl<T> ViewState<T> {
    /// Any failed lookup renders as "not found" rather than an error banner
    pub fn from_lookup(result: Result<T, ClientError>) -> Self {
        match result {
            Ok(value) => ViewState::Ready(value),
            Err(e) => {
                if !e.is_not_found() {
                    log::warn!("[VIEW] lookup failed: {}", e);
                }
                ViewState::NotFound
            }
        }
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ViewState::NotFound)
    }
}

/// List reads degrade to an empty list instead of failing the screen
pub fn or_empty<T>(what: &str, result: Result<Vec<T>, ClientError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        log::warn!("[VIEW] loading {} failed, showing nothing: {}", what, e);
        Vec::new()
    })
}
