//! Route table of the local site and the guard in front of protected views.

use crate::management::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Unauthenticated entry point with the login link.
    Entry,
    Login,
    Callback,
    Home,
    Logout,
    Health,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Entry => "/",
            Route::Login => "/login",
            Route::Callback => "/callback",
            Route::Home => "/home",
            Route::Logout => "/logout",
            Route::Health => "/health",
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Home)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    Redirect(Route),
}

/// Decides whether `target` may be rendered in `state`.
///
/// Protected routes render only for an authenticated session. An unresolved
/// session counts as unauthenticated, so protected content never shows
/// before storage has been read.
pub fn guard(state: SessionState, target: Route) -> GuardDecision {
    if !target.is_protected() || state.is_authenticated() {
        GuardDecision::Render(target)
    } else {
        GuardDecision::Redirect(Route::Entry)
    }
}
