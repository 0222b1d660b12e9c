//! Landing page selection.

use crate::session::AuthStore;

/// Which landing page to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Landing {
    /// Session not restored yet; show a spinner.
    Loading,
    /// No session; show the guest page.
    Guest,
    /// Logged in; show the user page.
    User,
}

impl Landing {
    /// Short label for display.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Guest => "guest",
            Self::User => "user",
        }
    }
}

/// Home page controller.
#[derive(Debug, Clone)]
pub struct HomePage {
    auth: AuthStore,
}

impl HomePage {
    /// Controller reading the given auth store.
    #[must_use]
    pub const fn new(auth: AuthStore) -> Self {
        Self { auth }
    }

    /// Landing for the current session state. Never `Guest` before hydration.
    #[must_use]
    pub fn landing(&self) -> Landing {
        if !self.auth.is_hydrated() {
            Landing::Loading
        } else if self.auth.is_authenticated() {
            Landing::User
        } else {
            Landing::Guest
        }
    }

    /// Landing once hydration has finished.
    pub async fn settled_landing(&self) -> Landing {
        self.auth.hydrate().await;
        self.landing()
    }
}
