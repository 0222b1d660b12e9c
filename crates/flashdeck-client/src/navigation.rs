//! Navigation requests raised by non-view code.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use flashdeck_api_models::Id;
use tokio::sync::watch;

/// Application locations a controller can redirect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Landing page.
    Home,
    /// Login form.
    Login,
    /// Registration form.
    Register,
    /// Folder and set browser.
    Library,
    /// Editor for one set.
    EditSet(Id),
}

impl Route {
    /// URL path of the route.
    #[must_use]
    pub fn path(self) -> String {
        match self {
            Self::Home => "/".to_string(),
            Self::Login => "/login".to_string(),
            Self::Register => "/register".to_string(),
            Self::Library => "/library".to_string(),
            Self::EditSet(id) => format!("/set/{id}/edit"),
        }
    }
}

impl Display for Route {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.path())
    }
}

/// Current route plus a change feed.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Arc<watch::Sender<Route>>,
}

impl Navigator {
    /// Navigator positioned at `initial`.
    #[must_use]
    pub fn new(initial: Route) -> Self {
        let (current, _) = watch::channel(initial);
        Self {
            current: Arc::new(current),
        }
    }

    /// Move to `route`.
    pub fn navigate(&self, route: Route) {
        tracing::debug!(route = %route, "navigate");
        self.current.send_replace(route);
    }

    /// Current route.
    #[must_use]
    pub fn current(&self) -> Route {
        *self.current.borrow()
    }

    /// Observe route changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.current.subscribe()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Route::Home)
    }
}
