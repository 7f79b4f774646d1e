//! Route table, guard decisions and role-gated navigation.

use std::fmt;

use super::Identity;
use super::session::SessionState;

/// Screens reachable by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// `/login`
    Login,
    /// `/dashboard/learn`
    Learn,
    /// `/dashboard/settings`
    Settings,
    /// `/dashboard/manage-course`
    ManageCourse,
    /// `/dashboard/manage-users`
    ManageUsers,
}

impl Route {
    /// Canonical path.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Learn => "/dashboard/learn",
            Self::Settings => "/dashboard/settings",
            Self::ManageCourse => "/dashboard/manage-course",
            Self::ManageUsers => "/dashboard/manage-users",
        }
    }

    /// Map a path onto a route. Unknown paths land on the dashboard default.
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim();
        let normalised = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        match normalised {
            "/login" => Self::Login,
            "/dashboard/settings" => Self::Settings,
            "/dashboard/manage-course" => Self::ManageCourse,
            "/dashboard/manage-users" => Self::ManageUsers,
            _ => Self::Learn,
        }
    }

    /// True for admin-only screens.
    pub const fn requires_admin(self) -> bool {
        matches!(self, Self::ManageCourse | Self::ManageUsers)
    }

    /// True for screens behind the dashboard guard.
    pub const fn requires_session(self) -> bool {
        !matches!(self, Self::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of guarding a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// Show the screen.
    Render(Route),
    /// Replace the location with another route.
    Redirect(Route),
    /// Session check still running; show a spinner.
    Loading,
}

/// Decide what to show for `path` given the session state.
///
/// # Examples
/// ```
/// use academy_client::domain::routing::{Navigation, Route, resolve};
/// use academy_client::domain::session::SessionState;
///
/// assert_eq!(
///     resolve("/dashboard/manage-users", &SessionState::Unauthenticated),
///     Navigation::Redirect(Route::Login),
/// );
/// ```
pub fn resolve(path: &str, state: &SessionState) -> Navigation {
    let route = Route::parse(path);
    if !route.requires_session() {
        return Navigation::Render(route);
    }
    match state {
        SessionState::Initializing => Navigation::Loading,
        SessionState::Unauthenticated => Navigation::Redirect(Route::Login),
        SessionState::Authenticated(identity) => {
            if route.requires_admin() && !identity.is_admin() {
                Navigation::Redirect(Route::Learn)
            } else {
                Navigation::Render(route)
            }
        }
    }
}

/// One sidebar entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavItem {
    /// Label shown in the sidebar.
    pub label: &'static str,
    /// Target route.
    pub route: Route,
}

/// Sidebar contents for the current identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidebar {
    /// `Hello, <name>` greeting.
    pub greeting: String,
    /// Entries in display order.
    pub items: Vec<NavItem>,
}

/// Build the sidebar. Admin entries appear only for admins.
pub fn navigation(identity: Option<&Identity>) -> Sidebar {
    let name = identity.map_or("User", |identity| identity.name().as_ref());
    let mut items = vec![NavItem {
        label: "Learn",
        route: Route::Learn,
    }];
    if identity.is_some_and(Identity::is_admin) {
        items.push(NavItem {
            label: "Manage Course",
            route: Route::ManageCourse,
        });
        items.push(NavItem {
            label: "Manage Users",
            route: Route::ManageUsers,
        });
    }
    items.push(NavItem {
        label: "Settings",
        route: Route::Settings,
    });
    Sidebar {
        greeting: format!("Hello, {name}"),
        items,
    }
}
