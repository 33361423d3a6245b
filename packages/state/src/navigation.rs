//! Routes and the authentication guard in front of them.

use api::{ApiError, ErrorKind, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    NewUser,
    EditUser(String),
}

impl Route {
    /// Everything except the login page needs a session.
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login)
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::NewUser => "/dashboard/new".to_string(),
            Route::EditUser(id) => format!("/dashboard/edit/{}", urlencoding::encode(id)),
        }
    }

    /// Resolve a path; unknown paths land on the dashboard.
    pub fn parse(path: &str) -> Route {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "/login" => Route::Login,
            "/dashboard/new" => Route::NewUser,
            _ => match trimmed.strip_prefix("/dashboard/edit/") {
                Some(id) if !id.is_empty() && !id.contains('/') => {
                    let id = urlencoding::decode(id)
                        .map(|s| s.into_owned())
                        .unwrap_or_else(|_| id.to_string());
                    Route::EditUser(id)
                }
                _ => Route::Dashboard,
            },
        }
    }
}

/// The route actually shown when `requested` is asked for.
pub fn guard(requested: Route, session: &Session) -> Route {
    match (session.is_authenticated(), requested) {
        (false, route) if route.is_protected() => Route::Login,
        (true, Route::Login) => Route::Dashboard,
        (_, route) => route,
    }
}

/// Where a failed protected call sends the user, if anywhere.
pub fn after_error(error: &ApiError) -> Option<Route> {
    match error.kind() {
        ErrorKind::Authentication => Some(Route::Login),
        ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Fetch => None,
    }
}
