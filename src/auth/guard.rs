use axum::{
    extract::{Request, State},
    http::{
        header::{LOCATION, SET_COOKIE},
        StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::auth::repo_types::{Role, User, UserStatus};
use crate::auth::session::{self, SessionData};
use crate::state::AppState;

/// Routes that require an authenticated user.
const PROTECTED_PREFIXES: &[&str] = &["/dashboard", "/admin", "/api"];
/// Routes that additionally require the admin role.
const ADMIN_PREFIXES: &[&str] = &["/admin"];
/// API routes exempt from the protected check.
const PUBLIC_API_PREFIXES: &[&str] = &["/api/auth"];
/// Pages an already-authenticated user is bounced away from.
const AUTH_PAGES: &[&str] = &["/auth/login", "/auth/register"];

/// Identity snapshot re-verified against the database for this request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub avatar_url: Option<String>,
}

impl From<User> for AuthedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            status: user.status,
            avatar_url: user.avatar_url,
        }
    }
}

/// Per-request authentication result, inserted into request extensions
/// whenever the guard lets the request continue.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: Option<AuthedUser>,
}

/// What the guard decided for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Continue,
    Redirect {
        location: String,
        clear_session: bool,
    },
}

/// Pure routing decision. Rules apply in order: authenticated users are
/// bounced off auth pages first, then anonymous requests off protected
/// routes (with a return path), then non-admins off admin routes, and
/// finally inactive accounts lose their session everywhere but auth pages.
pub(crate) fn authorize(
    path: &str,
    query: Option<&str>,
    user: Option<&AuthedUser>,
) -> RouteOutcome {
    let is_protected = PROTECTED_PREFIXES.iter().any(|p| path.starts_with(p));
    let is_admin_route = ADMIN_PREFIXES.iter().any(|p| path.starts_with(p));
    let is_public_api = PUBLIC_API_PREFIXES.iter().any(|p| path.starts_with(p));
    let is_auth_page = AUTH_PAGES.contains(&path);

    if is_auth_page {
        if let Some(user) = user {
            return RouteOutcome::Redirect {
                location: user.role.dashboard_path().to_string(),
                clear_session: false,
            };
        }
    }

    if is_protected && !is_public_api && user.is_none() {
        let mut return_to = path.to_string();
        if let Some(query) = query {
            return_to.push('?');
            return_to.push_str(query);
        }
        return RouteOutcome::Redirect {
            location: format!("/auth/login?redirectTo={}", urlencoding::encode(&return_to)),
            clear_session: false,
        };
    }

    if is_admin_route && user.map(|u| u.role) != Some(Role::Admin) {
        return RouteOutcome::Redirect {
            location: "/auth/login".to_string(),
            clear_session: false,
        };
    }

    if let Some(user) = user {
        if user.status != UserStatus::Active && !is_auth_page {
            return RouteOutcome::Redirect {
                location: "/auth/login".to_string(),
                clear_session: true,
            };
        }
    }

    RouteOutcome::Continue
}

/// Middleware applied to the whole router: resolves the session cookie to
/// a verified user, applies `authorize`, and performs the redirects.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let mut stale_session = false;
    let user = match session::read_session(req.headers()) {
        Some(session) => match verify_session(&state, &session).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                // Referenced user is gone or no longer active; the stale
                // cookie is discarded, never repaired.
                stale_session = true;
                None
            }
            Err(err) => {
                error!(error = %err, "session verification error");
                stale_session = true;
                None
            }
        },
        None => None,
    };

    let outcome = authorize(req.uri().path(), req.uri().query(), user.as_ref());

    match outcome {
        RouteOutcome::Continue => {
            req.extensions_mut().insert(AuthContext { user });
            let mut response = next.run(req).await;
            if stale_session {
                response.headers_mut().append(
                    SET_COOKIE,
                    session::clear_session_cookie(&state.config.session),
                );
            }
            response
        }
        RouteOutcome::Redirect {
            location,
            clear_session,
        } => {
            let mut response = found(&location);
            if clear_session || stale_session {
                response.headers_mut().append(
                    SET_COOKIE,
                    session::clear_session_cookie(&state.config.session),
                );
            }
            response
        }
    }
}

async fn verify_session(
    state: &AppState,
    session: &SessionData,
) -> Result<Option<AuthedUser>, sqlx::Error> {
    let user = User::find_by_id(&state.db, session.user_id).await?;
    Ok(user
        .filter(|u| u.status == UserStatus::Active)
        .map(AuthedUser::from))
}

/// 302 redirect; axum's `Redirect` helpers start at 303.
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}
