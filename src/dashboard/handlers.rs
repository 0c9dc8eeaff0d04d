use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::instrument;

use crate::auth::extractors::CurrentUser;
use crate::auth::guard::{found, AuthedUser};
use crate::auth::repo_types::Role;
use crate::state::AppState;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard_home))
        .route("/dashboard/freelancer", get(freelancer_dashboard))
        .route("/dashboard/client", get(client_dashboard))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/dashboard", get(admin_dashboard))
}

#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub user: AuthedUser,
}

/// Landing page: forwards to the role-specific dashboard.
#[instrument(skip_all)]
pub async fn dashboard_home(CurrentUser(user): CurrentUser) -> Response {
    found(user.role.dashboard_path())
}

#[instrument(skip_all)]
pub async fn freelancer_dashboard(CurrentUser(user): CurrentUser) -> Response {
    if user.role != Role::Freelancer {
        return found("/dashboard");
    }
    Json(DashboardData { user }).into_response()
}

#[instrument(skip_all)]
pub async fn client_dashboard(CurrentUser(user): CurrentUser) -> Response {
    if user.role != Role::Client {
        return found("/dashboard");
    }
    Json(DashboardData { user }).into_response()
}

/// The guard already gates `/admin`; the handler re-checks like the
/// dashboard it serves.
#[instrument(skip_all)]
pub async fn admin_dashboard(CurrentUser(user): CurrentUser) -> Response {
    if user.role != Role::Admin {
        return found("/dashboard");
    }
    Json(DashboardData { user }).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::UserStatus;
    use uuid::Uuid;

    #[test]
    fn dashboard_payload_wraps_the_user() {
        let json = serde_json::to_string(&DashboardData {
            user: AuthedUser {
                id: Uuid::new_v4(),
                name: "Jo Doe".into(),
                email: "jo@x.com".into(),
                role: Role::Client,
                status: UserStatus::Active,
                avatar_url: Some("https://cdn.worknet.test/jo.png".into()),
            },
        })
        .unwrap();
        assert!(json.contains("\"user\""));
        assert!(json.contains("\"avatarUrl\":\"https://cdn.worknet.test/jo.png\""));
    }
}
