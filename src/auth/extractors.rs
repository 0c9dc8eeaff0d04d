use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};

use crate::auth::guard::{AuthContext, AuthedUser};

/// Extracts the guard-verified user, rejecting anonymous requests.
pub struct CurrentUser(pub AuthedUser);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .and_then(|ctx| ctx.user.clone())
            .map(CurrentUser)
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ))
    }
}
