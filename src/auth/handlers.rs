use axum::{
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::Response,
    routing::{get, post},
    Extension, Form, Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::auth::dto::{LoginForm, LoginQuery, MeResponse, RegisterForm, RegisterResponse};
use crate::auth::guard::{found, AuthContext};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo_types::{FreelancerProfile, Role, User, UserStatus};
use crate::auth::services::{inactive_message, validate_login, validate_registration};
use crate::auth::session::{self, SessionData};
use crate::error::{AppError, INVALID_CREDENTIALS};
use crate::state::AppState;

const LOGIN_FAILED: &str = "An error occurred during login. Please try again.";
const REGISTER_FAILED: &str =
    "An unexpected error occurred during registration. Please try again.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", get(logout))
}

pub fn api_routes() -> Router<AppState> {
    Router::new().route("/api/auth/me", get(me))
}

#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let credentials = validate_login(&form)?;

    let Some(user) = User::find_by_email(&state.db, &credentials.email).await? else {
        // Same message as a wrong password so responses cannot be used to
        // probe which emails exist.
        warn!(email = %credentials.email, "login unknown email");
        return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
    };

    if user.status != UserStatus::Active {
        warn!(user_id = %user.id, status = ?user.status, "login for inactive account");
        return Err(AppError::Auth(inactive_message(user.status).into()));
    }

    let ok = verify_password(&credentials.password, &user.password_hash).map_err(|e| {
        error!(error = %e, "verify_password failed");
        AppError::Unexpected(LOGIN_FAILED.into())
    })?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Auth(INVALID_CREDENTIALS.into()));
    }

    let session_data = SessionData::for_user(&user);
    let cookie = session::session_cookie(&session_data, &state.config.session).map_err(|e| {
        error!(error = %e, "session cookie build failed");
        AppError::Unexpected(LOGIN_FAILED.into())
    })?;

    let destination = query
        .redirect_to
        .unwrap_or_else(|| user.role.dashboard_path().to_string());

    info!(user_id = %user.id, role = ?user.role, "user logged in");
    let mut response = found(&destination);
    response.headers_mut().append(SET_COOKIE, cookie);
    Ok(response)
}

#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Json<RegisterResponse>, AppError> {
    let registration = validate_registration(&form)?;

    if User::find_by_email(&state.db, &registration.email)
        .await?
        .is_some()
    {
        warn!(email = %registration.email, "registration email already taken");
        return Err(AppError::field(
            "email",
            "An account with this email already exists",
        ));
    }

    let password_hash = hash_password(&registration.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        AppError::Unexpected(REGISTER_FAILED.into())
    })?;

    let user = User::create(
        &state.db,
        &registration.name,
        &registration.email,
        &password_hash,
        registration.role,
    )
    .await?;

    if user.role == Role::Freelancer {
        FreelancerProfile::create(&state.db, user.id).await?;
    }

    info!(user_id = %user.id, email = %user.email, role = ?user.role, "user registered");
    Ok(Json(RegisterResponse {
        success: true,
        message: "Account created successfully!".into(),
    }))
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Response {
    let mut response = found("/auth/login");
    response.headers_mut().append(
        SET_COOKIE,
        session::clear_session_cookie(&state.config.session),
    );
    response
}

#[instrument(skip(ctx))]
pub async fn me(Extension(ctx): Extension<AuthContext>) -> Json<MeResponse> {
    Json(MeResponse {
        authenticated: ctx.user.is_some(),
        user: ctx.user,
    })
}
