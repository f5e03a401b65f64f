use axum::{extract::State, response::Response, Extension, Json};
use validator::Validate;

use crate::auth::middleware::BearerToken;
use crate::dto::{
    SessionResponse, SignInRequest, SignUpRequest, SignUpResponse, CONFIRM_EMAIL_NOTICE,
};
use crate::error::{AppError, AppResult};
use crate::handlers::redirect_to_sign_in;
use crate::models::session::{SessionUser, SignUpOutcome};
use crate::AppState;

pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> AppResult<Json<SessionResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let session = state.auth.sign_in(body.email.trim(), &body.password).await?;
    tracing::info!(user_id = %session.user_id, "Signed in");

    Ok(Json(SessionResponse {
        user: SessionUser::from(&session),
        access_token: session.access_token,
    }))
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(body): Json<SignUpRequest>,
) -> AppResult<Json<SignUpResponse>> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    match state.auth.sign_up(body.email.trim(), &body.password).await? {
        SignUpOutcome::ConfirmationPending => Ok(Json(SignUpResponse {
            status: "confirmation_pending",
            message: CONFIRM_EMAIL_NOTICE,
        })),
    }
}

/// Always ends on the sign-in surface, signed in or not.
pub async fn sign_out(
    State(state): State<AppState>,
    Extension(bearer): Extension<BearerToken>,
) -> Response {
    let mut view = state.view();
    view.mount(bearer.as_deref()).await;
    view.sign_out().await;
    redirect_to_sign_in(&state)
}
