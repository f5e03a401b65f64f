pub mod auth;
pub mod health;
pub mod home;
pub mod moods;
pub mod theme;

use axum::response::{IntoResponse, Redirect, Response};

use crate::AppState;

/// 303 to the sign-in surface.
pub fn redirect_to_sign_in(state: &AppState) -> Response {
    Redirect::to(&state.config.sign_in_path).into_response()
}
