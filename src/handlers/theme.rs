use axum::{extract::State, Json};

use crate::dto::{ThemeRequest, ThemeResponse};
use crate::error::AppResult;
use crate::AppState;

pub async fn get_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    let mut view = state.view();
    Json(ThemeResponse::from(view.restore_theme(&state.prefs).await))
}

pub async fn put_theme(
    State(state): State<AppState>,
    Json(body): Json<ThemeRequest>,
) -> AppResult<Json<ThemeResponse>> {
    let mut view = state.view();
    let theme = view.change_theme(&state.prefs, body.theme).await?;
    tracing::debug!(theme = theme.as_str(), "Theme changed");
    Ok(Json(ThemeResponse::from(theme)))
}
