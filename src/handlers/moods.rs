use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::auth::middleware::BearerToken;
use crate::controller::{Fetch, ViewEffect};
use crate::dto::{DayQuery, DayResponse, SaveMoodRequest, SaveMoodResponse};
use crate::error::{AppError, AppResult};
use crate::handlers::redirect_to_sign_in;
use crate::store::MISSING_MOOD;
use crate::AppState;

/// Save today's mood. Without a session or a mood this is rejected before
/// anything is sent to the backend.
pub async fn save_mood(
    State(state): State<AppState>,
    Extension(bearer): Extension<BearerToken>,
    Json(body): Json<SaveMoodRequest>,
) -> AppResult<Json<SaveMoodResponse>> {
    if body.mood.is_none() {
        return Err(AppError::PreconditionNotMet(MISSING_MOOD.into()));
    }

    let mut view = state.view();
    view.mount(bearer.as_deref()).await;

    let entry = view.save_mood(body.mood, body.note).await?;

    Ok(Json(SaveMoodResponse {
        entry,
        history: view.store().history().to_vec(),
    }))
}

pub async fn moods_on_day(
    State(state): State<AppState>,
    Extension(bearer): Extension<BearerToken>,
    Query(query): Query<DayQuery>,
) -> AppResult<Response> {
    let mut view = state.view();
    if view.mount(bearer.as_deref()).await == ViewEffect::RedirectToSignIn {
        return Ok(redirect_to_sign_in(&state));
    }

    if let Fetch::Suppressed = view.load_history().await? {
        return Ok(redirect_to_sign_in(&state));
    }

    Ok(Json(DayResponse {
        date: query.date,
        entries: view.entries_on(query.date),
    })
    .into_response())
}
