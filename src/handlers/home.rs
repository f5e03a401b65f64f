use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension, Json,
};

use crate::auth::middleware::BearerToken;
use crate::controller::{Fetch, ViewEffect, ViewState};
use crate::dto::{
    FriendsResponse, HomeResponse, Notices, ThemeResponse, EMPTY_FRIENDS_NOTICE,
    FRIENDS_UNAVAILABLE_NOTICE,
};
use crate::error::AppResult;
use crate::handlers::redirect_to_sign_in;
use crate::models::mood::{CalendarCell, MoodSymbol};
use crate::models::session::SessionUser;
use crate::AppState;

pub async fn home(
    State(state): State<AppState>,
    Extension(bearer): Extension<BearerToken>,
) -> AppResult<Response> {
    let mut view = state.view();
    if view.mount(bearer.as_deref()).await == ViewEffect::RedirectToSignIn {
        return Ok(redirect_to_sign_in(&state));
    }

    let theme = view.restore_theme(&state.prefs).await;
    let feeds = match view.load_home().await {
        Fetch::Ready(feeds) => feeds,
        Fetch::Suppressed => return Ok(redirect_to_sign_in(&state)),
    };
    let ViewState::Authenticated(session) = view.state() else {
        return Ok(redirect_to_sign_in(&state));
    };
    let user = SessionUser::from(session);

    let response = HomeResponse {
        user,
        theme: ThemeResponse::from(theme),
        moods: MoodSymbol::ALL.to_vec(),
        calendar: feeds.history.iter().map(CalendarCell::from).collect(),
        notices: Notices::for_feeds(&feeds),
        history: feeds.history,
        friends: feeds.friends,
    };

    Ok(Json(response).into_response())
}

/// Just the friends' latest moods.
pub async fn friends(
    State(state): State<AppState>,
    Extension(bearer): Extension<BearerToken>,
) -> AppResult<Response> {
    let mut view = state.view();
    if view.mount(bearer.as_deref()).await == ViewEffect::RedirectToSignIn {
        return Ok(redirect_to_sign_in(&state));
    }

    let response = match view.load_friends().await {
        Ok(Fetch::Ready(friends)) => FriendsResponse {
            notice: friends.is_empty().then_some(EMPTY_FRIENDS_NOTICE),
            friends,
        },
        Ok(Fetch::Suppressed) => return Ok(redirect_to_sign_in(&state)),
        Err(e) => {
            tracing::warn!(error = %e, "Friends feed unavailable");
            FriendsResponse {
                friends: Vec::new(),
                notice: Some(FRIENDS_UNAVAILABLE_NOTICE),
            }
        }
    };
    Ok(Json(response).into_response())
}
