//! Session-gated view controller.
//!
//! A view starts `Unresolved`, resolves the session exactly once on mount,
//! and only then may it read any feed. Every mount and sign-out starts a new
//! generation; results fetched under an older generation are dropped.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::AppResult;
use crate::feed::fetch_friends_latest;
use crate::models::mood::{FriendLatestMood, MoodEntry, MoodSymbol};
use crate::models::session::Session;
use crate::models::theme::ThemeChoice;
use crate::prefs::PrefsStore;
use crate::remote::{AuthBackend, MoodBackend};
use crate::store::MoodEntryStore;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Unresolved,
    Authenticated(Session),
    Unauthenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEffect {
    Stay,
    RedirectToSignIn,
}

/// Outcome of a guarded fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch<T> {
    Ready(T),
    /// Not authenticated; no request was issued.
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

/// A feed that failed to load comes back empty with its flag set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HomeFeeds {
    pub history: Vec<MoodEntry>,
    pub friends: Vec<FriendLatestMood>,
    pub history_unavailable: bool,
    pub friends_unavailable: bool,
}

pub struct ViewController {
    state: ViewState,
    generation: u64,
    theme: ThemeChoice,
    auth: Arc<dyn AuthBackend>,
    moods: Arc<dyn MoodBackend>,
    store: MoodEntryStore,
}

impl ViewController {
    pub fn new(auth: Arc<dyn AuthBackend>, moods: Arc<dyn MoodBackend>) -> Self {
        Self {
            state: ViewState::Unresolved,
            generation: 0,
            theme: ThemeChoice::default(),
            auth,
            store: MoodEntryStore::new(moods.clone()),
            moods,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            ViewState::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn store(&self) -> &MoodEntryStore {
        &self.store
    }

    /// Resolve the session once. A missing token never reaches the backend.
    pub async fn mount(&mut self, token: Option<&str>) -> ViewEffect {
        self.generation += 1;
        self.state = ViewState::Unresolved;

        let session = match token {
            Some(token) => match self.auth.resolve_session(token).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(error = %e, "Session resolution failed, treating as signed out");
                    None
                }
            },
            None => None,
        };

        match session {
            Some(session) => {
                tracing::debug!(user_id = %session.user_id, "View mounted");
                self.state = ViewState::Authenticated(session);
                ViewEffect::Stay
            }
            None => {
                self.state = ViewState::Unauthenticated;
                ViewEffect::RedirectToSignIn
            }
        }
    }

    /// Leaves the view signed out even if the backend never acknowledges.
    pub async fn sign_out(&mut self) -> ViewEffect {
        if let ViewState::Authenticated(session) = &self.state {
            if let Err(e) = self.auth.sign_out(&session.access_token).await {
                tracing::warn!(user_id = %session.user_id, error = %e, "Remote sign-out failed");
            } else {
                tracing::info!(user_id = %session.user_id, "Signed out");
            }
        }

        self.generation += 1;
        self.state = ViewState::Unauthenticated;
        ViewEffect::RedirectToSignIn
    }

    pub fn ticket(&self) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
        }
    }

    /// Hand back `result` only if the view that asked for it is still the
    /// one mounted.
    pub fn accept<T>(&self, ticket: FetchTicket, result: T) -> Option<T> {
        if ticket.generation == self.generation {
            Some(result)
        } else {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "Discarding late result"
            );
            None
        }
    }

    pub async fn load_history(&mut self) -> AppResult<Fetch<Vec<MoodEntry>>> {
        let ViewState::Authenticated(session) = &self.state else {
            return Ok(Fetch::Suppressed);
        };
        let history = self.store.load(session).await?.to_vec();
        Ok(Fetch::Ready(history))
    }

    pub async fn load_friends(&self) -> AppResult<Fetch<Vec<FriendLatestMood>>> {
        let ViewState::Authenticated(session) = &self.state else {
            return Ok(Fetch::Suppressed);
        };
        let friends = fetch_friends_latest(self.moods.as_ref(), session).await?;
        Ok(Fetch::Ready(friends))
    }

    /// Own history and friends' latest, fetched side by side. One feed
    /// failing does not take the other down.
    ///
    /// `&mut self` is held across both fetches, so nothing can sign out in
    /// between; a request that is cancelled drops its results with the
    /// future. The ticket check only matters to callers that split the
    /// fetch from `accept` across awaits.
    pub async fn load_home(&mut self) -> Fetch<HomeFeeds> {
        let ticket = self.ticket();
        let ViewState::Authenticated(session) = &self.state else {
            return Fetch::Suppressed;
        };

        let (history, friends) = futures_util::join!(
            self.store.load(session),
            fetch_friends_latest(self.moods.as_ref(), session)
        );

        let mut feeds = HomeFeeds::default();
        match history {
            Ok(history) => feeds.history = history.to_vec(),
            Err(e) => {
                tracing::warn!(error = %e, "Own history unavailable");
                feeds.history_unavailable = true;
            }
        }
        match friends {
            Ok(friends) => feeds.friends = friends,
            Err(e) => {
                tracing::warn!(error = %e, "Friends feed unavailable");
                feeds.friends_unavailable = true;
            }
        }

        match self.accept(ticket, feeds) {
            Some(feeds) => Fetch::Ready(feeds),
            None => Fetch::Suppressed,
        }
    }

    pub async fn save_mood(
        &mut self,
        mood: Option<MoodSymbol>,
        note: Option<String>,
    ) -> AppResult<MoodEntry> {
        let session = self.session().cloned();
        self.store.upsert_today(mood, note, session.as_ref()).await
    }

    /// Entries for `day` from the loaded history.
    pub fn entries_on(&self, day: NaiveDate) -> Vec<MoodEntry> {
        self.store.entries_on(day).into_iter().cloned().collect()
    }

    /// Anything but a valid stored theme falls back to the default.
    pub async fn restore_theme(&mut self, prefs: &PrefsStore) -> ThemeChoice {
        self.theme = match prefs.get_theme().await {
            Ok(theme) => theme,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read theme preference");
                ThemeChoice::default()
            }
        };
        self.theme
    }

    pub async fn change_theme(
        &mut self,
        prefs: &PrefsStore,
        theme: ThemeChoice,
    ) -> AppResult<ThemeChoice> {
        prefs.set_theme(theme).await?;
        self.theme = theme;
        Ok(theme)
    }
}
