use anyhow::Context;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod controller;
mod dto;
mod error;
mod feed;
mod handlers;
mod models;
mod prefs;
mod remote;
mod store;

use auth::rate_limit::AuthThrottle;
use config::{BackendKind, Config};
use controller::ViewController;
use prefs::PrefsStore;
use remote::{AuthBackend, MemoryBackend, MoodBackend, SupabaseClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<dyn AuthBackend>,
    pub moods: Arc<dyn MoodBackend>,
    pub prefs: PrefsStore,
    pub auth_throttle: AuthThrottle,
}

impl AppState {
    /// A fresh, unmounted view for one request.
    pub fn view(&self) -> ViewController {
        ViewController::new(self.auth.clone(), self.moods.clone())
    }
}

fn build_router(state: AppState) -> anyhow::Result<Router> {
    let auth_routes = Router::new()
        .route("/api/auth/signin", post(handlers::auth::sign_in))
        .route("/api/auth/signup", post(handlers::auth::sign_up))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::throttle_auth,
        ));

    let view_routes = Router::new()
        .route("/api/auth/signout", post(handlers::auth::sign_out))
        .route("/api/home", get(handlers::home::home))
        .route("/api/friends", get(handlers::home::friends))
        .route(
            "/api/moods",
            get(handlers::moods::moods_on_day).post(handlers::moods::save_mood),
        )
        .layer(middleware::from_fn(auth::middleware::capture_bearer));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/theme",
            get(handlers::theme::get_theme).put(handlers::theme::put_theme),
        );

    let origin = state
        .config
        .frontend_url
        .parse::<axum::http::HeaderValue>()
        .with_context(|| format!("FRONTEND_URL {:?} is not a valid origin", state.config.frontend_url))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    Ok(Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(view_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feelzy_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env()?);

    let (auth, moods): (Arc<dyn AuthBackend>, Arc<dyn MoodBackend>) = match config.backend {
        BackendKind::Supabase => {
            let settings = config
                .supabase
                .as_ref()
                .context("Supabase settings missing")?;
            let client = Arc::new(SupabaseClient::new(settings)?);
            tracing::info!(url = %settings.url, "Using Supabase backend");
            (client.clone(), client)
        }
        BackendKind::Memory => {
            tracing::warn!("Using in-memory backend; nothing survives a restart");
            let backend = Arc::new(MemoryBackend::new());
            backend.seed_demo().await?;
            (backend.clone(), backend)
        }
    };

    let auth_throttle = AuthThrottle::new(
        config.auth_rate_limit_max,
        config.auth_rate_limit_window_secs,
    );
    auth_throttle.spawn_sweeper();

    let state = AppState {
        config: config.clone(),
        auth,
        moods,
        prefs: PrefsStore::new(&config.prefs_path),
        auth_throttle,
    };

    let app = build_router(state)?;

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    // Connect info gives the auth throttle the client IP.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
