use axum::body::Body;
use axum::http::Response;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use rand::rngs::StdRng;
use rand::SeedableRng;
use spinwheel_shared::{RngSource, WheelGame};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use crate::config::AppConfig;
use crate::file_store::JsonFileStore;
use crate::games::backend_wheel_game::create_router as create_wheel_game_router;
use crate::services::spin_timer::{self, DynSource, DynStore, SharedWheel, WheelHost};

mod config;
mod error;
mod file_store;
mod games;
mod logging;
mod services;

#[derive(Clone)]
pub struct AppState {
    pub wheel: SharedWheel,
}

pub async fn health_check() -> impl IntoResponse {
    Response::new(Body::from("OK"))
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/wheel", create_wheel_game_router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("could not listen for ctrl-c: {}", e);
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::from_path(".env").ok();
    logging::setup()?;

    let config = AppConfig::from_env()?;
    let catalog = config.load_catalog()?;
    info!(
        "loaded {} prizes (total probability {:.4})",
        catalog.len(),
        catalog.total_probability()
    );

    let store: DynStore = Box::new(JsonFileStore::open(&config.storage_path));
    let mut game = WheelGame::hydrate(catalog, config.rules, config.tuning, store);
    game.on_complete(|result| {
        info!("🎉 {} ({})", result.headline, result.description);
    });
    info!(
        "session restored: claimed {} so far, spun before: {}",
        game.session().total_claimed_amount,
        game.session().has_spun_before
    );

    let rng: DynSource = Box::new(RngSource::new(StdRng::from_entropy()));
    let state = AppState {
        wheel: WheelHost::new(game, rng).shared(),
    };

    info!("listening on {}", config.bind_addr);
    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(result) = spin_timer::settle_now(&state.wheel).await {
        info!("settled spin {} before exit", result.spin_id);
    }

    Ok(())
}
