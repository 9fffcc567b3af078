use axum::{
    debug_handler,
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use spinwheel_shared::geometry::{
    layout_wheel, responsive_wheel_size, WheelLayout, DEFAULT_WHEEL_SIZE,
};
use spinwheel_shared::shared_wheel_game::*;
use spinwheel_shared::Prize;
use crate::error::Error;
use crate::services::spin_timer::{self, StatusResponse};
use crate::AppState;

const MIN_LAYOUT_SIZE: u32 = 50;
const MAX_LAYOUT_SIZE: u32 = 2000;
const MAX_DISPLAY_NAME_CHARS: usize = 40;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/spin", post(spin_wheel))
        .route("/status", get(get_wheel_status))
        .route("/layout", get(get_wheel_layout))
        .route("/catalog", get(get_catalog))
        .route("/profile", post(update_profile))
        .route("/verify-channel", post(verify_channel))
}

#[debug_handler]
async fn spin_wheel(State(state): State<AppState>) -> Json<WheelSpinResponse> {
    let (outcome, status) = spin_timer::start_spin(&state.wheel).await;
    let success = matches!(outcome, SpinOutcome::Started(_));
    let message = outcome.message().map(str::to_string);
    let spin = match outcome {
        SpinOutcome::Started(plan) => Some(plan),
        _ => None,
    };

    Json(WheelSpinResponse {
        success,
        message,
        spin,
        status: status.status,
    })
}

#[debug_handler]
async fn get_wheel_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let host = state.wheel.lock().await;
    Json(host.status())
}

#[debug_handler]
async fn get_wheel_layout(
    State(state): State<AppState>,
    Query(query): Query<LayoutQuery>,
) -> Result<Json<WheelLayout>, Error> {
    let size = match (query.size, query.viewport) {
        (Some(size), _) => size,
        (None, Some(viewport)) => responsive_wheel_size(viewport),
        (None, None) => DEFAULT_WHEEL_SIZE,
    };
    if !(MIN_LAYOUT_SIZE..=MAX_LAYOUT_SIZE).contains(&size) {
        return Err(Error::BadRequest(format!(
            "Wheel size must be between {} and {}",
            MIN_LAYOUT_SIZE, MAX_LAYOUT_SIZE
        )));
    }

    let host = state.wheel.lock().await;
    Ok(Json(layout_wheel(host.game().catalog(), size)))
}

#[debug_handler]
async fn get_catalog(State(state): State<AppState>) -> Json<Vec<Prize>> {
    let host = state.wheel.lock().await;
    Json(host.game().catalog().prizes().to_vec())
}

#[debug_handler]
async fn update_profile(
    State(state): State<AppState>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<StatusResponse>, Error> {
    let name = request.display_name.trim();
    if name.is_empty() || name.chars().count() > MAX_DISPLAY_NAME_CHARS {
        return Err(Error::BadRequest(format!(
            "Display name must be 1 to {} characters",
            MAX_DISPLAY_NAME_CHARS
        )));
    }

    let mut host = state.wheel.lock().await;
    host.game_mut().set_display_name(name)?;
    tracing::info!("display name set to {}", name);
    Ok(Json(host.status()))
}

#[debug_handler]
async fn verify_channel(State(state): State<AppState>) -> Result<Json<StatusResponse>, Error> {
    let mut host = state.wheel.lock().await;
    host.game_mut().mark_channel_verified()?;
    tracing::info!("channel membership confirmed");
    Ok(Json(host.status()))
}
