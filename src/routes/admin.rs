use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post},
};
use validator::Validate;

use crate::{
    dto::{
        admin::{
            ActionResponse, AddPlayerRequest, BoardListResponse, ScoreAdjustmentRequest,
            ScoreUpdateResponse, SelectTileRequest, StartGameRequest,
        },
        public::HostSnapshot,
    },
    error::AppError,
    services::admin_service,
    state::SharedState,
};

const HOST_SECRET_HEADER: &str = "x-host-secret";

/// Host-only endpoints driving the session.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/state", get(get_host_state))
        .route("/admin/boards", get(list_boards))
        .route("/admin/game/start", post(start_game))
        .route("/admin/game/tile", post(select_tile))
        .route("/admin/game/correct", post(mark_correct))
        .route("/admin/game/wrong", post(mark_wrong))
        .route("/admin/game/skip", post(skip_tile))
        .route("/admin/game/reset", post(reset_game))
        .route("/admin/players", post(add_player))
        .route("/admin/players/{name}", delete(remove_player))
        .route("/admin/players/{name}/score", post(adjust_score))
        .route_layer(middleware::from_fn_with_state(state, require_host_secret))
}

/// Host view of the session, including the current answer.
#[utoipa::path(
    get,
    path = "/admin/state",
    tag = "admin",
    params(("X-Host-Secret" = String, Header, description = "Configured host secret")),
    responses((status = 200, description = "Host snapshot", body = HostSnapshot))
)]
pub async fn get_host_state(State(state): State<SharedState>) -> Json<HostSnapshot> {
    Json(admin_service::host_state(&state).await)
}

/// Boards available in the store.
#[utoipa::path(
    get,
    path = "/admin/boards",
    tag = "admin",
    params(("X-Host-Secret" = String, Header, description = "Configured host secret")),
    responses(
        (status = 200, description = "Board identifiers", body = BoardListResponse),
        (status = 503, description = "Board store unavailable")
    )
)]
pub async fn list_boards(
    State(state): State<SharedState>,
) -> Result<Json<BoardListResponse>, AppError> {
    Ok(Json(admin_service::list_boards(&state).await?))
}

/// Load a board and leave the lobby.
#[utoipa::path(
    post,
    path = "/admin/game/start",
    tag = "admin",
    params(("X-Host-Secret" = String, Header, description = "Configured host secret")),
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Game started", body = ActionResponse),
        (status = 404, description = "Unknown board"),
        (status = 409, description = "Not in the lobby")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    payload: Option<Json<StartGameRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
    payload.validate()?;
    Ok(Json(admin_service::start_game(&state, payload).await?))
}

/// Reveal the clue of a tile.
#[utoipa::path(
    post,
    path = "/admin/game/tile",
    tag = "admin",
    params(("X-Host-Secret" = String, Header, description = "Configured host secret")),
    request_body = SelectTileRequest,
    responses((status = 200, description = "Clue revealed", body = ActionResponse))
)]
pub async fn select_tile(
    State(state): State<SharedState>,
    Json(payload): Json<SelectTileRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::select_tile(&state, payload).await?))
}

/// Judge the current answer as correct.
#[utoipa::path(
    post,
    path = "/admin/game/correct",
    tag = "admin",
    params(("X-Host-Secret" = String, Header, description = "Configured host secret")),
    responses((status = 200, description = "Answer credited", body = ActionResponse))
)]
pub async fn mark_correct(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::mark_correct(&state).await?))
}

/// Judge the current answer as wrong.
#[utoipa::path(
    post,
    path = "/admin/game/wrong",
    tag = "admin",
    params(("X-Host-Secret" = String, Header, description = "Configured host secret")),
    responses((status = 200, description = "Answer debited", body = ActionResponse))
)]
pub async fn mark_wrong(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::mark_wrong(&state).await?))
}

#[utoipa::path(
    post,
    path = "/admin/game/skip",
    tag = "admin",
    params(("X-Host-Secret" = String, Header, description = "Configured host secret")),
    responses((status = 200, description = "Tile closed without scoring", body = ActionResponse))
)]
pub async fn skip_tile(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::skip_tile(&state).await?))
}

#[utoipa::path(
    post,
    path = "/admin/game/reset",
    tag = "admin",
    params(("X-Host-Secret" = String, Header, description = "Configured host secret")),
    responses((status = 200, description = "Back in the lobby", body = ActionResponse))
)]
pub async fn reset_game(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::reset_game(&state).await?))
}

#[utoipa::path(
    post,
    path = "/admin/players",
    tag = "admin",
    params(("X-Host-Secret" = String, Header, description = "Configured host secret")),
    request_body = AddPlayerRequest,
    responses((status = 200, description = "Player registered", body = ActionResponse))
)]
pub async fn add_player(
    State(state): State<SharedState>,
    Json(payload): Json<AddPlayerRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    Ok(Json(admin_service::add_player(&state, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/admin/players/{name}",
    tag = "admin",
    params(("X-Host-Secret" = String, Header, description = "Configured host secret"),
    ("name" = String, Path, description = "Name of the player to remove")),
    responses((status = 204, description = "Player removed"))
)]
pub async fn remove_player(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<StatusCode, AppError> {
    admin_service::remove_player(&state, &name).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/admin/players/{name}/score",
    tag = "admin",
    params(("X-Host-Secret" = String, Header, description = "Configured host secret"),
    ("name" = String, Path, description = "Name of the player to adjust")),
    request_body = ScoreAdjustmentRequest,
    responses((status = 200, description = "Score adjusted", body = ScoreUpdateResponse))
)]
pub async fn adjust_score(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(payload): Json<ScoreAdjustmentRequest>,
) -> Result<Json<ScoreUpdateResponse>, AppError> {
    Ok(Json(
        admin_service::adjust_score(&state, &name, payload).await?,
    ))
}

async fn require_host_secret(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(HOST_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing host secret header `X-Host-Secret`".into())
        })?;

    if state.verify_host_secret(provided) {
        Ok(next.run(req).await)
    } else {
        Err(AppError::Unauthorized("invalid host secret".into()))
    }
}
