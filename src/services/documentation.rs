use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the Buzzboard backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::public::get_state,
        crate::routes::sse::public_stream,
        crate::routes::websocket::ws_handler,
        crate::routes::admin::get_host_state,
        crate::routes::admin::list_boards,
        crate::routes::admin::start_game,
        crate::routes::admin::select_tile,
        crate::routes::admin::mark_correct,
        crate::routes::admin::mark_wrong,
        crate::routes::admin::skip_tile,
        crate::routes::admin::reset_game,
        crate::routes::admin::add_player,
        crate::routes::admin::remove_player,
        crate::routes::admin::adjust_score,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisibleGamePhase,
            crate::dto::public::PublicSnapshot,
            crate::dto::public::HostSnapshot,
            crate::dto::public::TileSummary,
            crate::dto::public::PlayerSummary,
            crate::dto::public::TilePositionDto,
            crate::dto::sse::Handshake,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "public", description = "Read-only game state"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "websocket", description = "Player and host WebSocket commands"),
        (name = "admin", description = "Host controls, authenticated by `X-Host-Secret`"),
    )
)]
pub struct ApiDoc;
