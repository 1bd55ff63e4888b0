/// Host REST operations.
pub mod admin_service;
/// Snapshot fan-out to WebSocket and SSE clients.
pub mod broadcast;
/// OpenAPI documentation generation.
pub mod documentation;
/// Session commands and the timer pump.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// WebSocket connection and message handling service.
pub mod websocket_service;
