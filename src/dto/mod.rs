//! Wire types: REST bodies, WebSocket frames, SSE payloads and snapshots.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod admin;
pub mod health;
pub mod phase;
pub mod public;
pub mod sse;
pub mod validation;
pub mod ws;

/// RFC 3339 rendering used for every timestamp leaving the server.
fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
