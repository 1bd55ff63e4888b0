use tracing::{info, warn};

use crate::{
    error::ServiceError,
    services::broadcast::broadcast_state,
    state::{
        SharedState,
        game::{GameError, GameSession},
    },
};

/// Run `work` under the session lock, then broadcast the resulting snapshots.
///
/// Rejected commands leave the session untouched and are not broadcast. The board list
/// shown to hosts is fetched before the lock is taken.
pub async fn run_with_broadcast<F, T>(
    state: &SharedState,
    command: &'static str,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce(&mut GameSession) -> Result<T, GameError>,
{
    let available_boards = if state.has_hosts() {
        state.available_boards().await
    } else {
        Vec::new()
    };

    let mut session = state.game().lock().await;
    let before = session.phase();
    match work(&mut session) {
        Ok(value) => {
            let after = session.phase();
            if before != after {
                info!(command, from = %before, to = %after, "phase changed");
            }
            broadcast_state(state, &session, &available_boards);
            Ok(value)
        }
        Err(err) => {
            warn!(command, phase = %before, error = %err, "command rejected");
            Err(err.into())
        }
    }
}
