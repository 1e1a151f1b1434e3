//! services/api/src/web/countdown_task.rs
//!
//! The live reset-countdown WebSocket: entry point, control loop, and the
//! per-connection ticker task that streams drift-corrected snapshots and
//! fires the silent plan-ensure pass when the day boundary is crossed.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    Extension,
};
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use tokio::sync::{mpsc, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::web::protocol::{ClientMessage, CountdownResponse, ServerMessage};
use crate::web::state::AppState;
use training_plan_core::countdown::CountdownState;
use training_plan_core::domain::Tier;

type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn countdown_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(owner_id): Extension<Uuid>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, owner_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, owner_id: Uuid) {
    info!("New countdown connection established for user: {}", owner_id);

    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    // --- 1. Initialization Phase ---
    // The first message must be Init; it carries the tier the silent ensure
    // pass runs with after a boundary crossing.
    let tier: Tier = if let Some(Ok(Message::Text(init_json))) = receiver.next().await {
        match serde_json::from_str::<ClientMessage>(&init_json) {
            Ok(ClientMessage::Init { tier }) => tier.into(),
            _ => {
                error!("First message was not a valid Init message.");
                send_message(
                    &ws_sender,
                    &ServerMessage::Error {
                        message: "Expected an init message.".to_string(),
                    },
                )
                .await;
                return;
            }
        }
    } else {
        error!("Client disconnected before sending Init message.");
        return;
    };

    // --- 2. Ticker Task ---
    // The token guarantees the repeating timer is released on every exit
    // path of this handler.
    let cancellation_token = CancellationToken::new();
    let (resync_tx, resync_rx) = mpsc::channel::<()>(4);
    let ticker = tokio::spawn(tick_loop(
        state.clone(),
        ws_sender.clone(),
        owner_id,
        tier,
        cancellation_token.clone(),
        resync_rx,
    ));

    // --- 3. Control Loop ---
    while let Some(Ok(message)) = receiver.next().await {
        match message {
            Message::Text(json) => match serde_json::from_str::<ClientMessage>(&json) {
                Ok(ClientMessage::Resync) => {
                    // Resume-from-suspend: force a canonical tick now rather
                    // than waiting out the cadence.
                    let _ = resync_tx.send(()).await;
                }
                Ok(ClientMessage::Init { .. }) => {
                    warn!("Ignoring duplicate Init message.");
                }
                Err(e) => {
                    warn!("Ignoring malformed client message: {}", e);
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    cancellation_token.cancel();
    let _ = ticker.await;
    info!("Countdown connection closed for user: {}", owner_id);
}

/// The per-connection ticker: one drift-corrected snapshot per second (or
/// immediately on resync), plus the ensure pass on boundary crossings.
async fn tick_loop(
    state: AppState,
    ws_sender: WsSender,
    owner_id: Uuid,
    tier: Tier,
    cancellation_token: CancellationToken,
    mut resync: mpsc::Receiver<()>,
) {
    let offset = state.config.day_offset_hours;
    let mut countdown = CountdownState::new(state.clock.now_local(), offset);

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // After a stall, one corrected tick is enough; no need to replay misses.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Countdown ticker cancelled.");
                return;
            }
            _ = interval.tick() => {}
            Some(()) = resync.recv() => {}
        }

        let snapshot = countdown.tick(state.clock.now_local());
        let elapsed = snapshot.is_elapsed;
        let tick = ServerMessage::Tick {
            countdown: CountdownResponse::from(&snapshot),
        };
        if !send_message(&ws_sender, &tick).await {
            return;
        }

        if elapsed {
            info!(owner = %owner_id, "day boundary crossed, running silent ensure");
            match state.engine.ensure_today_plan_if_empty(owner_id, tier).await {
                Ok(generated) => {
                    let ensured = ServerMessage::PlanEnsured {
                        plan_id: generated.map(|p| p.plan.id),
                    };
                    if !send_message(&ws_sender, &ensured).await {
                        return;
                    }
                }
                Err(e) => {
                    error!("Silent ensure after reset failed: {:?}", e);
                    let _ = send_message(
                        &ws_sender,
                        &ServerMessage::Error {
                            message: "Failed to refresh today's plan.".to_string(),
                        },
                    )
                    .await;
                }
            }
        }
    }
}

/// Serialize and push one message; false means the client is gone.
async fn send_message(ws_sender: &WsSender, message: &ServerMessage) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize server message: {}", e);
            return false;
        }
    };
    ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_ok()
}
