use crate::api::AppState;
use crate::auth::verify_token;
use crate::domain::Message;
use crate::error::AppError;
use crate::realtime::ChannelMessage;
use axum::{
    extract::{
        Query, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    /// Select a conversation channel. Replaces any previous subscription.
    Subscribe { match_id: Uuid },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    Subscribed { match_id: Uuid },
    NewMessage { message: Message },
    Error { reason: String },
}

/// Upgrades to the realtime gateway. Browsers cannot set headers on a
/// websocket handshake, so the token travels as a query parameter.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match verify_token(&params.token, &state.config.auth.jwt_secret) {
        Ok(claims) => ws.on_upgrade(move |socket| handle_socket(socket, state, claims.sub)),
        Err(e) => {
            tracing::warn!(error = %e, "WebSocket handshake failed: invalid token");
            axum::http::StatusCode::UNAUTHORIZED.into_response()
        }
    }
}

fn encode(frame: &ServerFrame) -> Option<String> {
    match serde_json::to_string(frame) {
        Ok(text) => Some(text),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode gateway frame");
            None
        }
    }
}

#[tracing::instrument(name = "gateway_session", skip(socket, state), fields(user_id = %user_id))]
async fn handle_socket(socket: WebSocket, state: AppState, user_id: Uuid) {
    tracing::info!("WebSocket connected");

    let (mut ws_sink, mut ws_stream) = socket.split();
    let mut shutdown_rx = state.shutdown_rx.clone();
    // The current subscription; dropping the receiver is the unsubscribe.
    let mut subscription: Option<(Uuid, broadcast::Receiver<ChannelMessage>)> = None;

    loop {
        if *shutdown_rx.borrow() {
            tracing::info!("Shutdown signal received, closing WebSocket");
            let _ = ws_sink
                .send(WsMessage::Close(Some(axum::extract::ws::CloseFrame {
                    code: axum::extract::ws::close_code::AWAY,
                    reason: "Server shutting down".into(),
                })))
                .await;
            break;
        }

        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {}

            msg = ws_stream.next() => {
                let continue_loop = match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        match serde_json::from_str::<ClientFrame>(&text) {
                            Ok(ClientFrame::Subscribe { match_id }) => {
                                handle_subscribe(&state, user_id, match_id, &mut subscription, &mut ws_sink).await
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "Received malformed gateway frame");
                                true
                            }
                        }
                    }
                    Some(Ok(WsMessage::Close(_)) | Err(_)) | None => false,
                    Some(Ok(WsMessage::Binary(_))) => {
                        tracing::warn!("Received unexpected binary message");
                        true
                    }
                    Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => true,
                };

                if !continue_loop { break; }
            }

            event = recv_push(&mut subscription) => {
                match event {
                    Ok(channel_msg) => {
                        if !forward_push(&channel_msg, &subscription, &mut ws_sink).await { break; }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Delivery is at-most-once; dropped frames are
                        // recoverable through the history endpoint.
                        tracing::warn!(skipped, "Subscriber lagged behind channel buffer");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        subscription = None;
                    }
                }
            }
        }
    }

    let _ = ws_sink.close().await;
    tracing::info!("WebSocket disconnected");
}

/// Waits on the current subscription, or forever when there is none.
async fn recv_push(
    subscription: &mut Option<(Uuid, broadcast::Receiver<ChannelMessage>)>,
) -> Result<ChannelMessage, broadcast::error::RecvError> {
    match subscription.as_mut() {
        Some((_, rx)) => rx.recv().await,
        None => futures::future::pending().await,
    }
}

async fn handle_subscribe(
    state: &AppState,
    user_id: Uuid,
    match_id: Uuid,
    subscription: &mut Option<(Uuid, broadcast::Receiver<ChannelMessage>)>,
    ws_sink: &mut (impl futures::Sink<WsMessage, Error = axum::Error> + Unpin),
) -> bool {
    match state.conversation_service.subscribe(match_id, user_id).await {
        Ok(rx) => {
            // Switching conversations: the previous receiver is dropped
            // before the new channel goes live.
            *subscription = Some((match_id, rx));
            match encode(&ServerFrame::Subscribed { match_id }) {
                Some(text) => ws_sink.send(WsMessage::Text(text.into())).await.is_ok(),
                None => true,
            }
        }
        Err(AppError::NotFound) => {
            tracing::debug!(match_id = %match_id, "Subscribe rejected: not a participant");
            match encode(&ServerFrame::Error { reason: "Match not found".to_string() }) {
                Some(text) => ws_sink.send(WsMessage::Text(text.into())).await.is_ok(),
                None => true,
            }
        }
        Err(e) => {
            tracing::error!(error = %e, match_id = %match_id, "Subscribe failed");
            false
        }
    }
}

async fn forward_push(
    channel_msg: &ChannelMessage,
    subscription: &Option<(Uuid, broadcast::Receiver<ChannelMessage>)>,
    ws_sink: &mut (impl futures::Sink<WsMessage, Error = axum::Error> + Unpin),
) -> bool {
    let message: Message = match serde_json::from_slice(&channel_msg.payload) {
        Ok(message) => message,
        Err(e) => {
            tracing::error!(error = %e, channel = %channel_msg.channel, "Failed to decode realtime payload");
            return true;
        }
    };

    // A frame from a channel that is no longer selected is stale.
    if subscription.as_ref().is_none_or(|(current, _)| *current != message.match_id) {
        return true;
    }

    match encode(&ServerFrame::NewMessage { message }) {
        Some(text) => ws_sink.send(WsMessage::Text(text.into())).await.is_ok(),
        None => true,
    }
}
