use crate::api::rest::AppState;
use crate::messaging::{EventMessage, MessageBroker, MessageBrokerTrait};
use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Routing pattern matching every event
pub const ALL_EVENTS: &str = "#";

#[derive(Debug, Deserialize)]
pub struct EventStreamQuery {
    /// Routing pattern, e.g. `scan.#` or `record.*.*`
    pub topic: Option<String>,
}

// Handle WebSocket connection upgrade
pub async fn handle_ws_upgrade(
    ws: WebSocketUpgrade,
    Query(query): Query<EventStreamQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let broker = state.events.broker().clone();
    let topic = query.topic.unwrap_or_else(|| ALL_EVENTS.to_string());
    ws.on_upgrade(move |socket| handle_socket(socket, broker, topic))
}

/// Subscribe to `topic` and hand matching events to a channel
pub async fn subscribe_stream(
    broker: &MessageBroker,
    topic: &str,
) -> Result<(String, mpsc::UnboundedReceiver<EventMessage>)> {
    let (tx, rx) = mpsc::unbounded_channel::<EventMessage>();
    let subscription_id = broker
        .subscribe_pattern(
            topic,
            Arc::new(move |event: EventMessage| {
                tx.send(event)
                    .map_err(|_| anyhow::anyhow!("Event stream receiver dropped"))
            }),
        )
        .await?;
    Ok((subscription_id, rx))
}

// Stream matching events to the client as JSON text
async fn handle_socket(socket: WebSocket, broker: Arc<MessageBroker>, topic: String) {
    let (subscription_id, mut events) = match subscribe_stream(&broker, &topic).await {
        Ok(subscription) => subscription,
        Err(e) => {
            error!("Failed to subscribe event stream to {}: {}", topic, e);
            return;
        }
    };
    info!("Event stream client connected to {}", topic);
    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize event {}: {}", event.routing_key(), e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Clients only listen; incoming frames are drained until close.
    // Pings are answered by axum.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = receiver.next().await {
            match message {
                Message::Close(_) => break,
                other => debug!("Ignoring client frame: {:?}", other),
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    if let Err(e) = broker.unsubscribe(&subscription_id).await {
        warn!("Failed to drop event stream subscription: {}", e);
    }
    info!("Event stream client disconnected");
}
