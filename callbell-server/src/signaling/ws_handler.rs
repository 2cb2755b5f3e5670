use crate::signaling::SignalingService;
use crate::transport::TransportKind;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use callbell_core::ClientEvent;
use futures::{SinkExt, StreamExt};
use tracing::{error, info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(service): State<SignalingService>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, service))
}

async fn handle_socket(socket: WebSocket, service: SignalingService) {
    let (connection_id, mut rx) = match service.connect(TransportKind::WebSocket).await {
        Ok(connection) => connection,
        Err(e) => {
            error!("Refusing WebSocket connection: {}", e);
            return;
        }
    };
    info!("New WebSocket connection: {}", connection_id);

    let (mut sender, mut receiver) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match event.encode() {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize {}: {}", event.name(), e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let service = service.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match ClientEvent::decode(text.as_str()) {
                        Ok(event) => {
                            if service.emit(connection_id, event).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Invalid event from {}: {}", connection_id, e),
                    },
                    Message::Binary(_) => {
                        warn!("Binary frame from {} ignored", connection_id);
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    let _ = service.disconnect(connection_id).await;
    info!("WebSocket disconnected: {}", connection_id);
}
