use anyhow::{Context, Result, anyhow, bail};
use callbell_core::{ClientEvent, ServerEvent};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

const RECV_TIMEOUT_MS: u64 = 2000;

/// Browser-like WebSocket client speaking the JSON event frames.
pub struct TestClient {
    /// Label used in logs and assertion messages.
    pub name: String,
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(url: &str, name: &str) -> Result<Self> {
        let (ws, _) = connect_async(url)
            .await
            .with_context(|| format!("{name} failed to connect to {url}"))?;
        tracing::debug!("[TestClient] {} connected", name);
        Ok(Self {
            name: name.to_owned(),
            ws,
        })
    }

    pub async fn send(&mut self, event: ClientEvent) -> Result<()> {
        let json = event.encode()?;
        self.send_raw(&json).await
    }

    pub async fn send_raw(&mut self, text: &str) -> Result<()> {
        self.ws
            .send(Message::text(text.to_owned()))
            .await
            .with_context(|| format!("{} failed to send", self.name))
    }

    pub async fn announce(&mut self, user: &str) -> Result<()> {
        self.send(ClientEvent::JoinRoom(Some(user.to_owned()))).await
    }

    /// Next server event, or an error after the receive timeout.
    pub async fn recv(&mut self) -> Result<ServerEvent> {
        self.recv_within(RECV_TIMEOUT_MS).await
    }

    pub async fn recv_within(&mut self, timeout_ms: u64) -> Result<ServerEvent> {
        loop {
            let frame = timeout(Duration::from_millis(timeout_ms), self.ws.next())
                .await
                .map_err(|_| anyhow!("{} got nothing within {}ms", self.name, timeout_ms))?;

            match frame {
                Some(Ok(Message::Text(text))) => {
                    let event = ServerEvent::decode(text.as_str())
                        .with_context(|| format!("{} got an undecodable frame", self.name))?;
                    tracing::debug!("[TestClient] {} <- {}", self.name, event.name());
                    return Ok(event);
                }
                Some(Ok(Message::Close(_))) | None => bail!("{} connection closed", self.name),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e).context("WebSocket error"),
            }
        }
    }

    /// Fails if any event arrives within `window_ms`.
    pub async fn expect_silence(&mut self, window_ms: u64) -> Result<()> {
        match self.recv_within(window_ms).await {
            Ok(event) => bail!("{} unexpectedly received {:?}", self.name, event),
            Err(_) => Ok(()),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await.context("Failed to close")?;
        Ok(())
    }
}
