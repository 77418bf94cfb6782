use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use teloxide::types::ChatId;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use super::{CallError, StreamEnded, VoiceCallClient};

/// Segundos que el sidecar retiene la petición de eventos antes de responder vacío
const POLL_TIMEOUT_SECS: u64 = 25;
const POLL_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Cliente HTTP para el sidecar de llamadas de voz (estilo pytgcalls).
///
/// El sidecar expone `play`, `change`, `leave`, `pause` y `resume` como
/// endpoints JSON, y un endpoint `updates` de long-poll por el que entrega
/// las notificaciones de fin de stream.
pub struct TgCallsBridge {
    base_url: Url,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct StreamRequest<'a> {
    chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
}

#[derive(Deserialize)]
struct BridgeResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct UpdatesResponse {
    #[serde(default)]
    events: Vec<BridgeEvent>,
}

#[derive(Deserialize)]
struct BridgeEvent {
    #[serde(rename = "type")]
    kind: String,
    chat_id: i64,
}

impl TgCallsBridge {
    pub fn new(base_url: Url, http_timeout: Duration) -> anyhow::Result<Self> {
        // El long-poll de eventos debe caber dentro del timeout del cliente
        let timeout = http_timeout.max(Duration::from_secs(POLL_TIMEOUT_SECS + 5));
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        info!("🎼 Bridge de llamadas configurado en {}", base_url);
        Ok(Self { base_url, http })
    }

    async fn post(
        &self,
        path: &str,
        chat_id: ChatId,
        stream_url: Option<&str>,
    ) -> Result<(), CallError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| CallError::Transport(e.to_string()))?;
        let body = StreamRequest {
            chat_id: chat_id.0,
            url: stream_url,
        };

        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CallError::Transport(format!("HTTP {}", response.status())));
        }

        let parsed: BridgeResponse = response
            .json()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        if parsed.ok {
            Ok(())
        } else {
            Err(map_bridge_error(parsed.error.as_deref()))
        }
    }

    /// Suscripción a los eventos de fin de stream del sidecar.
    ///
    /// Lanza una tarea de long-poll que vive mientras el receptor exista.
    pub fn subscribe(self: &Arc<Self>, buffer: usize) -> mpsc::Receiver<StreamEnded> {
        let (tx, rx) = mpsc::channel(buffer);
        let bridge = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                match bridge.poll_updates().await {
                    Ok(events) => {
                        for event in events {
                            debug!("🔔 Fin de stream en {}", event.chat_id);
                            if tx.send(event).await.is_err() {
                                debug!("receptor de eventos cerrado, terminando poll");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        warn!("⚠️ Error consultando eventos del bridge: {}", e);
                        tokio::time::sleep(POLL_RETRY_DELAY).await;
                    }
                }
            }
        });

        rx
    }

    async fn poll_updates(&self) -> Result<Vec<StreamEnded>, CallError> {
        let url = self
            .base_url
            .join("updates")
            .map_err(|e| CallError::Transport(e.to_string()))?;

        let response = self
            .http
            .get(url)
            .query(&[("timeout", POLL_TIMEOUT_SECS)])
            .send()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CallError::Transport(format!("HTTP {}", response.status())));
        }

        let parsed: UpdatesResponse = response
            .json()
            .await
            .map_err(|e| CallError::Transport(e.to_string()))?;

        Ok(parsed
            .events
            .into_iter()
            .filter(|event| event.kind == "stream_ended")
            .map(|event| StreamEnded {
                chat_id: ChatId(event.chat_id),
            })
            .collect())
    }
}

/// Traduce los códigos de error del sidecar a [`CallError`]
fn map_bridge_error(code: Option<&str>) -> CallError {
    match code {
        Some("ALREADY_IN_CALL") => CallError::AlreadyInCall,
        Some("NO_ACTIVE_CALL") | Some("GROUP_CALL_NOT_FOUND") => CallError::NoActiveCall,
        Some("NOT_IN_CALL") => CallError::NotInCall,
        Some(other) => CallError::Transport(other.to_string()),
        None => CallError::Transport("error desconocido del bridge".to_string()),
    }
}

#[async_trait]
impl VoiceCallClient for TgCallsBridge {
    async fn join(&self, chat_id: ChatId, stream_url: &str) -> Result<(), CallError> {
        self.post("play", chat_id, Some(stream_url)).await
    }

    async fn change_stream(&self, chat_id: ChatId, stream_url: &str) -> Result<(), CallError> {
        self.post("change", chat_id, Some(stream_url)).await
    }

    async fn leave(&self, chat_id: ChatId) -> Result<(), CallError> {
        self.post("leave", chat_id, None).await
    }

    async fn pause(&self, chat_id: ChatId) -> Result<(), CallError> {
        self.post("pause", chat_id, None).await
    }

    async fn resume(&self, chat_id: ChatId) -> Result<(), CallError> {
        self.post("resume", chat_id, None).await
    }
}
