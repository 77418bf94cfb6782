use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use teloxide::types::ChatId;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::calls::{CallError, VoiceCallClient};
use crate::player::{queue::ChatQueue, PlayerError};
use crate::sources::Track;

/// Estado de reproducción de un chat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Idle,
    Playing,
    Paused,
}

/// Estado por chat. Sólo el coordinador lo muta, siempre bajo su mutex.
#[derive(Debug)]
struct ChatState {
    queue: ChatQueue,
    status: PlaybackStatus,
    /// Track cargado en el cliente de llamadas; puede ir un paso detrás
    /// del frente de la cola durante una transición
    current: Option<Track>,
    /// Se incrementa en cada stop; un inicio en vuelo que encuentre otro
    /// epoch al resolver no debe escribir estado
    epoch: u64,
}

/// Resultado de un enqueue
#[derive(Debug)]
pub enum EnqueueOutcome {
    /// El track era el primero y la reproducción arrancó
    Started(Track),
    /// El track quedó esperando en la posición indicada (1-based)
    Queued { position: usize, track: Track },
}

/// Vista de sólo lectura de la cola de un chat
#[derive(Debug, Clone)]
pub struct QueueSnapshot {
    pub status: PlaybackStatus,
    pub current: Option<Track>,
    /// Vista acotada empezando por el frente (el track en reproducción)
    pub upcoming: Vec<Track>,
    pub total: usize,
}

/// Contadores globales del proceso; sólo estadística
#[derive(Debug, Clone, Copy)]
pub struct StatsSnapshot {
    pub enqueued: u64,
    pub played: u64,
}

/// Coordinador de colas y ciclo de vida de reproducción por chat.
///
/// Serializa el acceso al estado de cada chat, traduce los cambios de la
/// cola en llamadas al cliente de voz y las notificaciones del cliente en
/// cambios de la cola. Los chats son independientes entre sí.
pub struct PlayerCoordinator {
    calls: Arc<dyn VoiceCallClient>,
    chats: DashMap<ChatId, Arc<Mutex<ChatState>>>,
    max_queue_size: usize,
    preview_size: usize,
    enqueued_total: AtomicU64,
    played_total: AtomicU64,
}

impl PlayerCoordinator {
    pub fn new(calls: Arc<dyn VoiceCallClient>, max_queue_size: usize, preview_size: usize) -> Self {
        Self {
            calls,
            chats: DashMap::new(),
            max_queue_size,
            preview_size,
            enqueued_total: AtomicU64::new(0),
            played_total: AtomicU64::new(0),
        }
    }

    /// Encola un track; si es el primero y no hay nada sonando, arranca
    /// la reproducción inmediatamente
    pub async fn enqueue(
        &self,
        chat_id: ChatId,
        track: Track,
    ) -> Result<EnqueueOutcome, PlayerError> {
        let state = self.chat(chat_id);
        let mut s = state.lock().await;

        let position = s.queue.push(track.clone())?;
        self.enqueued_total.fetch_add(1, Ordering::Relaxed);

        if position == 1 && s.status == PlaybackStatus::Idle {
            let epoch = s.epoch;
            drop(s);
            self.start_playback(chat_id, &state, epoch, track.clone())
                .await?;
            Ok(EnqueueOutcome::Started(track))
        } else {
            debug!(
                "track en espera en {}: {} (posición {})",
                chat_id, track.title, position
            );
            Ok(EnqueueOutcome::Queued { position, track })
        }
    }

    /// Única vía de avance de la cola: la usan tanto la notificación de fin
    /// de stream como el comando de skip, para que ambas transiten el mismo
    /// camino y no puedan sacar el frente dos veces.
    pub async fn advance(&self, chat_id: ChatId) -> Result<Option<Track>, PlayerError> {
        let state = self.chat(chat_id);
        let mut s = state.lock().await;

        if s.status == PlaybackStatus::Idle {
            return Err(PlayerError::NothingPlaying);
        }

        if let Some(finished) = s.queue.pop_front() {
            debug!("⏏️ Track terminado en {}: {}", chat_id, finished.title);
        }
        s.current = None;

        match s.queue.head().cloned() {
            Some(next) => {
                let epoch = s.epoch;
                drop(s);
                self.start_playback(chat_id, &state, epoch, next.clone())
                    .await?;
                Ok(Some(next))
            }
            None => {
                s.status = PlaybackStatus::Idle;
                if let Err(e) = self.calls.leave(chat_id).await {
                    warn!("⚠️ Error al salir de la llamada en {}: {}", chat_id, e);
                }
                info!("📭 Cola vacía en {}, saliendo del chat de voz", chat_id);
                Ok(None)
            }
        }
    }

    /// Pausa la reproducción actual
    pub async fn pause(&self, chat_id: ChatId) -> Result<(), PlayerError> {
        let state = self.chat(chat_id);
        let mut s = state.lock().await;

        match s.status {
            PlaybackStatus::Playing => {
                self.calls
                    .pause(chat_id)
                    .await
                    .map_err(PlayerError::PlaybackFailed)?;
                s.status = PlaybackStatus::Paused;
                info!("⏸️ Pausado en {}", chat_id);
                Ok(())
            }
            PlaybackStatus::Paused => Err(PlayerError::AlreadyInState),
            PlaybackStatus::Idle => Err(PlayerError::NothingPlaying),
        }
    }

    /// Reanuda una reproducción pausada
    pub async fn resume(&self, chat_id: ChatId) -> Result<(), PlayerError> {
        let state = self.chat(chat_id);
        let mut s = state.lock().await;

        match s.status {
            PlaybackStatus::Paused => {
                self.calls
                    .resume(chat_id)
                    .await
                    .map_err(PlayerError::PlaybackFailed)?;
                s.status = PlaybackStatus::Playing;
                info!("▶️ Reanudado en {}", chat_id);
                Ok(())
            }
            PlaybackStatus::Playing => Err(PlayerError::AlreadyInState),
            PlaybackStatus::Idle => Err(PlayerError::NothingPlaying),
        }
    }

    /// Sale de la llamada, limpia la cola y vuelve a idle. Idempotente.
    pub async fn stop(&self, chat_id: ChatId) -> Result<(), PlayerError> {
        let state = self.chat(chat_id);
        let mut s = state.lock().await;

        s.epoch = s.epoch.wrapping_add(1);
        s.queue.clear();
        s.status = PlaybackStatus::Idle;
        s.current = None;

        if let Err(e) = self.calls.leave(chat_id).await {
            // salir de una llamada inexistente no es un error para stop
            debug!("leave durante stop en {}: {}", chat_id, e);
        }

        info!("⏹️ Reproducción detenida en {}", chat_id);
        Ok(())
    }

    /// Track cargado actualmente en el cliente de llamadas, si hay
    pub async fn current_track(&self, chat_id: ChatId) -> Option<Track> {
        let state = self.chats.get(&chat_id).map(|entry| entry.clone())?;
        let s = state.lock().await;
        s.current.clone()
    }

    /// Vista de sólo lectura de la cola, sin efectos secundarios
    pub async fn queue_snapshot(&self, chat_id: ChatId) -> QueueSnapshot {
        match self.chats.get(&chat_id).map(|entry| entry.clone()) {
            Some(state) => {
                let s = state.lock().await;
                QueueSnapshot {
                    status: s.status,
                    current: s.current.clone(),
                    upcoming: s.queue.preview(self.preview_size),
                    total: s.queue.len(),
                }
            }
            None => QueueSnapshot {
                status: PlaybackStatus::Idle,
                current: None,
                upcoming: Vec::new(),
                total: 0,
            },
        }
    }

    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            enqueued: self.enqueued_total.load(Ordering::Relaxed),
            played: self.played_total.load(Ordering::Relaxed),
        }
    }

    /// Intenta reproducir `track` en el chat de voz.
    ///
    /// La llamada al cliente va fuera del lock del chat: un stop puede
    /// llegar mientras el join está en vuelo. Al resolver se revalida el
    /// epoch contra el estado actual, nunca contra una copia vieja.
    async fn start_playback(
        &self,
        chat_id: ChatId,
        state: &Arc<Mutex<ChatState>>,
        epoch: u64,
        track: Track,
    ) -> Result<(), PlayerError> {
        let result = match self.calls.join(chat_id, &track.stream_url).await {
            Err(CallError::AlreadyInCall) => {
                // sesión viva de una reproducción anterior: cambiar el
                // stream en lugar de unirse, sin descartar la cola
                debug!("ya en llamada en {}, cambiando stream", chat_id);
                self.calls.change_stream(chat_id, &track.stream_url).await
            }
            other => other,
        };

        let mut s = state.lock().await;

        if s.epoch != epoch {
            warn!(
                "⏹️ Inicio descartado en {} (stop durante el join)",
                chat_id
            );
            if result.is_ok() {
                if let Err(e) = self.calls.leave(chat_id).await {
                    warn!("⚠️ Error al salir tras inicio descartado en {}: {}", chat_id, e);
                }
            }
            return Err(PlayerError::Interrupted);
        }

        match result {
            Ok(()) => {
                s.status = PlaybackStatus::Playing;
                s.current = Some(track.clone());
                self.played_total.fetch_add(1, Ordering::Relaxed);
                info!("🎵 Reproduciendo en {}: {}", chat_id, track.title);
                Ok(())
            }
            Err(e) => {
                // un primer play fallido descarta todo el lote pendiente
                error!("❌ Fallo al reproducir en {}: {}", chat_id, e);
                s.queue.clear();
                s.status = PlaybackStatus::Idle;
                s.current = None;
                Err(PlayerError::PlaybackFailed(e))
            }
        }
    }

    fn chat(&self, chat_id: ChatId) -> Arc<Mutex<ChatState>> {
        self.chats
            .entry(chat_id)
            .or_insert_with(|| {
                Arc::new(Mutex::new(ChatState {
                    queue: ChatQueue::new(self.max_queue_size),
                    status: PlaybackStatus::Idle,
                    current: None,
                    epoch: 0,
                }))
            })
            .clone()
    }
}
