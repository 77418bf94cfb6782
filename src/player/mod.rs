//! # Player Module
//!
//! Per-chat playback queue and lifecycle coordination.
//!
//! This module owns all mutable playback state of the bot:
//!
//! ### [`coordinator`] - Chat Queue Coordinator
//! - One ordered queue per chat, created lazily on first use
//! - Decides start/advance/stop transitions against the voice call client
//! - Sole writer of the per-chat "currently playing" state
//!
//! ### [`queue`] - Queue Management
//! - FIFO queue with a configured cap, removal only from the head
//! - Bounded previews for the queue listing
//!
//! ## Concurrency
//!
//! All operations for one chat are serialized behind a per-chat
//! [`tokio::sync::Mutex`]; different chats progress independently through a
//! [`dashmap::DashMap`]. Calls into the voice client happen outside the chat
//! lock, guarded by an epoch check so a `stop` that lands while a join is in
//! flight cannot be overwritten by the stale result.

pub mod coordinator;
pub mod queue;

use thiserror::Error;

use crate::calls::CallError;

pub use coordinator::{EnqueueOutcome, PlaybackStatus, PlayerCoordinator, QueueSnapshot};

/// Errores del coordinador, mapeables 1:1 a texto para el usuario.
/// Todos son locales a un solo chat.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("la cola está llena (máximo {max} tracks)")]
    QueueFull { max: usize },
    #[error("no hay nada reproduciéndose en este chat")]
    NothingPlaying,
    #[error("la reproducción ya está en ese estado")]
    AlreadyInState,
    /// Fallo de join/transporte; la cola del chat queda descartada
    #[error("fallo al reproducir en el chat de voz: {0}")]
    PlaybackFailed(#[source] CallError),
    /// Un stop llegó mientras el inicio de reproducción estaba en vuelo
    #[error("la reproducción fue detenida antes de arrancar")]
    Interrupted,
}
