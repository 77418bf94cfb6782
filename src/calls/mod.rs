//! Cliente de llamadas de voz.
//!
//! El transporte de audio real vive en un sidecar externo (estilo pytgcalls);
//! este módulo define la costura [`VoiceCallClient`] que consume el
//! coordinador y el cliente HTTP [`TgCallsBridge`] que habla con el sidecar.

pub mod bridge;

use async_trait::async_trait;
use teloxide::types::ChatId;
use thiserror::Error;

pub use bridge::TgCallsBridge;

/// Errores reportados por el cliente de llamadas de voz
#[derive(Debug, Error)]
pub enum CallError {
    /// Ya hay una sesión activa para ese chat; se puede cambiar el stream
    #[error("ya estamos en la llamada de este chat")]
    AlreadyInCall,
    /// El chat no tiene un chat de voz iniciado
    #[error("el chat no tiene un chat de voz activo")]
    NoActiveCall,
    #[error("no estamos en la llamada de este chat")]
    NotInCall,
    #[error("error de transporte: {0}")]
    Transport(String),
}

/// Notificación asíncrona: el stream en curso de un chat terminó.
/// Se entrega como máximo una vez por reproducción.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamEnded {
    pub chat_id: ChatId,
}

/// Operaciones del cliente de llamadas que consume el coordinador
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceCallClient: Send + Sync {
    /// Se une al chat de voz y comienza el transporte del stream
    async fn join(&self, chat_id: ChatId, stream_url: &str) -> Result<(), CallError>;

    /// Cambia el stream de una sesión ya activa
    async fn change_stream(&self, chat_id: ChatId, stream_url: &str) -> Result<(), CallError>;

    async fn leave(&self, chat_id: ChatId) -> Result<(), CallError>;

    async fn pause(&self, chat_id: ChatId) -> Result<(), CallError>;

    async fn resume(&self, chat_id: ChatId) -> Result<(), CallError>;
}
