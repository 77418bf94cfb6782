pub mod ytdlp;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use thiserror::Error;

pub use ytdlp::YtDlpResolver;

/// Trait común para los resolutores de tracks
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Resuelve texto libre (búsqueda) o una URL directa a un track reproducible
    async fn resolve(&self, query: &str, requested_by: &str) -> Result<Track, ResolveError>;
}

/// Errores de resolución; nunca mutan el estado de ninguna cola
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no se encontró ningún track reproducible")]
    NotFound,
    #[error("el track supera la duración máxima ({0}s)")]
    TooLong(u64),
    #[error("yt-dlp falló: {0}")]
    Extractor(String),
    #[error("tiempo de espera agotado resolviendo la búsqueda")]
    Timeout,
}

/// Un track resuelto, listo para reproducir en un chat de voz.
/// Inmutable una vez resuelto.
#[derive(Debug, Clone)]
pub struct Track {
    pub title: String,
    /// `None` = en vivo o duración desconocida
    pub duration: Option<Duration>,
    /// URL de audio directa que entiende el cliente de llamadas
    pub stream_url: String,
    /// Página de origen (para el botón de enlace)
    pub source_url: Option<String>,
    pub requested_by: String,
    #[allow(dead_code)]
    pub enqueued_at: DateTime<Utc>,
}

impl Track {
    pub fn new(title: String, stream_url: String, requested_by: String) -> Self {
        Self {
            title,
            duration: None,
            stream_url,
            source_url: None,
            requested_by,
            enqueued_at: Utc::now(),
        }
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn with_source_url(mut self, source_url: String) -> Self {
        self.source_url = Some(source_url);
        self
    }
}
