use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub owner_username: String,

    // Sidecar de llamadas de voz
    pub bridge_url: String,

    // Cola
    pub max_queue_size: usize,
    pub queue_preview_size: usize,

    // Límites
    pub max_song_duration: u64, // en segundos, 0 = sin límite
    pub resolve_timeout: u64,   // en segundos
    pub http_timeout: u64,      // en segundos
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            // Telegram
            bot_token: std::env::var("BOT_TOKEN")?,
            owner_username: std::env::var("OWNER_USERNAME")
                .unwrap_or_else(|_| "open_vc_owner".to_string()),

            // Sidecar de llamadas
            bridge_url: std::env::var("TGCALLS_BRIDGE_URL")
                .unwrap_or_else(|_| "http://localhost:8793".to_string()),

            // Cola
            max_queue_size: std::env::var("MAX_QUEUE_SIZE")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
            queue_preview_size: std::env::var("QUEUE_PREVIEW_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,

            // Límites
            max_song_duration: std::env::var("MAX_SONG_DURATION")
                .unwrap_or_else(|_| "3600".to_string()) // 1 hora
                .parse()?,
            resolve_timeout: std::env::var("RESOLVE_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
            http_timeout: std::env::var("HTTP_TIMEOUT")
                .unwrap_or_else(|_| "30".to_string())
                .parse()?,
        };

        // Validate configuration before returning
        config.validate()?;

        Ok(config)
    }

    /// Sanity checks de los valores de configuración
    pub fn validate(&self) -> Result<()> {
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN must not be empty");
        }

        let bridge = Url::parse(&self.bridge_url)?;
        if !matches!(bridge.scheme(), "http" | "https") {
            anyhow::bail!("Bridge URL must be http(s), got: {}", self.bridge_url);
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.queue_preview_size == 0 {
            anyhow::bail!("Queue preview size must be greater than 0");
        }

        if self.resolve_timeout == 0 {
            anyhow::bail!("Resolve timeout must be greater than 0");
        }

        if self.http_timeout == 0 {
            anyhow::bail!("HTTP timeout must be greater than 0");
        }

        Ok(())
    }

    /// Límite de duración de track; 0 en el entorno significa sin límite
    pub fn max_song_duration_limit(&self) -> Option<Duration> {
        if self.max_song_duration == 0 {
            None
        } else {
            Some(Duration::from_secs(self.max_song_duration))
        }
    }

    /// Resumen seguro para loguear (sin token)
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Bridge: {}\n  \
            Queue: {} max, {} preview\n  \
            Limits: {}s max duration, {}s resolve timeout, {}s http timeout\n  \
            Owner: @{}",
            self.bridge_url,
            self.max_queue_size,
            self.queue_preview_size,
            self.max_song_duration,
            self.resolve_timeout,
            self.http_timeout,
            self.owner_username,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            bot_token: "123:abc".to_string(),
            owner_username: "owner".to_string(),
            bridge_url: "http://localhost:8793".to_string(),
            max_queue_size: 20,
            queue_preview_size: 10,
            max_song_duration: 3600,
            resolve_timeout: 30,
            http_timeout: 30,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn rejects_zero_queue_cap_and_bad_bridge_url() {
        let mut bad = config();
        bad.max_queue_size = 0;
        assert!(bad.validate().is_err());

        let mut bad = config();
        bad.bridge_url = "ftp://localhost".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn zero_duration_means_unlimited() {
        let mut cfg = config();
        cfg.max_song_duration = 0;
        assert_eq!(cfg.max_song_duration_limit(), None);

        cfg.max_song_duration = 600;
        assert_eq!(
            cfg.max_song_duration_limit(),
            Some(Duration::from_secs(600))
        );
    }
}
