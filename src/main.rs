use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use url::Url;

mod bot;
mod calls;
mod config;
mod player;
mod sources;
mod ui;

use crate::bot::MusicBot;
use crate::calls::{StreamEnded, TgCallsBridge, VoiceCallClient};
use crate::config::Config;
use crate::player::{PlayerCoordinator, PlayerError};
use crate::sources::{TrackResolver, YtDlpResolver};

#[tokio::main]
async fn main() -> Result<()> {
    // Inicializar logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("open_vc_music=debug".parse()?)
                .add_directive("teloxide=info".parse()?)
                .add_directive("reqwest=info".parse()?),
        )
        .init();

    info!("🎵 Iniciando Open VC Music Bot v{}", env!("CARGO_PKG_VERSION"));

    // Manejar health check si es necesario
    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check().await;
    }

    // Cargar configuración
    let config = Config::load()?;
    info!("{}", config.summary());

    // Bridge de llamadas de voz (sidecar estilo pytgcalls)
    let bridge_url = Url::parse(&config.bridge_url)?;
    let bridge = Arc::new(TgCallsBridge::new(
        bridge_url,
        Duration::from_secs(config.http_timeout),
    )?);

    // Coordinador de colas por chat
    let calls: Arc<dyn VoiceCallClient> = bridge.clone();
    let coordinator = Arc::new(PlayerCoordinator::new(
        calls,
        config.max_queue_size,
        config.queue_preview_size,
    ));

    // Resolución de tracks vía yt-dlp
    let resolver: Arc<dyn TrackResolver> = Arc::new(YtDlpResolver::new(
        Duration::from_secs(config.resolve_timeout),
        config.max_song_duration_limit(),
    ));

    let bot_client = Bot::new(&config.bot_token);

    // Fin de stream → advance, por el mismo camino que /skip
    let events = bridge.subscribe(64);
    tokio::spawn(stream_ended_pump(
        events,
        coordinator.clone(),
        bot_client.clone(),
    ));

    // Iniciar bot
    let ctx = Arc::new(MusicBot {
        config: Arc::new(config),
        coordinator: coordinator.clone(),
        resolver,
    });
    bot::run(bot_client, ctx).await;

    let stats = coordinator.stats();
    info!(
        "📊 Sesión terminada: {} tracks encolados, {} reproducidos",
        stats.enqueued, stats.played
    );
    Ok(())
}

/// Consume las notificaciones de fin de stream del bridge y avanza la cola
/// del chat correspondiente, anunciando el siguiente track si lo hay
async fn stream_ended_pump(
    mut events: mpsc::Receiver<StreamEnded>,
    coordinator: Arc<PlayerCoordinator>,
    bot: Bot,
) {
    while let Some(event) = events.recv().await {
        match coordinator.advance(event.chat_id).await {
            Ok(Some(track)) => {
                if let Err(e) = bot
                    .send_message(event.chat_id, ui::messages::now_playing(&track))
                    .parse_mode(ParseMode::Markdown)
                    .await
                {
                    warn!(
                        "no se pudo anunciar el siguiente track en {}: {}",
                        event.chat_id, e
                    );
                }
            }
            Ok(None) => {}
            Err(PlayerError::NothingPlaying) => {
                // un stop o un skip ganó la carrera; nada que avanzar
                debug!("fin de stream tardío en {}", event.chat_id);
            }
            Err(e) => {
                error!("❌ Error avanzando la cola en {}: {}", event.chat_id, e);
            }
        }
    }

    warn!("bomba de eventos terminada: el bridge cerró el canal");
}

async fn health_check() -> Result<()> {
    // Verificar dependencias críticas
    let yt_dlp = async_process::Command::new("yt-dlp")
        .arg("--version")
        .output()
        .await?;

    if yt_dlp.status.success() {
        println!("OK");
        Ok(())
    } else {
        anyhow::bail!("Dependencias faltantes");
    }
}
