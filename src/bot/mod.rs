//! # Bot Module
//!
//! Telegram command surface for Open VC Music.
//!
//! Parses chat commands, invokes the coordinator's operations and formats
//! results back to the chat. All substantive behavior lives in
//! [`crate::player`]; this module is thin I/O glue.

pub mod commands;

use std::sync::Arc;
use teloxide::{dptree, prelude::*};
use tracing::info;

use crate::{config::Config, player::PlayerCoordinator, sources::TrackResolver};

/// Dependencias compartidas por los handlers de comandos
pub struct MusicBot {
    pub config: Arc<Config>,
    pub coordinator: Arc<PlayerCoordinator>,
    pub resolver: Arc<dyn TrackResolver>,
}

/// Corre el dispatcher hasta recibir la señal de apagado
pub async fn run(bot: Bot, ctx: Arc<MusicBot>) {
    let handler = Update::filter_message().branch(
        dptree::entry()
            .filter_command::<commands::Command>()
            .endpoint(commands::handle_command),
    );

    info!("🚀 Bot iniciado, esperando comandos");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![ctx])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
