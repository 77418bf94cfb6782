use std::sync::Arc;
use teloxide::{
    prelude::*,
    types::{ParseMode, User},
    utils::command::BotCommands,
};
use tracing::{info, warn};

use super::MusicBot;
use crate::{
    player::{EnqueueOutcome, PlayerError},
    ui::messages,
};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    #[command(description = "welcome and setup")]
    Start,
    #[command(description = "show available commands")]
    Help,
    #[command(description = "play a song in the voice chat")]
    Play(String),
    #[command(description = "pause playback")]
    Pause,
    #[command(description = "resume playback")]
    Resume,
    #[command(description = "skip to the next track")]
    Skip,
    #[command(description = "stop and clear the queue")]
    Stop,
    #[command(description = "show the queue")]
    Queue,
    #[command(description = "show the current track")]
    Nowplaying,
}

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    ctx: Arc<MusicBot>,
) -> ResponseResult<()> {
    match cmd {
        Command::Start => handle_start(&bot, &msg, &ctx).await,
        Command::Help => handle_help(&bot, &msg).await,
        Command::Play(query) => handle_play(&bot, &msg, &ctx, query).await,
        Command::Pause => handle_pause(&bot, &msg, &ctx).await,
        Command::Resume => handle_resume(&bot, &msg, &ctx).await,
        Command::Skip => handle_skip(&bot, &msg, &ctx).await,
        Command::Stop => handle_stop(&bot, &msg, &ctx).await,
        Command::Queue => handle_queue(&bot, &msg, &ctx).await,
        Command::Nowplaying => handle_nowplaying(&bot, &msg, &ctx).await,
    }
}

async fn handle_start(bot: &Bot, msg: &Message, ctx: &MusicBot) -> ResponseResult<()> {
    let mut request = bot
        .send_message(msg.chat.id, messages::welcome_text())
        .parse_mode(ParseMode::Markdown);
    if let Some(keyboard) = messages::owner_keyboard(&ctx.config.owner_username) {
        request = request.reply_markup(keyboard);
    }
    request.await?;
    Ok(())
}

async fn handle_help(bot: &Bot, msg: &Message) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, messages::help_text())
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}

async fn handle_play(
    bot: &Bot,
    msg: &Message,
    ctx: &MusicBot,
    query: String,
) -> ResponseResult<()> {
    if msg.chat.is_private() {
        bot.send_message(msg.chat.id, "❌ Use in groups only!").await?;
        return Ok(());
    }

    let query = query.trim();
    if query.is_empty() {
        bot.send_message(
            msg.chat.id,
            "❌ **Usage:** `/play <song>`\n**Example:** `/play Despacito`",
        )
        .parse_mode(ParseMode::Markdown)
        .await?;
        return Ok(());
    }

    let requested_by = msg
        .from
        .as_ref()
        .map(requester_name)
        .unwrap_or_else(|| "anonymous".to_string());

    info!("📝 /play {:?} de {} en {}", query, requested_by, msg.chat.id);

    let status = bot
        .send_message(msg.chat.id, format!("🔍 Searching: `{query}`"))
        .parse_mode(ParseMode::Markdown)
        .await?;

    let track = match ctx.resolver.resolve(query, &requested_by).await {
        Ok(track) => track,
        Err(e) => {
            warn!("resolución falló para {:?}: {}", query, e);
            bot.edit_message_text(msg.chat.id, status.id, "❌ Not found!")
                .await?;
            return Ok(());
        }
    };

    match ctx.coordinator.enqueue(msg.chat.id, track).await {
        Ok(EnqueueOutcome::Started(track)) => {
            let mut request = bot
                .edit_message_text(msg.chat.id, status.id, messages::now_playing(&track))
                .parse_mode(ParseMode::Markdown);
            if let Some(keyboard) = messages::source_keyboard(&track) {
                request = request.reply_markup(keyboard);
            }
            request.await?;
        }
        Ok(EnqueueOutcome::Queued { position, track }) => {
            bot.edit_message_text(msg.chat.id, status.id, messages::queued(&track, position))
                .parse_mode(ParseMode::Markdown)
                .await?;
        }
        Err(PlayerError::QueueFull { max }) => {
            bot.edit_message_text(
                msg.chat.id,
                status.id,
                format!("❌ Queue is full! (max {max} tracks)"),
            )
            .await?;
        }
        Err(PlayerError::Interrupted) => {
            bot.edit_message_text(
                msg.chat.id,
                status.id,
                "⏹️ Stopped before playback could start.",
            )
            .await?;
        }
        Err(e) => {
            warn!("fallo de reproducción en {}: {}", msg.chat.id, e);
            bot.edit_message_text(
                msg.chat.id,
                status.id,
                "❌ Failed! Check:\n• Voice chat started\n• Bot is admin\n• Voice chat permissions",
            )
            .await?;
        }
    }

    Ok(())
}

async fn handle_pause(bot: &Bot, msg: &Message, ctx: &MusicBot) -> ResponseResult<()> {
    let text = match ctx.coordinator.pause(msg.chat.id).await {
        Ok(()) => "⏸️ Paused!".to_string(),
        Err(PlayerError::AlreadyInState) => "❌ Already paused!".to_string(),
        Err(PlayerError::NothingPlaying) => "❌ Nothing playing!".to_string(),
        Err(e) => format!("❌ Error: {e}"),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_resume(bot: &Bot, msg: &Message, ctx: &MusicBot) -> ResponseResult<()> {
    let text = match ctx.coordinator.resume(msg.chat.id).await {
        Ok(()) => "▶️ Resumed!".to_string(),
        Err(PlayerError::AlreadyInState) => "❌ Already playing!".to_string(),
        Err(PlayerError::NothingPlaying) => "❌ Nothing playing!".to_string(),
        Err(e) => format!("❌ Error: {e}"),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

async fn handle_skip(bot: &Bot, msg: &Message, ctx: &MusicBot) -> ResponseResult<()> {
    match ctx.coordinator.advance(msg.chat.id).await {
        Ok(Some(track)) => {
            bot.send_message(
                msg.chat.id,
                format!("⏭️ Skipped!\n\n{}", messages::now_playing(&track)),
            )
            .parse_mode(ParseMode::Markdown)
            .await?;
        }
        Ok(None) => {
            bot.send_message(
                msg.chat.id,
                "⏭️ Skipped. Queue is empty, leaving the voice chat.",
            )
            .await?;
        }
        Err(PlayerError::NothingPlaying) => {
            bot.send_message(msg.chat.id, "❌ Nothing playing!").await?;
        }
        Err(e) => {
            warn!("skip falló en {}: {}", msg.chat.id, e);
            bot.send_message(msg.chat.id, "❌ Failed to play the next track, queue cleared.")
                .await?;
        }
    }
    Ok(())
}

async fn handle_stop(bot: &Bot, msg: &Message, ctx: &MusicBot) -> ResponseResult<()> {
    if let Err(e) = ctx.coordinator.stop(msg.chat.id).await {
        warn!("stop falló en {}: {}", msg.chat.id, e);
    }
    bot.send_message(msg.chat.id, "⏹️ Stopped!").await?;
    Ok(())
}

async fn handle_queue(bot: &Bot, msg: &Message, ctx: &MusicBot) -> ResponseResult<()> {
    let snapshot = ctx.coordinator.queue_snapshot(msg.chat.id).await;
    bot.send_message(msg.chat.id, messages::queue_list(&snapshot))
        .parse_mode(ParseMode::Markdown)
        .await?;
    Ok(())
}

async fn handle_nowplaying(bot: &Bot, msg: &Message, ctx: &MusicBot) -> ResponseResult<()> {
    match ctx.coordinator.current_track(msg.chat.id).await {
        Some(track) => {
            let mut request = bot
                .send_message(msg.chat.id, messages::now_playing(&track))
                .parse_mode(ParseMode::Markdown);
            if let Some(keyboard) = messages::source_keyboard(&track) {
                request = request.reply_markup(keyboard);
            }
            request.await?;
        }
        None => {
            bot.send_message(msg.chat.id, "📭 Nothing playing!").await?;
        }
    }
    Ok(())
}

/// Mención del usuario si tiene username, si no el nombre visible
fn requester_name(user: &User) -> String {
    user.mention().unwrap_or_else(|| user.first_name.clone())
}
