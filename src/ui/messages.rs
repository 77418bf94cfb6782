use std::time::Duration;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use url::Url;

use crate::player::{PlaybackStatus, QueueSnapshot};
use crate::sources::Track;

/// Mensaje de bienvenida de /start
pub fn welcome_text() -> String {
    "🎵 **Open VC Music** 🎵\n\n\
     Play music in voice chats!\n\n\
     **Setup:**\n\
     • Add me as admin\n\
     • Start a voice chat\n\
     • Use `/play <song>`\n\n\
     **Commands:**\n\
     `/play` - Play a song\n\
     `/pause` - Pause\n\
     `/resume` - Resume\n\
     `/skip` - Skip to next\n\
     `/stop` - Stop\n\
     `/queue` - Show queue\n\
     `/nowplaying` - Current track\n\
     `/help` - Help"
        .to_string()
}

pub fn help_text() -> String {
    "🎵 **Open VC Music Commands**\n\n\
     `/play <song>` - Play (search or URL)\n\
     `/queue` - Show queue\n\
     `/nowplaying` - Current track\n\
     `/pause` - Pause\n\
     `/resume` - Resume\n\
     `/skip` - Skip to next\n\
     `/stop` - Stop and clear\n\n\
     **Setup:**\n\
     1. Make the bot admin\n\
     2. Start a voice chat\n\
     3. Use /play!"
        .to_string()
}

pub fn now_playing(track: &Track) -> String {
    format!(
        "▶️ **Now Playing:**\n🎵 {}\n⏱️ {}\n👤 {}",
        track.title,
        fmt_duration(track.duration),
        track.requested_by
    )
}

pub fn queued(track: &Track, position: usize) -> String {
    format!(
        "✅ **Added to queue:**\n🎵 {}\n📍 Position: #{}\n👤 {}",
        track.title, position, track.requested_by
    )
}

/// Listado acotado de la cola; el frente va marcado como en reproducción
pub fn queue_list(snapshot: &QueueSnapshot) -> String {
    if snapshot.total == 0 {
        return "📭 Queue empty!".to_string();
    }

    let head_marker = if snapshot.status == PlaybackStatus::Paused {
        "⏸️"
    } else {
        "▶️"
    };

    let mut text = format!("📋 **Queue ({}):**\n\n", snapshot.total);
    for (i, track) in snapshot.upcoming.iter().enumerate() {
        if i == 0 {
            text.push_str(&format!("{} {}\n", head_marker, track.title));
        } else {
            text.push_str(&format!("{}. {}\n", i + 1, track.title));
        }
    }

    let remaining = snapshot.total.saturating_sub(snapshot.upcoming.len());
    if remaining > 0 {
        text.push_str(&format!("...+{remaining} more"));
    }

    text
}

/// `m:ss` (o `h:mm:ss`); `?` para en vivo / duración desconocida
pub fn fmt_duration(duration: Option<Duration>) -> String {
    match duration {
        Some(d) => {
            let secs = d.as_secs();
            if secs >= 3600 {
                format!("{}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
            } else {
                format!("{}:{:02}", secs / 60, secs % 60)
            }
        }
        None => "?".to_string(),
    }
}

/// Botón hacia la página de origen del track, si la hay
pub fn source_keyboard(track: &Track) -> Option<InlineKeyboardMarkup> {
    let url = track.source_url.as_ref().and_then(|u| Url::parse(u).ok())?;
    Some(InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::url("🔗 Source", url),
    ]]))
}

/// Botón hacia el dueño del bot para el mensaje de bienvenida
pub fn owner_keyboard(owner_username: &str) -> Option<InlineKeyboardMarkup> {
    let url = Url::parse(&format!("https://t.me/{owner_username}")).ok()?;
    Some(InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::url("👑 Owner", url),
    ]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn track(title: &str) -> Track {
        Track::new(
            title.to_string(),
            format!("https://cdn.example/{title}.m4a"),
            "@tester".to_string(),
        )
    }

    #[test]
    fn formats_durations() {
        assert_eq!(fmt_duration(None), "?");
        assert_eq!(fmt_duration(Some(Duration::from_secs(65))), "1:05");
        assert_eq!(fmt_duration(Some(Duration::from_secs(754))), "12:34");
        assert_eq!(fmt_duration(Some(Duration::from_secs(3725))), "1:02:05");
    }

    #[test]
    fn empty_queue_has_its_own_message() {
        let snapshot = QueueSnapshot {
            status: PlaybackStatus::Idle,
            current: None,
            upcoming: Vec::new(),
            total: 0,
        };
        assert_eq!(queue_list(&snapshot), "📭 Queue empty!");
    }

    #[test]
    fn queue_list_marks_the_head_and_truncates() {
        let upcoming: Vec<Track> = (0..10).map(|i| track(&format!("t{i}"))).collect();
        let snapshot = QueueSnapshot {
            status: PlaybackStatus::Playing,
            current: Some(upcoming[0].clone()),
            upcoming,
            total: 12,
        };

        let text = queue_list(&snapshot);
        assert!(text.starts_with("📋 **Queue (12):**"));
        assert!(text.contains("▶️ t0"));
        assert!(text.contains("2. t1"));
        assert!(text.contains("10. t9"));
        assert!(text.ends_with("...+2 more"));
    }

    #[test]
    fn paused_queue_marks_the_head_as_paused() {
        let snapshot = QueueSnapshot {
            status: PlaybackStatus::Paused,
            current: Some(track("t0")),
            upcoming: vec![track("t0"), track("t1")],
            total: 2,
        };

        let text = queue_list(&snapshot);
        assert!(text.contains("⏸️ t0"));
        assert!(text.contains("2. t1"));
    }

    #[test]
    fn now_playing_shows_requester_and_duration() {
        let track = track("Despacito").with_duration(Duration::from_secs(229));
        let text = now_playing(&track);
        assert!(text.contains("Despacito"));
        assert!(text.contains("3:49"));
        assert!(text.contains("@tester"));
    }

    #[test]
    fn source_keyboard_requires_a_valid_url() {
        let with_url = track("a").with_source_url("https://youtu.be/abc".to_string());
        assert!(source_keyboard(&with_url).is_some());
        assert!(source_keyboard(&track("b")).is_none());
    }
}
