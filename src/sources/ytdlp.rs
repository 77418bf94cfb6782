use async_process::Command;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use super::{ResolveError, Track, TrackResolver};

/// Resolutor de tracks basado en yt-dlp (búsqueda en plataforma o URL directa)
pub struct YtDlpResolver {
    // Limitar procesos concurrentes para evitar rate limiting
    rate_limiter: tokio::sync::Semaphore,
    resolve_timeout: Duration,
    max_duration: Option<Duration>,
}

/// Información extraída de yt-dlp
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    duration: Option<f64>,
    url: Option<String>,
    webpage_url: Option<String>,
    is_live: Option<bool>,
    formats: Option<Vec<Format>>,
}

#[derive(Debug, Deserialize)]
struct Format {
    url: Option<String>,
    acodec: Option<String>,
}

impl YtDlpResolver {
    pub fn new(resolve_timeout: Duration, max_duration: Option<Duration>) -> Self {
        Self {
            rate_limiter: tokio::sync::Semaphore::new(3),
            resolve_timeout,
            max_duration,
        }
    }

    /// Convierte la salida JSON de yt-dlp en un track, aplicando el límite de duración
    fn track_from_info(
        &self,
        info: YtDlpInfo,
        query: &str,
        requested_by: &str,
    ) -> Result<Track, ResolveError> {
        let stream_url = pick_stream_url(&info).ok_or(ResolveError::NotFound)?;

        let is_live = info.is_live.unwrap_or(false);
        let duration = match info.duration {
            Some(secs) if secs > 0.0 && !is_live => Some(Duration::from_secs(secs as u64)),
            _ => None,
        };

        if let (Some(max), Some(dur)) = (self.max_duration, duration) {
            if dur > max {
                return Err(ResolveError::TooLong(max.as_secs()));
            }
        }

        let mut track = Track::new(
            info.title.unwrap_or_else(|| query.to_string()),
            stream_url,
            requested_by.to_string(),
        );
        if let Some(dur) = duration {
            track = track.with_duration(dur);
        }
        if let Some(page) = info.webpage_url {
            track = track.with_source_url(page);
        }

        Ok(track)
    }
}

#[async_trait::async_trait]
impl TrackResolver for YtDlpResolver {
    async fn resolve(&self, query: &str, requested_by: &str) -> Result<Track, ResolveError> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|e| ResolveError::Extractor(e.to_string()))?;

        info!("🔍 Resolviendo: {}", query);

        let target = if is_direct_url(query) {
            query.to_string()
        } else {
            format!("ytsearch1:{query}")
        };

        let output = timeout(
            self.resolve_timeout,
            Command::new("yt-dlp")
                .args([
                    "--no-playlist",
                    "--dump-json",
                    "--format",
                    "bestaudio/best",
                    "--no-warnings",
                    "--socket-timeout",
                    "10",
                    &target,
                ])
                .output(),
        )
        .await
        .map_err(|_| ResolveError::Timeout)?
        .map_err(|e| ResolveError::Extractor(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("❌ yt-dlp falló para {:?}: {}", query, stderr.trim());
            return Err(ResolveError::Extractor(stderr.trim().to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let info = parse_first_entry(&stdout).ok_or(ResolveError::NotFound)?;

        let track = self.track_from_info(info, query, requested_by)?;
        debug!("✅ Resuelto: {} ({:?})", track.title, track.duration);
        Ok(track)
    }
}

/// Primer objeto JSON válido de la salida (una entrada por línea)
fn parse_first_entry(stdout: &str) -> Option<YtDlpInfo> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .find_map(|line| serde_json::from_str::<YtDlpInfo>(line).ok())
}

/// URL de audio: el campo directo o el primer formato con codec de audio
fn pick_stream_url(info: &YtDlpInfo) -> Option<String> {
    if let Some(url) = &info.url {
        return Some(url.clone());
    }
    info.formats.as_ref()?.iter().find_map(|format| {
        let has_audio = format.acodec.as_deref().is_some_and(|codec| codec != "none");
        if has_audio {
            format.url.clone()
        } else {
            None
        }
    })
}

fn is_direct_url(query: &str) -> bool {
    Url::parse(query)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn direct_url_detection() {
        assert!(is_direct_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_direct_url("http://example.com/audio.mp3"));
        assert!(!is_direct_url("despacito"));
        assert!(!is_direct_url("ftp://example.com/audio.mp3"));
    }

    #[test]
    fn parses_entry_with_direct_url() {
        let stdout = r#"{"title":"Test Song","duration":245.0,"url":"https://cdn.example/a.m4a","webpage_url":"https://www.youtube.com/watch?v=abc"}"#;
        let info = parse_first_entry(stdout).unwrap();
        assert_eq!(info.title.as_deref(), Some("Test Song"));
        assert_eq!(pick_stream_url(&info).as_deref(), Some("https://cdn.example/a.m4a"));
    }

    #[test]
    fn falls_back_to_first_audio_format() {
        let stdout = r#"{"title":"Test","formats":[{"url":"https://cdn.example/video.mp4","acodec":"none"},{"url":"https://cdn.example/audio.webm","acodec":"opus"}]}"#;
        let info = parse_first_entry(stdout).unwrap();
        assert_eq!(
            pick_stream_url(&info).as_deref(),
            Some("https://cdn.example/audio.webm")
        );
    }

    #[test]
    fn skips_garbage_lines() {
        let stdout = "WARNING: algo\n{\"title\":\"Ok\",\"url\":\"https://cdn.example/a.m4a\"}\n";
        assert!(parse_first_entry(stdout).is_some());
    }

    #[test]
    fn live_stream_has_no_duration() {
        let resolver = YtDlpResolver::new(Duration::from_secs(30), None);
        let info: YtDlpInfo = serde_json::from_str(
            r#"{"title":"Radio","duration":0.0,"is_live":true,"url":"https://cdn.example/live"}"#,
        )
        .unwrap();
        let track = resolver.track_from_info(info, "radio", "@tester").unwrap();
        assert_eq!(track.duration, None);
    }

    #[test]
    fn rejects_tracks_over_max_duration() {
        let resolver = YtDlpResolver::new(Duration::from_secs(30), Some(Duration::from_secs(600)));
        let info: YtDlpInfo = serde_json::from_str(
            r#"{"title":"Mix largo","duration":7200.0,"url":"https://cdn.example/mix"}"#,
        )
        .unwrap();
        let result = resolver.track_from_info(info, "mix", "@tester");
        assert!(matches!(result, Err(ResolveError::TooLong(600))));
    }
}
